//! Runtime driver tests on tokio's paused clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use dategate_core::runtime::run;
use dategate_core::{
    Clock, Event, Gate, GateSettings, Location, Navigator, OptInFlag, Page, StaticOptIn,
};
use tokio::time::{sleep, Instant};

/// Wall clock that advances with tokio's (paused) time.
struct TokioClock {
    base: DateTime<Utc>,
    origin: Instant,
}

impl TokioClock {
    fn starting_at(base: DateTime<Utc>) -> Self {
        Self {
            base,
            origin: Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    type Tz = Utc;

    fn now(&self) -> DateTime<Utc> {
        self.base + chrono::Duration::from_std(self.origin.elapsed()).unwrap()
    }
}

async fn drive<F: OptInFlag>(
    base: DateTime<Utc>,
    flag: F,
    path: &str,
    shutdown: impl std::future::Future<Output = ()>,
) -> (Location, Vec<Event>) {
    let gate = Gate::new(
        TokioClock::starting_at(base),
        flag,
        Location::new(path),
        GateSettings::default(),
    )
    .unwrap();
    let mut events = Vec::new();
    let gate = run(gate, shutdown, |e| events.push(e.clone())).await;
    (gate.into_navigator(), events)
}

#[tokio::test(start_paused = true)]
async fn one_shot_opens_the_window_on_time() {
    let base = Utc.with_ymd_and_hms(2025, 2, 13, 23, 59, 59).unwrap();
    let (loc, events) = drive(base, StaticOptIn(false), "/index.html", sleep(Duration::from_secs(3))).await;

    assert_eq!(loc.path(), "/main.html");
    assert_eq!(loc.replacements().len(), 1);

    let redirect = events.iter().find(|e| e.is_redirect()).unwrap();
    match redirect {
        Event::Redirected { to, at, .. } => {
            assert_eq!(*to, Page::Main);
            let fired = at.with_timezone(&Utc);
            assert!(fired >= Utc.with_ymd_and_hms(2025, 2, 14, 0, 0, 0).unwrap());
            assert!(fired < Utc.with_ymd_and_hms(2025, 2, 14, 0, 0, 1).unwrap());
        }
        other => panic!("Expected Redirected, got {other:?}"),
    }

    // After the reload the chain is armed for the window close.
    match events.last().unwrap() {
        Event::Armed { boundary, .. } => {
            assert_eq!(
                boundary.with_timezone(&Utc),
                Utc.with_ymd_and_hms(2025, 2, 15, 0, 0, 0).unwrap()
            );
        }
        other => panic!("Expected Armed, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn one_shot_closes_the_window() {
    let base = Utc.with_ymd_and_hms(2025, 2, 14, 23, 59, 58).unwrap();
    let (loc, _) = drive(base, StaticOptIn(true), "/main.html", sleep(Duration::from_secs(5))).await;
    assert_eq!(loc.path(), "/waiting.html");
}

#[tokio::test(start_paused = true)]
async fn fallback_picks_up_flag_change() {
    let base = Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap();
    let flag = Arc::new(AtomicBool::new(false));
    let writer = Arc::clone(&flag);
    let shutdown = async move {
        sleep(Duration::from_secs(30)).await;
        writer.store(true, Ordering::SeqCst);
        sleep(Duration::from_secs(45)).await;
    };
    let (loc, events) = drive(base, flag, "/index.html", shutdown).await;

    assert_eq!(loc.path(), "/waiting.html");
    let at = events
        .iter()
        .find_map(|e| match e {
            Event::Redirected { at, .. } => Some(at.with_timezone(&Utc)),
            _ => None,
        })
        .unwrap();
    // Observed on the first fallback tick, one minute after load.
    assert_eq!(at, base + chrono::Duration::seconds(60));
}

#[tokio::test(start_paused = true)]
async fn fallback_keeps_ticking_without_redirects() {
    let base = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
    let (loc, events) = drive(base, StaticOptIn(false), "/index.html", sleep(Duration::from_secs(181))).await;
    assert!(loc.replacements().is_empty());
    let checks = events
        .iter()
        .filter(|e| matches!(e, Event::Checked { .. }))
        .count();
    // Initial load plus ticks at 60s, 120s and 180s.
    assert_eq!(checks, 4);
}

/// Navigator whose replacements never take effect.
struct StuckNavigator {
    attempts: usize,
}

impl Navigator for StuckNavigator {
    fn current_path(&self) -> String {
        "/index.html".into()
    }

    fn replace(&mut self, _resource: &str) {
        self.attempts += 1;
    }
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_honoured_while_reloads_keep_redirecting() {
    let base = Utc.with_ymd_and_hms(2025, 2, 14, 12, 0, 0).unwrap();
    let gate = Gate::new(
        TokioClock::starting_at(base),
        StaticOptIn(false),
        StuckNavigator { attempts: 0 },
        GateSettings::default(),
    )
    .unwrap();

    let gate = run(gate, std::future::ready(()), |_| {}).await;
    assert_eq!(gate.loads(), 1);
    assert_eq!(gate.navigator().attempts, 1);
}
