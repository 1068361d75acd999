//! Tokio driver for a [`Gate`].
//!
//! One task, two timer sources: a `sleep` for the armed one-shot and an
//! `interval` for the fallback re-check. `select!` runs their callbacks
//! strictly one after another, so the gate needs no locking.

use std::future::Future;
use std::pin::Pin;

use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::events::Event;
use crate::gate::Gate;
use crate::location::Navigator;
use crate::optin::OptInFlag;

/// Drive `gate` until `shutdown` resolves, then hand it back.
///
/// Every event the gate produces is passed to `on_event`. A redirect reloads
/// the page: the gate is loaded again and the fallback period restarts.
pub async fn run<C, F, N, S, E>(mut gate: Gate<C, F, N>, shutdown: S, mut on_event: E) -> Gate<C, F, N>
where
    C: Clock,
    F: OptInFlag,
    N: Navigator,
    S: Future<Output = ()>,
    E: FnMut(&Event),
{
    tokio::pin!(shutdown);

    'page: loop {
        let events = gate.load();
        events.iter().for_each(&mut on_event);
        info!(path = %gate.navigator().current_path(), loads = gate.loads(), "page loaded");
        if gate.take_reload() {
            if reload_cancelled(&mut shutdown).await {
                info!("gate shutting down");
                return gate;
            }
            continue 'page;
        }

        let period = gate.fallback_interval();
        let mut fallback = time::interval_at(Instant::now() + period, period);
        fallback.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let one_shot = gate.boundary_in();
            let sleep = async move {
                match one_shot {
                    Some(delay) => time::sleep(delay).await,
                    None => std::future::pending::<()>().await,
                }
            };

            let events = tokio::select! {
                _ = &mut shutdown => {
                    info!("gate shutting down");
                    return gate;
                }
                _ = sleep => {
                    debug!("one-shot elapsed");
                    gate.on_boundary()
                }
                _ = fallback.tick() => {
                    debug!("fallback re-check");
                    gate.on_fallback()
                }
            };
            events.iter().for_each(&mut on_event);

            if gate.take_reload() {
                if reload_cancelled(&mut shutdown).await {
                    info!("gate shutting down");
                    return gate;
                }
                continue 'page;
            }
        }
    }
}

/// Yield once before a reload, reporting whether `shutdown` resolved.
///
/// A navigator that never lands on the required page would otherwise reload
/// in a tight loop without giving `shutdown` a chance to run.
async fn reload_cancelled<S: Future<Output = ()>>(shutdown: &mut Pin<&mut S>) -> bool {
    tokio::select! {
        biased;
        _ = shutdown.as_mut() => true,
        _ = tokio::task::yield_now() => false,
    }
}
