//! Boundary scheduler.
//!
//! A chain of one-shot timers, each armed for the next window boundary
//! (open or close) plus a small safety margin. The scheduler holds no thread
//! or timer of its own; the host sleeps until [`Scheduler::fire_in`] elapses,
//! calls [`Scheduler::fire`], runs the enforcer and arms again.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Armed -> (fire) -> Idle -> Armed -> ...
//! ```

use chrono::{DateTime, Datelike, Duration, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{fixed, Event};
use crate::window::{TargetDate, Window};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Armed,
}

/// An armed one-shot.
#[derive(Debug, Clone)]
pub struct Arming<Tz: TimeZone> {
    /// Window boundary this one-shot is for.
    pub boundary: DateTime<Tz>,
    /// `boundary + safety margin`.
    pub fire_at: DateTime<Tz>,
    /// Delay from the arming instant to `fire_at`.
    pub delay: Duration,
}

/// Next instant at which the required page could change.
///
/// Rolls over to next year's window once this year's has closed.
pub fn next_boundary<Tz: TimeZone>(now: &DateTime<Tz>, target: TargetDate) -> DateTime<Tz> {
    let mut window = Window::for_instant(now, target);
    if *now >= window.end {
        window = Window::for_year(now.year().saturating_add(1), target, &now.timezone());
    }
    if *now < window.start {
        window.start
    } else {
        window.end
    }
}

/// One-shot chain state machine.
#[derive(Debug, Clone)]
pub struct Scheduler<Tz: TimeZone> {
    target: TargetDate,
    safety_margin: Duration,
    armed: Option<Arming<Tz>>,
    fired: u64,
}

impl<Tz: TimeZone> Scheduler<Tz> {
    pub fn new(target: TargetDate, safety_margin: std::time::Duration) -> Self {
        Self {
            target,
            safety_margin: Duration::from_std(safety_margin).unwrap_or_else(|_| Duration::zero()),
            armed: None,
            fired: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> SchedulerState {
        if self.armed.is_some() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    pub fn armed(&self) -> Option<&Arming<Tz>> {
        self.armed.as_ref()
    }

    /// Number of one-shots that have fired.
    pub fn fire_count(&self) -> u64 {
        self.fired
    }

    /// Time left until the armed one-shot is due, zero if overdue.
    pub fn fire_in(&self, now: &DateTime<Tz>) -> Option<std::time::Duration> {
        let armed = self.armed.as_ref()?;
        let left = armed.fire_at.clone() - now.clone();
        Some(left.to_std().unwrap_or(std::time::Duration::ZERO))
    }

    pub fn is_due(&self, now: &DateTime<Tz>) -> bool {
        self.armed.as_ref().is_some_and(|a| *now >= a.fire_at)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Arm the one-shot for the next boundary after `now`, replacing any
    /// armed one. Stays idle when no boundary lies ahead.
    pub fn arm(&mut self, now: &DateTime<Tz>) -> Event {
        let boundary = next_boundary(now, self.target);
        let until = boundary.clone() - now.clone();
        if until <= Duration::zero() {
            debug!("no future boundary, one-shot chain ends");
            self.armed = None;
            return Event::Unarmed { at: fixed(now) };
        }

        let fire_at = boundary.clone() + self.safety_margin;
        let delay = until + self.safety_margin;
        let event = Event::Armed {
            boundary: fixed(&boundary),
            fire_at: fixed(&fire_at),
            delay_ms: delay.num_milliseconds().max(0) as u64,
            at: fixed(now),
        };
        info!(boundary = %fixed(&boundary), delay_ms = delay.num_milliseconds(), "one-shot armed");
        self.armed = Some(Arming {
            boundary,
            fire_at,
            delay,
        });
        event
    }

    /// Consume the armed one-shot if it is due at `now`.
    ///
    /// Returns `false` (and stays armed) when called early.
    pub fn fire(&mut self, now: &DateTime<Tz>) -> bool {
        if !self.is_due(now) {
            return false;
        }
        self.armed = None;
        self.fired += 1;
        true
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }
}
