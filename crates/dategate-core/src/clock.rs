//! Wall-clock sources.
//!
//! Everything that reads the time goes through [`Clock`] so tests can drive
//! the gate with simulated time.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, TimeZone};

pub trait Clock {
    type Tz: TimeZone;

    fn now(&self) -> DateTime<Self::Tz>;
}

/// The host's local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock<Tz: TimeZone> {
    now: Arc<Mutex<DateTime<Tz>>>,
}

impl<Tz: TimeZone> ManualClock<Tz> {
    pub fn new(start: DateTime<Tz>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Tz>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = instant;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *guard = guard.clone() + by;
    }
}

impl<Tz: TimeZone> Clock for ManualClock<Tz> {
    type Tz = Tz;

    fn now(&self) -> DateTime<Tz> {
        self.now.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    type Tz = C::Tz;

    fn now(&self) -> DateTime<C::Tz> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn manual_clock_shares_time_between_clones() {
        let start = Utc.with_ymd_and_hms(2025, 2, 13, 23, 59, 0).unwrap();
        let clock = ManualClock::new(start);
        let other = clock.clone();
        clock.advance(Duration::minutes(1));
        assert_eq!(other.now(), Utc.with_ymd_and_hms(2025, 2, 14, 0, 0, 0).unwrap());
        other.set(start);
        assert_eq!(clock.now(), start);
    }
}
