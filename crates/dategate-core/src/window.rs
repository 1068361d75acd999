//! Yearly active window.
//!
//! The window opens at local midnight of the target date and closes at the
//! next local midnight. `start` is inclusive, `end` is exclusive.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Calendar date (month/day) the window opens on every year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDate {
    pub month: u32,
    pub day: u32,
}

impl TargetDate {
    /// Feb 14.
    pub const VALENTINE: TargetDate = TargetDate { month: 2, day: 14 };

    /// Build a target date that exists in every year.
    ///
    /// Feb 29 is rejected: a window must be derivable for any year.
    pub fn new(month: u32, day: u32) -> Result<Self, ValidationError> {
        // 2001 is not a leap year.
        if NaiveDate::from_ymd_opt(2001, month, day).is_none() {
            return Err(ValidationError::InvalidTargetDate { month, day });
        }
        Ok(Self { month, day })
    }

    fn date_in(&self, year: i32) -> NaiveDate {
        let year = clamp_year(year);
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(year, Self::VALENTINE.month, Self::VALENTINE.day))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl Default for TargetDate {
    fn default() -> Self {
        Self::VALENTINE
    }
}

/// Active window for one year.
#[derive(Debug, Clone, Serialize)]
#[serde(bound(serialize = "Tz::Offset: std::fmt::Display"))]
pub struct Window<Tz: TimeZone> {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

impl<Tz: TimeZone> Window<Tz> {
    /// Window of `target` in `year`, in the time zone `tz`.
    ///
    /// Years chrono cannot represent are clamped to the nearest one it can.
    pub fn for_year(year: i32, target: TargetDate, tz: &Tz) -> Self {
        let day = target.date_in(year);
        let next = day.succ_opt().unwrap_or(day);
        Self {
            start: local_midnight(tz, day),
            end: local_midnight(tz, next),
        }
    }

    /// Window for the local year of `instant`.
    pub fn for_instant(instant: &DateTime<Tz>, target: TargetDate) -> Self {
        Self::for_year(instant.year(), target, &instant.timezone())
    }

    /// `start <= instant < end`.
    pub fn contains(&self, instant: &DateTime<Tz>) -> bool {
        *instant >= self.start && *instant < self.end
    }

    pub fn length(&self) -> Duration {
        self.end.clone() - self.start.clone()
    }
}

impl<Tz: TimeZone> PartialEq for Window<Tz> {
    fn eq(&self, other: &Self) -> bool {
        self.start == other.start && self.end == other.end
    }
}

fn clamp_year(year: i32) -> i32 {
    // Keep one spare year on each side so `succ_opt` and next-year
    // roll-over stay representable.
    year.clamp(NaiveDate::MIN.year() + 1, NaiveDate::MAX.year() - 1)
}

/// Local midnight of `date`, normalised the way a browser `Date` does.
///
/// A midnight skipped by a DST gap resolves to the first valid minute after
/// the gap; an ambiguous midnight resolves to the earlier instant.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let midnight = date.and_time(NaiveTime::MIN);
    let mut candidate: NaiveDateTime = midnight;
    for _ in 0..(24 * 60) {
        if let Some(resolved) = tz.from_local_datetime(&candidate).earliest() {
            return resolved;
        }
        candidate += Duration::minutes(1);
    }
    tz.from_utc_datetime(&midnight)
}
