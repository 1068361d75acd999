use chrono::{DateTime, FixedOffset, Offset, TimeZone};
use serde::{Deserialize, Serialize};

use crate::page::Page;

/// Every gate step produces an Event.
/// The CLI prints them; the runtime logs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Enforcer ran and the current page is allowed.
    Checked {
        page: Page,
        required: Page,
        in_window: bool,
        accepted: bool,
        at: DateTime<FixedOffset>,
    },
    /// Enforcer replaced the current page.
    Redirected {
        from: Page,
        to: Page,
        resource: String,
        in_window: bool,
        accepted: bool,
        at: DateTime<FixedOffset>,
    },
    /// One-shot armed for the next window boundary.
    Armed {
        boundary: DateTime<FixedOffset>,
        fire_at: DateTime<FixedOffset>,
        delay_ms: u64,
        at: DateTime<FixedOffset>,
    },
    /// No future boundary; the one-shot chain ends.
    Unarmed { at: DateTime<FixedOffset> },
}

impl Event {
    pub fn is_redirect(&self) -> bool {
        matches!(self, Event::Redirected { .. })
    }

    /// Target page of a redirect.
    pub fn redirect_target(&self) -> Option<Page> {
        match self {
            Event::Redirected { to, .. } => Some(*to),
            _ => None,
        }
    }
}

/// Pin a zoned instant to its current UTC offset for serialization.
pub(crate) fn fixed<Tz: TimeZone>(instant: &DateTime<Tz>) -> DateTime<FixedOffset> {
    instant.with_timezone(&instant.offset().fix())
}
