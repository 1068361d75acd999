//! # dategate Core Library
//!
//! Date-gated page redirection for a single-page site. A "main" page is only
//! reachable during a yearly one-day window; outside it visitors who opted in
//! are sent to a "waiting" page and everyone else is kept off "main".
//!
//! ## Architecture
//!
//! - **Window**: yearly `[start, end)` range at local midnight
//! - **Enforcer**: maps (time, opt-in flag, current page) to a redirect
//! - **Scheduler**: one-shot chain armed for the next window boundary
//! - **Gate**: enforcer + scheduler + fallback re-check for one loaded page,
//!   driven on tokio by [`runtime::run`]
//! - **Storage**: TOML configuration and a SQLite key-value store holding the
//!   opt-in flag
//!
//! ## Key Components
//!
//! - [`Window`]: yearly window calculator
//! - [`Enforcer`]: decision table and redirect
//! - [`Scheduler`]: boundary one-shot state machine
//! - [`Gate`]: the composed component

pub mod clock;
pub mod enforcer;
pub mod error;
pub mod events;
pub mod gate;
pub mod location;
pub mod optin;
pub mod page;
pub mod runtime;
pub mod scheduler;
pub mod storage;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use enforcer::{decide, required_page, Enforcer};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::Event;
pub use gate::{Gate, GateSettings};
pub use location::{Location, Navigator};
pub use optin::{OptInFlag, StaticOptIn, StoredOptIn};
pub use page::{Page, PageNames};
pub use scheduler::{next_boundary, Arming, Scheduler, SchedulerState};
pub use storage::{Config, Database};
pub use window::{TargetDate, Window};
