//! The gate for one loaded page: enforcer, one-shot chain and fallback.
//!
//! A redirect ends the page's execution context. The gate then reports a
//! pending reload; the host must call [`Gate::load`] again, which re-checks
//! the new page and re-arms from scratch.

use std::time::Duration;

use tracing::debug;

use crate::clock::Clock;
use crate::enforcer::Enforcer;
use crate::error::ValidationError;
use crate::events::Event;
use crate::location::Navigator;
use crate::optin::OptInFlag;
use crate::page::PageNames;
use crate::scheduler::Scheduler;
use crate::storage::Config;
use crate::window::TargetDate;

/// Tunables of a gate.
#[derive(Debug, Clone)]
pub struct GateSettings {
    pub target: TargetDate,
    pub pages: PageNames,
    pub safety_margin: Duration,
    pub fallback_interval: Duration,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GateSettings {
    fn from(config: &Config) -> Self {
        Self {
            target: config.target_date(),
            pages: config.pages.clone(),
            safety_margin: config.safety_margin(),
            fallback_interval: config.fallback_interval(),
        }
    }
}

pub struct Gate<C: Clock, F, N> {
    enforcer: Enforcer<C, F>,
    scheduler: Scheduler<C::Tz>,
    nav: N,
    fallback_interval: Duration,
    reload_pending: bool,
    loads: u64,
}

impl<C: Clock, F: OptInFlag, N: Navigator> Gate<C, F, N> {
    /// Build a gate for one page.
    ///
    /// Fails when the page stems overlap, since every load would then
    /// redirect again without ever reaching a timer.
    pub fn new(clock: C, flag: F, nav: N, settings: GateSettings) -> Result<Self, ValidationError> {
        settings.pages.validate()?;
        if settings.fallback_interval.is_zero() {
            return Err(ValidationError::InvalidValue {
                field: "scheduler.fallback_interval_secs".into(),
                message: "must be greater than zero".into(),
            });
        }
        Ok(Self {
            scheduler: Scheduler::new(settings.target, settings.safety_margin),
            enforcer: Enforcer::new(clock, flag, settings.pages, settings.target),
            nav,
            fallback_interval: settings.fallback_interval,
            reload_pending: false,
            loads: 0,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn navigator(&self) -> &N {
        &self.nav
    }

    pub fn into_navigator(self) -> N {
        self.nav
    }

    pub fn scheduler(&self) -> &Scheduler<C::Tz> {
        &self.scheduler
    }

    pub fn enforcer(&self) -> &Enforcer<C, F> {
        &self.enforcer
    }

    pub fn fallback_interval(&self) -> Duration {
        self.fallback_interval
    }

    /// How many times a page has been loaded (initial load included).
    pub fn loads(&self) -> u64 {
        self.loads
    }

    pub fn reload_pending(&self) -> bool {
        self.reload_pending
    }

    /// Time until the armed one-shot is due, `None` when nothing is armed.
    pub fn boundary_in(&self) -> Option<Duration> {
        self.scheduler.fire_in(&self.enforcer.clock().now())
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Page load: enforce once, then arm the next boundary.
    pub fn load(&mut self) -> Vec<Event> {
        self.loads += 1;
        self.reload_pending = false;
        self.scheduler.disarm();
        self.enforce_then_arm()
    }

    /// The one-shot elapsed. Early wake-ups are ignored and stay armed.
    pub fn on_boundary(&mut self) -> Vec<Event> {
        let now = self.enforcer.clock().now();
        if !self.scheduler.fire(&now) {
            debug!("one-shot woke before its fire time");
            return Vec::new();
        }
        self.enforce_then_arm()
    }

    /// Fallback tick: enforce only, the one-shot chain is left alone.
    pub fn on_fallback(&mut self) -> Vec<Event> {
        let event = self.enforcer.enforce(&mut self.nav);
        self.note_redirect(&event);
        vec![event]
    }

    /// Take the pending-reload flag set by a redirect.
    pub fn take_reload(&mut self) -> bool {
        std::mem::take(&mut self.reload_pending)
    }

    fn enforce_then_arm(&mut self) -> Vec<Event> {
        let event = self.enforcer.enforce(&mut self.nav);
        if self.note_redirect(&event) {
            return vec![event];
        }
        let now = self.enforcer.clock().now();
        let armed = self.scheduler.arm(&now);
        vec![event, armed]
    }

    fn note_redirect(&mut self, event: &Event) -> bool {
        if event.is_redirect() {
            // The old page's timers die with it.
            self.scheduler.disarm();
            self.reload_pending = true;
            return true;
        }
        false
    }
}
