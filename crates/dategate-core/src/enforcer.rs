//! Decide which page must be showing and redirect when it isn't.
//!
//! | time            | opted in | current page | required |
//! |-----------------|----------|--------------|----------|
//! | inside window   | any      | any          | main     |
//! | outside window  | yes      | any          | waiting  |
//! | outside window  | no       | main         | waiting  |
//! | outside window  | no       | other        | current  |

use chrono::{DateTime, TimeZone};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::events::{fixed, Event};
use crate::location::Navigator;
use crate::optin::OptInFlag;
use crate::page::{Page, PageNames};
use crate::window::{TargetDate, Window};

/// The page that must be showing.
pub fn required_page(in_window: bool, accepted: bool, current: Page) -> Page {
    if in_window {
        Page::Main
    } else if accepted || current == Page::Main {
        Page::Waiting
    } else {
        current
    }
}

/// Redirect target for `current` at `now`, `None` if it may stay.
pub fn decide<Tz: TimeZone>(
    now: &DateTime<Tz>,
    window: &Window<Tz>,
    accepted: bool,
    current: Page,
) -> Option<Page> {
    let required = required_page(window.contains(now), accepted, current);
    (required != current).then_some(required)
}

pub struct Enforcer<C, F> {
    clock: C,
    flag: F,
    pages: PageNames,
    target: TargetDate,
}

impl<C: Clock, F: OptInFlag> Enforcer<C, F> {
    pub fn new(clock: C, flag: F, pages: PageNames, target: TargetDate) -> Self {
        Self {
            clock,
            flag,
            pages,
            target,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn flag(&self) -> &F {
        &self.flag
    }

    pub fn pages(&self) -> &PageNames {
        &self.pages
    }

    pub fn target(&self) -> TargetDate {
        self.target
    }

    /// Run one check against `nav`, navigating at most once.
    pub fn enforce<N: Navigator + ?Sized>(&self, nav: &mut N) -> Event {
        let now = self.clock.now();
        let window = Window::for_instant(&now, self.target);
        let in_window = window.contains(&now);
        let path = nav.current_path();
        let current = self.pages.classify(&path);
        let accepted = self.flag.read();
        let required = required_page(in_window, accepted, current);

        // Required is never Unknown, so a resource always exists.
        if required != current {
            if let Some(resource) = self.pages.resource(required) {
                info!(%path, from = %current, to = %required, in_window, accepted, "redirecting");
                nav.replace(&resource);
                return Event::Redirected {
                    from: current,
                    to: required,
                    resource,
                    in_window,
                    accepted,
                    at: fixed(&now),
                };
            }
        }

        debug!(%path, page = %current, in_window, accepted, "page allowed");
        Event::Checked {
            page: current,
            required,
            in_window,
            accepted,
            at: fixed(&now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::location::Location;
    use crate::optin::StaticOptIn;
    use chrono::{Duration, Utc};
    use proptest::prelude::*;

    const ALL_PAGES: [Page; 4] = [Page::Question, Page::Waiting, Page::Main, Page::Unknown];

    fn feb14() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 2, 14, 0, 0, 0).unwrap()
    }

    fn enforcer(
        now: DateTime<Utc>,
        accepted: bool,
    ) -> Enforcer<ManualClock<Utc>, StaticOptIn> {
        Enforcer::new(
            ManualClock::new(now),
            StaticOptIn(accepted),
            PageNames::default(),
            TargetDate::VALENTINE,
        )
    }

    #[test]
    fn decision_table() {
        for page in ALL_PAGES {
            for accepted in [false, true] {
                assert_eq!(required_page(true, accepted, page), Page::Main);
            }
            assert_eq!(required_page(false, true, page), Page::Waiting);
        }
        assert_eq!(required_page(false, false, Page::Main), Page::Waiting);
        assert_eq!(required_page(false, false, Page::Question), Page::Question);
        assert_eq!(required_page(false, false, Page::Waiting), Page::Waiting);
        assert_eq!(required_page(false, false, Page::Unknown), Page::Unknown);
    }

    #[test]
    fn decide_uses_window_bounds() {
        let w = Window::for_year(2025, TargetDate::VALENTINE, &Utc);
        assert_eq!(decide(&w.start, &w, false, Page::Question), Some(Page::Main));
        assert_eq!(decide(&w.start, &w, false, Page::Main), None);
        assert_eq!(decide(&w.end, &w, false, Page::Main), Some(Page::Waiting));
        assert_eq!(decide(&w.end, &w, false, Page::Unknown), None);
        assert_eq!(decide(&w.end, &w, true, Page::Unknown), Some(Page::Waiting));
    }

    #[test]
    fn window_start_is_inside() {
        let mut loc = Location::new("/index.html");
        let event = enforcer(feb14(), false).enforce(&mut loc);
        assert_eq!(event.redirect_target(), Some(Page::Main));
        assert_eq!(loc.path(), "/main.html");
    }

    #[test]
    fn last_millisecond_of_window_keeps_main() {
        let now = feb14() + Duration::days(1) - Duration::milliseconds(1);
        let mut loc = Location::new("/main.html");
        let event = enforcer(now, false).enforce(&mut loc);
        assert!(!event.is_redirect());
        assert!(loc.replacements().is_empty());
    }

    #[test]
    fn window_end_is_outside() {
        let now = feb14() + Duration::days(1);
        let mut loc = Location::new("/main.html");
        let event = enforcer(now, true).enforce(&mut loc);
        assert_eq!(event.redirect_target(), Some(Page::Waiting));
        assert_eq!(loc.path(), "/waiting.html");
    }

    #[test]
    fn main_before_window_is_disallowed() {
        let now = feb14() - Duration::days(1);
        let mut loc = Location::new("/main.html");
        let event = enforcer(now, false).enforce(&mut loc);
        assert_eq!(event.redirect_target(), Some(Page::Waiting));
    }

    #[test]
    fn new_visitor_may_stay_on_question_or_unknown() {
        let now = feb14() - Duration::days(30);
        for path in ["/", "/index.html", "/about.html", "/waiting.html"] {
            let mut loc = Location::new(path);
            let event = enforcer(now, false).enforce(&mut loc);
            assert!(!event.is_redirect(), "{path} should stay");
        }
    }

    #[test]
    fn enforce_is_idempotent() {
        let now = feb14() + Duration::hours(5);
        let e = enforcer(now, false);
        let mut loc = Location::new("/");
        assert!(e.enforce(&mut loc).is_redirect());
        assert!(!e.enforce(&mut loc).is_redirect());
        assert_eq!(loc.replacements().len(), 1);
    }

    #[test]
    fn checked_event_reports_inputs() {
        let now = feb14() - Duration::days(2);
        let mut loc = Location::new("/waiting.html");
        match enforcer(now, true).enforce(&mut loc) {
            Event::Checked {
                page,
                required,
                in_window,
                accepted,
                ..
            } => {
                assert_eq!(page, Page::Waiting);
                assert_eq!(required, Page::Waiting);
                assert!(!in_window);
                assert!(accepted);
            }
            other => panic!("Expected Checked, got {other:?}"),
        }
    }

    fn page_strategy() -> impl Strategy<Value = Page> {
        prop::sample::select(ALL_PAGES.to_vec())
    }

    fn path_for(page: Page) -> &'static str {
        match page {
            Page::Question => "/index.html",
            Page::Waiting => "/waiting.html",
            Page::Main => "/main.html",
            Page::Unknown => "/about.html",
        }
    }

    proptest! {
        #[test]
        fn inside_window_always_ends_on_main(
            year in 1971i32..2400,
            offset_ms in 0i64..86_400_000,
            accepted in any::<bool>(),
            page in page_strategy(),
        ) {
            let now = Utc.with_ymd_and_hms(year, 2, 14, 0, 0, 0).unwrap()
                + Duration::milliseconds(offset_ms);
            let mut loc = Location::new(path_for(page));
            enforcer(now, accepted).enforce(&mut loc);
            prop_assert_eq!(PageNames::default().classify(loc.path()), Page::Main);
        }

        #[test]
        fn outside_window_follows_flag(
            year in 1971i32..2400,
            day_offset in 1i64..364,
            accepted in any::<bool>(),
            page in page_strategy(),
        ) {
            // Any whole day after Feb 14 that is still before next Feb 14.
            let now = Utc.with_ymd_and_hms(year, 2, 14, 12, 0, 0).unwrap()
                + Duration::days(day_offset);
            let mut loc = Location::new(path_for(page));
            let e = enforcer(now, accepted);
            e.enforce(&mut loc);
            let after = PageNames::default().classify(loc.path());
            let expected = if accepted || page == Page::Main { Page::Waiting } else { page };
            prop_assert_eq!(after, expected);
            // A second pass never navigates again.
            prop_assert!(!e.enforce(&mut loc).is_redirect());
        }
    }
}
