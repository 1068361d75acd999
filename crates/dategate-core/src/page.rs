use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Which of the site's pages a document path refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    /// The landing page asking the visitor to opt in. Also the empty path.
    Question,
    Waiting,
    Main,
    Unknown,
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Page::Question => "question",
            Page::Waiting => "waiting",
            Page::Main => "main",
            Page::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Resource stems of the three pages (`<stem>.html`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageNames {
    #[serde(default = "default_question")]
    pub question: String,
    #[serde(default = "default_waiting")]
    pub waiting: String,
    #[serde(default = "default_main")]
    pub main: String,
}

fn default_question() -> String {
    "index".into()
}
fn default_waiting() -> String {
    "waiting".into()
}
fn default_main() -> String {
    "main".into()
}

impl Default for PageNames {
    fn default() -> Self {
        Self {
            question: default_question(),
            waiting: default_waiting(),
            main: default_main(),
        }
    }
}

impl PageNames {
    /// Classify a document path by its last segment.
    ///
    /// Matching is a case-sensitive suffix match on `<stem>.htm` or
    /// `<stem>.html`, so `/a/b/main.htm` is main and `/` is the question page.
    pub fn classify(&self, path: &str) -> Page {
        let segment = path.rsplit('/').next().unwrap_or_default();
        if segment.is_empty() || ends_with_page(segment, &self.question) {
            Page::Question
        } else if ends_with_page(segment, &self.waiting) {
            Page::Waiting
        } else if ends_with_page(segment, &self.main) {
            Page::Main
        } else {
            Page::Unknown
        }
    }

    /// Relative navigation target for `page`. `None` for [`Page::Unknown`].
    pub fn resource(&self, page: Page) -> Option<String> {
        let stem = match page {
            Page::Question => &self.question,
            Page::Waiting => &self.waiting,
            Page::Main => &self.main,
            Page::Unknown => return None,
        };
        Some(format!("{stem}.html"))
    }

    /// Check that every stem is a bare file stem and that each page's
    /// resource classifies back to that page.
    ///
    /// Stems that end with one another (`index` for question, `reindex` for
    /// main) would send the visitor between two pages forever.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (page, stem) in [
            (Page::Question, &self.question),
            (Page::Waiting, &self.waiting),
            (Page::Main, &self.main),
        ] {
            if stem.is_empty() || stem.contains('/') {
                return Err(ValidationError::InvalidValue {
                    field: format!("pages.{page}"),
                    message: "must be a non-empty file stem".into(),
                });
            }
            let round_trips = self
                .resource(page)
                .is_some_and(|resource| self.classify(&resource) == page);
            if !round_trips {
                return Err(ValidationError::InvalidValue {
                    field: format!("pages.{page}"),
                    message: "stems must not end with one another".into(),
                });
            }
        }
        Ok(())
    }
}

fn ends_with_page(segment: &str, stem: &str) -> bool {
    let Some(rest) = segment.strip_suffix(".html").or_else(|| segment.strip_suffix(".htm")) else {
        return false;
    };
    rest.ends_with(stem)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_path_is_question() {
        let names = PageNames::default();
        assert_eq!(names.classify(""), Page::Question);
        assert_eq!(names.classify("/"), Page::Question);
        assert_eq!(names.classify("/site/"), Page::Question);
    }

    #[test]
    fn classifies_all_pages_with_both_extensions() {
        let names = PageNames::default();
        assert_eq!(names.classify("/index.html"), Page::Question);
        assert_eq!(names.classify("/index.htm"), Page::Question);
        assert_eq!(names.classify("/site/waiting.html"), Page::Waiting);
        assert_eq!(names.classify("waiting.htm"), Page::Waiting);
        assert_eq!(names.classify("/main.html"), Page::Main);
        assert_eq!(names.classify("/deep/path/main.htm"), Page::Main);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let names = PageNames::default();
        assert_eq!(names.classify("/Main.html"), Page::Unknown);
        assert_eq!(names.classify("/main.HTML"), Page::Unknown);
    }

    #[test]
    fn matching_is_by_suffix() {
        let names = PageNames::default();
        assert_eq!(names.classify("/domain.html"), Page::Main);
        assert_eq!(names.classify("/main.html.bak"), Page::Unknown);
        assert_eq!(names.classify("/main.htmlx"), Page::Unknown);
        assert_eq!(names.classify("/about.html"), Page::Unknown);
        assert_eq!(names.classify("/main"), Page::Unknown);
    }

    #[test]
    fn only_last_segment_counts() {
        let names = PageNames::default();
        assert_eq!(names.classify("/main.html/other.html"), Page::Unknown);
    }

    #[test]
    fn resources_use_html_extension() {
        let names = PageNames::default();
        assert_eq!(names.resource(Page::Main).as_deref(), Some("main.html"));
        assert_eq!(names.resource(Page::Waiting).as_deref(), Some("waiting.html"));
        assert_eq!(names.resource(Page::Question).as_deref(), Some("index.html"));
        assert_eq!(names.resource(Page::Unknown), None);
    }

    #[test]
    fn custom_stems() {
        let names = PageNames {
            question: "ask".into(),
            waiting: "soon".into(),
            main: "day".into(),
        };
        assert_eq!(names.classify("/day.html"), Page::Main);
        assert_eq!(names.classify("/main.html"), Page::Unknown);
        assert_eq!(names.resource(Page::Waiting).as_deref(), Some("soon.html"));
    }

    #[test]
    fn default_and_custom_stems_validate() {
        PageNames::default().validate().unwrap();
        PageNames {
            question: "domain".into(),
            waiting: "soon".into(),
            main: "main".into(),
        }
        .validate()
        .unwrap();
    }

    #[test]
    fn overlapping_stems_fail_validation() {
        let same = PageNames {
            question: "main".into(),
            ..PageNames::default()
        };
        assert!(matches!(
            same.validate(),
            Err(ValidationError::InvalidValue { field, .. }) if field == "pages.main"
        ));

        let suffix = PageNames {
            main: "reindex".into(),
            ..PageNames::default()
        };
        assert!(suffix.validate().is_err());

        let nested = PageNames {
            waiting: "a/b".into(),
            ..PageNames::default()
        };
        assert!(nested.validate().is_err());
    }
}
