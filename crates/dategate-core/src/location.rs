/// The document location a gate runs against.
///
/// `replace` is replace-style navigation: no history entry is left behind,
/// so going back never returns to the page that was disallowed.
pub trait Navigator {
    fn current_path(&self) -> String;

    fn replace(&mut self, resource: &str);
}

impl<N: Navigator + ?Sized> Navigator for &mut N {
    fn current_path(&self) -> String {
        (**self).current_path()
    }

    fn replace(&mut self, resource: &str) {
        (**self).replace(resource)
    }
}

/// In-process stand-in for a browser location.
///
/// Relative resources resolve against the current directory of the path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    path: String,
    replacements: Vec<String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            replacements: Vec::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Every path this location was replaced with, oldest first.
    pub fn replacements(&self) -> &[String] {
        &self.replacements
    }
}

impl Navigator for Location {
    fn current_path(&self) -> String {
        self.path.clone()
    }

    fn replace(&mut self, resource: &str) {
        let resolved = match self.path.rfind('/') {
            Some(idx) => format!("{}{}", &self.path[..=idx], resource),
            None => resource.to_string(),
        };
        self.replacements.push(resolved.clone());
        self.path = resolved;
    }
}
