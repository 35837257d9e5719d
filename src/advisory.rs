//! # Advisory Results
//!
//! A value paired with the non-fatal issues found while producing it.
//!
//! Pod annotations are untrusted user input. A malformed value must never block
//! injection or secret creation, so parsers record a warning, keep the default and
//! carry on. Callers surface the warnings (logs, pod events) and always use the value.

use std::fmt;

/// Separator used when warnings are joined into a single message
pub const WARNING_SEPARATOR: &str = "; ";

/// A fully usable value together with the warnings collected while building it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advisory<T> {
    value: T,
    warnings: Vec<String>,
}

impl<T> Advisory<T> {
    /// Wrap a value that produced no warnings
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warnings: Vec::new(),
        }
    }

    /// Wrap a value together with the warnings collected for it
    pub fn with_warnings(value: T, warnings: Vec<String>) -> Self {
        Self { value, warnings }
    }

    /// Borrow the value
    pub fn value(&self) -> &T {
        &self.value
    }

    /// Individual warnings, in the order they were recorded
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// True when no warnings were recorded
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    /// All warnings joined into one message, or `None` when there are none
    pub fn joined_warnings(&self) -> Option<String> {
        if self.warnings.is_empty() {
            None
        } else {
            Some(self.warnings.join(WARNING_SEPARATOR))
        }
    }

    /// Split into the value and the warnings
    pub fn into_parts(self) -> (T, Vec<String>) {
        (self.value, self.warnings)
    }

    /// Discard the warnings
    pub fn into_value(self) -> T {
        self.value
    }
}

impl<T> fmt::Display for Advisory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.joined_warnings() {
            Some(joined) => write!(f, "{} warning(s): [ {joined} ]", self.warnings.len()),
            None => write!(f, "no warnings"),
        }
    }
}
