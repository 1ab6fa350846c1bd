//! Three-way policy configuration for row outcome handling.

/// How the runner disposes of a classified row outcome.
///
/// `Default` and `Ignore` are deliberately distinct settings: leaving a
/// policy unset keeps the built-in behavior (append to the matching
/// collection, or propagate for errors), while `Ignore` suppresses it.
/// For skipped and aborted rows `Ignore` drops the row entirely; for
/// errors it still collects the error record. That asymmetry is
/// intentional: errors are data to inspect, ignored skips are not.
pub enum Policy<H> {
    /// Built-in handling.
    Default,
    /// Suppress default handling.
    Ignore,
    /// Caller-supplied handler, fully responsible for disposition.
    Custom(H),
}

impl<H> Policy<H> {
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Default)
    }

    pub fn is_ignore(&self) -> bool {
        matches!(self, Self::Ignore)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl<H> Default for Policy<H> {
    fn default() -> Self {
        Self::Default
    }
}

impl<H> std::fmt::Debug for Policy<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "Default"),
            Self::Ignore => write!(f, "Ignore"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}
