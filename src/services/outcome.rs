//! Tagged extractor outcome.

/// Result of one metric extraction.
///
/// Failures carry their reason for logging and tests; callers that only
/// need the metric collapse them with [`Extraction::value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction<T> {
    /// Served from the persistent cache
    Cached(T),
    /// Freshly computed from fetched content
    Computed(T),
    /// Fetch or response handling failed
    Failed(String),
}

impl<T> Extraction<T> {
    pub fn is_cached(&self) -> bool {
        matches!(self, Extraction::Cached(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Extraction::Failed(_))
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match self {
            Extraction::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl<T: Default> Extraction<T> {
    /// The metric, or its documented default when extraction failed.
    pub fn value(self) -> T {
        match self {
            Extraction::Cached(value) | Extraction::Computed(value) => value,
            Extraction::Failed(_) => T::default(),
        }
    }
}
