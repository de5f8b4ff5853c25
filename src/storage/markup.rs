//! Short-lived title → markup map warmed by the batch preloader.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Markup fetched ahead of the per-title fan-out.
///
/// Entries are consumed on read: each warmed page is handed out once.
#[derive(Debug, Default)]
pub struct MarkupCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MarkupCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Titles from the bulk source use underscores, the API answers with spaces.
    pub fn normalize_title(title: &str) -> String {
        title.replace('_', " ").trim().to_string()
    }

    pub fn insert(&self, title: &str, markup: String) {
        self.lock().insert(Self::normalize_title(title), markup);
    }

    pub fn extend(&self, pages: HashMap<String, String>) {
        let mut entries = self.lock();
        for (title, markup) in pages {
            entries.insert(Self::normalize_title(&title), markup);
        }
    }

    /// Remove and return the markup warmed for `title`.
    pub fn take(&self, title: &str) -> Option<String> {
        self.lock().remove(&Self::normalize_title(title))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
