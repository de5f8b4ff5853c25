//! In-memory content source for tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::services::ContentSource;

#[derive(Default)]
pub struct FakeSource {
    rendered: HashMap<String, String>,
    markup: HashMap<String, String>,
    panic_on: HashSet<String>,
    failing_batches: bool,
    delay: Option<Duration>,
    rendered_calls: AtomicUsize,
    markup_calls: AtomicUsize,
    batch_sizes: Mutex<Vec<usize>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a page; an empty string leaves that content missing.
    pub fn with_page(mut self, title: &str, rendered: &str, markup: &str) -> Self {
        if !rendered.is_empty() {
            self.rendered.insert(title.to_string(), rendered.to_string());
        }
        if !markup.is_empty() {
            self.markup.insert(title.to_string(), markup.to_string());
        }
        self
    }

    /// Make every fetch for `title` panic.
    pub fn panicking_on(mut self, title: &str) -> Self {
        self.panic_on.insert(title.to_string());
        self
    }

    pub fn with_failing_batches(mut self) -> Self {
        self.failing_batches = true;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn rendered_calls(&self) -> usize {
        self.rendered_calls.load(Ordering::SeqCst)
    }

    pub fn markup_calls(&self) -> usize {
        self.markup_calls.load(Ordering::SeqCst)
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batch_sizes.lock().unwrap().clone()
    }

    async fn pause(&self, title: &str) {
        if self.panic_on.contains(title) {
            panic!("injected failure for {title}");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn rendered_html(&self, title: &str) -> Result<String> {
        self.rendered_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(title).await;
        self.rendered
            .get(title)
            .cloned()
            .ok_or_else(|| AppError::api(format!("parse text '{title}'"), "missingtitle"))
    }

    async fn markup(&self, title: &str) -> Result<String> {
        self.markup_calls.fetch_add(1, Ordering::SeqCst);
        self.pause(title).await;
        self.markup
            .get(title)
            .cloned()
            .ok_or_else(|| AppError::api(format!("parse wikitext '{title}'"), "missingtitle"))
    }

    async fn markup_batch(&self, titles: &[String]) -> Result<HashMap<String, String>> {
        self.batch_sizes.lock().unwrap().push(titles.len());
        if self.failing_batches {
            return Err(AppError::api("batch", "service unavailable"));
        }
        // The API reports normalized titles.
        Ok(titles
            .iter()
            .filter_map(|title| {
                self.markup
                    .get(title)
                    .map(|markup| (title.replace('_', " "), markup.clone()))
            })
            .collect())
    }
}
