// src/services/prose.rs

//! Readable prose size extractor.
//!
//! Counts the characters of paragraph text in the rendered article after
//! dropping tables, reference markers, navigation boxes, edit-section links
//! and script/style blocks.

use std::sync::Arc;

use ego_tree::NodeRef;
use scraper::{ElementRef, Html, node::Node};

use crate::error::AppError;
use crate::models::{CacheKey, CacheValue};
use crate::services::{ContentSource, Extraction};
use crate::storage::MetricCache;

/// Elements whose whole subtree is not prose.
const IGNORE_TAGS: &[&str] = &["table", "script", "style"];

/// Classes marking non-prose blocks in rendered wiki pages.
const IGNORE_CLASSES: &[&str] = &["navbox", "reference", "mw-editsection", "noprint"];

/// Computes `prose_size` per title, consulting the metric cache first.
#[derive(Clone)]
pub struct ProseSizeExtractor {
    source: Arc<dyn ContentSource>,
    cache: Arc<MetricCache>,
}

impl ProseSizeExtractor {
    pub fn new(source: Arc<dyn ContentSource>, cache: Arc<MetricCache>) -> Self {
        Self { source, cache }
    }

    pub async fn extract(&self, title: &str) -> Extraction<u64> {
        let key = CacheKey::prose_size(title);
        if let Some(size) = self.cache.get(&key).and_then(|v| v.as_prose_size()) {
            log::debug!("Cached prose_size for '{}': {}", title, size);
            return Extraction::Cached(size);
        }

        let html = match self.source.rendered_html(title).await {
            Ok(html) => html,
            Err(e) => {
                match &e {
                    AppError::Api { .. } => log::debug!("No rendered text for '{}': {}", title, e),
                    _ => log::warn!("prose_size failed for '{}': {}", title, e),
                }
                return Extraction::Failed(e.to_string());
            }
        };

        let size = measure_prose(&html) as u64;
        if size == 0 {
            log::debug!("No paragraphs found in '{}'", title);
        } else {
            log::debug!("prose_size for '{}': {} characters", title, size);
        }

        self.cache.set(key, CacheValue::ProseSize(size));
        Extraction::Computed(size)
    }
}

/// Character count of all prose paragraphs joined by single spaces.
pub fn measure_prose(html: &str) -> usize {
    let fragment = Html::parse_fragment(html);
    let paragraphs: Vec<String> = fragment
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "p" && !has_ignored_ancestor(el))
        .map(|p| {
            let mut text = String::new();
            for child in p.children() {
                collect_text(&child, &mut text);
            }
            text.trim().to_string()
        })
        .collect();

    if paragraphs.is_empty() {
        return 0;
    }
    paragraphs.join(" ").chars().count()
}

fn collect_text(node: &NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(element) => {
            if should_ignore_element(element) {
                return;
            }
            for child in node.children() {
                collect_text(&child, out);
            }
        }
        _ => {}
    }
}

fn should_ignore_element(element: &scraper::node::Element) -> bool {
    IGNORE_TAGS.contains(&element.name())
        || element
            .classes()
            .any(|class_name| IGNORE_CLASSES.contains(&class_name))
}

fn has_ignored_ancestor(node: &ElementRef<'_>) -> bool {
    if should_ignore_element(node.value()) {
        return true;
    }
    node.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| should_ignore_element(ancestor.value()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeSource;
    use crate::storage::CacheMode;

    #[test]
    fn test_measure_joins_paragraphs_with_spaces() {
        let html = "<div class=\"mw-parser-output\"><p>Hello world.</p><p> Second one. </p></div>";
        // "Hello world." (12) + " " + "Second one." (11)
        assert_eq!(measure_prose(html), 24);
    }

    #[test]
    fn test_measure_strips_non_prose() {
        let html = r##"
            <div class="mw-parser-output">
              <table class="infobox"><tr><td><p>Infobox text</p></td></tr></table>
              <p>Text<sup class="reference"><a href="#c1">[1]</a></sup> here.</p>
              <div class="navbox"><p>Navigation</p></div>
              <h2>Section<span class="mw-editsection">[edit]</span></h2>
              <script>var x = 1;</script>
              <p class="noprint">Hidden</p>
            </div>"##;
        assert_eq!(measure_prose(html), "Text here.".chars().count());
    }

    #[test]
    fn test_measure_counts_characters_not_bytes() {
        assert_eq!(measure_prose("<p>Москва</p>"), 6);
    }

    #[test]
    fn test_measure_no_paragraphs() {
        assert_eq!(measure_prose("<div>Only a div</div>"), 0);
        assert_eq!(measure_prose(""), 0);
    }

    #[tokio::test]
    async fn test_extract_caches_computed_value() {
        let source = Arc::new(FakeSource::new().with_page("A", "<p>abc</p>", ""));
        let cache = Arc::new(MetricCache::in_memory(CacheMode::Enabled));
        let extractor = ProseSizeExtractor::new(source.clone(), cache.clone());

        assert_eq!(extractor.extract("A").await, Extraction::Computed(3));
        assert_eq!(extractor.extract("A").await, Extraction::Cached(3));
        assert_eq!(source.rendered_calls(), 1);
    }

    #[tokio::test]
    async fn test_extract_failure_is_zero_and_not_cached() {
        let source = Arc::new(FakeSource::new());
        let cache = Arc::new(MetricCache::in_memory(CacheMode::Enabled));
        let extractor = ProseSizeExtractor::new(source.clone(), cache.clone());

        let outcome = extractor.extract("Missing").await;
        assert!(outcome.is_failed());
        assert_eq!(outcome.value(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_extract_forced_recalculation_always_fetches() {
        let source = Arc::new(FakeSource::new().with_page("A", "<p>abc</p>", ""));
        let cache = Arc::new(MetricCache::in_memory(CacheMode::ForceRecalculate));
        let extractor = ProseSizeExtractor::new(source.clone(), cache.clone());

        extractor.extract("A").await;
        extractor.extract("A").await;
        assert_eq!(source.rendered_calls(), 2);
        assert!(cache.is_empty());
    }
}
