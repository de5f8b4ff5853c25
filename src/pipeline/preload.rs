// src/pipeline/preload.rs

//! Batch preloading of article markup.

use crate::services::ContentSource;
use crate::storage::MarkupCache;

/// Counters of one preload pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PreloadSummary {
    pub batches: usize,
    pub failed_batches: usize,
    pub pages: usize,
}

/// Fetch markup for `titles` in groups of `batch_size` and store it in
/// `markup`. A failed group is logged and skipped.
pub async fn preload_markup(
    source: &dyn ContentSource,
    markup: &MarkupCache,
    titles: &[String],
    batch_size: usize,
) -> PreloadSummary {
    let batch_size = batch_size.max(1);
    let total_batches = titles.len().div_ceil(batch_size);
    let mut summary = PreloadSummary::default();

    log::info!(
        "Preloading markup for {} titles in {} batches...",
        titles.len(),
        total_batches
    );

    for (index, batch) in titles.chunks(batch_size).enumerate() {
        summary.batches += 1;
        match source.markup_batch(batch).await {
            Ok(pages) => {
                summary.pages += pages.len();
                markup.extend(pages);
            }
            Err(e) => {
                summary.failed_batches += 1;
                log::warn!(
                    "Preload batch {}/{} failed: {}",
                    index + 1,
                    total_batches,
                    e
                );
            }
        }
    }

    log::debug!(
        "Preload done: {} pages warmed, {} of {} batches failed",
        summary.pages,
        summary.failed_batches,
        summary.batches
    );
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::FakeSource;

    fn titles(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("Title_{i}")).collect()
    }

    #[tokio::test]
    async fn test_groups_respect_batch_size() {
        let mut source = FakeSource::new();
        for title in titles(120) {
            source = source.with_page(&title, "", "{{x}}");
        }
        let markup = MarkupCache::new();

        let summary = preload_markup(&source, &markup, &titles(120), 50).await;
        assert_eq!(source.batch_sizes(), vec![50, 50, 20]);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.pages, 120);
        assert_eq!(markup.take("Title_7").as_deref(), Some("{{x}}"));
    }

    #[tokio::test]
    async fn test_failed_batches_are_skipped() {
        let source = FakeSource::new().with_failing_batches();
        let markup = MarkupCache::new();

        let summary = preload_markup(&source, &markup, &titles(7), 3).await;
        assert_eq!(source.batch_sizes(), vec![3, 3, 1]);
        assert_eq!(summary.failed_batches, 3);
        assert!(markup.is_empty());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let source = FakeSource::new();
        let summary = preload_markup(&source, &MarkupCache::new(), &[], 50).await;
        assert_eq!(summary, PreloadSummary::default());
        assert!(source.batch_sizes().is_empty());
    }
}
