// src/pipeline/enrich.rs

//! Concurrent enrichment engine.
//!
//! Each row runs on its own spawned task; at most `workers` tasks are in
//! flight. Results are collected in completion order. A row whose task
//! returns an error or panics is logged and dropped.

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{EnrichedRow, EnrichmentConfig, ExistingRecords, RawRow};
use crate::services::{ProseSizeExtractor, QualityExtractor};

/// Rows that completed and titles that were dropped.
#[derive(Debug, Default)]
pub struct EnrichmentOutcome {
    pub rows: Vec<EnrichedRow>,
    pub failed: Vec<String>,
}

/// Aggregate prose_size figures, for logging only.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProseStats {
    pub count: usize,
    pub mean: f64,
    /// Smallest non-zero value, 0 when there is none
    pub min_positive: u64,
    pub max: u64,
    pub zeros: usize,
}

impl ProseStats {
    pub fn from_rows(rows: &[EnrichedRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let total: u64 = rows.iter().map(|row| row.prose_size).sum();
        Self {
            count: rows.len(),
            mean: total as f64 / rows.len() as f64,
            min_positive: rows
                .iter()
                .map(|row| row.prose_size)
                .filter(|size| *size > 0)
                .min()
                .unwrap_or(0),
            max: rows.iter().map(|row| row.prose_size).max().unwrap_or(0),
            zeros: rows.iter().filter(|row| row.prose_size == 0).count(),
        }
    }
}

/// Maps raw rows to enriched rows with a bounded worker pool.
pub struct Enricher {
    prose: ProseSizeExtractor,
    quality: QualityExtractor,
    existing: Arc<ExistingRecords>,
    workers: usize,
    progress_interval: usize,
}

impl Enricher {
    pub fn new(
        prose: ProseSizeExtractor,
        quality: QualityExtractor,
        existing: Arc<ExistingRecords>,
        config: &EnrichmentConfig,
    ) -> Self {
        Self {
            prose,
            quality,
            existing,
            workers: config.workers.max(1),
            progress_interval: config.progress_interval.max(1),
        }
    }

    /// Compute both metrics for one row and attach its carried-over comment.
    pub async fn fetch_row_data(&self, row: &RawRow) -> Result<EnrichedRow> {
        let title = row.page_title.as_str();
        let comment = self.existing.comment(title);

        let started = Instant::now();
        let prose = self.prose.extract(title).await;
        let source = if prose.is_cached() { "cached" } else { "computed" };
        let prose_size = prose.value();
        log::debug!(
            "prose_size={} for '{}' ({}, {:.3}s)",
            prose_size,
            title,
            source,
            started.elapsed().as_secs_f64()
        );

        let quality = self.quality.extract(title).await.value();
        EnrichedRow::from_raw(row, prose_size, quality, comment)
    }

    /// Enrich all rows. Never fails as a whole; dropped titles are reported
    /// in the outcome.
    pub async fn run(self: &Arc<Self>, rows: Vec<RawRow>) -> EnrichmentOutcome {
        let total = rows.len();
        let started = Instant::now();
        log::info!("Processing {} articles with {} workers...", total, self.workers);

        let mut tasks = stream::iter(rows)
            .map(|row| {
                let enricher = Arc::clone(self);
                let title = row.page_title.clone();
                async move {
                    let handle =
                        tokio::spawn(async move { enricher.fetch_row_data(&row).await });
                    (title, handle.await)
                }
            })
            .buffer_unordered(self.workers);

        let mut outcome = EnrichmentOutcome::default();
        let mut prose_total: u64 = 0;

        while let Some((title, joined)) = tasks.next().await {
            match joined {
                Ok(Ok(row)) => {
                    prose_total += row.prose_size;
                    outcome.rows.push(row);

                    let done = outcome.rows.len();
                    if done % self.progress_interval == 0 {
                        let rate = done as f64 / started.elapsed().as_secs_f64().max(f64::EPSILON);
                        log::info!(
                            "Progress: {}/{} ({:.2} rows/s, avg prose_size {:.1})",
                            done,
                            total,
                            rate,
                            prose_total as f64 / done as f64
                        );
                    }
                }
                Ok(Err(e)) => {
                    log::warn!("Dropping '{}': {}", title, e);
                    outcome.failed.push(title);
                }
                Err(e) => {
                    log::warn!("Worker for '{}' failed: {}", title, e);
                    outcome.failed.push(title);
                }
            }
        }

        let elapsed = started.elapsed().as_secs_f64();
        let stats = ProseStats::from_rows(&outcome.rows);
        log::info!(
            "Processed {} articles in {:.2}s ({:.2} rows/s), {} dropped",
            outcome.rows.len(),
            elapsed,
            outcome.rows.len() as f64 / elapsed.max(f64::EPSILON),
            outcome.failed.len()
        );
        log::info!(
            "prose_size stats: mean={:.1}, min={}, max={}, zeros={}",
            stats.mean,
            stats.min_positive,
            stats.max,
            stats.zeros
        );

        outcome
    }
}
