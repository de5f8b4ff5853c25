// src/pipeline/run.rs

//! End-to-end run: fetch titles, enrich, publish.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{AppError, Result};
use crate::models::{CacheKey, Config, TabularDataset};
use crate::pipeline::enrich::Enricher;
use crate::pipeline::preload::preload_markup;
use crate::services::{
    BulkSource, ContentSource, Credentials, DatasetStore, ProseSizeExtractor, QualityExtractor,
    QualityRules,
};
use crate::storage::{MarkupCache, MetricCache};
use crate::utils::log::{header, step, sub_item, summary};

const TOTAL_STEPS: usize = 4;

/// Per-run switches resolved from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub query_id: u64,
    /// Skip publishing and log a few sample rows instead
    pub test_mode: bool,
    /// Required unless `test_mode` is set
    pub credentials: Option<Credentials>,
}

/// External collaborators of a run.
pub struct RunContext {
    pub bulk: Arc<dyn BulkSource>,
    pub content: Arc<dyn ContentSource>,
    pub store: Arc<dyn DatasetStore>,
    pub cache: Arc<MetricCache>,
}

/// What a finished run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub input_rows: usize,
    pub enriched_rows: usize,
    pub dropped_rows: usize,
    pub published: bool,
}

/// Run the whole pipeline once.
pub async fn run_pipeline(
    config: &Config,
    options: &RunOptions,
    context: &RunContext,
) -> Result<RunSummary> {
    let started = Instant::now();
    header("Article metrics update");
    sub_item(&format!("Query: {}", options.query_id));
    sub_item(&format!("Workers: {}", config.enrichment.workers));
    sub_item(&format!("Cache: {:?}", context.cache.mode()));
    if options.test_mode {
        sub_item("Test mode: nothing will be published");
    }

    step(1, TOTAL_STEPS, "Fetching article list");
    let rows = match context.bulk.fetch_rows(options.query_id).await {
        Ok(rows) => rows,
        Err(e) => {
            log::error!("Failed to fetch rows: {}", e);
            Vec::new()
        }
    };
    if rows.is_empty() {
        return Err(AppError::NoInputRows {
            query_id: options.query_id,
        });
    }
    let input_rows = rows.len();

    step(2, TOTAL_STEPS, "Loading published data");
    let existing = Arc::new(context.store.load_existing().await);

    step(3, TOTAL_STEPS, "Computing metrics");
    let markup = Arc::new(MarkupCache::new());
    let titles: Vec<String> = rows
        .iter()
        .filter(|row| context.cache.get(&CacheKey::quality(&row.page_title)).is_none())
        .map(|row| row.page_title.clone())
        .collect();
    if titles.is_empty() {
        log::debug!("Quality cached for every title, preload skipped");
    } else {
        preload_markup(
            context.content.as_ref(),
            &markup,
            &titles,
            config.enrichment.preload_batch_size(),
        )
        .await;
    }

    let rules = Arc::new(QualityRules::standard()?);
    let prose = ProseSizeExtractor::new(Arc::clone(&context.content), Arc::clone(&context.cache));
    let quality = QualityExtractor::new(
        Arc::clone(&context.content),
        Arc::clone(&context.cache),
        markup,
        rules,
    );
    let enricher = Arc::new(Enricher::new(prose, quality, existing, &config.enrichment));
    let outcome = enricher.run(rows).await;

    context.cache.flush();

    if outcome.rows.is_empty() {
        return Err(AppError::NoEnrichedRows);
    }

    step(4, TOTAL_STEPS, "Publishing dataset");
    let dataset = TabularDataset::from_rows(&outcome.rows, &config.dataset);

    let published = if options.test_mode {
        log::info!("Test mode: upload skipped");
        for row in dataset.data.iter().take(3) {
            log::debug!("Sample row: {}", row);
        }
        false
    } else {
        let credentials = options
            .credentials
            .as_ref()
            .ok_or_else(|| AppError::config("publishing requires credentials"))?;
        context.store.publish(&dataset, credentials).await?;
        true
    };

    let result = RunSummary {
        input_rows,
        enriched_rows: outcome.rows.len(),
        dropped_rows: outcome.failed.len(),
        published,
    };

    summary(
        "Run complete",
        &[
            ("Input rows", result.input_rows.to_string()),
            ("Enriched rows", result.enriched_rows.to_string()),
            ("Dropped rows", result.dropped_rows.to_string()),
            ("Published", result.published.to_string()),
            (
                "Elapsed",
                format!("{:.2}s", started.elapsed().as_secs_f64()),
            ),
        ],
    );

    Ok(result)
}
