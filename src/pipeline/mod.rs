//! Pipeline stages of one enrichment run.
//!
//! - `preload`: Warm markup in batches before enrichment
//! - `enrich`: Compute metrics for all rows with a bounded worker pool
//! - `lifecycle`: Flush the cache when the process is interrupted
//! - `run`: Fetch, enrich and publish end to end

pub mod enrich;
pub mod lifecycle;
pub mod preload;
pub mod run;

pub use enrich::{EnrichmentOutcome, Enricher, ProseStats};
pub use lifecycle::{ShutdownHook, run_until, run_until_interrupted, shutdown_signal};
pub use preload::{PreloadSummary, preload_markup};
pub use run::{RunContext, RunOptions, RunSummary, run_pipeline};
