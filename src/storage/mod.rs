//! Cache storage for computed metrics and warmed markup.
//!
//! - `MetricCache`: persistent, one JSON blob per query, survives restarts
//! - `MarkupCache`: transient, filled by the batch preloader
//!
//! ## Blob Location
//!
//! ```text
//! {tmp}/wiki_cache/
//! ├── cache_93243.json      # entries for query 93243
//! └── cache_93243.tmp       # in-flight flush, renamed over the blob
//! ```

pub mod cache;
pub mod markup;

// Re-export for convenience
pub use cache::{CacheMode, MetricCache};
pub use markup::MarkupCache;
