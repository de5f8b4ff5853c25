// src/models/mod.rs

//! Domain models for the enrichment application.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod dataset;
mod metric;
mod row;

// Re-export all public types
pub use config::{
    API_BATCH_LIMIT, ApiConfig, CacheConfig, Config, DatasetConfig, EnrichmentConfig,
    LoggingConfig,
};
pub use dataset::{ExistingRecords, Schema, SchemaField, TabularDataset};
pub use metric::{CacheKey, CacheValue, MetricKind, QualityLabel};
pub use row::{EnrichedRow, RawRow, parse_count};
