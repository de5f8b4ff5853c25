//! Service layer for the enrichment application.
//!
//! This module contains the business logic for:
//! - Content fetching (`ContentSource`, `MediaWikiClient`)
//! - Prose size extraction (`ProseSizeExtractor`)
//! - Quality classification (`QualityExtractor`, `QualityRules`)
//! - Title list download (`BulkSource`, `QuarryClient`)
//! - Published dataset access (`DatasetStore`, `CommonsClient`)

pub mod commons;
pub mod content;
mod outcome;
pub mod prose;
pub mod quality;
pub mod quarry;

#[cfg(test)]
pub(crate) mod testing;

pub use commons::{CommonsClient, Credentials, DatasetStore};
pub use content::{ContentSource, MediaWikiClient};
pub use outcome::Extraction;
pub use prose::{ProseSizeExtractor, measure_prose};
pub use quality::{QualityExtractor, QualityRule, QualityRules};
pub use quarry::{BulkSource, QuarryClient};
