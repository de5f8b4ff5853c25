// src/services/quarry.rs

//! Bulk source: latest result set of a saved database query.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::error::Result;
use crate::models::RawRow;

/// One-shot provider of the input title list.
#[async_trait]
pub trait BulkSource: Send + Sync {
    async fn fetch_rows(&self, query_id: u64) -> Result<Vec<RawRow>>;
}

/// Downloads the TSV export of a query's latest run.
#[derive(Clone)]
pub struct QuarryClient {
    client: Client,
    base_url: String,
}

impl QuarryClient {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// TSV export URL for the latest run of `query_id`.
    pub fn result_url(&self, query_id: u64) -> Result<Url> {
        let base = Url::parse(&self.base_url)?;
        Ok(base.join(&format!("query/{query_id}/result/latest/0/tsv"))?)
    }
}

#[async_trait]
impl BulkSource for QuarryClient {
    async fn fetch_rows(&self, query_id: u64) -> Result<Vec<RawRow>> {
        let url = self.result_url(query_id)?;
        log::info!("Fetching latest results of query {}...", query_id);

        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let rows = RawRow::parse_tsv(&text);
        log::info!("Received {} rows", rows.len());
        Ok(rows)
    }
}
