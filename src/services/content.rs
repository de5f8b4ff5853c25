// src/services/content.rs

//! Content source abstraction and its MediaWiki implementation.
//!
//! Extractors only see [`ContentSource`]; tests substitute an in-memory
//! implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, Result};

/// Fetches article content by title.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Rendered HTML of the article body.
    async fn rendered_html(&self, title: &str) -> Result<String>;

    /// Raw markup of the article.
    async fn markup(&self, title: &str) -> Result<String>;

    /// Raw markup for several titles in one request, keyed by the title
    /// the API reports.
    async fn markup_batch(&self, titles: &[String]) -> Result<HashMap<String, String>>;
}

/// MediaWiki action API client sharing one pooled HTTP client.
#[derive(Clone)]
pub struct MediaWikiClient {
    client: Client,
    api_url: String,
}

impl MediaWikiClient {
    pub fn new(client: Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into(),
        }
    }

    async fn get_json(&self, params: &[(&str, &str)]) -> Result<Value> {
        let text = self
            .client
            .get(&self.api_url)
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl ContentSource for MediaWikiClient {
    async fn rendered_html(&self, title: &str) -> Result<String> {
        let data = self
            .get_json(&[
                ("action", "parse"),
                ("page", title),
                ("prop", "text"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        parse_rendered(title, &data)
    }

    async fn markup(&self, title: &str) -> Result<String> {
        let data = self
            .get_json(&[
                ("action", "parse"),
                ("page", title),
                ("prop", "wikitext"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        parse_markup(title, &data)
    }

    async fn markup_batch(&self, titles: &[String]) -> Result<HashMap<String, String>> {
        if titles.is_empty() {
            return Ok(HashMap::new());
        }
        let joined = titles.join("|");
        let data = self
            .get_json(&[
                ("action", "query"),
                ("titles", joined.as_str()),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        api_error(&format!("batch of {}", titles.len()), &data)?;
        Ok(revision_contents(&data))
    }
}

/// Turn an `{"error": {...}}` response into an error.
pub(crate) fn api_error(context: &str, data: &Value) -> Result<()> {
    match data.get("error") {
        Some(error) => {
            let info = error
                .get("info")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            Err(AppError::api(context, info))
        }
        None => Ok(()),
    }
}

/// Extract `parse.text` from a rendered-page response.
pub(crate) fn parse_rendered(title: &str, data: &Value) -> Result<String> {
    let context = format!("parse text '{title}'");
    api_error(&context, data)?;
    let html = data
        .pointer("/parse/text")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::api(&context, "missing parse.text"))?;
    if html.is_empty() {
        return Err(AppError::api(&context, "empty HTML"));
    }
    Ok(html.to_string())
}

/// Extract `parse.wikitext`; an absent field reads as empty markup.
pub(crate) fn parse_markup(title: &str, data: &Value) -> Result<String> {
    api_error(&format!("parse wikitext '{title}'"), data)?;
    Ok(data
        .pointer("/parse/wikitext")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string())
}

/// Collect `title → main slot content` from a `prop=revisions` response.
///
/// Pages without revisions (missing or invalid titles) are skipped.
pub(crate) fn revision_contents(data: &Value) -> HashMap<String, String> {
    let Some(pages) = data.pointer("/query/pages").and_then(Value::as_array) else {
        return HashMap::new();
    };

    pages
        .iter()
        .filter_map(|page| {
            let title = page.get("title").and_then(Value::as_str)?;
            let content = page
                .pointer("/revisions/0/slots/main/content")
                .and_then(Value::as_str)?;
            Some((title.to_string(), content.to_string()))
        })
        .collect()
}
