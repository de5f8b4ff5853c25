// src/services/commons.rs

//! Previously published dataset: loading it and publishing its replacement.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::models::{ExistingRecords, TabularDataset};
use crate::services::content::api_error;

/// Account used for publishing.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Read `COMMONS_USERNAME` / `COMMONS_PASSWORD`.
    pub fn from_env() -> Result<Self> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| AppError::config(format!("{name} is not set")))
        };
        Ok(Self {
            username: read("COMMONS_USERNAME")?,
            password: read("COMMONS_PASSWORD")?,
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the dataset lives.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// Rows of the current revision. Missing page or any failure reads as
    /// "no existing data".
    async fn load_existing(&self) -> ExistingRecords;

    /// Replace the published dataset.
    async fn publish(&self, dataset: &TabularDataset, credentials: &Credentials) -> Result<()>;
}

/// Tabular data page on a MediaWiki site.
///
/// The HTTP client must keep cookies so the login session carries over to
/// the edit request.
#[derive(Clone)]
pub struct CommonsClient {
    client: Client,
    api_url: String,
    page_title: String,
    summary: String,
}

impl CommonsClient {
    pub fn new(
        client: Client,
        api_url: impl Into<String>,
        page_title: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_url: api_url.into(),
            page_title: page_title.into(),
            summary: summary.into(),
        }
    }

    pub fn page_url(&self) -> String {
        format!(
            "{}{}",
            self.api_url.replace("/w/api.php", "/wiki/"),
            self.page_title.replace(' ', "_")
        )
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

    async fn post_json(&self, params: &[(&str, &str)]) -> Result<Value> {
        let text = self
            .client
            .post(&self.api_url)
            .form(params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(serde_json::from_str(&text)?)
    }

    async fn fetch_existing(&self) -> Result<ExistingRecords> {
        let data = self
            .get_json(&[
                ("action", "query"),
                ("titles", self.page_title.as_str()),
                ("prop", "revisions"),
                ("rvslots", "main"),
                ("rvprop", "content"),
                ("format", "json"),
                ("formatversion", "2"),
            ])
            .await?;
        existing_from_response(&data)
    }

    /// Log in and return a CSRF token for editing.
    async fn authenticate(&self, credentials: &Credentials) -> Result<String> {
        log::info!("Authenticating as {}...", credentials.username);

        let data = self
            .get_json(&[
                ("action", "query"),
                ("meta", "tokens"),
                ("type", "login"),
                ("format", "json"),
            ])
            .await?;
        let login_token = json_str(&data, "/query/tokens/logintoken", "login token")?;

        let data = self
            .post_json(&[
                ("action", "login"),
                ("lgname", credentials.username.as_str()),
                ("lgpassword", credentials.password.as_str()),
                ("lgtoken", login_token.as_str()),
                ("format", "json"),
            ])
            .await?;
        let result = data.pointer("/login/result").and_then(Value::as_str);
        if result != Some("Success") {
            let reason = data
                .pointer("/login/reason")
                .and_then(Value::as_str)
                .or(result)
                .unwrap_or("no result");
            return Err(AppError::publish(format!("login failed: {reason}")));
        }

        let data = self
            .get_json(&[("action", "query"), ("meta", "tokens"), ("format", "json")])
            .await?;
        let csrf_token = json_str(&data, "/query/tokens/csrftoken", "csrf token")?;

        log::info!("Authentication successful");
        Ok(csrf_token)
    }
}

#[async_trait]
impl DatasetStore for CommonsClient {
    async fn load_existing(&self) -> ExistingRecords {
        log::info!("Loading published data from {}...", self.page_title);
        match self.fetch_existing().await {
            Ok(records) => {
                log::info!("Loaded {} existing records", records.len());
                records
            }
            Err(e) => {
                log::warn!("Failed to load existing data: {}", e);
                ExistingRecords::default()
            }
        }
    }

    async fn publish(&self, dataset: &TabularDataset, credentials: &Credentials) -> Result<()> {
        let csrf_token = self.authenticate(credentials).await?;
        let text = dataset.to_json()?;

        log::info!("Uploading {} records...", dataset.data.len());
        let data = self
            .post_json(&[
                ("action", "edit"),
                ("title", self.page_title.as_str()),
                ("text", text.as_str()),
                ("token", csrf_token.as_str()),
                ("format", "json"),
                ("summary", self.summary.as_str()),
                ("contentmodel", "Tabular.JsonConfig"),
            ])
            .await?;

        if data.pointer("/edit/result").and_then(Value::as_str) == Some("Success") {
            log::info!("Uploaded {} records", dataset.data.len());
            log::info!("{}", self.page_url());
            Ok(())
        } else {
            Err(AppError::publish(format!("edit rejected: {data}")))
        }
    }
}

/// Records from a `prop=revisions` response for the dataset page.
pub(crate) fn existing_from_response(data: &Value) -> Result<ExistingRecords> {
    api_error("load existing dataset", data)?;

    let page = data
        .pointer("/query/pages/0")
        .ok_or_else(|| AppError::api("load existing dataset", "no pages in response"))?;

    if page.get("missing").is_some() || page.get("invalid").is_some() {
        log::info!("Dataset page does not exist yet; a new one will be created");
        return Ok(ExistingRecords::default());
    }

    let content = page
        .pointer("/revisions/0/slots/main/content")
        .and_then(Value::as_str)
        .unwrap_or_default();
    if content.trim().is_empty() {
        return Ok(ExistingRecords::default());
    }

    Ok(TabularDataset::parse(content)?.records())
}

fn json_str(data: &Value, pointer: &str, what: &str) -> Result<String> {
    data.pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::publish(format!("missing {what} in response")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_existing_from_missing_page() {
        let data = json!({"query": {"pages": [{"ns": 486, "title": "Data:X.tab", "missing": true}]}});
        assert!(existing_from_response(&data).unwrap().is_empty());
    }

    #[test]
    fn test_existing_from_blank_content() {
        let data = json!({"query": {"pages": [{"pageid": 5, "revisions": [
            {"slots": {"main": {"content": "   "}}}
        ]}]}});
        assert!(existing_from_response(&data).unwrap().is_empty());
    }

    #[test]
    fn test_existing_from_tabular_content() {
        let content = json!({
            "license": "CC0-1.0",
            "schema": {"fields": [
                {"name": "page_title", "type": "string"},
                {"name": "comment", "type": "string"}
            ]},
            "data": [["Example", "keep me"]]
        })
        .to_string();
        let data = json!({"query": {"pages": [{"pageid": 5, "revisions": [
            {"slots": {"main": {"content": content}}}
        ]}]}});
        let records = existing_from_response(&data).unwrap();
        assert_eq!(records.comment("Example"), "keep me");
    }

    #[test]
    fn test_existing_from_garbage_content_is_error() {
        let data = json!({"query": {"pages": [{"pageid": 5, "revisions": [
            {"slots": {"main": {"content": "not json"}}}
        ]}]}});
        assert!(existing_from_response(&data).is_err());
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials {
            username: "bot".into(),
            password: "secret".into(),
        };
        let shown = format!("{credentials:?}");
        assert!(shown.contains("bot"));
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn test_page_url() {
        let commons = CommonsClient::new(
            Client::new(),
            "https://commons.wikimedia.org/w/api.php",
            "Data:A b.tab",
            "s",
        );
        assert_eq!(
            commons.page_url(),
            "https://commons.wikimedia.org/wiki/Data:A_b.tab"
        );
    }
}
