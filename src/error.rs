// src/error.rs

//! Unified error handling for the enrichment application.

use std::fmt;

use thiserror::Error;

/// Result type alias for enrichment operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Remote API answered with an error or an unexpected shape
    #[error("API error for {context}: {message}")]
    Api { context: String, message: String },

    /// Persistent cache could not be read or written
    #[error("Cache error: {0}")]
    Cache(String),

    /// Publishing the dataset failed
    #[error("Publish error: {0}")]
    Publish(String),

    /// Bulk source produced no rows
    #[error("No rows received for query {query_id}")]
    NoInputRows { query_id: u64 },

    /// Every row was dropped during enrichment
    #[error("No rows survived enrichment")]
    NoEnrichedRows,

    /// Run stopped by an interruption signal
    #[error("Interrupted by {0}")]
    Interrupted(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an API error with context.
    pub fn api(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Api {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a cache error.
    pub fn cache(message: impl fmt::Display) -> Self {
        Self::Cache(message.to_string())
    }

    /// Create a publish error.
    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish(message.into())
    }

    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Interrupted(_) => 130,
            _ => 1,
        }
    }
}
