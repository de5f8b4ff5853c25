//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Maximum number of titles the wiki API accepts in one multi-title query.
pub const API_BATCH_LIMIT: usize = 50;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote endpoints and HTTP behavior
    #[serde(default)]
    pub api: ApiConfig,

    /// Worker pool and batching settings
    #[serde(default)]
    pub enrichment: EnrichmentConfig,

    /// Persistent cache location
    #[serde(default)]
    pub cache: CacheConfig,

    /// Published dataset metadata
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        for (name, value) in [
            ("api.wiki_api", &self.api.wiki_api),
            ("api.commons_api", &self.api.commons_api),
            ("api.quarry_base", &self.api.quarry_base),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }
        if self.enrichment.workers == 0 {
            return Err(AppError::validation("enrichment.workers must be > 0"));
        }
        if self.enrichment.batch_limit == 0 || self.enrichment.batch_limit > API_BATCH_LIMIT {
            return Err(AppError::validation(format!(
                "enrichment.batch_limit must be within 1..={API_BATCH_LIMIT}"
            )));
        }
        if self.enrichment.progress_interval == 0 {
            return Err(AppError::validation(
                "enrichment.progress_interval must be > 0",
            ));
        }
        if self.dataset.page_title.trim().is_empty() {
            return Err(AppError::validation("dataset.page_title is empty"));
        }
        Ok(())
    }
}

/// Remote endpoints and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Wiki API used for rendered text and markup
    #[serde(default = "defaults::wiki_api")]
    pub wiki_api: String,

    /// API hosting the published dataset
    #[serde(default = "defaults::commons_api")]
    pub commons_api: String,

    /// Base URL of the query service providing the title list
    #[serde(default = "defaults::quarry_base")]
    pub quarry_base: String,

    /// User-Agent template; `{query_id}` is substituted
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    /// User-Agent header for a given query.
    pub fn user_agent_for(&self, query_id: u64) -> String {
        self.user_agent.replace("{query_id}", &query_id.to_string())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            wiki_api: defaults::wiki_api(),
            commons_api: defaults::commons_api(),
            quarry_base: defaults::quarry_base(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Worker pool and batching settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    /// Number of rows enriched concurrently
    #[serde(default = "defaults::workers")]
    pub workers: usize,

    /// Upper bound on titles per multi-title markup query
    #[serde(default = "defaults::batch_limit")]
    pub batch_limit: usize,

    /// Log throughput every N completed rows
    #[serde(default = "defaults::progress_interval")]
    pub progress_interval: usize,
}

impl EnrichmentConfig {
    /// Preload group size, scaled with the pool width.
    pub fn preload_batch_size(&self) -> usize {
        self.batch_limit
            .min(API_BATCH_LIMIT)
            .min(self.workers.saturating_mul(5))
            .max(1)
    }
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            workers: defaults::workers(),
            batch_limit: defaults::batch_limit(),
            progress_interval: defaults::progress_interval(),
        }
    }
}

/// Persistent cache settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding cache blobs (defaults to `<tmp>/wiki_cache`)
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl CacheConfig {
    pub fn dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("wiki_cache"))
    }

    /// Blob path for one query.
    pub fn blob_path(&self, query_id: u64) -> PathBuf {
        self.dir().join(format!("cache_{query_id}.json"))
    }
}

/// Metadata of the published dataset page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Page holding the tabular data
    #[serde(default = "defaults::page_title")]
    pub page_title: String,

    /// Edit summary used on upload
    #[serde(default = "defaults::summary")]
    pub summary: String,

    #[serde(default = "defaults::license")]
    pub license: String,

    /// Localized descriptions keyed by language code
    #[serde(default = "defaults::description")]
    pub description: BTreeMap<String, String>,

    #[serde(default = "defaults::sources")]
    pub sources: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            page_title: defaults::page_title(),
            summary: defaults::summary(),
            license: defaults::license(),
            description: defaults::description(),
            sources: defaults::sources(),
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// File every log line is appended to; empty disables
    #[serde(default = "defaults::log_file")]
    pub file: String,

    /// Default level when neither `RUST_LOG` nor `--verbose` is given
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: defaults::log_file(),
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::collections::BTreeMap;

    // API defaults
    pub fn wiki_api() -> String {
        "https://ru.wikipedia.org/w/api.php".into()
    }
    pub fn commons_api() -> String {
        "https://commons.wikimedia.org/w/api.php".into()
    }
    pub fn quarry_base() -> String {
        "https://quarry.wmcloud.org".into()
    }
    pub fn user_agent() -> String {
        "ArticleMetricsBot/1.0 (quarry-id:{query_id})".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Enrichment defaults
    pub fn workers() -> usize {
        10
    }
    pub fn batch_limit() -> usize {
        super::API_BATCH_LIMIT
    }
    pub fn progress_interval() -> usize {
        10
    }

    // Dataset defaults
    pub fn page_title() -> String {
        "Data:Voyagerim/myarticles.tab".into()
    }
    pub fn summary() -> String {
        "Автоматическое обновление данных через Quarry".into()
    }
    pub fn license() -> String {
        "CC0-1.0".into()
    }
    pub fn description() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("en".to_string(), "Articles created by Voyagerim".to_string()),
            (
                "ru".to_string(),
                "Статьи, созданные участником Voyagerim".to_string(),
            ),
        ])
    }
    pub fn sources() -> String {
        "Imported from Quarry query results".into()
    }

    // Logging defaults
    pub fn log_file() -> String {
        "upload_log.txt".into()
    }
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.api.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = Config::default();
        config.enrichment.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_batch_above_api_limit() {
        let mut config = Config::default();
        config.enrichment.batch_limit = API_BATCH_LIMIT + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn preload_batch_size_scales_with_workers() {
        let mut enrichment = EnrichmentConfig::default();
        assert_eq!(enrichment.preload_batch_size(), 50);
        enrichment.workers = 2;
        assert_eq!(enrichment.preload_batch_size(), 10);
        enrichment.workers = 1;
        enrichment.batch_limit = 3;
        assert_eq!(enrichment.preload_batch_size(), 3);
    }

    #[test]
    fn user_agent_substitutes_query_id() {
        let api = ApiConfig::default();
        assert!(api.user_agent_for(93243).contains("quarry-id:93243"));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[logging]\nlevel = \"debug\"\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().logging.level, "debug");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [enrichment]
            workers = 4

            [cache]
            dir = "/var/tmp/metrics"
            "#,
        )
        .unwrap();
        assert_eq!(config.enrichment.workers, 4);
        assert_eq!(config.enrichment.progress_interval, 10);
        assert_eq!(
            config.cache.blob_path(7),
            PathBuf::from("/var/tmp/metrics/cache_7.json")
        );
        assert_eq!(config.dataset.license, "CC0-1.0");
    }
}
