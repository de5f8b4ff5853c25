//! Article Metrics CLI
//!
//! Fetches the latest query results, computes metrics and publishes the
//! dataset. Exits with 130 when interrupted, 1 on any other failure.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use article_metrics::{
    error::Result,
    models::Config,
    pipeline::{self, RunContext, RunOptions, ShutdownHook},
    services::{CommonsClient, Credentials, MediaWikiClient, QuarryClient},
    storage::{CacheMode, MetricCache},
    utils::{http, log as logging},
};
use clap::Parser;

/// Article metrics updater
#[derive(Parser, Debug)]
#[command(
    name = "article-metrics",
    version,
    about = "Enrich article lists with prose size and quality metrics"
)]
struct Cli {
    /// Saved query whose latest results list the articles
    #[arg(long, default_value_t = 93243)]
    query_id: u64,

    /// Compute everything but skip publishing
    #[arg(long)]
    test: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Number of concurrent workers (overrides config)
    #[arg(long)]
    workers: Option<usize>,

    /// Do not read or write the persistent cache
    #[arg(long)]
    no_cache: bool,

    /// Ignore and delete the persistent cache
    #[arg(long)]
    force_recalculate: bool,

    /// Cancel --force-recalculate
    #[arg(long)]
    no_force_recalculate: bool,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, load_error) = match Config::load(&cli.config) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let log_file = Some(config.logging.file.as_str())
        .filter(|file| !file.trim().is_empty())
        .map(Path::new);
    logging::init(&config.logging.level, cli.verbose, log_file);

    if let Some(e) = load_error {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
    }

    if let Some(workers) = cli.workers {
        config.enrichment.workers = workers;
    }

    match run(cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }

    let credentials = if cli.test {
        None
    } else {
        Some(Credentials::from_env()?)
    };

    let cache_mode =
        CacheMode::from_flags(cli.no_cache, cli.force_recalculate, cli.no_force_recalculate);
    let cache = Arc::new(MetricCache::open(
        config.cache.blob_path(cli.query_id),
        cache_mode,
    ));

    let client = http::create_async_client(&config.api, cli.query_id, config.enrichment.workers)?;
    let session = http::create_session_client(&config.api, cli.query_id)?;

    let context = RunContext {
        bulk: Arc::new(QuarryClient::new(client.clone(), &config.api.quarry_base)),
        content: Arc::new(MediaWikiClient::new(client, &config.api.wiki_api)),
        store: Arc::new(CommonsClient::new(
            session,
            &config.api.commons_api,
            &config.dataset.page_title,
            &config.dataset.summary,
        )),
        cache: Arc::clone(&cache),
    };
    let options = RunOptions {
        query_id: cli.query_id,
        test_mode: cli.test,
        credentials,
    };

    let hook = ShutdownHook::new(cache);
    pipeline::run_until_interrupted(pipeline::run_pipeline(&config, &options, &context), &hook)
        .await?;

    log::info!("Done!");
    Ok(())
}
