// src/pipeline/lifecycle.rs

//! Interrupt handling: persist the metric cache before the process exits.

use std::future::Future;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::storage::MetricCache;

/// Work to do when the run is interrupted.
#[derive(Clone)]
pub struct ShutdownHook {
    cache: Arc<MetricCache>,
}

impl ShutdownHook {
    pub fn new(cache: Arc<MetricCache>) -> Self {
        Self { cache }
    }

    /// Flush the cache; failures are logged only.
    ///
    /// Returns `true` when a blob was written.
    pub fn on_interrupt(&self, signal: &str) -> bool {
        log::warn!("Received {}. Saving cache and shutting down...", signal);
        let saved = self.cache.flush();
        log::info!(
            "Shutdown complete ({})",
            if saved { "cache saved" } else { "cache not saved" }
        );
        saved
    }
}

/// Resolves with the signal name on SIGINT or SIGTERM.
#[cfg(unix)]
pub async fn shutdown_signal() -> String {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => tokio::select! {
            _ = ctrl_c() => "SIGINT".to_string(),
            _ = terminate.recv() => "SIGTERM".to_string(),
        },
        Err(e) => {
            log::warn!("Cannot listen for SIGTERM: {}", e);
            ctrl_c().await;
            "SIGINT".to_string()
        }
    }
}

/// Resolves with the signal name on Ctrl-C.
#[cfg(not(unix))]
pub async fn shutdown_signal() -> String {
    ctrl_c().await;
    "SIGINT".to_string()
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Drive `work` to completion unless a process signal arrives first.
pub async fn run_until_interrupted<F, T>(work: F, hook: &ShutdownHook) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    run_until(work, shutdown_signal(), hook).await
}

/// Race `work` against `signal`. When the signal wins, in-flight work is
/// dropped, the hook runs and the result is [`AppError::Interrupted`].
pub async fn run_until<F, S, T>(work: F, signal: S, hook: &ShutdownHook) -> Result<T>
where
    F: Future<Output = Result<T>>,
    S: Future<Output = String>,
{
    tokio::select! {
        result = work => result,
        name = signal => {
            hook.on_interrupt(&name);
            Err(AppError::Interrupted(name))
        }
    }
}
