// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::ApiConfig;

/// Create the pooled client used for content and bulk requests.
///
/// Idle connections per host are kept up to the worker count so
/// concurrent fetches reuse them.
pub fn create_async_client(
    config: &ApiConfig,
    query_id: u64,
    workers: usize,
) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent_for(query_id))
        .timeout(Duration::from_secs(config.timeout_secs))
        .pool_max_idle_per_host(workers.max(1))
        .build()?;
    Ok(client)
}

/// Create a client with a cookie store, for login sessions.
pub fn create_session_client(config: &ApiConfig, query_id: u64) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(config.user_agent_for(query_id))
        .timeout(Duration::from_secs(config.timeout_secs))
        .cookie_store(true)
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clients_build_from_defaults() {
        let config = ApiConfig::default();
        assert!(create_async_client(&config, 93243, 10).is_ok());
        assert!(create_session_client(&config, 93243).is_ok());
    }
}
