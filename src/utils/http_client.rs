use std::time::Duration;

use crate::constants::{
    DEFAULT_HTTP_CLIENT_CONNECT_TIMEOUT_SECONDS, DEFAULT_HTTP_CLIENT_POOL_IDLE_TIMEOUT_SECONDS,
    DEFAULT_HTTP_CLIENT_POOL_MAX_IDLE_PER_HOST, DEFAULT_HTTP_CLIENT_TIMEOUT_SECONDS,
};

/// Builds the HTTP client shared by the token lease and callback requests.
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(
            DEFAULT_HTTP_CLIENT_CONNECT_TIMEOUT_SECONDS,
        ))
        .timeout(Duration::from_secs(DEFAULT_HTTP_CLIENT_TIMEOUT_SECONDS))
        .pool_max_idle_per_host(DEFAULT_HTTP_CLIENT_POOL_MAX_IDLE_PER_HOST)
        .pool_idle_timeout(Duration::from_secs(
            DEFAULT_HTTP_CLIENT_POOL_IDLE_TIMEOUT_SECONDS,
        ))
        .build()
}
