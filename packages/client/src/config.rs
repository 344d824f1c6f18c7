//! Fetcher and walker configuration, populated from environment variables.

use std::time::Duration;

/// Timeouts, retry policy, and limits for [`HttpFetcher`](crate::HttpFetcher).
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `WEFT_FETCH_TIMEOUT_SECS` | `10` | Per-request timeout |
/// | `WEFT_FETCH_MAX_RETRIES` | `3` | Retries after the first attempt, transient failures only |
/// | `WEFT_FETCH_BACKOFF_MS` | `250` | Delay before the first retry |
/// | `WEFT_FETCH_BACKOFF_MAX_MS` | `5000` | Cap on the retry delay (before jitter) |
/// | `WEFT_FETCH_MAX_BODY_BYTES` | `4194304` | Largest response body accepted |
/// | `WEFT_USER_AGENT` | `weftstreams/<version>` | `User-Agent` header |
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub max_body_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            max_retries: 3,
            backoff_base: Duration::from_millis(250),
            backoff_max: Duration::from_millis(5000),
            max_body_bytes: 4 * 1024 * 1024,
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    /// Populate config from environment variables, applying defaults where
    /// absent or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout: env_parse("WEFT_FETCH_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            max_retries: env_parse("WEFT_FETCH_MAX_RETRIES").unwrap_or(defaults.max_retries),
            backoff_base: env_parse("WEFT_FETCH_BACKOFF_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_base),
            backoff_max: env_parse("WEFT_FETCH_BACKOFF_MAX_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.backoff_max),
            max_body_bytes: env_parse("WEFT_FETCH_MAX_BODY_BYTES")
                .unwrap_or(defaults.max_body_bytes),
            user_agent: std::env::var("WEFT_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

/// Limits for [`CollectionWalker`](crate::CollectionWalker).
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `WEFT_WALK_MAX_PAGES` | (absent = unbounded) | Pages a single walk may visit |
#[derive(Debug, Clone, Default)]
pub struct WalkConfig {
    /// `None` walks until the collection ends or a cycle is found.
    pub max_pages: Option<usize>,
}

impl WalkConfig {
    pub fn from_env() -> Self {
        Self {
            max_pages: env_parse("WEFT_WALK_MAX_PAGES"),
        }
    }
}

fn default_user_agent() -> String {
    format!("weftstreams/{}", env!("CARGO_PKG_VERSION"))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
