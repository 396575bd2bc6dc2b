//! Configuration types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for one request executor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MakerConfig {
    /// Base URL every relative request path is resolved against.
    pub base_url: String,
    /// Headers sent with every request unless overridden per call.
    pub headers: IndexMap<String, String>,
    /// Retry and timeout settings.
    pub retry: RetryConfig,
    /// Connection-level transport settings.
    pub transport: TransportSettings,
    /// File cache settings. No cache is used when absent.
    pub cache: Option<CacheConfig>,
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Transport attempts per logical call.
    pub max_attempts: u32,
    /// Per-attempt timeout (seconds).
    pub timeout_secs: u64,
    /// Wait after a connection failure (ms).
    pub connection_backoff_ms: u64,
    /// Wait after a timeout (ms).
    pub timeout_backoff_ms: u64,
    /// Wait after an unclassified client error (ms).
    pub client_error_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            timeout_secs: 60,
            connection_backoff_ms: 10_000,
            timeout_backoff_ms: 20_000,
            client_error_backoff_ms: 60_000,
        }
    }
}

impl RetryConfig {
    /// Per-attempt timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connection_backoff(&self) -> Duration {
        Duration::from_millis(self.connection_backoff_ms)
    }

    pub fn timeout_backoff(&self) -> Duration {
        Duration::from_millis(self.timeout_backoff_ms)
    }

    pub fn client_error_backoff(&self) -> Duration {
        Duration::from_millis(self.client_error_backoff_ms)
    }
}

/// Transport (connection pool) settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportSettings {
    /// Connection timeout (seconds).
    pub connect_timeout_secs: u64,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections kept per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 10,
            user_agent: format!("httpmaker/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

/// File cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory cache files are written to.
    pub dir: PathBuf,
    /// Response headers to persist. `None` drops headers entirely,
    /// `["*"]` keeps all of them.
    pub allow_headers: Option<Vec<String>>,
    /// URL prefix removed before deriving the file name.
    pub ignore_url_part: Option<String>,
    /// Extra substitutions applied to the URL after the built-in ones.
    pub replacements: IndexMap<String, String>,
    /// Entries younger than this are served without a network call (seconds).
    pub max_age_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".httpmaker-cache"),
            allow_headers: None,
            ignore_url_part: None,
            replacements: IndexMap::new(),
            max_age_secs: 15 * 60,
        }
    }
}

impl CacheConfig {
    /// Wildcard entry in `allow_headers` meaning "keep every header".
    pub const ALL_HEADERS: &'static str = "*";

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }
}
