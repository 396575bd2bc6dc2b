//! Response caching.
//!
//! Executors talk to a cache only through [`CacheProvider`]. A provider
//! failure never fails a request: lookups degrade to a miss and writes are
//! skipped, both with a warning.

mod file;
mod memory;

pub use file::{FileCache, HeaderFilter};
pub use memory::MemoryCache;

use crate::response::ResponseData;
use httpmaker_log::spans::cache_span;
use std::sync::Arc;
use std::time::Duration;

/// Default freshness window.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(15 * 60);

/// Cache operation result.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache errors.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Caller-supplied freshness predicate.
pub type Freshness = Arc<dyn Fn(&ResponseData) -> bool + Send + Sync>;

/// True when `entry` is no older than `max_age`. Entries stamped in the
/// future count as fresh.
pub fn is_fresh(entry: &ResponseData, max_age: Duration) -> bool {
    match entry.age().to_std() {
        Ok(age) => age <= max_age,
        Err(_) => true,
    }
}

/// Storage for previously fetched responses, keyed by request URL.
pub trait CacheProvider: Send + Sync {
    /// Look up the entry stored for `key`.
    fn get(&self, key: &str) -> CacheResult<Option<ResponseData>>;

    /// Store `entry` under its own URL, replacing any previous entry.
    fn put(&self, entry: &ResponseData) -> CacheResult<()>;

    /// Whether `entry` may be served instead of making a request.
    fn condition(&self, entry: &ResponseData) -> bool {
        is_fresh(entry, DEFAULT_MAX_AGE)
    }

    /// Remove the entry for `key`, reporting whether one existed.
    fn evict(&self, key: &str) -> CacheResult<bool>;
}

/// Decide whether a call can be answered from the cache.
///
/// `None` means "go to the network".
pub fn resolve(
    cache: Option<&dyn CacheProvider>,
    full_url: &str,
    cache_only: bool,
) -> Option<ResponseData> {
    let cache = cache?;
    let _span = cache_span("get", full_url).entered();

    let entry = match cache.get(full_url) {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            tracing::debug!(url = %full_url, "cache miss");
            return None;
        }
        Err(error) => {
            tracing::warn!(url = %full_url, %error, "cache lookup failed, treating as miss");
            return None;
        }
    };

    if cache_only || cache.condition(&entry) {
        tracing::debug!(url = %full_url, cache_only, "serving from cache");
        return Some(entry);
    }

    tracing::debug!(url = %full_url, fetched_at = %entry.fetched_at(), "cached entry is stale");
    None
}

/// Write a fresh network response through to the cache. Best effort.
pub fn store(cache: Option<&dyn CacheProvider>, response: &ResponseData) {
    let Some(cache) = cache else {
        return;
    };
    let _span = cache_span("put", response.url()).entered();

    if let Err(error) = cache.put(response) {
        tracing::warn!(url = %response.url(), %error, "cache write skipped");
    }
}
