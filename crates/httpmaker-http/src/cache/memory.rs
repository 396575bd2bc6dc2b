//! In-memory cache implementation.

use super::{is_fresh, CacheProvider, CacheResult, Freshness, DEFAULT_MAX_AGE};
use crate::response::ResponseData;
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Process-local cache keyed by URL. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, ResponseData>>,
    condition: Option<Freshness>,
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.len())
            .field("custom_condition", &self.condition.is_some())
            .finish()
    }
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the default freshness check.
    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&ResponseData) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
        debug!("Memory cache cleared");
    }
}

impl CacheProvider for MemoryCache {
    fn get(&self, key: &str) -> CacheResult<Option<ResponseData>> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn put(&self, entry: &ResponseData) -> CacheResult<()> {
        self.entries.insert(entry.url().to_string(), entry.clone());
        debug!(key = entry.url(), "Cache set");
        Ok(())
    }

    fn condition(&self, entry: &ResponseData) -> bool {
        match &self.condition {
            Some(condition) => condition(entry),
            None => is_fresh(entry, DEFAULT_MAX_AGE),
        }
    }

    fn evict(&self, key: &str) -> CacheResult<bool> {
        let removed = self.entries.remove(key).is_some();
        debug!(key, removed, "Cache evict");
        Ok(removed)
    }
}
