//! httpmaker test harness
//!
//! Shared tracing setup, mock HTTP servers and scratch directories for the
//! workspace's integration tests.

pub mod mocks;

pub use mocks::TestHttpServer;

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

/// Global test counter for unique resource naming
static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Initialize the test harness with tracing support
pub fn init() {
    static INIT: Lazy<()> = Lazy::new(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("warn,httpmaker_http=debug"));

        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_file(true)
            .with_line_number(true)
            .try_init()
            .ok();
    });

    Lazy::force(&INIT);
}

/// Generate a unique test ID
pub fn unique_test_id() -> String {
    let count = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    format!("test_{}_{}", timestamp, count)
}

/// Fresh directory for a file cache, removed when the guard drops.
pub fn cache_dir() -> TempDir {
    tempfile::Builder::new()
        .prefix(&format!("httpmaker-{}-", unique_test_id()))
        .tempdir()
        .expect("failed to create cache dir")
}

/// A URL nothing listens on; connections are refused immediately.
pub const UNREACHABLE_URL: &str = "http://127.0.0.1:1/";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_ids_differ() {
        assert_ne!(unique_test_id(), unique_test_id());
    }

    #[test]
    fn test_cache_dir_is_removed_on_drop() {
        let dir = cache_dir();
        let path = dir.path().to_path_buf();
        assert!(path.is_dir());
        drop(dir);
        assert!(!path.exists());
    }
}
