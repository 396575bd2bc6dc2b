//! Span and timing helpers for request and cache instrumentation.

use std::time::Instant;
use tracing::{debug_span, Span};

/// Span covering one logical request made through an executor.
pub fn request_span(method: &str, url: &str) -> Span {
    debug_span!("http_request", method = %method, url = %url)
}

/// Span covering one cache provider operation.
pub fn cache_span(operation: &'static str, key: &str) -> Span {
    debug_span!("cache", op = operation, key = %key)
}

/// Timing utility for operations.
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Milliseconds since the timer started.
    pub fn elapsed_ms(&self) -> u128 {
        self.start.elapsed().as_millis()
    }

    /// Complete the timer and record duration.
    pub fn finish(self) {
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %self.elapsed_ms(),
            "operation completed"
        );
    }
}
