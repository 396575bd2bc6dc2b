//! Retry policy for the attempt loop.

use crate::error::TransportError;
use httpmaker_config::RetryConfig;
use std::time::Duration;

/// How many attempts one logical call gets and how long to wait after each
/// kind of failure.
///
/// Waits grow with how unexpected the failure is: a dropped connection
/// gets the shortest pause, a timeout a longer one, and an unclassified
/// client fault the longest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Transport attempts per call. Values below 1 are treated as 1.
    pub max_attempts: u32,
    /// Per-attempt timeout handed to the transport.
    pub timeout: Duration,
    pub connection_backoff: Duration,
    pub timeout_backoff: Duration,
    pub client_error_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            timeout: config.timeout(),
            connection_backoff: config.connection_backoff(),
            timeout_backoff: config.timeout_backoff(),
            client_error_backoff: config.client_error_backoff(),
        }
    }
}

/// What the attempt loop does after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given duration, then try again.
    Retry(Duration),
    /// Stop and report the call as having no response.
    GiveUp,
}

impl RetryPolicy {
    /// A policy that never waits between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            connection_backoff: Duration::ZERO,
            timeout_backoff: Duration::ZERO,
            client_error_backoff: Duration::ZERO,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Worst-case latency of one call: every attempt times out and waits
    /// the longest backoff (no wait after the last attempt).
    pub fn worst_case(&self) -> Duration {
        let longest = self
            .connection_backoff
            .max(self.timeout_backoff)
            .max(self.client_error_backoff);
        let attempts = self.attempts();
        self.timeout * attempts + longest * (attempts - 1)
    }

    pub fn backoff_for(&self, error: &TransportError) -> Duration {
        match error {
            TransportError::Connect(_) => self.connection_backoff,
            TransportError::Timeout(_) => self.timeout_backoff,
            TransportError::Client(_) => self.client_error_backoff,
        }
    }

    /// Decide what follows failed attempt number `attempt` (1-based).
    pub fn after_failure(
        &self,
        url: &str,
        attempt: u32,
        error: &TransportError,
        allow_wait: bool,
    ) -> RetryDecision {
        let unexpected = matches!(error, TransportError::Client(_));
        tracing::error!(
            %url,
            attempt,
            kind = error.kind(),
            unexpected,
            %error,
            "request attempt failed"
        );

        if !allow_wait {
            tracing::debug!(%url, "retry waits disabled, giving up");
            return RetryDecision::GiveUp;
        }

        if attempt >= self.attempts() {
            tracing::error!(%url, attempts = attempt, "all attempts failed, no response");
            return RetryDecision::GiveUp;
        }

        RetryDecision::Retry(self.backoff_for(error))
    }
}
