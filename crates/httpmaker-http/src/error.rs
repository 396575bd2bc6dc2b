//! Error types.

use crate::cache::CacheError;

/// Failure of a single transport attempt.
///
/// These never reach callers of `make`; the attempt loop absorbs them and
/// reports exhaustion as an absent response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Peer unreachable or connection reset.
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other transport or client-side fault.
    #[error("client error: {0}")]
    Client(String),
}

impl TransportError {
    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Connect(_) => "connect",
            Self::Timeout(_) => "timeout",
            Self::Client(_) => "client",
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // A connect timeout reports both flags; treat it as a timeout.
        if e.is_timeout() {
            TransportError::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else {
            TransportError::Client(e.to_string())
        }
    }
}

/// Errors surfaced to callers of an executor.
#[derive(Debug, thiserror::Error)]
pub enum MakerError {
    /// The caller asked for a method the transport does not expose.
    #[error("request method not supported: {0}")]
    UnsupportedMethod(String),

    #[error("failed to build HTTP transport: {0}")]
    TransportBuild(#[source] reqwest::Error),

    #[error("failed to set up cache: {0}")]
    Cache(#[from] CacheError),
}
