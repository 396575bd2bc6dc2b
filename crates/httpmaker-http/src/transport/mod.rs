//! The transport seam: send one HTTP request, get status, headers and body.

mod client;

pub use client::{ReqwestBlockingTransport, ReqwestTransport, TransportConfig};

use crate::error::TransportError;
use crate::headers::Headers;
use crate::method::Method;
use crate::request::Body;
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::time::Duration;

/// A fully assembled outbound request.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Resolved URL with the call's query parameters already encoded.
    pub url: String,
    /// Executor defaults merged with per-call overrides.
    pub headers: Headers,
    pub data: Option<Body>,
    pub json: Option<Value>,
    /// Per-attempt timeout.
    pub timeout: Duration,
}

/// A reply as the transport delivered it, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// URL the reply belongs to, query string included.
    pub url: String,
    pub status: u16,
    pub headers: Headers,
    pub body: Bytes,
}

/// Blocking transport. Shared by reference across threads.
pub trait Transport: Send + Sync {
    fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError>;

    /// Release pooled connections. Called once when the owning executor is dropped.
    fn close(&self) {}
}

/// Non-blocking transport.
#[async_trait]
pub trait AsyncTransport: Send + Sync {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError>;

    /// Release pooled connections. Called once when the owning executor is dropped.
    fn close(&self) {}
}

/// Flatten a reqwest header map, joining repeated names with `", "`.
pub(crate) fn collect_headers(map: &reqwest::header::HeaderMap) -> Headers {
    let mut headers = Headers::with_capacity(map.keys_len());
    for (name, value) in map {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        headers
            .entry(name.as_str().to_string())
            .and_modify(|existing: &mut String| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    headers
}
