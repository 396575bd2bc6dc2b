//! Normalized responses.

use crate::headers::{get_header, Headers};
use crate::transport::RawResponse;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Sentinel content type used when a reply carries no `Content-Type`.
pub const EMPTY_CONTENT_TYPE: &str = "empty";

/// The result of one HTTP exchange, either fresh or loaded from a cache.
///
/// Immutable once built. The body is always a JSON object: other JSON
/// values are wrapped under `"data"` and unparseable text under `"error"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    url: String,
    status: u16,
    headers: Headers,
    body: Map<String, Value>,
    fetched_at: DateTime<Utc>,
}

impl ResponseData {
    pub fn new(
        url: impl Into<String>,
        status: u16,
        headers: Headers,
        body: Map<String, Value>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            status,
            headers,
            body,
            fetched_at,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        get_header(&self.headers, name)
    }

    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Time elapsed since the response was fetched.
    pub fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }

    /// Deserialize the body into a caller type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.body.clone()))
    }

    /// Copy of this response carrying a different header set.
    pub fn with_headers(&self, headers: Headers) -> Self {
        Self {
            headers,
            ..self.clone()
        }
    }

    /// Consume into the body map.
    pub fn into_body(self) -> Map<String, Value> {
        self.body
    }
}

/// Wrap any JSON value so the result is an object.
pub fn into_mapping(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}

fn error_body(raw: &[u8]) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert(
        "error".to_string(),
        Value::String(String::from_utf8_lossy(raw).into_owned()),
    );
    map
}

/// How a reply's content type is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ContentKind {
    Json,
    Html,
    Empty,
    Unsupported(String),
}

impl ContentKind {
    fn classify(headers: &Headers) -> Self {
        let Some(content_type) = get_header(headers, "content-type") else {
            return Self::Empty;
        };

        let media_type = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match media_type.as_str() {
            "application/json" => Self::Json,
            t if t.ends_with("+json") => Self::Json,
            "text/html" => Self::Html,
            "" | EMPTY_CONTENT_TYPE => Self::Empty,
            other => Self::Unsupported(other.to_string()),
        }
    }
}

/// Parse a reply body, falling back to `{"error": <text>}`.
fn parse_body(raw: &[u8]) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(raw) {
        Ok(value) => into_mapping(value),
        Err(e) => {
            tracing::warn!(error = %e, bytes = raw.len(), "response body is not valid JSON");
            error_body(raw)
        }
    }
}

/// Turn a raw transport reply into a [`ResponseData`].
///
/// Returns `None` for content types other than JSON, HTML or absent; that is
/// the one case where a completed exchange yields nothing usable.
pub fn normalize(raw: RawResponse, fetched_at: DateTime<Utc>) -> Option<ResponseData> {
    let body = match ContentKind::classify(&raw.headers) {
        ContentKind::Json | ContentKind::Empty => parse_body(&raw.body),
        // Some servers label JSON as HTML; parse it anyway.
        ContentKind::Html => parse_body(&raw.body),
        ContentKind::Unsupported(content_type) => {
            tracing::debug!(url = %raw.url, %content_type, "unreadable content type");
            return None;
        }
    };

    Some(ResponseData::new(
        raw.url,
        raw.status,
        raw.headers,
        body,
        fetched_at,
    ))
}
