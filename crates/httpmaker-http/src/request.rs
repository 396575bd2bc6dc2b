//! Request descriptions and URL resolution.

use crate::headers::Headers;
use serde::Serialize;
use serde_json::Value;

/// Non-JSON request payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// `application/x-www-form-urlencoded` pairs.
    Form(Vec<(String, String)>),
    /// Raw text sent as-is.
    Text(String),
}

/// One logical call handed to an executor's `make`.
///
/// The method is kept as text and validated when the call is made, so an
/// unsupported method surfaces as `MakerError::UnsupportedMethod`.
#[derive(Debug, Clone, PartialEq)]
pub struct MakeRequest {
    pub(crate) url: String,
    pub(crate) method: String,
    pub(crate) data: Option<Body>,
    pub(crate) json: Option<Value>,
    pub(crate) params: Vec<(String, String)>,
    pub(crate) headers: Headers,
    pub(crate) cache_only: bool,
    pub(crate) allow_retry_wait: bool,
}

impl MakeRequest {
    /// Describe a call to `url` (relative to the executor's base URL).
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: method.into(),
            data: None,
            json: None,
            params: Vec::new(),
            headers: Headers::new(),
            cache_only: false,
            allow_retry_wait: true,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new("POST", url)
    }

    pub fn put(url: impl Into<String>) -> Self {
        Self::new("PUT", url)
    }

    pub fn delete(url: impl Into<String>) -> Self {
        Self::new("DELETE", url)
    }

    pub fn patch(url: impl Into<String>) -> Self {
        Self::new("PATCH", url)
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new("HEAD", url)
    }

    pub fn options(url: impl Into<String>) -> Self {
        Self::new("OPTIONS", url)
    }

    /// Set a JSON body. Takes precedence over `form`/`text` when both are set.
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    /// Serialize any value into the JSON body.
    pub fn json_from<T: Serialize>(self, body: &T) -> Result<Self, serde_json::Error> {
        Ok(self.json(serde_json::to_value(body)?))
    }

    /// Set a form-encoded body.
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.data = Some(Body::Form(
            pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        ));
        self
    }

    /// Set a raw text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.data = Some(Body::Text(body.into()));
        self
    }

    /// Append a query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Add a per-call header overriding the executor default of the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Serve any cached entry regardless of freshness.
    pub fn cache_only(mut self, cache_only: bool) -> Self {
        self.cache_only = cache_only;
        self
    }

    /// Whether failed attempts may wait and retry. When false the first
    /// failure ends the call.
    pub fn allow_retry_wait(mut self, allow: bool) -> Self {
        self.allow_retry_wait = allow;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn is_cache_only(&self) -> bool {
        self.cache_only
    }

    pub fn retry_wait_allowed(&self) -> bool {
        self.allow_retry_wait
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Ensure a non-empty base ends with exactly one `/`.
pub fn normalize_base(base: &str) -> String {
    if base.is_empty() {
        return String::new();
    }
    format!("{}/", base.trim_end_matches('/'))
}

/// Resolve `relative` against `base`.
///
/// An empty `relative` yields the base. Leading slashes of `relative` are
/// dropped so the join never doubles them. Absolute URLs, and URLs already
/// under `base`, come back unchanged.
pub fn full_path(base: &str, relative: &str) -> String {
    let base = normalize_base(base);

    if relative.is_empty() {
        return base;
    }

    if is_absolute(relative) || (!base.is_empty() && relative.starts_with(&base)) {
        return relative.to_string();
    }

    format!("{}{}", base, relative.trim_start_matches('/'))
}

/// Append `params` to `url` as an encoded query string.
///
/// The result is the URL the call is sent to and cached under. It is in
/// the canonical form reqwest reports for the reply, so lookups and writes
/// agree on the key. A URL that does not parse is returned unchanged.
pub fn with_query(url: &str, params: &[(String, String)]) -> String {
    // parse_with_params leaves a bare `?` behind when there are no params
    let parsed = if params.is_empty() {
        reqwest::Url::parse(url)
    } else {
        reqwest::Url::parse_with_params(url, params)
    };

    match parsed {
        Ok(parsed) => parsed.to_string(),
        Err(error) => {
            tracing::debug!(%url, %error, "cannot attach query parameters");
            url.to_string()
        }
    }
}
