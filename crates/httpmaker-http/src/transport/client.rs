//! reqwest-backed transports.

use super::{collect_headers, AsyncTransport, RawResponse, Transport, TransportRequest};
use crate::error::{MakerError, TransportError};
use crate::request::Body;
use async_trait::async_trait;
use httpmaker_config::TransportSettings;
use std::time::Duration;

/// Connection pool configuration shared by both transports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Maximum idle connections per host.
    pub pool_max_idle_per_host: usize,
    /// Enable gzip decompression.
    pub gzip: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("httpmaker/{}", env!("CARGO_PKG_VERSION")),
            pool_max_idle_per_host: 10,
            gzip: true,
        }
    }
}

impl From<&TransportSettings> for TransportConfig {
    fn from(settings: &TransportSettings) -> Self {
        Self {
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            user_agent: settings.user_agent.clone(),
            pool_max_idle_per_host: settings.pool_max_idle_per_host,
            gzip: settings.gzip,
        }
    }
}

// Both reqwest builders expose the same method names but share no trait.
macro_rules! prepare_request {
    ($builder:expr, $request:expr) => {{
        let request: &TransportRequest = $request;
        let mut builder = $builder.timeout(request.timeout);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match (&request.json, &request.data) {
            (Some(json), _) => builder.json(json),
            (None, Some(Body::Form(pairs))) => builder.form(pairs),
            (None, Some(Body::Text(text))) => builder.body(text.clone()),
            (None, None) => builder,
        }
    }};
}

/// Non-blocking transport over a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, MakerError> {
        let mut builder = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.pool_max_idle_per_host);

        if config.gzip {
            builder = builder.gzip(true);
        }

        let inner = builder.build().map_err(MakerError::TransportBuild)?;
        Ok(Self { inner })
    }

    /// Wrap an existing client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }

    /// Get the inner reqwest client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.inner
    }
}

#[async_trait]
impl AsyncTransport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let builder = prepare_request!(
            self.inner.request(request.method.into(), &request.url),
            request
        );

        let response = builder.send().await?;
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await?;

        Ok(RawResponse {
            url,
            status,
            headers,
            body,
        })
    }
}

/// Blocking transport over a pooled `reqwest::blocking::Client`.
///
/// Must not be created or dropped from inside an async runtime.
#[derive(Debug, Clone)]
pub struct ReqwestBlockingTransport {
    inner: reqwest::blocking::Client,
}

impl ReqwestBlockingTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, MakerError> {
        let mut builder = reqwest::blocking::Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .pool_max_idle_per_host(config.pool_max_idle_per_host);

        if config.gzip {
            builder = builder.gzip(true);
        }

        let inner = builder.build().map_err(MakerError::TransportBuild)?;
        Ok(Self { inner })
    }

    pub fn from_client(inner: reqwest::blocking::Client) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &reqwest::blocking::Client {
        &self.inner
    }
}

impl Transport for ReqwestBlockingTransport {
    fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        let builder = prepare_request!(
            self.inner.request(request.method.into(), &request.url),
            request
        );

        let response = builder.send()?;
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes()?;

        Ok(RawResponse {
            url,
            status,
            headers,
            body,
        })
    }
}
