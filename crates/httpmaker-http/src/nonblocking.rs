//! Async executor.

use crate::cache::CacheProvider;
use crate::error::MakerError;
use crate::maker::{plan, MakerBuilder, MakerCore};
use crate::request::MakeRequest;
use crate::response::{normalize, ResponseData};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::transport::{AsyncTransport, ReqwestTransport, TransportRequest};
use chrono::Utc;
use httpmaker_config::MakerConfig;
use httpmaker_log::spans::{request_span, Timer};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// Executes requests as futures on a tokio runtime.
///
/// A call suspends only while the transport is in flight and while
/// waiting out a backoff. Many calls may share one executor by reference.
pub struct HttpMakerAsync<T: AsyncTransport = ReqwestTransport> {
    core: MakerCore,
    transport: T,
}

impl HttpMakerAsync {
    /// Build from configuration with the default reqwest transport.
    pub fn new(config: &MakerConfig) -> Result<Self, MakerError> {
        MakerBuilder::from_config(config)?.build_async()
    }

    pub fn builder() -> MakerBuilder {
        MakerBuilder::new()
    }
}

impl<T: AsyncTransport> HttpMakerAsync<T> {
    pub(crate) fn from_parts(core: MakerCore, transport: T) -> Self {
        tracing::debug!(base_url = %core.base_url(), "async session opened");
        Self { core, transport }
    }

    /// Resolve `url` against the base URL.
    pub fn full_path(&self, url: &str) -> String {
        self.core.full_path(url)
    }

    pub fn cache(&self) -> Option<&Arc<dyn CacheProvider>> {
        self.core.cache()
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.core.policy
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Drop the cached entry for `url`, returning whether one existed.
    pub fn evict(&self, url: &str) -> bool {
        self.core.evict(url)
    }

    /// Perform one logical call. Same contract as [`crate::HttpMaker::make`].
    pub async fn make(&self, request: MakeRequest) -> Result<Option<ResponseData>, MakerError> {
        let (method, full_url) = plan(&self.core, &request)?;
        let span = request_span(method.as_str(), &full_url);

        if let Some(cached) = span.in_scope(|| self.core.lookup(&full_url, request.cache_only)) {
            return Ok(Some(cached));
        }

        let allow_wait = request.allow_retry_wait;
        let prepared = self.core.prepare(method, full_url, request);
        Ok(self.attempt_loop(prepared, allow_wait).instrument(span).await)
    }

    async fn attempt_loop(
        &self,
        prepared: TransportRequest,
        allow_wait: bool,
    ) -> Option<ResponseData> {
        let timer = Timer::start("http_request");
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(attempt, "sending request");

            match self.transport.send(&prepared).await {
                Ok(raw) => {
                    let status = raw.status;
                    let response = normalize(raw, Utc::now());
                    if let Some(response) = &response {
                        self.core.remember(response);
                    }
                    tracing::debug!(
                        status,
                        attempt,
                        elapsed_ms = %timer.elapsed_ms(),
                        "request finished"
                    );
                    timer.finish();
                    return response;
                }
                Err(error) => {
                    match self
                        .core
                        .policy
                        .after_failure(&prepared.url, attempt, &error, allow_wait)
                    {
                        RetryDecision::Retry(wait) => tokio::time::sleep(wait).await,
                        RetryDecision::GiveUp => return None,
                    }
                }
            }
        }
    }

    pub async fn get(&self, url: &str) -> Result<Option<ResponseData>, MakerError> {
        self.make(MakeRequest::get(url)).await
    }

    pub async fn post_json(
        &self,
        url: &str,
        body: Value,
    ) -> Result<Option<ResponseData>, MakerError> {
        self.make(MakeRequest::post(url).json(body)).await
    }

    /// Release the transport now.
    pub fn close(self) {
        drop(self);
    }
}

impl<T: AsyncTransport> Drop for HttpMakerAsync<T> {
    fn drop(&mut self) {
        self.transport.close();
        tracing::info!(base_url = %self.core.base_url(), "session closed");
    }
}
