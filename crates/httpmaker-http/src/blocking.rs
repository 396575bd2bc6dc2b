//! Blocking executor.

use crate::cache::CacheProvider;
use crate::error::MakerError;
use crate::maker::{plan, MakerBuilder, MakerCore};
use crate::request::MakeRequest;
use crate::response::{normalize, ResponseData};
use crate::retry::{RetryDecision, RetryPolicy};
use crate::transport::{ReqwestBlockingTransport, Transport};
use chrono::Utc;
use httpmaker_config::MakerConfig;
use httpmaker_log::spans::{request_span, Timer};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// How the blocking executor waits between attempts.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Parks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Executes requests on the calling thread.
///
/// Retry waits block that thread. The transport is released exactly once,
/// either by [`HttpMaker::close`] or when the executor is dropped.
pub struct HttpMaker<T: Transport = ReqwestBlockingTransport> {
    core: MakerCore,
    transport: T,
    sleeper: Box<dyn Sleeper>,
}

impl HttpMaker {
    /// Build from configuration with the default reqwest transport.
    pub fn new(config: &MakerConfig) -> Result<Self, MakerError> {
        MakerBuilder::from_config(config)?.build_blocking()
    }

    pub fn builder() -> MakerBuilder {
        MakerBuilder::new()
    }
}

impl<T: Transport> HttpMaker<T> {
    pub(crate) fn from_parts(core: MakerCore, transport: T) -> Self {
        tracing::debug!(base_url = %core.base_url(), "blocking session opened");
        Self {
            core,
            transport,
            sleeper: Box::new(ThreadSleeper),
        }
    }

    /// Replace how retry waits are performed.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
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

    /// Perform one logical call.
    ///
    /// Returns `Ok(None)` when every attempt failed or the reply had an
    /// unsupported content type. The only error is an unsupported method,
    /// reported before the cache or the network is touched.
    pub fn make(&self, request: MakeRequest) -> Result<Option<ResponseData>, MakerError> {
        let (method, full_url) = plan(&self.core, &request)?;
        let span = request_span(method.as_str(), &full_url);
        let _guard = span.enter();

        if let Some(cached) = self.core.lookup(&full_url, request.cache_only) {
            return Ok(Some(cached));
        }

        let allow_wait = request.allow_retry_wait;
        let prepared = self.core.prepare(method, full_url, request);
        let timer = Timer::start("http_request");
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(attempt, "sending request");

            match self.transport.send(&prepared) {
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
                    return Ok(response);
                }
                Err(error) => {
                    match self
                        .core
                        .policy
                        .after_failure(&prepared.url, attempt, &error, allow_wait)
                    {
                        RetryDecision::Retry(wait) => self.sleeper.sleep(wait),
                        RetryDecision::GiveUp => return Ok(None),
                    }
                }
            }
        }
    }

    pub fn get(&self, url: &str) -> Result<Option<ResponseData>, MakerError> {
        self.make(MakeRequest::get(url))
    }

    pub fn post_json(&self, url: &str, body: Value) -> Result<Option<ResponseData>, MakerError> {
        self.make(MakeRequest::post(url).json(body))
    }

    /// Release the transport now.
    pub fn close(self) {
        drop(self);
    }
}

impl<T: Transport> Drop for HttpMaker<T> {
    fn drop(&mut self) {
        self.transport.close();
        tracing::info!(base_url = %self.core.base_url(), "session closed");
    }
}
