//! State and construction shared by the blocking and async executors.

use crate::blocking::HttpMaker;
use crate::cache::{self, CacheProvider, FileCache};
use crate::error::MakerError;
use crate::headers::{merge_headers, Headers};
use crate::method::Method;
use crate::nonblocking::HttpMakerAsync;
use crate::request::{self, MakeRequest};
use crate::response::ResponseData;
use crate::retry::RetryPolicy;
use crate::transport::{
    AsyncTransport, ReqwestBlockingTransport, ReqwestTransport, Transport, TransportConfig,
    TransportRequest,
};
use httpmaker_config::MakerConfig;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Everything an executor needs apart from its transport.
#[derive(Clone)]
pub(crate) struct MakerCore {
    base_url: String,
    headers: Headers,
    cache: Option<Arc<dyn CacheProvider>>,
    pub(crate) policy: RetryPolicy,
}

impl fmt::Debug for MakerCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MakerCore")
            .field("base_url", &self.base_url)
            .field("headers", &self.headers)
            .field("cache", &self.cache.is_some())
            .field("policy", &self.policy)
            .finish()
    }
}

impl MakerCore {
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn full_path(&self, url: &str) -> String {
        request::full_path(&self.base_url, url)
    }

    pub(crate) fn cache(&self) -> Option<&Arc<dyn CacheProvider>> {
        self.cache.as_ref()
    }

    pub(crate) fn lookup(&self, full_url: &str, cache_only: bool) -> Option<ResponseData> {
        cache::resolve(self.cache.as_deref(), full_url, cache_only)
    }

    pub(crate) fn remember(&self, response: &ResponseData) {
        cache::store(self.cache.as_deref(), response);
    }

    /// Drop the cached entry for `url`, which must carry any query string
    /// the call was made with. Provider failures count as "nothing removed".
    pub(crate) fn evict(&self, url: &str) -> bool {
        let Some(cache) = &self.cache else {
            return false;
        };
        let full_url = request::with_query(&self.full_path(url), &[]);
        match cache.evict(&full_url) {
            Ok(removed) => removed,
            Err(error) => {
                tracing::warn!(url = %full_url, %error, "cache evict failed");
                false
            }
        }
    }

    /// Assemble the outbound request for one logical call.
    pub(crate) fn prepare(
        &self,
        method: Method,
        full_url: String,
        request: MakeRequest,
    ) -> TransportRequest {
        TransportRequest {
            method,
            url: full_url,
            headers: merge_headers(&self.headers, &request.headers),
            data: request.data,
            json: request.json,
            timeout: self.policy.timeout,
        }
    }
}

/// Validate the method of `request` and resolve its URL, query included.
///
/// Runs before the cache is consulted so an unsupported method never
/// produces a response, cached or not. The resolved URL is both the
/// cache key and the address the transport is sent to.
pub(crate) fn plan(
    core: &MakerCore,
    request: &MakeRequest,
) -> Result<(Method, String), MakerError> {
    let method: Method = request.method.parse()?;
    let full_url = request::with_query(&core.full_path(&request.url), &request.params);
    Ok((method, full_url))
}

/// Builder for [`HttpMaker`] and [`HttpMakerAsync`].
pub struct MakerBuilder {
    base_url: String,
    headers: Headers,
    cache: Option<Arc<dyn CacheProvider>>,
    policy: RetryPolicy,
    transport: TransportConfig,
}

impl Default for MakerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MakerBuilder {
    pub fn new() -> Self {
        Self {
            base_url: String::new(),
            headers: Headers::new(),
            cache: None,
            policy: RetryPolicy::default(),
            transport: TransportConfig::default(),
        }
    }

    /// Start from a loaded configuration. A `cache` section creates a
    /// [`FileCache`] (and its directory).
    pub fn from_config(config: &MakerConfig) -> Result<Self, MakerError> {
        let mut builder = Self::new()
            .base_url(config.base_url.clone())
            .headers(config.headers.clone())
            .retry_policy(RetryPolicy::from(&config.retry))
            .transport_config(TransportConfig::from(&config.transport));

        if let Some(cache_config) = &config.cache {
            builder = builder.cache(FileCache::from_config(cache_config)?);
        }

        Ok(builder)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Add one default header sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Replace all default headers.
    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn cache(self, cache: impl CacheProvider + 'static) -> Self {
        self.shared_cache(Arc::new(cache))
    }

    /// Use a provider that is also held elsewhere.
    pub fn shared_cache(mut self, cache: Arc<dyn CacheProvider>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy.max_attempts = max_attempts;
        self
    }

    /// Per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.policy.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Connection settings for the default reqwest transports.
    pub fn transport_config(mut self, config: TransportConfig) -> Self {
        self.transport = config;
        self
    }

    fn into_core(self) -> (MakerCore, TransportConfig) {
        let core = MakerCore {
            base_url: request::normalize_base(&self.base_url),
            headers: self.headers,
            cache: self.cache,
            policy: self.policy,
        };
        (core, self.transport)
    }

    /// Build a blocking executor over reqwest.
    ///
    /// Must be called outside any async runtime.
    pub fn build_blocking(self) -> Result<HttpMaker, MakerError> {
        let (core, config) = self.into_core();
        let transport = ReqwestBlockingTransport::new(&config)?;
        Ok(HttpMaker::from_parts(core, transport))
    }

    /// Build a blocking executor over a caller-supplied transport.
    pub fn build_blocking_with<T: Transport>(self, transport: T) -> HttpMaker<T> {
        let (core, _) = self.into_core();
        HttpMaker::from_parts(core, transport)
    }

    /// Build an async executor over reqwest.
    pub fn build_async(self) -> Result<HttpMakerAsync, MakerError> {
        let (core, config) = self.into_core();
        let transport = ReqwestTransport::new(&config)?;
        Ok(HttpMakerAsync::from_parts(core, transport))
    }

    /// Build an async executor over a caller-supplied transport.
    pub fn build_async_with<T: AsyncTransport>(self, transport: T) -> HttpMakerAsync<T> {
        let (core, _) = self.into_core();
        HttpMakerAsync::from_parts(core, transport)
    }
}
