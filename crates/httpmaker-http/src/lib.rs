//! HTTP request executor with retry, response normalization and a
//! pluggable response cache.

pub mod blocking;
pub mod cache;
pub mod error;
pub mod headers;
pub mod maker;
pub mod method;
pub mod nonblocking;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

#[cfg(test)]
mod testing;

pub use blocking::{HttpMaker, Sleeper, ThreadSleeper};
pub use cache::{CacheError, CacheProvider, FileCache, HeaderFilter, MemoryCache};
pub use error::{MakerError, TransportError};
pub use headers::{merge_headers, Headers};
pub use maker::MakerBuilder;
pub use method::Method;
pub use nonblocking::HttpMakerAsync;
pub use request::{full_path, Body, MakeRequest};
pub use response::ResponseData;
pub use retry::RetryPolicy;
pub use transport::{
    AsyncTransport, RawResponse, ReqwestBlockingTransport, ReqwestTransport, Transport,
    TransportConfig, TransportRequest,
};
