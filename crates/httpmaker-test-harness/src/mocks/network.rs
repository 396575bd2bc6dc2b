//! HTTP mocking utilities using wiremock.

use serde::Serialize;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub use wiremock::ResponseTemplate as Reply;

/// HTTP mock server wrapper with convenience methods
pub struct TestHttpServer {
    server: MockServer,
}

impl TestHttpServer {
    /// Start a new mock server
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL with a trailing slash.
    pub fn url(&self) -> String {
        format!("{}/", self.server.uri())
    }

    /// Get URL for a specific path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.server.uri(), path.trim_start_matches('/'))
    }

    /// Access the underlying MockServer
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Register a GET endpoint that returns JSON
    pub async fn get_json<T: Serialize>(&self, endpoint: &str, response: &T) {
        self.respond_json("GET", endpoint, 200, response).await;
    }

    /// Register an endpoint that returns `response` as JSON with `status`.
    pub async fn respond_json<T: Serialize>(
        &self,
        verb: &str,
        endpoint: &str,
        status: u16,
        response: &T,
    ) {
        Mock::given(method(verb))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(status).set_body_json(response))
            .mount(&self.server)
            .await;
    }

    /// Register an endpoint with a raw body and explicit content type.
    /// `None` sends no `Content-Type` header at all.
    pub async fn respond_raw(
        &self,
        verb: &str,
        endpoint: &str,
        status: u16,
        content_type: Option<&str>,
        body: impl Into<Vec<u8>>,
    ) {
        let template = match content_type {
            Some(content_type) => ResponseTemplate::new(status).set_body_raw(body, content_type),
            None => ResponseTemplate::new(status).set_body_bytes(body),
        };

        Mock::given(method(verb))
            .and(path(endpoint))
            .respond_with(template)
            .mount(&self.server)
            .await;
    }

    /// Register a sequence of responses
    pub async fn sequence(&self, endpoint: &str, responses: Vec<ResponseTemplate>) {
        for (i, response) in responses.into_iter().enumerate() {
            Mock::given(path(endpoint))
                .respond_with(response)
                .up_to_n_times(1)
                .with_priority(100 - i as u8)
                .mount(&self.server)
                .await;
        }
    }

    /// Number of requests received for `endpoint`.
    pub async fn hits(&self, endpoint: &str) -> usize {
        self.received_requests()
            .await
            .iter()
            .filter(|r| r.url.path() == endpoint)
            .count()
    }

    /// Verify that a request was received
    pub async fn verify_received(&self, endpoint: &str, times: usize) {
        let count = self.hits(endpoint).await;
        assert_eq!(
            count, times,
            "Expected {} requests to {}, got {}",
            times, endpoint, count
        );
    }

    /// Get all received requests
    pub async fn received_requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Clear all mocks and recorded requests
    pub async fn reset(&self) {
        self.server.reset().await;
    }
}
