//! Test doubles for executor tests.

use crate::blocking::Sleeper;
use crate::error::TransportError;
use crate::headers::Headers;
use crate::transport::{AsyncTransport, RawResponse, Transport, TransportRequest};
use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A 200 reply carrying `body` as JSON.
pub(crate) fn ok_json(url: &str, body: Value) -> RawResponse {
    reply(url, 200, Some("application/json"), body.to_string())
}

pub(crate) fn reply(
    url: &str,
    status: u16,
    content_type: Option<&str>,
    body: impl Into<Bytes>,
) -> RawResponse {
    let mut headers = Headers::new();
    if let Some(content_type) = content_type {
        headers.insert("content-type".to_string(), content_type.to_string());
    }
    RawResponse {
        url: url.to_string(),
        status,
        headers,
        body: body.into(),
    }
}

pub(crate) fn connect_error() -> TransportError {
    TransportError::Connect("connection refused".to_string())
}

#[derive(Default)]
struct Script {
    replies: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
    sent: Mutex<Vec<TransportRequest>>,
    calls: AtomicUsize,
    closes: AtomicUsize,
}

/// Transport that plays back queued outcomes and records what it was sent.
///
/// Clones share state, so a test can keep one handle while the executor
/// owns another. Once the queue runs dry every call fails to connect.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Script>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn then(self, outcome: Result<RawResponse, TransportError>) -> Self {
        self.script
            .replies
            .lock()
            .expect("script lock")
            .push_back(outcome);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.script.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.script.closes.load(Ordering::SeqCst)
    }

    pub(crate) fn sent(&self) -> Vec<TransportRequest> {
        self.script.sent.lock().expect("sent lock").clone()
    }

    fn next(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .sent
            .lock()
            .expect("sent lock")
            .push(request.clone());
        self.script
            .replies
            .lock()
            .expect("script lock")
            .pop_front()
            .unwrap_or_else(|| Err(connect_error()))
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        self.next(request)
    }

    fn close(&self) {
        self.script.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl AsyncTransport for ScriptedTransport {
    async fn send(&self, request: &TransportRequest) -> Result<RawResponse, TransportError> {
        self.next(request)
    }

    fn close(&self) {
        self.script.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sleeper that records requested waits instead of blocking.
#[derive(Clone, Default)]
pub(crate) struct RecordingSleeper {
    waits: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits.lock().expect("waits lock").clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().expect("waits lock").push(duration);
    }
}
