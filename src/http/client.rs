//! Outbound HTTP client capability.
//!
//! # Responsibilities
//! - Define the `HttpSend` seam every pipeline fetches through
//! - Provide the production `reqwest`-backed implementation
//! - Classify transport failures so callers can degrade gracefully
//!
//! # Design Decisions
//! - One shared client, no request-specific mutable state on it
//! - Pipelines never construct `reqwest` types; they speak in the small
//!   value types below, which keeps the seam trivially fakeable in tests

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};
use thiserror::Error;

/// Errors that can occur on an outbound fetch.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Could not connect to the remote host.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The transport-level timeout fired.
    #[error("request timed out")]
    Timeout,

    /// Any other transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// An outbound request, fully described by value.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Per-request deadline; `None` uses the client's own limits.
    pub timeout: Option<Duration>,
}

/// A fully buffered outbound response.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Capability for sending HTTP requests.
///
/// Injected into every pipeline so tests can substitute a fake.
#[async_trait]
pub trait HttpSend: Send + Sync {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, ClientError>;
}

/// Production client backed by a pooled `reqwest::Client`.
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Create a client with a connect timeout; read deadlines come per
    /// request or from the caller's own race.
    pub fn new(connect_timeout: Duration) -> Self {
        let inner = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { inner }
    }
}

#[async_trait]
impl HttpSend for ReqwestClient {
    async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, ClientError> {
        let mut builder = self
            .inner
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(deadline) = request.timeout {
            builder = builder.timeout(deadline);
        }

        let response = builder.send().await.map_err(classify)?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(classify)?;

        Ok(OutboundResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify(err: reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout
    } else if err.is_connect() {
        ClientError::Connect(err.to_string())
    } else {
        ClientError::Transport(err)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-crate fake for pipeline unit tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use super::*;

    /// Scripted `HttpSend`: responses are served FIFO and every request is
    /// recorded. An optional delay before each response makes timeout races
    /// testable; a future dropped mid-delay never consumes its response.
    #[derive(Default)]
    pub(crate) struct FakeClient {
        responses: Mutex<VecDeque<Result<OutboundResponse, ClientError>>>,
        calls: Mutex<Vec<OutboundRequest>>,
        delay: Option<Duration>,
    }

    impl FakeClient {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::default()
            }
        }

        pub(crate) fn push_response(&self, status: StatusCode, body: &str) {
            self.push(Ok(OutboundResponse {
                status,
                headers: HeaderMap::new(),
                body: Bytes::copy_from_slice(body.as_bytes()),
            }));
        }

        pub(crate) fn push(&self, result: Result<OutboundResponse, ClientError>) {
            self.responses.lock().unwrap().push_back(result);
        }

        pub(crate) fn calls(&self) -> Vec<OutboundRequest> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpSend for FakeClient {
        async fn send(&self, request: OutboundRequest) -> Result<OutboundResponse, ClientError> {
            self.calls.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Connect("no scripted response".into())))
        }
    }
}
