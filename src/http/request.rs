//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) via the request-id layer
//! - Derive the request-scoped `RequestContext` the pipelines consume
//! - Buffer the body so fallback forwarding can replay it
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The context is derived once and never mutated; pipelines build new
//!   values from it instead of touching the transport request

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use thiserror::Error;
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Bodies larger than this are rejected up front; the pipelines only ever
/// replay small CMS requests.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// The request body could not be buffered within [`MAX_BODY_BYTES`].
///
/// Replaying a truncated body against the origin would be silent data
/// loss, so the request is rejected instead.
#[derive(Debug, Error)]
#[error("request body exceeds {MAX_BODY_BYTES} bytes")]
pub struct BodyTooLarge;

/// UUID v4 request IDs for the `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Request-scoped view of an inbound request.
///
/// Created once per request and shared by reference; all derived values
/// (normalized paths, sanitized queries, log records) are built from it.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub scheme: String,
    pub host: String,
    pub path: String,
    /// Raw query string, without the leading `?`.
    pub raw_query: Option<String>,
    /// Decoded query pairs in arrival order.
    pub query: Vec<(String, String)>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RequestContext {
    /// Buffer the request and derive the context.
    ///
    /// `default_scheme` reflects how the listener terminates ("https" when
    /// TLS is configured); an `x-forwarded-proto` header from a trusted
    /// fronting layer overrides it. Fails when the body cannot be buffered
    /// within the size limit.
    pub async fn from_request(
        request: Request<Body>,
        default_scheme: &str,
    ) -> Result<Self, BodyTooLarge> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, MAX_BODY_BYTES)
            .await
            .map_err(|_| BodyTooLarge)?;

        let scheme = header_str(&parts.headers, "x-forwarded-proto")
            .map(|s| if s.contains("https") { "https" } else { "http" })
            .unwrap_or(default_scheme)
            .to_string();

        let host = header_str(&parts.headers, "host")
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_default();

        let raw_query = parts.uri.query().map(str::to_string);
        let query = raw_query
            .as_deref()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            method: parts.method,
            scheme,
            host,
            path: parts.uri.path().to_string(),
            raw_query,
            query,
            user_agent: header_str(&parts.headers, "user-agent").map(str::to_string),
            referer: header_str(&parts.headers, "referer").map(str::to_string),
            headers: parts.headers,
            body,
        })
    }

    /// Path plus query, as the origin expects to see it.
    pub fn path_and_query(&self) -> String {
        match &self.raw_query {
            Some(q) => format!("{}?{}", self.path, q),
            None => self.path.clone(),
        }
    }

    /// First query value for the given key, if present.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// True if the query carries the key at all, regardless of value.
    pub fn has_query_key(&self, key: &str) -> bool {
        self.query.iter().any(|(k, _)| k.eq_ignore_ascii_case(key))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
