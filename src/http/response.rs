//! Response construction helpers.
//!
//! # Responsibilities
//! - Build the small terminal responses the pipelines emit (rejections,
//!   empty redirects, gone)
//! - Convert buffered upstream responses into client responses
//! - Strip hop-by-hop headers when crossing a proxy boundary
//!
//! # Design Decisions
//! - Responses are always built as fresh header sets; nothing is cloned
//!   from an inbound or upstream message and then stripped

use axum::body::Body;
use axum::http::header::{HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use axum::http::StatusCode;
use axum::response::Response;

use crate::http::client::OutboundResponse;

/// Marker header identifying which redirect branch produced a response.
pub const X_REDIRECT_HANDLER: &str = "x-redirect-handler";

/// Marker header on originless responses.
pub const X_GENERATOR: &str = "x-generator";

const HOP_BY_HOP_HEADERS: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// True for headers that must not cross a proxy hop.
pub fn is_hop_by_hop_header(name: &str) -> bool {
    HOP_BY_HOP_HEADERS
        .iter()
        .any(|h| name.eq_ignore_ascii_case(h))
}

/// Plain-text response with the given status.
pub fn plain_text(status: StatusCode, message: &str) -> Response {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain")
        .body(Body::from(message.to_string()))
        .unwrap_or_default()
}

/// 405 response enumerating the permitted methods.
pub fn method_not_allowed(method: &str, allowed: &[String]) -> Response {
    Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(CONTENT_TYPE, "text/plain")
        .header(ALLOW, allowed.join(", "))
        .body(Body::from(format!("Method {method} not allowed.")))
        .unwrap_or_default()
}

/// Empty redirect response with cache-control and a handler marker.
///
/// Returns `None` when the location is not a valid header value; the
/// caller treats that the same as a malformed decision.
pub fn redirect(status: StatusCode, location: &str, cache_control: &str, marker: &str) -> Option<Response> {
    let location = HeaderValue::from_str(location).ok()?;
    Response::builder()
        .status(status)
        .header(LOCATION, location)
        .header(CACHE_CONTROL, cache_control)
        .header(X_REDIRECT_HANDLER, marker)
        .body(Body::empty())
        .ok()
}

/// Empty response with just a status (410 gone).
pub fn empty(status: StatusCode) -> Response {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .unwrap_or_default()
}

/// Convert a buffered upstream response, dropping hop-by-hop headers.
pub fn from_outbound(upstream: OutboundResponse) -> Response {
    let mut builder = Response::builder().status(upstream.status);
    if let Some(headers) = builder.headers_mut() {
        for (name, value) in upstream.headers.iter() {
            if !is_hop_by_hop_header(name.as_str()) {
                headers.append(name.clone(), value.clone());
            }
        }
        headers.remove(CONTENT_LENGTH);
    }
    builder
        .body(Body::from(upstream.body))
        .unwrap_or_default()
}
