//! Originless responders: geo lookup and robots.txt.
//!
//! Fixed bodies assembled entirely at the edge; no upstream is consulted
//! and no decision logic runs. Both answers are marked uncacheable so
//! fronting caches never pin a stale body.

use axum::body::Body;
use axum::http::header::{HeaderValue, CACHE_CONTROL, CONTENT_TYPE, EXPIRES, PRAGMA, VARY};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use serde::Serialize;

use crate::http::request::RequestContext;
use crate::http::response::{self, X_GENERATOR};

const NO_STORE: &str = "private, no-cache, no-store, must-revalidate";

/// Geo answer derived from the fronting platform's headers.
#[derive(Debug, Serialize)]
struct GeoAnswer<'a> {
    ip: Option<&'a str>,
    country: Option<&'a str>,
}

/// JSON `{ip, country}` from the platform headers. GET/POST only.
pub fn geo(ctx: &RequestContext) -> Response {
    if ctx.method != Method::GET && ctx.method != Method::POST {
        return response::method_not_allowed(
            ctx.method.as_str(),
            &["GET".to_string(), "POST".to_string()],
        );
    }

    let answer = GeoAnswer {
        ip: header_str(ctx, "cf-connecting-ip"),
        country: header_str(ctx, "cf-ipcountry"),
    };
    let body = serde_json::to_string(&answer).unwrap_or_else(|_| "{}".to_string());

    let mut response = base_no_store(StatusCode::OK, Body::from(body));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(VARY, HeaderValue::from_static("Origin"));
    response
}

/// Plaintext robots.txt advertising the configured sitemap.
pub fn robots(sitemap_url: &str) -> Response {
    let body = format!("User-agent: *\nDisallow: \nSitemap: {sitemap_url}");
    let mut response = base_no_store(StatusCode::OK, Body::from(body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

fn base_no_store(status: StatusCode, body: Body) -> Response {
    let mut builder = Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        headers.insert(CACHE_CONTROL, HeaderValue::from_static(NO_STORE));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(EXPIRES, HeaderValue::from_static("0"));
        headers.insert(X_GENERATOR, HeaderValue::from_static("edgegate"));
    }
    builder.body(body).unwrap_or_default()
}

fn header_str<'a>(ctx: &'a RequestContext, name: &str) -> Option<&'a str> {
    ctx.headers.get(name).and_then(|v| v.to_str().ok())
}
