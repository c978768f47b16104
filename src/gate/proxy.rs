//! Tag-container proxy gate.
//!
//! # Responsibilities
//! - Turn rejections into terminal 403/405 responses
//! - Forward allowed requests to the fixed tag upstream
//! - Rewrite the upstream response: content-type fix, header strip list,
//!   variant cross-origin policy, cache overrides
//!
//! # Design Decisions
//! - Forward and response header sets are built fresh; retained entries are
//!   copied in, nothing is cloned and then stripped
//! - The gate never raises: upstream transport failure is a 502

use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{
    HeaderMap, HeaderValue, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE, COOKIE, EXPIRES, HOST,
    PRAGMA, REFERER, VARY,
};
use axum::http::StatusCode;
use axum::response::Response;

use crate::cache::CacheClass;
use crate::config::schema::TagProxyConfig;
use crate::http::client::{HttpSend, OutboundRequest};
use crate::http::request::RequestContext;
use crate::http::response::{self, is_hop_by_hop_header};
use crate::gate::verdict::{evaluate, AllowedRequest, ProxyVerdict, Rejection};

/// Upstream path served for the HTML-embeddable variant.
const VARIANT_PATH: &str = "/ns.html";

/// Upstream path served for everything else.
const SCRIPT_PATH: &str = "/gtm.js";

/// Response headers that leak platform or CORS details; always dropped.
const STRIPPED_RESPONSE_HEADERS: &[&str] = &[
    "alt-svc",
    "access-control-allow-credentials",
    "access-control-allow-headers",
    "access-control-allow-origin",
    "cross-origin-resource-policy",
    "strict-transport-security",
    "x-xss-protection",
];

/// The upstream-proxy gate.
pub struct TagProxy {
    client: Arc<dyn HttpSend>,
    config: TagProxyConfig,
    ttl_secs: u64,
}

impl TagProxy {
    pub fn new(client: Arc<dyn HttpSend>, config: TagProxyConfig, ttl_secs: u64) -> Self {
        Self {
            client,
            config,
            ttl_secs,
        }
    }

    /// Gate one request. Always returns a response; never raises.
    pub async fn proxy(&self, ctx: &RequestContext) -> Response {
        let allowed = match evaluate(ctx, &self.config, self.ttl_secs) {
            ProxyVerdict::Deny(Rejection::MethodNotAllowed) => {
                return response::method_not_allowed(
                    ctx.method.as_str(),
                    &self.config.allowed_methods,
                );
            }
            ProxyVerdict::Deny(Rejection::MissingParameters) => {
                return response::plain_text(StatusCode::FORBIDDEN, "Missing URL query parameters");
            }
            ProxyVerdict::Deny(Rejection::IdNotWhitelisted) => {
                return response::plain_text(
                    StatusCode::FORBIDDEN,
                    "Missing whitelisted ID as URL query parameter: id",
                );
            }
            ProxyVerdict::Allow(allowed) => allowed,
        };

        let request = self.build_upstream_request(ctx, &allowed);
        tracing::debug!(url = %request.url, variant = allowed.html_variant, "forwarding to tag upstream");

        match self.client.send(request).await {
            Ok(upstream) => self.rewrite_response(upstream, &allowed),
            Err(err) => {
                tracing::error!(error = %err, "tag upstream fetch failed");
                response::plain_text(StatusCode::BAD_GATEWAY, "Upstream request failed")
            }
        }
    }

    fn build_upstream_request(&self, ctx: &RequestContext, allowed: &AllowedRequest) -> OutboundRequest {
        let path = if allowed.html_variant {
            VARIANT_PATH
        } else {
            SCRIPT_PATH
        };

        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in &allowed.query {
            serializer.append_pair(key, value);
        }
        if allowed.cache.needs_cache_bust() {
            serializer.append_pair("rand", &cache_bust_token());
        }
        let query = serializer.finish();

        let url = format!(
            "{}{}?{}",
            self.config.upstream_url.trim_end_matches('/'),
            path,
            query
        );

        // Fresh header set: keep what the upstream needs, never the
        // browsing context (cookie/referer) or hop-by-hop entries.
        let mut headers = HeaderMap::new();
        for (name, value) in ctx.headers.iter() {
            if name == COOKIE || name == REFERER || name == HOST || name == CONTENT_LENGTH {
                continue;
            }
            if is_hop_by_hop_header(name.as_str()) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
        if let Ok(value) = HeaderValue::from_str(&allowed.cache.request_cache_control()) {
            headers.insert(CACHE_CONTROL, value);
        }

        OutboundRequest {
            method: ctx.method.clone(),
            url,
            headers,
            body: None,
            timeout: None,
        }
    }

    fn rewrite_response(
        &self,
        upstream: crate::http::client::OutboundResponse,
        allowed: &AllowedRequest,
    ) -> Response {
        let cacheable = matches!(allowed.cache, CacheClass::Cacheable { .. });

        let mut headers = HeaderMap::new();
        for (name, value) in upstream.headers.iter() {
            let name_str = name.as_str();
            if is_hop_by_hop_header(name_str) || name == CONTENT_LENGTH {
                continue;
            }
            if STRIPPED_RESPONSE_HEADERS
                .iter()
                .any(|h| name_str.eq_ignore_ascii_case(h))
            {
                continue;
            }
            // Stale caching headers inherited from upstream make no sense
            // once we set our own policy.
            if cacheable && (name == CACHE_CONTROL || name == EXPIRES || name == PRAGMA || name == VARY) {
                continue;
            }
            if name == CONTENT_TYPE && is_legacy_javascript(value) {
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/javascript; charset=utf-8"),
                );
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        if allowed.html_variant {
            headers.insert(
                "cross-origin-resource-policy",
                HeaderValue::from_static("same-site"),
            );
        }
        if cacheable {
            if let Some(cache_control) = allowed.cache.response_cache_control() {
                if let Ok(value) = HeaderValue::from_str(&cache_control) {
                    headers.insert(CACHE_CONTROL, value);
                }
            }
            headers.insert(VARY, HeaderValue::from_static("Accept-Encoding"));
        }

        let mut builder = Response::builder().status(upstream.status);
        if let Some(response_headers) = builder.headers_mut() {
            *response_headers = headers;
        }
        builder.body(Body::from(upstream.body)).unwrap_or_default()
    }
}

/// The legacy MIME value corrected per RFC 9239.
fn is_legacy_javascript(value: &HeaderValue) -> bool {
    value
        .to_str()
        .map(|v| v.to_ascii_lowercase().contains("application/javascript"))
        .unwrap_or(false)
}

/// Random alphanumeric token appended to bypassed fetches.
fn cache_bust_token() -> String {
    std::iter::repeat_with(fastrand::alphanumeric).take(10).collect()
}
