//! Redirect resolution pipeline.
//!
//! # Responsibilities
//! - Short-circuit on normalizable URLs without any external call
//! - Consult the decision service under a hard deadline
//! - Fall back to a direct origin fetch on any failure
//!
//! # Design Decisions
//! - The timeout race drops the losing future, so an abandoned decision
//!   call is aborted rather than left running
//! - Fallback never surfaces an error; a dead origin degrades to 502, the
//!   only case where the client sees that the layer exists

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use axum::http::{Method, StatusCode};
use axum::response::Response;
use tokio::time::timeout;

use crate::config::schema::{DecisionConfig, OriginConfig};
use crate::http::client::{HttpSend, OutboundRequest};
use crate::http::request::RequestContext;
use crate::http::response;
use crate::normalize::normalize_path;
use crate::redirect::decision::{parse_decision, Decision, DecisionError, DecisionPayload};

/// User-agent sent on decision-service calls.
const SERVICE_USER_AGENT: &str = concat!("edgegate/", env!("CARGO_PKG_VERSION"));

/// What the resolver produced for one request.
pub struct RedirectOutcome {
    pub response: Response,
    /// Rule that matched, when the decision service made the call.
    pub rule_id: Option<String>,
}

/// The redirect-resolution pipeline.
pub struct RedirectResolver {
    client: Arc<dyn HttpSend>,
    decision: DecisionConfig,
    origin: OriginConfig,
    ttl_secs: u64,
}

impl RedirectResolver {
    pub fn new(
        client: Arc<dyn HttpSend>,
        decision: DecisionConfig,
        origin: OriginConfig,
        ttl_secs: u64,
    ) -> Self {
        Self {
            client,
            decision,
            origin,
            ttl_secs,
        }
    }

    /// Resolve one request. Always returns a response.
    pub async fn resolve(&self, ctx: &RequestContext) -> RedirectOutcome {
        // Cheapest and most certain redirect: the URL itself needs fixing.
        let normalized = normalize_path(&ctx.path);
        if normalized != ctx.path.as_str() {
            let location = match &ctx.raw_query {
                Some(q) => format!("{}://{}{}?{}", ctx.scheme, ctx.host, normalized, q),
                None => format!("{}://{}{}", ctx.scheme, ctx.host, normalized),
            };
            tracing::debug!(path = %ctx.path, location = %location, "path rewrite redirect");
            if let Some(response) = response::redirect(
                StatusCode::MOVED_PERMANENTLY,
                &location,
                &self.permanent_cache_control(),
                "rewrite",
            ) {
                return RedirectOutcome {
                    response,
                    rule_id: None,
                };
            }
        }

        match self.consult(ctx).await {
            Ok(Decision::Gone { rule_id }) => RedirectOutcome {
                response: response::empty(StatusCode::GONE),
                rule_id,
            },
            Ok(Decision::Redirect {
                status,
                location,
                rule_id,
            }) => {
                match response::redirect(
                    status,
                    &location,
                    &self.permanent_cache_control(),
                    "redirection",
                ) {
                    Some(response) => RedirectOutcome { response, rule_id },
                    // Location not representable as a header: same as malformed.
                    None => {
                        tracing::warn!(location = %location, "unusable decision location, serving origin");
                        self.fallback(ctx).await
                    }
                }
            }
            Ok(Decision::PassThrough) => self.fallback(ctx).await,
            Err(err) => {
                tracing::warn!(error = %err, host = %ctx.host, path = %ctx.path, "decision service unavailable, serving origin");
                self.fallback(ctx).await
            }
        }
    }

    /// POST the context to the decision service under the configured
    /// deadline. The in-flight call is dropped if the deadline wins.
    async fn consult(&self, ctx: &RequestContext) -> Result<Decision, DecisionError> {
        let payload = DecisionPayload::from_context(ctx);
        let body = serde_json::to_vec(&payload).map_err(|_| DecisionError::Malformed)?;

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(SERVICE_USER_AGENT));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request = OutboundRequest {
            method: Method::POST,
            url: format!(
                "{}/{}/get",
                self.decision.base_url.trim_end_matches('/'),
                self.decision.token
            ),
            headers,
            body: Some(body.into()),
            timeout: None,
        };

        let deadline = Duration::from_millis(self.decision.timeout_ms);
        let upstream = timeout(deadline, self.client.send(request))
            .await
            .map_err(|_| DecisionError::Timeout)??;

        if !upstream.status.is_success() {
            return Err(DecisionError::Status(upstream.status));
        }
        parse_decision(&upstream.body)
    }

    /// Replay the original request against the origin and return its
    /// response verbatim. Never raises; a dead origin becomes a 502.
    async fn fallback(&self, ctx: &RequestContext) -> RedirectOutcome {
        let mut headers = HeaderMap::new();
        for (name, value) in ctx.headers.iter() {
            let name_str = name.as_str();
            if name_str == "host"
                || name_str == "content-length"
                || response::is_hop_by_hop_header(name_str)
            {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        let request = OutboundRequest {
            method: ctx.method.clone(),
            url: format!(
                "{}{}",
                self.origin.base_url.trim_end_matches('/'),
                ctx.path_and_query()
            ),
            headers,
            body: (!ctx.body.is_empty()).then(|| ctx.body.clone()),
            timeout: None,
        };

        let response = match self.client.send(request).await {
            Ok(upstream) => response::from_outbound(upstream),
            Err(err) => {
                tracing::error!(error = %err, "origin fetch failed");
                response::plain_text(StatusCode::BAD_GATEWAY, "Upstream request failed")
            }
        };

        RedirectOutcome {
            response,
            rule_id: None,
        }
    }

    fn permanent_cache_control(&self) -> String {
        format!("max-age={}, must-revalidate", self.ttl_secs)
    }
}
