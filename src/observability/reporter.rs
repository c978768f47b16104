//! Fire-and-forget decision logging.
//!
//! # Responsibilities
//! - Build the `LogRecord` describing a finished request and its outcome
//! - Deliver it to the decision service's log endpoint on a detached task
//!
//! # Design Decisions
//! - At-most-once, best effort: every failure (serialization, network,
//!   non-2xx) is swallowed and surfaces only as a debug-level trace
//! - Never on the critical path; the response has already been computed
//!   when the task is spawned

use std::sync::Arc;

use axum::http::header::{HeaderMap, HeaderValue, CONTENT_TYPE, LOCATION, USER_AGENT};
use axum::http::Method;
use axum::response::Response;
use serde::Serialize;

use crate::config::schema::DecisionConfig;
use crate::http::client::{HttpSend, OutboundRequest};
use crate::http::request::RequestContext;

const REPORTER_USER_AGENT: &str = concat!("edgegate/", env!("CARGO_PKG_VERSION"));

/// Structured record of one request and the decision taken.
///
/// Created after the decision is final; never mutated; discarded after the
/// delivery attempt.
#[derive(Debug, Serialize)]
pub struct LogRecord {
    pub status_code: u16,
    pub host: String,
    pub method: String,
    pub request_uri: String,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub scheme: String,
    pub use_json: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
}

impl LogRecord {
    /// Describe a finished exchange. The target is the `Location` the
    /// client was sent to, when there is one.
    pub fn from_exchange(ctx: &RequestContext, response: &Response, rule_id: Option<String>) -> Self {
        let target = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        Self {
            status_code: response.status().as_u16(),
            host: ctx.host.clone(),
            method: ctx.method.to_string(),
            request_uri: ctx.path.clone(),
            user_agent: ctx.user_agent.clone(),
            referer: ctx.referer.clone(),
            scheme: ctx.scheme.clone(),
            use_json: true,
            target,
            rule_id,
        }
    }
}

/// Deliver a record on a detached task. Returns immediately.
pub fn report(client: Arc<dyn HttpSend>, decision: &DecisionConfig, record: LogRecord) {
    let url = format!(
        "{}/{}/log",
        decision.base_url.trim_end_matches('/'),
        decision.token
    );

    tokio::spawn(async move {
        let body = match serde_json::to_vec(&record) {
            Ok(body) => body,
            Err(e) => {
                tracing::debug!(error = %e, "could not serialize log record");
                return;
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(REPORTER_USER_AGENT));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let request = OutboundRequest {
            method: Method::POST,
            url,
            headers,
            body: Some(body.into()),
            timeout: None,
        };

        match client.send(request).await {
            Ok(response) if !response.status.is_success() => {
                tracing::debug!(status = %response.status, "decision log rejected");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, "decision log delivery failed");
            }
        }
    });
}
