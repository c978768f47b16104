//! Decision-service wire contract.
//!
//! # Responsibilities
//! - Serialize the resolution payload
//! - Parse and validate the service's JSON answer into a `Decision`
//!
//! # Design Decisions
//! - Validation is an explicit step: any deviation from the contract is a
//!   `DecisionError::Malformed`, never an unstructured parse panic
//! - Unsupported status codes become `PassThrough`; an ambiguous decision
//!   must never propagate an invalid status to the client

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::client::ClientError;
use crate::http::request::RequestContext;

/// Errors in the decision-service consultation.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// The configured deadline elapsed before the service answered.
    #[error("decision service timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("decision service returned {0}")]
    Status(StatusCode),

    /// The body did not match the wire contract.
    #[error("malformed decision response")]
    Malformed,

    /// Transport-level failure.
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Payload POSTed to the decision service.
#[derive(Debug, Serialize)]
pub struct DecisionPayload<'a> {
    pub host: &'a str,
    pub request_uri: &'a str,
    pub user_agent: Option<&'a str>,
    pub referer: Option<&'a str>,
    pub scheme: &'a str,
    pub use_json: bool,
}

impl<'a> DecisionPayload<'a> {
    pub fn from_context(ctx: &'a RequestContext) -> Self {
        Self {
            host: &ctx.host,
            request_uri: &ctx.path,
            user_agent: ctx.user_agent.as_deref(),
            referer: ctx.referer.as_deref(),
            scheme: &ctx.scheme,
            use_json: true,
        }
    }
}

/// What the decision service told us to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The resource is gone; answer 410.
    Gone { rule_id: Option<String> },
    /// Redirect with 301 or 308.
    Redirect {
        status: StatusCode,
        location: String,
        rule_id: Option<String>,
    },
    /// No usable decision; serve the original request.
    PassThrough,
}

#[derive(Debug, Deserialize)]
struct RawDecision {
    status_code: Option<u16>,
    location: Option<String>,
    matched_rule: Option<MatchedRule>,
}

#[derive(Debug, Deserialize)]
struct MatchedRule {
    id: String,
}

/// Parse a decision-service body.
///
/// 410 maps to `Gone`; 301/308 require a location; every other status is
/// `PassThrough`. Anything unparseable, or a redirect status without a
/// location, is `Malformed`.
pub fn parse_decision(body: &[u8]) -> Result<Decision, DecisionError> {
    let raw: RawDecision = serde_json::from_slice(body).map_err(|_| DecisionError::Malformed)?;
    let rule_id = raw.matched_rule.map(|r| r.id);

    match raw.status_code {
        Some(410) => Ok(Decision::Gone { rule_id }),
        Some(code @ (301 | 308)) => match raw.location {
            Some(location) if !location.is_empty() => Ok(Decision::Redirect {
                status: StatusCode::from_u16(code).map_err(|_| DecisionError::Malformed)?,
                location,
                rule_id,
            }),
            _ => Err(DecisionError::Malformed),
        },
        _ => Ok(Decision::PassThrough),
    }
}
