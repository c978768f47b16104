//! Guard evaluation for the tag-container proxy.
//!
//! # Responsibilities
//! - Enforce method, parameter-presence, and ID-whitelist guards
//! - Classify alternate-variant and debug requests
//! - Sanitize the query down to the tag-related allow-pattern
//!
//! # Design Decisions
//! - Pure: no IO, so every guard is unit-testable in isolation
//! - Rejections are values, not errors; the gate always answers

use crate::cache::{classify, CacheClass};
use crate::config::schema::TagProxyConfig;
use crate::http::request::RequestContext;

/// Query key whose presence marks a debug request.
const DEBUG_PARAM: &str = "gtm_debug";

/// Prefix shared by all tag-related query keys.
const TAG_PARAM_PREFIX: &str = "gtm_";

/// Query key carrying the container ID.
const ID_PARAM: &str = "id";

/// Why a request was turned away at the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    MethodNotAllowed,
    MissingParameters,
    IdNotWhitelisted,
}

/// A request that passed every guard, ready to forward.
#[derive(Debug, Clone)]
pub struct AllowedRequest {
    /// Path denotes the HTML-embeddable variant (`/ns.html` family).
    pub html_variant: bool,
    /// Debug parameter present.
    pub debug: bool,
    /// Query restricted to the allow-pattern, order preserved.
    pub query: Vec<(String, String)>,
    pub cache: CacheClass,
}

/// Outcome of the guard sequence.
#[derive(Debug, Clone)]
pub enum ProxyVerdict {
    Deny(Rejection),
    Allow(AllowedRequest),
}

/// Run the guard sequence and classify the request.
pub fn evaluate(ctx: &RequestContext, config: &TagProxyConfig, ttl_secs: u64) -> ProxyVerdict {
    if !config
        .allowed_methods
        .iter()
        .any(|m| m.eq_ignore_ascii_case(ctx.method.as_str()))
    {
        return ProxyVerdict::Deny(Rejection::MethodNotAllowed);
    }

    if ctx.query.is_empty() {
        return ProxyVerdict::Deny(Rejection::MissingParameters);
    }

    // Whitelist comparison is exact: GTM-XXXXXX1 is not GTM-XXXXXX.
    let whitelisted = ctx
        .query_value(ID_PARAM)
        .map(|id| config.id_whitelist.iter().any(|allowed| allowed == id))
        .unwrap_or(false);
    if !whitelisted {
        return ProxyVerdict::Deny(Rejection::IdNotWhitelisted);
    }

    let html_variant = is_variant_path(&ctx.path);
    let debug = ctx.has_query_key(DEBUG_PARAM);

    let query = ctx
        .query
        .iter()
        .filter(|(key, _)| is_allowed_param(key))
        .cloned()
        .collect();

    ProxyVerdict::Allow(AllowedRequest {
        html_variant,
        debug,
        query,
        cache: classify(html_variant, debug, ttl_secs),
    })
}

/// True for a single-segment path with an `.html` extension, e.g.
/// `/ns.html` or `/tag.html` but not `/a/b.html`.
fn is_variant_path(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    let lower = rest.to_ascii_lowercase();
    let Some(stem) = lower.strip_suffix(".html") else {
        return false;
    };
    !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// The allow-pattern: the literal `id` key plus anything tag-prefixed.
fn is_allowed_param(key: &str) -> bool {
    key.eq_ignore_ascii_case(ID_PARAM)
        || (key.len() >= TAG_PARAM_PREFIX.len()
            && key[..TAG_PARAM_PREFIX.len()].eq_ignore_ascii_case(TAG_PARAM_PREFIX))
}
