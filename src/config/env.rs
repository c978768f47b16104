//! Configuration loading from the environment.
//!
//! Every value starts from the schema default and is overridden by its
//! `EDGEGATE_*` variable when set. Loading and semantic validation are
//! separate steps so tests can construct configs directly.

use std::env;

use thiserror::Error;

use crate::config::schema::{default_routes, EdgeConfig, TlsConfig};

/// Listener
pub const BIND_ADDRESS: &str = "EDGEGATE_BIND_ADDRESS";
pub const TLS_CERT: &str = "EDGEGATE_TLS_CERT";
pub const TLS_KEY: &str = "EDGEGATE_TLS_KEY";
pub const REQUEST_TIMEOUT_SECS: &str = "EDGEGATE_REQUEST_TIMEOUT_SECS";

/// Decision service
pub const DECISION_URL: &str = "EDGEGATE_DECISION_URL";
pub const DECISION_TOKEN: &str = "EDGEGATE_DECISION_TOKEN";
pub const DECISION_TIMEOUT_MS: &str = "EDGEGATE_DECISION_TIMEOUT_MS";

/// Origin and upstreams
pub const ORIGIN_URL: &str = "EDGEGATE_ORIGIN_URL";
pub const TAG_UPSTREAM_URL: &str = "EDGEGATE_TAG_UPSTREAM_URL";
pub const TAG_HOST: &str = "EDGEGATE_TAG_HOST";
pub const TAG_ID_WHITELIST: &str = "EDGEGATE_TAG_ID_WHITELIST";
pub const TAG_ALLOWED_METHODS: &str = "EDGEGATE_TAG_ALLOWED_METHODS";

/// Caching and endpoints
pub const CACHE_TTL_SECS: &str = "EDGEGATE_CACHE_TTL_SECS";
pub const SITEMAP_URL: &str = "EDGEGATE_SITEMAP_URL";
pub const MEDIA_HOST: &str = "EDGEGATE_MEDIA_HOST";

/// Observability
pub const LOG_LEVEL: &str = "EDGEGATE_LOG_LEVEL";
pub const METRICS_ENABLED: &str = "EDGEGATE_METRICS_ENABLED";
pub const METRICS_ADDRESS: &str = "EDGEGATE_METRICS_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable was absent or empty.
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    /// A variable was present but could not be parsed.
    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },
}

/// Load configuration from the environment and validate it.
pub fn load_from_env() -> Result<EdgeConfig, ConfigError> {
    let mut config = EdgeConfig::default();

    if let Some(v) = var(BIND_ADDRESS) {
        config.listener.bind_address = v;
    }
    match (var(TLS_CERT), var(TLS_KEY)) {
        (Some(cert_path), Some(key_path)) => {
            config.listener.tls = Some(TlsConfig { cert_path, key_path });
        }
        (None, None) => {}
        (Some(_), None) => {
            return Err(ConfigError::InvalidVar {
                name: TLS_KEY,
                reason: format!("{TLS_CERT} is set but {TLS_KEY} is not"),
            });
        }
        (None, Some(_)) => {
            return Err(ConfigError::InvalidVar {
                name: TLS_CERT,
                reason: format!("{TLS_KEY} is set but {TLS_CERT} is not"),
            });
        }
    }
    if let Some(v) = var(REQUEST_TIMEOUT_SECS) {
        config.listener.request_timeout_secs = parse_u64(REQUEST_TIMEOUT_SECS, &v)?;
    }

    if let Some(v) = var(DECISION_URL) {
        config.decision.base_url = v;
    }
    if let Some(v) = var(DECISION_TOKEN) {
        config.decision.token = v;
    }
    if let Some(v) = var(DECISION_TIMEOUT_MS) {
        config.decision.timeout_ms = parse_u64(DECISION_TIMEOUT_MS, &v)?;
    }

    if let Some(v) = var(ORIGIN_URL) {
        config.origin.base_url = v;
    }
    if let Some(v) = var(TAG_UPSTREAM_URL) {
        config.tag.upstream_url = v;
    }
    if let Some(v) = var(TAG_ID_WHITELIST) {
        config.tag.id_whitelist = parse_list(&v);
    }
    if let Some(v) = var(TAG_ALLOWED_METHODS) {
        config.tag.allowed_methods = parse_list(&v)
            .into_iter()
            .map(|m| m.to_ascii_uppercase())
            .collect();
    }

    if let Some(v) = var(CACHE_TTL_SECS) {
        config.cache.ttl_secs = parse_u64(CACHE_TTL_SECS, &v)?;
    }
    if let Some(v) = var(SITEMAP_URL) {
        config.endpoints.sitemap_url = v;
    }
    if let Some(v) = var(MEDIA_HOST) {
        config.endpoints.media_host = v;
    }

    if let Some(v) = var(LOG_LEVEL) {
        config.observability.log_level = v;
    }
    if let Some(v) = var(METRICS_ENABLED) {
        config.observability.metrics_enabled = parse_bool(METRICS_ENABLED, &v)?;
    }
    if let Some(v) = var(METRICS_ADDRESS) {
        config.observability.metrics_address = v;
    }

    // The route table is compiled in code; the environment only picks the
    // host that dispatches to the tag proxy (one route per former handler
    // deployment).
    let tag_host = var(TAG_HOST).unwrap_or_else(|| "tags.example.com".to_string());
    config.routes = default_routes(&tag_host);

    validate(&config)?;
    Ok(config)
}

/// Semantic checks that serde defaults cannot express.
pub fn validate(config: &EdgeConfig) -> Result<(), ConfigError> {
    if config.decision.token.is_empty() {
        return Err(ConfigError::MissingVar(DECISION_TOKEN));
    }
    if config.decision.timeout_ms == 0 {
        return Err(ConfigError::InvalidVar {
            name: DECISION_TIMEOUT_MS,
            reason: "timeout must be greater than zero".to_string(),
        });
    }
    if config.tag.id_whitelist.is_empty() {
        return Err(ConfigError::MissingVar(TAG_ID_WHITELIST));
    }
    if config.tag.allowed_methods.is_empty() {
        return Err(ConfigError::MissingVar(TAG_ALLOWED_METHODS));
    }
    Ok(())
}

fn var(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_u64(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidVar {
        name,
        reason: format!("expected an integer, got {value:?}"),
    })
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidVar {
            name,
            reason: format!("expected a boolean, got {value:?}"),
        }),
    }
}

/// Split a comma-separated list, trimming whitespace and dropping empties.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("GTM-AAAAAA, GTM-BBBBBB ,,GTM-CCCCCC"),
            vec!["GTM-AAAAAA", "GTM-BBBBBB", "GTM-CCCCCC"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool(METRICS_ENABLED, "true").unwrap());
        assert!(parse_bool(METRICS_ENABLED, "1").unwrap());
        assert!(!parse_bool(METRICS_ENABLED, "no").unwrap());
        assert!(parse_bool(METRICS_ENABLED, "maybe").is_err());
    }

    #[test]
    fn test_parse_u64_rejects_garbage() {
        assert_eq!(parse_u64(CACHE_TTL_SECS, "300").unwrap(), 300);
        assert!(parse_u64(CACHE_TTL_SECS, "fast").is_err());
    }

    #[test]
    fn test_validate_requires_token() {
        let mut config = EdgeConfig::default();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingVar(DECISION_TOKEN))
        ));

        config.decision.token = "tok".to_string();
        assert!(validate(&config).is_ok());

        config.decision.timeout_ms = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_requires_whitelist() {
        let mut config = EdgeConfig::default();
        config.decision.token = "tok".to_string();
        config.tag.id_whitelist.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingVar(TAG_ID_WHITELIST))
        ));
    }
}
