//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits so defaults can be expressed declaratively;
//! the values themselves come from the environment (see `env.rs`).

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EdgeConfig {
    /// Listener configuration (bind address, TLS, request timeout).
    pub listener: ListenerConfig,

    /// Route definitions mapping requests to handlers.
    pub routes: Vec<RouteConfig>,

    /// Decision service (redirect resolution + logging endpoint).
    pub decision: DecisionConfig,

    /// Origin used for fallback and media fallback fetches.
    pub origin: OriginConfig,

    /// Tag-container proxy gate settings.
    pub tag: TagProxyConfig,

    /// Cache TTL for cacheable responses.
    pub cache: CacheConfig,

    /// Originless endpoint settings (robots, geo, media).
    pub endpoints: EndpointsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
            request_timeout_secs: 30,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// The handler a route dispatches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Redirect resolution pipeline (catch-all).
    Redirect,
    /// Tag-container proxy gate.
    TagProxy,
    /// Originless geo JSON responder.
    Geo,
    /// Originless robots.txt responder.
    Robots,
    /// Image-engine media passthrough.
    Media,
}

/// Route configuration mapping requests to a handler.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Host header to match (exact match, case-insensitive).
    pub host: Option<String>,

    /// Path prefix to match.
    pub path_prefix: Option<String>,

    /// Path suffixes to match (any of, case-insensitive).
    pub path_suffixes: Option<Vec<String>>,

    /// Handler this route dispatches to.
    pub handler: HandlerKind,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,
}

/// Decision service configuration.
///
/// The same base URL and token serve both the `/get` resolution call and
/// the `/log` fire-and-forget reporting call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DecisionConfig {
    /// Base URL of the decision service.
    pub base_url: String,

    /// Account token, appended as a path segment.
    pub token: String,

    /// Hard deadline for the resolution call in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://proxy.redirection.io".to_string(),
            token: String::new(),
            timeout_ms: 2000,
        }
    }
}

/// Origin server used when the decision service yields no redirect.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Base URL the original request is replayed against.
    pub base_url: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
        }
    }
}

/// Tag-container proxy gate configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TagProxyConfig {
    /// Base URL of the tag-container upstream.
    pub upstream_url: String,

    /// Container IDs allowed through the gate.
    pub id_whitelist: Vec<String>,

    /// Methods the gate accepts.
    pub allowed_methods: Vec<String>,
}

impl Default for TagProxyConfig {
    fn default() -> Self {
        Self {
            upstream_url: "https://www.googletagmanager.com".to_string(),
            id_whitelist: vec!["GTM-XXXXXX".to_string()],
            allowed_methods: vec!["GET".to_string(), "HEAD".to_string()],
        }
    }
}

/// Cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL for cacheable responses in seconds.
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Originless endpoint settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EndpointsConfig {
    /// Sitemap URL advertised by robots.txt.
    pub sitemap_url: String,

    /// Image-engine host the media passthrough rewrites to.
    pub media_host: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            sitemap_url: "https://www.example.com/sitemap.xml".to_string(),
            media_host: "www.example.com.imgeng.in".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// The default route table.
///
/// Path-specific endpoints sit above the tag-proxy host route; the redirect
/// pipeline is the catch-all. Each entry stands in for what used to be a
/// separately deployed edge handler.
pub fn default_routes(tag_host: &str) -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "geo".to_string(),
            host: None,
            path_prefix: Some("/api/geoip".to_string()),
            path_suffixes: None,
            handler: HandlerKind::Geo,
            priority: 100,
        },
        RouteConfig {
            name: "robots".to_string(),
            host: None,
            path_prefix: Some("/robots.txt".to_string()),
            path_suffixes: None,
            handler: HandlerKind::Robots,
            priority: 90,
        },
        RouteConfig {
            name: "media".to_string(),
            host: None,
            path_prefix: None,
            path_suffixes: Some(
                [".gif", ".png", ".jpg", ".jpeg", ".webp", ".bmp", ".ico"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            handler: HandlerKind::Media,
            priority: 80,
        },
        RouteConfig {
            name: "tag-proxy".to_string(),
            host: Some(tag_host.to_string()),
            path_prefix: None,
            path_suffixes: None,
            handler: HandlerKind::TagProxy,
            priority: 50,
        },
        RouteConfig {
            name: "redirect".to_string(),
            host: None,
            path_prefix: None,
            path_suffixes: None,
            handler: HandlerKind::Redirect,
            priority: 0,
        },
    ]
}
