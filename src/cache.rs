//! Cache classification policy.
//!
//! # Responsibilities
//! - Map request attributes to a cache class, once per request
//! - Define the `cache-control` value each class puts on responses
//!
//! # Design Decisions
//! - Pure: classification never looks at anything but its inputs
//! - Debug and alternate-variant responses are never cached; callers must
//!   attach a cache-busting token when forwarding a `Bypass` request so
//!   shared caches cannot coalesce it

/// How a response may be cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheClass {
    /// Cache for `ttl_secs`, then revalidate.
    Cacheable { ttl_secs: u64 },
    /// Do not cache; no cache-busting required.
    NoCache,
    /// Do not cache, and defeat shared caches with a busting token.
    Bypass,
}

/// Classify a request.
///
/// Alternate-variant (HTML-embeddable) and debug requests bypass caching
/// entirely; everything else is cacheable with the configured TTL.
pub fn classify(html_variant: bool, debug: bool, ttl_secs: u64) -> CacheClass {
    if html_variant || debug {
        CacheClass::Bypass
    } else {
        CacheClass::Cacheable { ttl_secs }
    }
}

impl CacheClass {
    /// The `cache-control` value to set on the client response, if any.
    ///
    /// `Bypass` returns `None`: whatever the upstream sent is passed through
    /// untouched, since the busting token already makes the URL unique.
    pub fn response_cache_control(&self) -> Option<String> {
        match self {
            CacheClass::Cacheable { ttl_secs } => {
                Some(format!("max-age={ttl_secs}, must-revalidate"))
            }
            CacheClass::NoCache => Some("private, no-cache".to_string()),
            CacheClass::Bypass => None,
        }
    }

    /// The `cache-control` value to send with the upstream fetch.
    pub fn request_cache_control(&self) -> String {
        match self {
            CacheClass::Cacheable { ttl_secs } => format!("max-age={ttl_secs}"),
            CacheClass::NoCache | CacheClass::Bypass => "no-cache".to_string(),
        }
    }

    /// Effective TTL in seconds (0 for anything uncacheable).
    pub fn ttl_secs(&self) -> u64 {
        match self {
            CacheClass::Cacheable { ttl_secs } => *ttl_secs,
            _ => 0,
        }
    }

    /// True when the caller must append a cache-busting token.
    pub fn needs_cache_bust(&self) -> bool {
        matches!(self, CacheClass::Bypass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_request_is_cacheable() {
        let class = classify(false, false, 300);
        assert_eq!(class, CacheClass::Cacheable { ttl_secs: 300 });
        assert_eq!(class.ttl_secs(), 300);
        assert!(!class.needs_cache_bust());
    }

    #[test]
    fn test_variant_and_debug_bypass() {
        assert_eq!(classify(true, false, 300), CacheClass::Bypass);
        assert_eq!(classify(false, true, 300), CacheClass::Bypass);
        assert_eq!(classify(true, true, 300), CacheClass::Bypass);
        assert!(classify(true, false, 300).needs_cache_bust());
        assert_eq!(classify(true, false, 300).ttl_secs(), 0);
    }

    #[test]
    fn test_response_cache_control_values() {
        assert_eq!(
            classify(false, false, 300).response_cache_control().unwrap(),
            "max-age=300, must-revalidate"
        );
        assert_eq!(
            CacheClass::NoCache.response_cache_control().unwrap(),
            "private, no-cache"
        );
        assert!(CacheClass::Bypass.response_cache_control().is_none());
    }

    #[test]
    fn test_request_cache_control_values() {
        assert_eq!(classify(false, false, 60).request_cache_control(), "max-age=60");
        assert_eq!(CacheClass::Bypass.request_cache_control(), "no-cache");
    }
}
