//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Compile route configs into matchers at startup
//! - Look up the matching handler for a request
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan over priority-ordered routes (route counts are tiny)
//! - Explicit no-match rather than silent default; the catch-all redirect
//!   route is itself an ordinary table entry

use axum::body::Body;
use axum::http::Request;

use crate::config::schema::{HandlerKind, RouteConfig};
use crate::routing::matcher::{
    AndMatcher, HostMatcher, Matcher, PathPrefixMatcher, PathSuffixMatcher,
};

/// A route compiled from configuration.
#[derive(Debug)]
pub struct CompiledRoute {
    /// Route identifier for logging/metrics.
    pub name: String,
    /// Handler this route dispatches to.
    pub handler: HandlerKind,
    matcher: AndMatcher,
    priority: u32,
}

/// Immutable route table, highest priority first.
#[derive(Debug)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile the configured routes. Sort order is fixed at startup.
    pub fn from_config(configs: Vec<RouteConfig>) -> Self {
        let mut routes: Vec<CompiledRoute> = configs
            .into_iter()
            .map(|config| {
                let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
                if let Some(host) = &config.host {
                    matchers.push(Box::new(HostMatcher::new(host.clone())));
                }
                if let Some(prefix) = &config.path_prefix {
                    matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
                }
                if let Some(suffixes) = &config.path_suffixes {
                    matchers.push(Box::new(PathSuffixMatcher::new(suffixes.clone())));
                }
                CompiledRoute {
                    name: config.name,
                    handler: config.handler,
                    matcher: AndMatcher::new(matchers),
                    priority: config.priority,
                }
            })
            .collect();

        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { routes }
    }

    /// Find the first route matching the request, highest priority first.
    pub fn match_request(&self, req: &Request<Body>) -> Option<&CompiledRoute> {
        self.routes.iter().find(|route| route.matcher.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::default_routes;

    fn request(host: &str, path: &str) -> Request<Body> {
        Request::builder()
            .uri(format!("http://{host}{path}"))
            .header("host", host)
            .body(Body::default())
            .unwrap()
    }

    #[test]
    fn test_default_table_dispatch() {
        let table = RouteTable::from_config(default_routes("tags.example.com"));

        let geo = table.match_request(&request("www.example.com", "/api/geoip")).unwrap();
        assert_eq!(geo.handler, HandlerKind::Geo);

        let robots = table.match_request(&request("www.example.com", "/robots.txt")).unwrap();
        assert_eq!(robots.handler, HandlerKind::Robots);

        let media = table
            .match_request(&request("www.example.com", "/media/Logo.png"))
            .unwrap();
        assert_eq!(media.handler, HandlerKind::Media);

        let tag = table.match_request(&request("tags.example.com", "/gtm.js")).unwrap();
        assert_eq!(tag.handler, HandlerKind::TagProxy);

        // Everything else falls through to the redirect pipeline.
        let other = table.match_request(&request("www.example.com", "/About-Us/")).unwrap();
        assert_eq!(other.handler, HandlerKind::Redirect);
    }

    #[test]
    fn test_priority_order_wins() {
        // A media extension on the tag host still goes to media: higher priority.
        let table = RouteTable::from_config(default_routes("tags.example.com"));
        let route = table
            .match_request(&request("tags.example.com", "/pixel.gif"))
            .unwrap();
        assert_eq!(route.handler, HandlerKind::Media);
    }

    #[test]
    fn test_empty_table_has_no_match() {
        let table = RouteTable::from_config(vec![]);
        assert!(table.match_request(&request("a.com", "/")).is_none());
    }
}
