//! Upstream proxy gate for tag-container traffic.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → verdict.rs (method / parameters / whitelist guards, pure)
//!     → Deny → terminal 403/405
//!     → Allow → proxy.rs (sanitized forward to fixed upstream)
//!     → response rewrite (content-type, strip list, cache overrides)
//! ```
//!
//! # Design Decisions
//! - Guards are evaluated in a fixed order; the first failure is terminal
//! - The upstream host and both target paths are fixed; only the variant
//!   classification picks between them

pub mod proxy;
pub mod verdict;

pub use proxy::TagProxy;
pub use verdict::{ProxyVerdict, Rejection};
