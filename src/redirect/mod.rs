//! Redirect resolution pipeline.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → normalize (path canonical?) ── differs → 301 to normalized URL
//!     → decision.rs (wire payload)
//!     → resolver.rs (POST, raced against the configured deadline)
//!     → Decision {Gone, Redirect, PassThrough} or error
//!     → error/timeout/pass-through → replay request against origin
//! ```
//!
//! # Design Decisions
//! - Normalization always precedes the decision call
//! - Every failure mode degrades to "serve as if this layer did not exist"

pub mod decision;
pub mod resolver;

pub use decision::{Decision, DecisionError};
pub use resolver::{RedirectOutcome, RedirectResolver};
