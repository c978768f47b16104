//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher produces:
//!     → metrics.rs (counters, histograms → Prometheus scrape)
//!     → reporter.rs (LogRecord → decision-service log endpoint, detached)
//!
//! All subsystems produce:
//!     → tracing events (structured fields, request ID in span)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments)
//! - Decision logging is fire-and-forget: at-most-once, never awaited by
//!   the request path, failures swallowed at debug level

pub mod metrics;
pub mod reporter;

pub use reporter::{report, LogRecord};
