//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! environment (EDGEGATE_* variables)
//!     → env.rs (read & parse, starting from schema defaults)
//!     → env.rs::validate (semantic checks)
//!     → EdgeConfig (validated, immutable)
//!     → shared via Arc to all subsystems
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults so a minimal environment boots the gateway
//! - Validation separates syntactic (parse) from semantic checks
//! - No singleton lookup: the config value is passed by reference

pub mod env;
pub mod schema;

pub use env::{load_from_env, validate, ConfigError};
pub use schema::EdgeConfig;
pub use schema::HandlerKind;
pub use schema::RouteConfig;
