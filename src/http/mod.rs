//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, route dispatch)
//!     → request.rs (derive RequestContext: scheme, host, query, body)
//!     → [pipeline produces a response]
//!     → response.rs (fresh header sets, hop-by-hop hygiene)
//!     → Send to client
//!
//! Outbound:
//!     pipelines → client.rs (HttpSend capability → shared reqwest client)
//! ```

pub mod client;
pub mod request;
pub mod response;
pub mod server;
pub mod tls;

pub use client::{ClientError, HttpSend, OutboundRequest, OutboundResponse, ReqwestClient};
pub use request::{BodyTooLarge, MakeRequestUuid, RequestContext, X_REQUEST_ID};
pub use server::HttpServer;
