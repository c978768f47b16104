//! Edgegate — edge-request interception gateway.
//!
//! For every inbound request the gateway decides, with bounded latency,
//! whether to rewrite the URL and redirect, reject the request outright,
//! or forward a sanitized version to a fixed upstream and rewrite the
//! response — never blocking the client on best-effort telemetry.
//!
//! # Architecture Overview
//!
//! ```text
//!                   ┌────────────────────────────────────────────────┐
//!                   │                   EDGEGATE                     │
//!                   │                                                │
//!  Client Request   │  ┌─────────┐    ┌──────────────┐              │
//!  ─────────────────┼─▶│  http   │───▶│   routing    │              │
//!                   │  │ server  │    │    table     │              │
//!                   │  └─────────┘    └──────┬───────┘              │
//!                   │            ┌───────────┼─────────────┐        │
//!                   │            ▼           ▼             ▼        │
//!                   │     ┌──────────┐ ┌──────────┐ ┌───────────┐  │
//!                   │     │ redirect │ │   gate   │ │ endpoints │  │
//!                   │     │ resolver │ │ tagproxy │ │ geo/robots│  │
//!                   │     └────┬─────┘ └────┬─────┘ │   media   │  │
//!                   │          │            │       └─────┬─────┘  │
//!                   │          ▼            ▼             ▼        │
//!  Client Response  │  ┌─────────────────────────────────────────┐ │
//!  ◀────────────────┼──│  http client (HttpSend, shared reqwest) │─┼──▶ decision svc /
//!                   │  └─────────────────────────────────────────┘ │    origin /
//!                   │                                              │    tag upstream
//!                   │  ┌─────────────────────────────────────────┐ │
//!                   │  │ Cross-Cutting: config · normalize·cache │ │
//!                   │  │ observability (metrics, detached log)   │ │
//!                   │  └─────────────────────────────────────────┘ │
//!                   └────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;

// Pipelines
pub mod endpoints;
pub mod gate;
pub mod redirect;

// Shared policies
pub mod cache;
pub mod normalize;

// Cross-cutting concerns
pub mod observability;

pub use config::EdgeConfig;
pub use http::HttpServer;
