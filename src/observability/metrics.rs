//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency) by handler and status
//! - Expose a Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `edgegate_requests_total` (counter): requests by method, status, handler
//! - `edgegate_request_duration_seconds` (histogram): latency by handler
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Labels for handler, method, status code
//! - Recording happens once per request in the dispatcher, never inside
//!   the pipelines

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on the given address.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed request.
pub fn record_request(method: &str, status: u16, handler: &str, start_time: Instant) {
    metrics::counter!(
        "edgegate_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "handler" => handler.to_string(),
    )
    .increment(1);

    metrics::histogram!(
        "edgegate_request_duration_seconds",
        "handler" => handler.to_string(),
    )
    .record(start_time.elapsed().as_secs_f64());
}
