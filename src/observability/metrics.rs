//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): inbound requests by status
//! - `bridge_request_duration_seconds` (histogram): inbound latency
//! - `bridge_upstream_calls_total` (counter): upstream calls by outcome
//! - `bridge_upstream_duration_seconds` (histogram): upstream latency
//!
//! Recording is a no-op until a recorder is installed, so the functions
//! are safe to call from tests.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with its scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed inbound request.
pub fn record_request(status: u16, start: Instant) {
    metrics::counter!("bridge_requests_total", "status" => status.to_string()).increment(1);
    metrics::histogram!("bridge_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record one upstream call and its outcome (`ok`, `timeout`, `unreachable`, ...).
pub fn record_upstream_call(outcome: &'static str, start: Instant) {
    metrics::counter!("bridge_upstream_calls_total", "outcome" => outcome).increment(1);
    metrics::histogram!("bridge_upstream_duration_seconds").record(start.elapsed().as_secs_f64());
}
