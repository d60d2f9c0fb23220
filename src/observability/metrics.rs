//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_requests_total` (counter): exchanges by kind (single/batch/invalid) and status
//! - `rpc_request_duration_seconds` (histogram): exchange latency by kind
//! - `rpc_calls_total` (counter): Caller invocations by service and outcome
//! - `rpc_batch_size` (histogram): items per batch

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::StatusCode;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(kind: &'static str, status: StatusCode, start: Instant) {
    metrics::counter!(
        "rpc_requests_total",
        "kind" => kind,
        "status" => status.as_u16().to_string()
    )
    .increment(1);
    metrics::histogram!("rpc_request_duration_seconds", "kind" => kind)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_call(service: &str, outcome: &'static str) {
    metrics::counter!(
        "rpc_calls_total",
        "service" => service.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_batch(size: usize) {
    metrics::histogram!("rpc_batch_size").record(size as f64);
}
