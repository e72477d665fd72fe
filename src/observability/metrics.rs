//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_invocations_total` (counter): invocations by outcome
//!   (`delivered`, `templated`, `rejected`)
//! - `gateway_flow_errors_total` (counter): flows that failed to transform
//! - `gateway_deliveries_total` (counter): downstream calls by method, status
//! - `gateway_delivery_duration_seconds` (histogram): downstream latency

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

pub mod names {
    pub const INVOCATIONS_TOTAL: &str = "gateway_invocations_total";
    pub const FLOW_ERRORS_TOTAL: &str = "gateway_flow_errors_total";
    pub const DELIVERIES_TOTAL: &str = "gateway_deliveries_total";
    pub const DELIVERY_DURATION_SECONDS: &str = "gateway_delivery_duration_seconds";
}

/// Install the Prometheus recorder and serve it on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_invocation(outcome: &'static str) {
    counter!(names::INVOCATIONS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_flow_error() {
    counter!(names::FLOW_ERRORS_TOTAL).increment(1);
}

/// Record one completed downstream call.
pub fn record_delivery(method: &str, status: u16, started: Instant) {
    counter!(
        names::DELIVERIES_TOTAL,
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(names::DELIVERY_DURATION_SECONDS, "method" => method.to_string())
        .record(started.elapsed().as_secs_f64());
}
