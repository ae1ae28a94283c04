//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define routing and query metrics
//! - Install the Prometheus recorder when enabled
//!
//! # Metrics
//! - `trellis_routes_matched_total` (counter): matches by kind (literal, fallback)
//! - `trellis_route_misses_total` (counter): requests no route matched
//! - `trellis_dispatches_total` (counter): dispatches by method, outcome
//! - `trellis_queries_total` (counter): executed queries by connection
//! - `trellis_query_duration_seconds` (histogram): query latency
//! - `trellis_query_failures_total` (counter): failed queries by connection
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Labels are low-cardinality (kind, method, outcome, connection name)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

use crate::routing::method::Method;

/// Install the global Prometheus recorder; the handle renders the
/// exposition text.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Metrics recorder installed");
    Ok(handle)
}

pub fn record_route_matched(kind: &'static str) {
    counter!("trellis_routes_matched_total", "kind" => kind).increment(1);
}

pub fn record_route_miss() {
    counter!("trellis_route_misses_total").increment(1);
}

pub fn record_dispatch(method: Method, outcome: &'static str) {
    counter!(
        "trellis_dispatches_total",
        "method" => method.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_query(connection: &str, elapsed: Duration) {
    counter!("trellis_queries_total", "connection" => connection.to_string()).increment(1);
    histogram!("trellis_query_duration_seconds", "connection" => connection.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_query_error(connection: &str) {
    counter!("trellis_query_failures_total", "connection" => connection.to_string()).increment(1);
}
