//! Metrics collection and exposition.
//!
//! # Metrics
//! - `portal_http_requests_total` (counter): requests by method, route, status
//! - `portal_http_request_duration_seconds` (histogram): handler latency
//! - `portal_workflow_total` (counter): workflow runs by name and outcome
//! - `portal_chain_calls_total` (counter): provider calls by operation and outcome
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until
//!   `init_metrics` installs the Prometheus exporter
//! - Label values are small closed sets (no addresses, no hashes)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Outcome label for successful operations.
pub const OUTCOME_OK: &str = "ok";

/// Outcome label for failed operations.
pub const OUTCOME_ERROR: &str = "error";

/// Install the Prometheus exporter with an HTTP listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished HTTP request.
pub fn record_request(method: &str, route: &str, status: u16, started: Instant) {
    metrics::counter!(
        "portal_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "portal_http_request_duration_seconds",
        "route" => route.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record a workflow run.
pub fn record_workflow(workflow: &'static str, ok: bool) {
    metrics::counter!(
        "portal_workflow_total",
        "workflow" => workflow,
        "outcome" => outcome(ok)
    )
    .increment(1);
}

/// Record a chain provider call.
pub fn record_chain_call(op: &'static str, ok: bool) {
    metrics::counter!(
        "portal_chain_calls_total",
        "op" => op,
        "outcome" => outcome(ok)
    )
    .increment(1);
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        OUTCOME_OK
    } else {
        OUTCOME_ERROR
    }
}
