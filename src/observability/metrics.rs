//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Expose a Prometheus-compatible scrape endpoint
//! - Track request, chain-query, Krnl, and storage metrics
//!
//! # Metrics
//! - `klunkaz_requests_total` (counter): requests by method, path, status
//! - `klunkaz_request_duration_seconds` (histogram): latency distribution
//! - `klunkaz_chain_queries_total` (counter): chain queries by kind, outcome
//! - `klunkaz_chain_query_attempts` (histogram): attempts per query
//! - `klunkaz_krnl_actions_total` (counter): Krnl actions by type, outcome
//! - `klunkaz_storage_errors_total` (counter): surfaced storage failures
//!
//! # Design Decisions
//! - The `metrics` facade keeps call sites cheap no-ops when no exporter
//!   is installed (tests, metrics disabled)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed HTTP request.
pub fn record_request(method: &str, path: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("klunkaz_requests_total", &labels).increment(1);
    histogram!("klunkaz_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

/// Record the terminal outcome of a chain query workflow run.
pub fn record_chain_query(kind: &'static str, attempt: u32, success: bool) {
    let labels = [
        ("kind", kind.to_string()),
        ("outcome", outcome(success).to_string()),
    ];
    counter!("klunkaz_chain_queries_total", &labels).increment(1);
    histogram!("klunkaz_chain_query_attempts", "kind" => kind).record(attempt as f64);
}

/// Record a Krnl action execution.
pub fn record_krnl_action(action: &str, success: bool) {
    counter!(
        "klunkaz_krnl_actions_total",
        "action" => action.to_string(),
        "outcome" => outcome(success),
    )
    .increment(1);
}

/// Record a storage failure that surfaced to a client.
pub fn record_storage_error() {
    counter!("klunkaz_storage_errors_total").increment(1);
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}
