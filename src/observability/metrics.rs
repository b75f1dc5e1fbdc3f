//! Metrics collection and exposition.
//!
//! # Metrics
//! - `quote_requests_total` (counter): requests by timer name and status
//! - `quote_request_duration_seconds` (histogram): end-to-end latency
//! - `quote_contributor_duration_seconds` (histogram): per contributor/outcome
//! - `quote_downstream_duration_seconds` (histogram): downstream call latency
//! - `quote_simulation_events_total` (counter): inner timeouts armed, cancels fired
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which is what tests rely on
//! - Prometheus exposition is opt-in via config

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(timer: &str, status: u16, elapsed: Duration) {
    counter!(
        "quote_requests_total",
        "timer" => timer.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("quote_request_duration_seconds", "timer" => timer.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_contributor(name: &str, ok: bool, elapsed: Duration) {
    let outcome = if ok { "ok" } else { "error" };
    histogram!(
        "quote_contributor_duration_seconds",
        "contributor" => name.to_string(),
        "outcome" => outcome
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_service_call(service: &str, status: u16, elapsed: Duration) {
    histogram!(
        "quote_downstream_duration_seconds",
        "service" => service.to_string(),
        "status" => status.to_string()
    )
    .record(elapsed.as_secs_f64());
}

pub fn record_simulation(event: &'static str) {
    counter!("quote_simulation_events_total", "event" => event).increment(1);
}
