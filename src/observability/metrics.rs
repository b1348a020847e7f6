//! Metrics collection and exposition.
//!
//! # Metrics
//! - `policy_decisions_total` (counter): admission decisions by outcome
//! - `policy_active_connections` (gauge): admitted, unreleased connections
//! - `policy_config_reloads_total` (counter): reload attempts by result
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one admission decision. `outcome` is "admitted" or a deny reason label.
pub fn record_decision(outcome: &'static str) {
    ::metrics::counter!("policy_decisions_total", "outcome" => outcome).increment(1);
}

/// Track an admitted connection. Paired with [`connection_released`].
pub fn connection_admitted() {
    ::metrics::gauge!("policy_active_connections").increment(1.0);
}

pub fn connection_released() {
    ::metrics::gauge!("policy_active_connections").decrement(1.0);
}

pub fn record_config_reload(result: &'static str) {
    ::metrics::counter!("policy_config_reloads_total", "result" => result).increment(1);
}
