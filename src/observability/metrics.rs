//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mockdeck_requests_recorded_total` (counter, `method`)
//! - `mockdeck_request_log_evictions_total` (counter)
//! - `mockdeck_broadcast_messages_total` (counter, `kind`)
//! - `mockdeck_broadcast_dropped_total` (counter): observers dropped on publish
//! - `mockdeck_observers_connected` (gauge)
//! - `mockdeck_listener_transitions_total` (counter, `to`)
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request_logged(method: &str, evicted: bool) {
    counter!("mockdeck_requests_recorded_total", "method" => method.to_string()).increment(1);
    if evicted {
        counter!("mockdeck_request_log_evictions_total").increment(1);
    }
}

pub fn record_broadcast(kind: &'static str, dropped: usize) {
    counter!("mockdeck_broadcast_messages_total", "kind" => kind).increment(1);
    if dropped > 0 {
        counter!("mockdeck_broadcast_dropped_total").increment(dropped as u64);
    }
}

pub fn record_observers(count: usize) {
    gauge!("mockdeck_observers_connected").set(count as f64);
}

pub fn record_transition(to: &'static str) {
    counter!("mockdeck_listener_transitions_total", "to" => to).increment(1);
}
