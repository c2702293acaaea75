//! Metrics collection and exposition.
//!
//! # Metrics
//! - `server_pool_refresh_total` (counter): refresh gate wins
//! - `server_pool_response_skipped_total` (counter): responses dropped on lock contention
//! - `server_pool_responses_total` (counter): responses handled, by strategy
//! - `server_pool_selection_miss_total` (counter): selections with no route, by role
//! - `server_pool_invalid_servers` (gauge): retirement backlog
//! - `server_pool_servers_reclaimed_total` (counter): destroyed servers, by role
//! - `server_pool_server_online` (gauge): 1=online, 0=offline, by address
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

pub fn record_refresh() {
    counter!("server_pool_refresh_total").increment(1);
}

pub fn record_response_skipped() {
    counter!("server_pool_response_skipped_total").increment(1);
}

pub fn record_response(strategy: &'static str) {
    counter!("server_pool_responses_total", "strategy" => strategy).increment(1);
}

pub fn record_selection_miss(role: &'static str) {
    counter!("server_pool_selection_miss_total", "role" => role).increment(1);
}

pub fn record_invalid_servers(count: usize) {
    gauge!("server_pool_invalid_servers").set(count as f64);
}

pub fn record_server_reclaimed(role: &'static str) {
    counter!("server_pool_servers_reclaimed_total", "role" => role).increment(1);
}

pub fn record_server_online(addr: &str, online: bool) {
    gauge!("server_pool_server_online", "addr" => addr.to_string()).set(if online { 1.0 } else { 0.0 });
}
