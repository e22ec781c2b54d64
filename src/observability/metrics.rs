//! Metrics collection and exposition.
//!
//! # Metrics
//! - `squawker_blocks_processed_total` (counter)
//! - `squawker_transactions_scanned_total` (counter)
//! - `squawker_protocol_messages_total` (counter)
//! - `squawker_zone_updates_total` (counter): by `result` (ok, error)
//! - `squawker_poll_failures_total` (counter)
//! - `squawker_cursor_height` (gauge)
//!
//! Recording is a no-op until an exporter is installed.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_block_processed(height: u64, transactions: usize) {
    counter!("squawker_blocks_processed_total").increment(1);
    counter!("squawker_transactions_scanned_total").increment(transactions as u64);
    gauge!("squawker_cursor_height").set(height as f64);
}

pub fn record_protocol_message() {
    counter!("squawker_protocol_messages_total").increment(1);
}

pub fn record_zone_update(success: bool) {
    let result = if success { "ok" } else { "error" };
    counter!("squawker_zone_updates_total", "result" => result).increment(1);
}

pub fn record_poll_failure() {
    counter!("squawker_poll_failures_total").increment(1);
}
