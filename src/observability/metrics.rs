//! Metrics collection and exposition.
//!
//! # Metrics
//! - `heartbeat_requests_total` (counter): status requests by node, outcome
//! - `checkpoints_published_total` (counter): publish attempts by result
//! - `checkpoints_received_total` (counter): ingested checkpoints by result
//! - `monitor_probes_total` (counter): probes by target, result
//! - `monitor_transitions_total` (counter): failover/failback/critical
//! - `monitor_active_target` (gauge): 1=primary, 0=backup, -1=critical
//! - `backup_state_stale` (gauge): 1 when BACKUP last replied stale
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::session::{MonitorState, Transition};
use crate::health::Role;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_heartbeat(node: &'static str, outcome: &'static str) {
    counter!("heartbeat_requests_total", "node" => node, "outcome" => outcome).increment(1);
}

pub fn record_checkpoint_published(result: &'static str) {
    counter!("checkpoints_published_total", "result" => result).increment(1);
}

pub fn record_checkpoint_received(result: &'static str) {
    counter!("checkpoints_received_total", "result" => result).increment(1);
}

pub fn record_backup_staleness(stale: bool) {
    gauge!("backup_state_stale").set(if stale { 1.0 } else { 0.0 });
}

pub fn record_probe(target: Role, ok: bool) {
    let result = if ok { "ok" } else { "miss" };
    counter!("monitor_probes_total", "target" => target.as_str(), "result" => result).increment(1);
}

pub fn record_transition(transition: Transition, state: MonitorState) {
    counter!("monitor_transitions_total", "kind" => transition.as_str()).increment(1);
    record_monitor_state(state);
}

pub fn record_monitor_state(state: MonitorState) {
    let value = match state {
        MonitorState::OnPrimary => 1.0,
        MonitorState::OnBackup => 0.0,
        MonitorState::Critical => -1.0,
    };
    gauge!("monitor_active_target").set(value);
}
