//! Configuration validation.
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Pure functions: config → Result<(), Vec<ValidationError>>
//! - Runs before any listener is bound

use thiserror::Error;

use crate::config::schema::{BackupConfig, ClusterConfig, MonitorConfig, PrimaryConfig};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} must be non-zero")]
    Zero { field: &'static str },
    #[error("failure_chance must be within [0, 1], got {0}")]
    FailureChance(f64),
    #[error("{field} must not be empty")]
    EmptyHost { field: &'static str },
    #[error("backup heartbeat_port and checkpoint_port must differ (both {0})")]
    PortClash(u16),
}

fn non_zero(value: u64, field: &'static str, errors: &mut Vec<ValidationError>) {
    if value == 0 {
        errors.push(ValidationError::Zero { field });
    }
}

fn non_empty(value: &str, field: &'static str, errors: &mut Vec<ValidationError>) {
    if value.trim().is_empty() {
        errors.push(ValidationError::EmptyHost { field });
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_primary(config: &PrimaryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if !(0.0..=1.0).contains(&config.failure_chance) {
        errors.push(ValidationError::FailureChance(config.failure_chance));
    }
    non_empty(&config.backup_host, "primary.backup_host", &mut errors);
    non_zero(config.checkpoint_port as u64, "primary.checkpoint_port", &mut errors);
    non_zero(config.checkpoint_interval_ms, "primary.checkpoint_interval_ms", &mut errors);
    non_zero(
        config.checkpoint_connect_timeout_ms,
        "primary.checkpoint_connect_timeout_ms",
        &mut errors,
    );
    non_zero(config.read_timeout_ms, "primary.read_timeout_ms", &mut errors);
    non_zero(config.max_connections as u64, "primary.max_connections", &mut errors);
    finish(errors)
}

pub fn validate_backup(config: &BackupConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    if config.heartbeat_port != 0 && config.heartbeat_port == config.checkpoint_port {
        errors.push(ValidationError::PortClash(config.heartbeat_port));
    }
    non_zero(config.read_timeout_ms, "backup.read_timeout_ms", &mut errors);
    non_zero(config.max_connections as u64, "backup.max_connections", &mut errors);
    finish(errors)
}

pub fn validate_monitor(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    non_zero(config.interval_ms, "monitor.interval_ms", &mut errors);
    non_zero(config.timeout_ms, "monitor.timeout_ms", &mut errors);
    non_zero(config.max_failures as u64, "monitor.max_failures", &mut errors);
    non_zero(
        config.probe_primary_every_n_beats as u64,
        "monitor.probe_primary_every_n_beats",
        &mut errors,
    );
    non_zero(
        config.ok_streak_for_failback as u64,
        "monitor.ok_streak_for_failback",
        &mut errors,
    );
    non_empty(&config.primary_host, "monitor.primary_host", &mut errors);
    non_empty(&config.backup_host, "monitor.backup_host", &mut errors);
    non_zero(config.primary_port as u64, "monitor.primary_port", &mut errors);
    non_zero(config.backup_port as u64, "monitor.backup_port", &mut errors);
    finish(errors)
}

/// Validate every section of a cluster config.
pub fn validate_config(config: &ClusterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    for result in [
        validate_primary(&config.primary),
        validate_backup(&config.backup),
        validate_monitor(&config.monitor),
    ] {
        if let Err(mut e) = result {
            errors.append(&mut e);
        }
    }
    finish(errors)
}
