//! Configuration schema definitions.
//!
//! Every field has a default so a file only needs the values it changes.
//! Defaults match the positional CLI defaults of each role.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration shared by every role.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ClusterConfig {
    pub primary: PrimaryConfig,
    pub backup: BackupConfig,
    pub monitor: MonitorConfig,
    pub observability: ObservabilityConfig,
}

/// PRIMARY node configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct PrimaryConfig {
    /// Interface the status listener binds to.
    pub bind_host: String,

    /// Status port.
    pub port: u16,

    /// Probability in [0, 1] that a request is crashed or hung.
    pub failure_chance: f64,

    /// Host running BACKUP's checkpoint receiver.
    pub backup_host: String,

    /// BACKUP's checkpoint port.
    pub checkpoint_port: u16,

    /// Checkpoint publish period in milliseconds.
    pub checkpoint_interval_ms: u64,

    /// Connect timeout for each checkpoint push in milliseconds.
    pub checkpoint_connect_timeout_ms: u64,

    /// How long a simulated hang stalls a connection, in milliseconds.
    pub hang_duration_ms: u64,

    /// How long a status handler waits for the request line, in milliseconds.
    pub read_timeout_ms: u64,

    /// Maximum concurrent status connections.
    pub max_connections: usize,

    /// Seed for the failure injector and detector. Random when unset.
    pub seed: Option<u64>,
}

impl Default for PrimaryConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 9999,
            failure_chance: 0.30,
            backup_host: "localhost".to_string(),
            checkpoint_port: 7003,
            checkpoint_interval_ms: 1000,
            checkpoint_connect_timeout_ms: 1000,
            hang_duration_ms: 15_000,
            read_timeout_ms: 10_000,
            max_connections: 1024,
            seed: None,
        }
    }
}

impl PrimaryConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn checkpoint_target(&self) -> String {
        format!("{}:{}", self.backup_host, self.checkpoint_port)
    }

    pub fn checkpoint_interval(&self) -> Duration {
        Duration::from_millis(self.checkpoint_interval_ms)
    }

    pub fn checkpoint_connect_timeout(&self) -> Duration {
        Duration::from_millis(self.checkpoint_connect_timeout_ms)
    }

    pub fn hang_duration(&self) -> Duration {
        Duration::from_millis(self.hang_duration_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// BACKUP node configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BackupConfig {
    pub bind_host: String,

    /// Status port.
    pub heartbeat_port: u16,

    /// Checkpoint receiver port.
    pub checkpoint_port: u16,

    /// Age after which the reported state is flagged `[STALE]`, in milliseconds.
    pub stale_window_ms: u64,

    /// Read timeout for status requests and checkpoint lines, in milliseconds.
    pub read_timeout_ms: u64,

    pub max_connections: usize,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            heartbeat_port: 9998,
            checkpoint_port: 7003,
            stale_window_ms: 5000,
            read_timeout_ms: 10_000,
            max_connections: 1024,
        }
    }
}

impl BackupConfig {
    pub fn heartbeat_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.heartbeat_port)
    }

    pub fn checkpoint_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.checkpoint_port)
    }

    pub fn stale_window(&self) -> Duration {
        Duration::from_millis(self.stale_window_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// MONITOR configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Delay between poll cycles in milliseconds.
    pub interval_ms: u64,

    /// Connect and read timeout per probe in milliseconds.
    pub timeout_ms: u64,

    /// Consecutive misses that trigger failover (or CRITICAL on BACKUP).
    pub max_failures: u32,

    pub primary_host: String,
    pub primary_port: u16,
    pub backup_host: String,
    pub backup_port: u16,

    /// While on BACKUP, probe PRIMARY every this many cycles.
    pub probe_primary_every_n_beats: u32,

    /// Consecutive successful PRIMARY probes required to fail back.
    pub ok_streak_for_failback: u32,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            timeout_ms: 3000,
            max_failures: 3,
            primary_host: "localhost".to_string(),
            primary_port: 9999,
            backup_host: "localhost".to_string(),
            backup_port: 9998,
            probe_primary_every_n_beats: 5,
            ok_streak_for_failback: 2,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    pub log_format: LogFormat,

    /// Prometheus exporter bind address. Disabled when unset.
    pub metrics_address: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "heartbeat_failover=info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_address: None,
        }
    }
}
