//! Heartbeat failover pair (v1)
//!
//! One binary, three roles.
//!
//! # Architecture Overview
//!
//! ```text
//!                  HEARTBEAT / ALIVE
//!     ┌─────────┐ ─────────────────────▶ ┌─────────────┐
//!     │ MONITOR │                        │   PRIMARY   │ :9999
//!     │         │ ──────┐                │ (injector)  │
//!     └─────────┘       │                └──────┬──────┘
//!       failover /      │ after failover        │ checkpoint "<value>\n"
//!       failback        ▼                       ▼ every 1s
//!                  ┌─────────────┐       ┌─────────────┐
//!                  │   BACKUP    │ :9998 │  BACKUP     │ :7003
//!                  │  status     │◀──────│  receiver   │
//!                  └─────────────┘ state └─────────────┘
//! ```
//!
//! Positional arguments per role, all optional:
//! - `primary [port] [failureChance] [backupHost] [checkpointPort]`
//! - `backup [heartbeatPort] [checkpointPort]`
//! - `monitor [intervalSec] [timeoutSec] [maxFailures] [primaryHost] [primaryPort]
//!   [backupHost] [backupPort] [probePrimaryEveryNBeats] [okStreakForFailback]`

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use heartbeat_failover::config::validation::{validate_backup, validate_monitor, validate_primary};
use heartbeat_failover::config::{
    load_config, BackupConfig, ClusterConfig, ConfigError, LogFormat, MonitorConfig, PrimaryConfig,
};
use heartbeat_failover::health::{Monitor, MonitorOutcome};
use heartbeat_failover::lifecycle::signals::spawn_signal_handler;
use heartbeat_failover::lifecycle::Shutdown;
use heartbeat_failover::net::Listener;
use heartbeat_failover::node::{BackupNode, PrimaryNode};
use heartbeat_failover::observability::logging::init_logging;
use heartbeat_failover::observability::metrics::init_metrics;

#[derive(Parser)]
#[command(name = "heartbeat-failover")]
#[command(about = "Primary/backup replica pair with a failover monitor", long_about = None)]
struct Cli {
    /// TOML file with [primary], [backup], [monitor], [observability] sections.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum)]
    log_format: Option<LogFormatArg>,

    /// Expose Prometheus metrics on this address.
    #[arg(long, global = true)]
    metrics_addr: Option<SocketAddr>,

    #[command(subcommand)]
    role: RoleCommand,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Subcommand)]
enum RoleCommand {
    /// Run the PRIMARY replica
    Primary(PrimaryArgs),
    /// Run the BACKUP replica
    Backup(BackupArgs),
    /// Run the failover monitor
    Monitor(MonitorArgs),
}

#[derive(Args)]
struct PrimaryArgs {
    /// Status port [default: 9999]
    port: Option<u16>,
    /// Probability of a simulated crash or hang per request [default: 0.30]
    failure_chance: Option<f64>,
    /// BACKUP host for checkpoints [default: localhost]
    backup_host: Option<String>,
    /// BACKUP checkpoint port [default: 7003]
    checkpoint_port: Option<u16>,
    /// Seed the failure injector for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

impl PrimaryArgs {
    fn apply(self, config: &mut PrimaryConfig) {
        if let Some(v) = self.port {
            config.port = v;
        }
        if let Some(v) = self.failure_chance {
            config.failure_chance = v;
        }
        if let Some(v) = self.backup_host {
            config.backup_host = v;
        }
        if let Some(v) = self.checkpoint_port {
            config.checkpoint_port = v;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
    }
}

#[derive(Args)]
struct BackupArgs {
    /// Status port [default: 9998]
    heartbeat_port: Option<u16>,
    /// Checkpoint port [default: 7003]
    checkpoint_port: Option<u16>,
}

impl BackupArgs {
    fn apply(self, config: &mut BackupConfig) {
        if let Some(v) = self.heartbeat_port {
            config.heartbeat_port = v;
        }
        if let Some(v) = self.checkpoint_port {
            config.checkpoint_port = v;
        }
    }
}

#[derive(Args)]
struct MonitorArgs {
    /// Seconds between polls [default: 2]
    interval_sec: Option<u64>,
    /// Connect/read timeout in seconds [default: 3]
    timeout_sec: Option<u64>,
    /// Consecutive misses before switching [default: 3]
    max_failures: Option<u32>,
    /// [default: localhost]
    primary_host: Option<String>,
    /// [default: 9999]
    primary_port: Option<u16>,
    /// [default: localhost]
    backup_host: Option<String>,
    /// [default: 9998]
    backup_port: Option<u16>,
    /// While on BACKUP, probe PRIMARY every N polls [default: 5]
    probe_primary_every_n_beats: Option<u32>,
    /// Consecutive PRIMARY probes needed to fail back [default: 2]
    ok_streak_for_failback: Option<u32>,
}

impl MonitorArgs {
    fn apply(self, config: &mut MonitorConfig) {
        if let Some(v) = self.interval_sec {
            config.interval_ms = v.saturating_mul(1000);
        }
        if let Some(v) = self.timeout_sec {
            config.timeout_ms = v.saturating_mul(1000);
        }
        if let Some(v) = self.max_failures {
            config.max_failures = v;
        }
        if let Some(v) = self.primary_host {
            config.primary_host = v;
        }
        if let Some(v) = self.primary_port {
            config.primary_port = v;
        }
        if let Some(v) = self.backup_host {
            config.backup_host = v;
        }
        if let Some(v) = self.backup_port {
            config.backup_port = v;
        }
        if let Some(v) = self.probe_primary_every_n_beats {
            config.probe_primary_every_n_beats = v;
        }
        if let Some(v) = self.ok_streak_for_failback {
            config.ok_streak_for_failback = v;
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClusterConfig::default(),
    };
    if let Some(format) = cli.log_format {
        config.observability.log_format = format.into();
    }
    if let Some(addr) = cli.metrics_addr {
        config.observability.metrics_address = Some(addr.to_string());
    }

    init_logging(&config.observability);
    tracing::info!("heartbeat-failover v{} starting", env!("CARGO_PKG_VERSION"));

    if let Some(addr) = &config.observability.metrics_address {
        match addr.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(metrics_address = %addr, error = %e, "Failed to parse metrics address"),
        }
    }

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    match cli.role {
        RoleCommand::Primary(args) => {
            let mut primary = config.primary;
            args.apply(&mut primary);
            validate_primary(&primary).map_err(ConfigError::Validation)?;

            let listener = Listener::bind(&primary.bind_address(), primary.max_connections).await?;
            PrimaryNode::new(primary).run(listener, shutdown.subscribe()).await;
        }
        RoleCommand::Backup(args) => {
            let mut backup = config.backup;
            args.apply(&mut backup);
            validate_backup(&backup).map_err(ConfigError::Validation)?;

            let status = Listener::bind(&backup.heartbeat_address(), backup.max_connections).await?;
            let checkpoints = Listener::bind(&backup.checkpoint_address(), backup.max_connections).await?;
            BackupNode::new(backup)
                .run(status, checkpoints, shutdown.subscribe())
                .await;
        }
        RoleCommand::Monitor(args) => {
            let mut monitor = config.monitor;
            args.apply(&mut monitor);
            validate_monitor(&monitor).map_err(ConfigError::Validation)?;

            match Monitor::new(&monitor).run(shutdown.subscribe()).await {
                MonitorOutcome::Critical => tracing::error!("Monitor exiting: no replica left to poll"),
                MonitorOutcome::Shutdown => tracing::info!("Monitor stopped"),
            }
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
