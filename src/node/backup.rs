//! BACKUP node: checkpoint receiver plus status server with staleness.

use std::sync::Arc;
use std::time::Duration;

use crate::config::BackupConfig;
use crate::lifecycle::ShutdownSignal;
use crate::net::Listener;
use crate::node::status::{serve_status, StatusReply, StatusSource};
use crate::observability::metrics;
use crate::protocol::{alive_line, is_heartbeat};
use crate::replication::CheckpointReceiver;
use crate::state::{Clock, ReplicatedState, StateCell, SystemClock};

pub struct BackupNode {
    config: BackupConfig,
    state: StateCell,
    clock: Arc<dyn Clock>,
}

impl BackupNode {
    pub fn new(config: BackupConfig) -> Self {
        Self {
            config,
            state: StateCell::new(ReplicatedState::unknown()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn state(&self) -> StateCell {
        self.state.clone()
    }

    fn status_source(&self) -> BackupStatus {
        BackupStatus {
            state: self.state.clone(),
            clock: self.clock.clone(),
            stale_window: self.config.stale_window(),
        }
    }

    /// Build the receiver that feeds this node's state.
    pub fn checkpoint_receiver(&self) -> CheckpointReceiver {
        CheckpointReceiver::new(self.state.clone(), self.clock.clone(), self.config.read_timeout())
    }

    /// Ingest checkpoints and serve heartbeats until shutdown.
    pub async fn run(self, status: Listener, checkpoints: Listener, shutdown: ShutdownSignal) {
        tracing::info!(
            stale_window_ms = self.config.stale_window_ms,
            "BACKUP starting"
        );

        let receiver_task = tokio::spawn(self.checkpoint_receiver().run(checkpoints, shutdown.clone()));

        let source = Arc::new(self.status_source());
        serve_status(status, source, self.config.read_timeout(), shutdown).await;

        if let Err(e) = receiver_task.await {
            tracing::error!(error = %e, "Checkpoint receiver task failed");
        }
    }
}

/// Reply policy of BACKUP: never fails, flags old state.
struct BackupStatus {
    state: StateCell,
    clock: Arc<dyn Clock>,
    stale_window: Duration,
}

impl StatusSource for BackupStatus {
    fn node(&self) -> &'static str {
        "backup"
    }

    fn reply(&self, request: &str) -> StatusReply {
        if !is_heartbeat(request) {
            return StatusReply::Ignore;
        }
        let snapshot = self.state.snapshot();
        let stale = snapshot.is_stale(self.clock.now(), self.stale_window);
        metrics::record_backup_staleness(stale);
        StatusReply::Alive(alive_line(snapshot.value, stale))
    }
}
