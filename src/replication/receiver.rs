//! Checkpoint receiver (BACKUP).
//!
//! Each checkpoint connection gets its own task, so an idle peer cannot
//! hold back later checkpoints. A connection carries one line, which
//! replaces the shared state when it is a known state token. Anything else
//! keeps the previous state.

use std::sync::Arc;
use std::time::Duration;

use tokio::time;

use crate::lifecycle::ShutdownSignal;
use crate::net::{serve, Incoming, Listener};
use crate::observability::metrics;
use crate::protocol::io::read_line;
use crate::state::{Clock, ReplicatedState, StateCell, StateValue};

pub struct CheckpointReceiver {
    state: StateCell,
    clock: Arc<dyn Clock>,
    read_timeout: Duration,
}

impl CheckpointReceiver {
    pub fn new(state: StateCell, clock: Arc<dyn Clock>, read_timeout: Duration) -> Self {
        Self {
            state,
            clock,
            read_timeout,
        }
    }

    /// Apply one checkpoint line. Returns the new value, or `None` if ignored.
    pub fn accept_line(&self, line: &str) -> Option<StateValue> {
        if line.trim().is_empty() {
            metrics::record_checkpoint_received("empty");
            return None;
        }
        match line.parse::<StateValue>() {
            Ok(value) => {
                self.state
                    .replace(ReplicatedState::observed(value, self.clock.now()));
                metrics::record_checkpoint_received("applied");
                Some(value)
            }
            Err(e) => {
                metrics::record_checkpoint_received("rejected");
                tracing::warn!(error = %e, "Ignoring malformed checkpoint");
                None
            }
        }
    }

    async fn ingest(&self, mut conn: Incoming) {
        let peer = conn.peer;
        let read = tokio::select! {
            res = time::timeout(self.read_timeout, read_line(&mut conn.stream)) => res,
            _ = conn.shutdown.recv() => return,
        };
        match read {
            Ok(Ok(Some(line))) => {
                if let Some(value) = self.accept_line(&line) {
                    tracing::debug!(peer = %peer, connection_id = %conn.id, state = %value, "Checkpoint received");
                }
            }
            Ok(Ok(None)) => tracing::debug!(peer = %peer, "Checkpoint connection closed empty"),
            Ok(Err(e)) => tracing::debug!(peer = %peer, error = %e, "Checkpoint read failed"),
            Err(_) => tracing::debug!(peer = %peer, "Checkpoint read timed out"),
        }
    }

    /// Ingest checkpoints until shutdown.
    pub async fn run(self, listener: Listener, shutdown: ShutdownSignal) {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Checkpoint listener started");
        }

        let receiver = Arc::new(self);
        serve(listener, shutdown, move |conn: Incoming| {
            let receiver = receiver.clone();
            async move { receiver.ingest(conn).await }
        })
        .await;

        tracing::info!("Checkpoint listener stopped");
    }
}
