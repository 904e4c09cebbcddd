//! Checkpoint publisher (PRIMARY).
//!
//! # Responsibilities
//! - Every interval, push the current state to BACKUP as one line
//! - Never fail, never retry within a cycle; the next cycle is the retry
//!
//! # Design Decisions
//! - Reachability changes are logged once, individual misses at debug
//! - BACKUP may be absent forever; the loop does not care

use std::time::Duration;

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time;

use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::protocol::io::write_line;
use crate::state::{StateCell, StateValue};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("connect to {target} timed out")]
    ConnectTimeout { target: String },
    #[error("connect to {target} failed: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },
    #[error("write timed out")]
    WriteTimeout,
    #[error("write failed: {0}")]
    Write(#[from] std::io::Error),
}

pub struct CheckpointPublisher {
    target: String,
    interval: Duration,
    connect_timeout: Duration,
    state: StateCell,
}

impl CheckpointPublisher {
    /// `target` is BACKUP's checkpoint address, e.g. `localhost:7003`.
    pub fn new(target: impl Into<String>, interval: Duration, connect_timeout: Duration, state: StateCell) -> Self {
        Self {
            target: target.into(),
            interval,
            connect_timeout,
            state,
        }
    }

    /// Push the current state once.
    pub async fn publish_once(&self) -> Result<StateValue, PublishError> {
        let value = self.state.snapshot().value;

        let mut stream = time::timeout(self.connect_timeout, TcpStream::connect(self.target.as_str()))
            .await
            .map_err(|_| PublishError::ConnectTimeout {
                target: self.target.clone(),
            })?
            .map_err(|source| PublishError::Connect {
                target: self.target.clone(),
                source,
            })?;

        time::timeout(self.connect_timeout, async {
            write_line(&mut stream, value.as_token()).await?;
            stream.shutdown().await
        })
        .await
        .map_err(|_| PublishError::WriteTimeout)??;

        Ok(value)
    }

    /// Publish every interval until shutdown.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            target_addr = %self.target,
            interval_ms = self.interval.as_millis() as u64,
            "Checkpoint publisher started"
        );

        let mut reachable: Option<bool> = None;
        loop {
            match self.publish_once().await {
                Ok(value) => {
                    metrics::record_checkpoint_published("ok");
                    if reachable != Some(true) {
                        tracing::info!(target_addr = %self.target, "Backup reachable, checkpoints flowing");
                    }
                    tracing::trace!(state = %value, "Checkpoint sent");
                    reachable = Some(true);
                }
                Err(e) => {
                    metrics::record_checkpoint_published("skipped");
                    if reachable != Some(false) {
                        tracing::warn!(error = %e, "Backup unreachable, will keep trying");
                    } else {
                        tracing::debug!(error = %e, "Checkpoint skipped");
                    }
                    reachable = Some(false);
                }
            }

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = shutdown.recv() => break,
            }
        }

        tracing::info!("Checkpoint publisher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::io::read_line;
    use crate::state::ReplicatedState;
    use std::time::Instant;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn sends_current_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = StateCell::new(ReplicatedState::observed(StateValue::ObstacleDetected, Instant::now()));
        let publisher = CheckpointPublisher::new(
            addr.to_string(),
            Duration::from_millis(50),
            Duration::from_millis(500),
            state,
        );

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_line(&mut socket).await.unwrap()
        });

        assert_eq!(publisher.publish_once().await.unwrap(), StateValue::ObstacleDetected);
        assert_eq!(server.await.unwrap().as_deref(), Some("Obstacle Detected"));
    }

    #[tokio::test]
    async fn unreachable_backup_is_an_error_not_a_panic() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let state = StateCell::new(ReplicatedState::observed(StateValue::Clear, Instant::now()));
        let publisher = CheckpointPublisher::new(
            addr.to_string(),
            Duration::from_millis(50),
            Duration::from_millis(200),
            state,
        );
        assert!(publisher.publish_once().await.is_err());
    }
}
