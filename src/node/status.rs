//! Status server shared by PRIMARY and BACKUP.
//!
//! Accept a connection, read one line, let the node decide the reply.
//! Every connection runs in its own task, so a hang on one never delays
//! another.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::time;

use crate::lifecycle::ShutdownSignal;
use crate::net::{serve, Incoming, Listener};
use crate::observability::metrics;
use crate::protocol::io::{read_line, write_line};

/// What to do with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusReply {
    /// Send this line, then close.
    Alive(String),
    /// Close without replying.
    Crash,
    /// Hold the connection open for this long, then close.
    Hang(Duration),
    /// Not a heartbeat: close without replying.
    Ignore,
}

impl StatusReply {
    fn outcome(&self) -> &'static str {
        match self {
            StatusReply::Alive(_) => "alive",
            StatusReply::Crash => "crash",
            StatusReply::Hang(_) => "hang",
            StatusReply::Ignore => "ignored",
        }
    }
}

/// A node's reply policy.
pub trait StatusSource: Send + Sync + 'static {
    /// Node name used in logs and metrics.
    fn node(&self) -> &'static str;

    fn reply(&self, request: &str) -> StatusReply;
}

/// Serve status requests until shutdown.
pub async fn serve_status<S: StatusSource>(
    listener: Listener,
    source: Arc<S>,
    read_timeout: Duration,
    shutdown: ShutdownSignal,
) {
    let node = source.node();
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(node, address = %addr, "Serving heartbeats");
    }

    serve(listener, shutdown, move |conn: Incoming| {
        let source = source.clone();
        async move { handle_connection(source.as_ref(), read_timeout, conn).await }
    })
    .await;

    tracing::info!(node, "Status server stopped");
}

async fn handle_connection<S: StatusSource>(source: &S, read_timeout: Duration, mut conn: Incoming) {
    let node = source.node();
    let request = match time::timeout(read_timeout, read_line(&mut conn.stream)).await {
        Ok(Ok(Some(line))) => line,
        Ok(Ok(None)) => {
            tracing::debug!(node, connection_id = %conn.id, "Peer closed before sending a request");
            return;
        }
        Ok(Err(e)) => {
            tracing::debug!(node, connection_id = %conn.id, error = %e, "Read failed");
            return;
        }
        Err(_) => {
            tracing::debug!(node, connection_id = %conn.id, "No request before read timeout");
            return;
        }
    };

    let reply = source.reply(&request);
    metrics::record_heartbeat(node, reply.outcome());

    match reply {
        StatusReply::Alive(line) => {
            if let Err(e) = write_line(&mut conn.stream, &line).await {
                // Client likely gave up on its timeout already.
                tracing::debug!(node, connection_id = %conn.id, error = %e, "Reply not delivered");
                return;
            }
            tracing::debug!(node, connection_id = %conn.id, peer = %conn.peer, reply = %line, "Heartbeat answered");
            let _ = conn.stream.shutdown().await;
        }
        StatusReply::Crash => {
            tracing::warn!(node, connection_id = %conn.id, "CRASHED (simulated): closing connection immediately");
        }
        StatusReply::Hang(duration) => {
            tracing::warn!(
                node,
                connection_id = %conn.id,
                hang_ms = duration.as_millis() as u64,
                "UNRESPONSIVE (simulated): stalling connection"
            );
            tokio::select! {
                _ = time::sleep(duration) => {}
                _ = conn.shutdown.recv() => {}
            }
        }
        StatusReply::Ignore => {
            tracing::debug!(node, connection_id = %conn.id, request = %request, "Ignoring unexpected request");
        }
    }
}
