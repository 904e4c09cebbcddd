//! TCP listener with a connection limit and a shutdown-aware accept loop.
//!
//! # Responsibilities
//! - Bind to a configured address
//! - Accept incoming TCP connections
//! - Enforce max_connections via semaphore
//! - Hand each connection to its own task so a stalled peer blocks nobody

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::lifecycle::ShutdownSignal;
use crate::net::connection::{ConnectionId, ConnectionTracker};

/// How long an accept loop waits for in-flight handlers after shutdown.
pub const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to accept: {0}")]
    Accept(#[source] std::io::Error),
    #[error("connection limiter closed")]
    LimiterClosed,
}

/// A bounded TCP listener that limits concurrent connections.
pub struct Listener {
    inner: TcpListener,
    connection_limit: Arc<Semaphore>,
    max_connections: usize,
}

impl Listener {
    /// Bind to `addr` (e.g. `0.0.0.0:9999`) allowing `max_connections` live handlers.
    pub async fn bind(addr: &str, max_connections: usize) -> Result<Self, ListenerError> {
        let bind_err = |source| ListenerError::Bind {
            addr: addr.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).await.map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        tracing::info!(
            address = %local_addr,
            max_connections,
            "Listener bound"
        );

        Ok(Self {
            inner: listener,
            connection_limit: Arc::new(Semaphore::new(max_connections)),
            max_connections,
        })
    }

    /// Accept a new connection, waiting for a free slot first.
    ///
    /// The returned permit must be held for the connection's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ConnectionPermit), ListenerError> {
        let permit = self
            .connection_limit
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::LimiterClosed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_permits = self.connection_limit.available_permits(),
            "Connection accepted"
        );

        Ok((stream, addr, ConnectionPermit { _permit: permit }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    pub fn available_permits(&self) -> usize {
        self.connection_limit.available_permits()
    }

    pub fn max_connections(&self) -> usize {
        self.max_connections
    }
}

/// A permit representing a connection slot, released on drop.
#[derive(Debug)]
pub struct ConnectionPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

/// Per-connection context handed to a handler.
#[derive(Debug)]
pub struct Incoming {
    pub stream: TcpStream,
    pub peer: SocketAddr,
    pub id: ConnectionId,
    pub shutdown: ShutdownSignal,
}

/// Run an accept loop until shutdown, spawning `handler` per connection.
///
/// After shutdown the loop stops accepting and waits up to
/// [`DRAIN_DEADLINE`] for in-flight handlers.
pub async fn serve<F, Fut>(listener: Listener, mut shutdown: ShutdownSignal, handler: F)
where
    F: Fn(Incoming) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let handler = Arc::new(handler);
    let tracker = ConnectionTracker::new();

    loop {
        let accepted = tokio::select! {
            res = listener.accept() => res,
            _ = shutdown.recv() => break,
        };

        let (stream, peer, permit) = match accepted {
            Ok(conn) => conn,
            Err(ListenerError::LimiterClosed) => break,
            Err(e) => {
                tracing::warn!(error = %e, "Accept failed");
                continue;
            }
        };

        let guard = tracker.track();
        let incoming = Incoming {
            stream,
            peer,
            id: guard.id(),
            shutdown: shutdown.clone(),
        };
        let handler = handler.clone();
        tokio::spawn(async move {
            let _permit = permit;
            let _guard = guard;
            handler(incoming).await;
        });
    }

    let in_flight = tracker.active_count();
    if in_flight > 0 {
        tracing::info!(in_flight, "Draining connections");
        if !tracker.wait_idle(DRAIN_DEADLINE).await {
            tracing::warn!(
                remaining = tracker.active_count(),
                "Drain deadline passed with connections still open"
            );
        }
    }
}
