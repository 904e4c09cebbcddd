//! Single status probe over TCP.
//!
//! # Responsibilities
//! - Connect with a bounded timeout
//! - Send `HEARTBEAT`, read one reply line with the same timeout
//! - Classify every failure mode as a miss

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

use crate::health::Endpoint;
use crate::protocol::io::{read_line, write_line};
use crate::protocol::{is_alive, HEARTBEAT};

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("connect timed out after {0:?}")]
    ConnectTimeout(Duration),
    #[error("connect failed: {0}")]
    Connect(#[source] std::io::Error),
    #[error("reply timed out after {0:?}")]
    ReadTimeout(Duration),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("connection closed without reply")]
    Closed,
    #[error("unexpected reply: {0:?}")]
    Unexpected(String),
}

/// Issues one health check against an endpoint.
pub trait Prober: Send + Sync {
    /// Returns the reply line on success (it begins with `ALIVE`).
    fn probe(&self, endpoint: &Endpoint) -> impl Future<Output = Result<String, ProbeError>> + Send;
}

/// Probe over a fresh TCP connection per call.
#[derive(Debug, Clone)]
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    /// `timeout` bounds the connect and, separately, the reply read.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Prober for TcpProber {
    async fn probe(&self, endpoint: &Endpoint) -> Result<String, ProbeError> {
        let mut stream = time::timeout(
            self.timeout,
            TcpStream::connect((endpoint.host.as_str(), endpoint.port)),
        )
        .await
        .map_err(|_| ProbeError::ConnectTimeout(self.timeout))?
        .map_err(ProbeError::Connect)?;

        write_line(&mut stream, HEARTBEAT).await?;

        let reply = time::timeout(self.timeout, read_line(&mut stream))
            .await
            .map_err(|_| ProbeError::ReadTimeout(self.timeout))??;

        match reply {
            None => Err(ProbeError::Closed),
            Some(line) if is_alive(&line) => Ok(line),
            Some(line) => Err(ProbeError::Unexpected(line)),
        }
    }
}
