//! Health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! monitor.rs (single sequential loop):
//!     every interval
//!     → probe.rs: HEARTBEAT to the active target
//!     → session.rs: record result, maybe fail over / go critical
//!     → while on BACKUP, every N beats probe PRIMARY out of band
//!     → session.rs: record streak, maybe fail back
//! ```
//!
//! # Design Decisions
//! - Consecutive-miss threshold before any state change
//! - Failback requires an unbroken streak of PRIMARY probes (hysteresis)
//! - Probing is behind a trait so the loop can be driven without sockets

pub mod monitor;
pub mod probe;
pub mod session;

use std::fmt;

pub use monitor::{Monitor, MonitorOutcome};
pub use probe::{ProbeError, Prober, TcpProber};
pub use session::{FailoverPolicy, MonitorSession, MonitorState, Transition};

/// Which replica an endpoint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Primary,
    Backup,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Primary => "primary",
            Role::Backup => "backup",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Primary => f.write_str("PRIMARY"),
            Role::Backup => f.write_str("BACKUP"),
        }
    }
}

/// Network location of a replica's status server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub role: Role,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(role: Role, host: impl Into<String>, port: u16) -> Self {
        Self {
            role,
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
