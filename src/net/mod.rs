//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limit, shutdown)
//!     → connection.rs (id + live-connection tracking)
//!     → per-connection task running the node's handler
//! ```
//!
//! # Design Decisions
//! - Bounded concurrency prevents resource exhaustion
//! - Each connection runs in its own task
//! - Accept loops drain in-flight handlers on shutdown

pub mod connection;
pub mod listener;

pub use listener::{serve, Incoming, Listener, ListenerError};
