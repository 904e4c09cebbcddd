//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → every ShutdownSignal resolves
//!     → accept loops stop accepting → drain handlers
//!     → publisher and monitor loops exit
//! ```
//!
//! # Design Decisions
//! - One coordinator per process, cloned into every task
//! - Late subscribers still observe an earlier trigger
//! - Shutdown never changes wire behavior, it only ends loops

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownSignal};
