//! Checkpoint replication subsystem.
//!
//! # Data Flow
//! ```text
//! PRIMARY StateCell
//!     → publisher.rs (every interval, short connect timeout)
//!     → "<value>\n" over TCP
//!     → receiver.rs (one line per connection)
//!     → BACKUP StateCell (value + receipt time)
//! ```
//!
//! # Design Decisions
//! - At-most-once, lossy: no sequence numbers, no acks
//! - A lost checkpoint only delays freshness until the next one
//! - Receiver handles each connection in its own task; every write is a
//!   whole-value swap of the state cell, so the receiver is the only writer

pub mod publisher;
pub mod receiver;

pub use publisher::{CheckpointPublisher, PublishError};
pub use receiver::CheckpointReceiver;
