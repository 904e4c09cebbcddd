//! Replica nodes.
//!
//! # Data Flow
//! ```text
//! PRIMARY (primary.rs):
//!     status.rs accept loop → injector.rs (respond / crash / hang)
//!         → detector.rs → StateCell → reply
//!     replication::publisher → BACKUP checkpoint port
//!
//! BACKUP (backup.rs):
//!     replication::receiver → StateCell
//!     status.rs accept loop → StateCell snapshot + staleness → reply
//! ```
//!
//! # Design Decisions
//! - Both roles share one status server; only the reply policy differs
//! - Randomness sits behind traits so tests force each outcome

pub mod backup;
pub mod detector;
pub mod injector;
pub mod primary;
pub mod status;

pub use backup::BackupNode;
pub use detector::{Detector, FixedDetector, RandomDetector};
pub use injector::{Decision, FailureInjector, FixedInjector, RandomInjector};
pub use primary::PrimaryNode;
pub use status::{StatusReply, StatusSource};
