//! Replicated state subsystem.
//!
//! # Data Flow
//! ```text
//! PRIMARY:
//!     status handler → detect → StateCell::replace
//!     checkpoint publisher → StateCell::snapshot → wire
//!
//! BACKUP:
//!     checkpoint receiver → StateCell::replace (observed_at = clock.now())
//!     status handler → StateCell::snapshot → staleness check at reply time
//! ```
//!
//! # Design Decisions
//! - One `ArcSwap` cell per node, one writer per role
//! - Staleness is computed on every read, never cached
//! - Time comes from a `Clock` so tests can control it

pub mod clock;
pub mod replicated;

pub use clock::{Clock, ManualClock, SystemClock};
pub use replicated::{ReplicatedState, StateCell, StateParseError, StateValue};
