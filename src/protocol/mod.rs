//! Line-oriented wire protocol.
//!
//! # Messages
//! ```text
//! Status exchange (monitor → node):
//!     → "HEARTBEAT\n"
//!     ← "ALIVE | Status: <value>\n"
//!     ← "ALIVE | Status: <value> [STALE]\n"     (BACKUP, window exceeded)
//!     any other request → no reply, connection closed
//!
//! Checkpoint (PRIMARY → BACKUP):
//!     → "<value>\n"                              (no reply, no ack)
//! ```
//!
//! # Design Decisions
//! - One request line, at most one reply line, then close
//! - Lines are capped so a misbehaving peer can't grow a buffer unbounded

pub mod io;

use crate::state::StateValue;

/// Status request token.
pub const HEARTBEAT: &str = "HEARTBEAT";

/// Prefix of every successful status reply.
pub const ALIVE_PREFIX: &str = "ALIVE";

/// Marker appended by BACKUP when its checkpoint is too old.
pub const STALE_MARKER: &str = "[STALE]";

/// Longest line either side will read.
pub const MAX_LINE_BYTES: u64 = 1024;

pub fn is_heartbeat(line: &str) -> bool {
    line == HEARTBEAT
}

/// Compose a status reply.
pub fn alive_line(value: StateValue, stale: bool) -> String {
    if stale {
        format!("{ALIVE_PREFIX} | Status: {value} {STALE_MARKER}")
    } else {
        format!("{ALIVE_PREFIX} | Status: {value}")
    }
}

/// A probe succeeds iff the reply begins with `ALIVE`.
pub fn is_alive(reply: &str) -> bool {
    reply.starts_with(ALIVE_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alive_line_format() {
        assert_eq!(alive_line(StateValue::Clear, false), "ALIVE | Status: Clear");
        assert_eq!(
            alive_line(StateValue::ObstacleDetected, true),
            "ALIVE | Status: Obstacle Detected [STALE]"
        );
    }

    #[test]
    fn only_alive_prefix_counts() {
        assert!(is_alive("ALIVE | Status: Clear"));
        assert!(!is_alive("DEAD"));
        assert!(!is_alive(""));
        assert!(!is_alive(" ALIVE"));
    }

    #[test]
    fn heartbeat_is_exact() {
        assert!(is_heartbeat("HEARTBEAT"));
        assert!(!is_heartbeat("heartbeat"));
        assert!(!is_heartbeat("HEARTBEAT "));
    }
}
