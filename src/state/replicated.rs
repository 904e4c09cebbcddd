//! Replicated state value and its lock-free cell.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use thiserror::Error;

/// Detection result carried by PRIMARY and shadowed by BACKUP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateValue {
    /// No checkpoint has reached this node yet (BACKUP only).
    Unknown,
    Clear,
    ObstacleDetected,
}

impl StateValue {
    /// Literal token used on the wire.
    pub fn as_token(&self) -> &'static str {
        match self {
            StateValue::Unknown => "Unknown",
            StateValue::Clear => "Clear",
            StateValue::ObstacleDetected => "Obstacle Detected",
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized state token: {0:?}")]
pub struct StateParseError(pub String);

impl FromStr for StateValue {
    type Err = StateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Clear" => Ok(StateValue::Clear),
            "Obstacle Detected" => Ok(StateValue::ObstacleDetected),
            "Unknown" => Ok(StateValue::Unknown),
            other => Err(StateParseError(other.to_string())),
        }
    }
}

/// A state value plus the instant it was produced or received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicatedState {
    pub value: StateValue,
    /// `None` until the first observation (BACKUP before any checkpoint).
    pub observed_at: Option<Instant>,
}

impl ReplicatedState {
    /// Initial BACKUP state: nothing received yet.
    pub fn unknown() -> Self {
        Self {
            value: StateValue::Unknown,
            observed_at: None,
        }
    }

    pub fn observed(value: StateValue, at: Instant) -> Self {
        Self {
            value,
            observed_at: Some(at),
        }
    }

    /// Stale iff `now - observed_at > window`. Never observed counts as stale.
    pub fn is_stale(&self, now: Instant, window: Duration) -> bool {
        match self.observed_at {
            Some(at) => now.saturating_duration_since(at) > window,
            None => true,
        }
    }
}

/// Single shared cell per node.
///
/// Readers take a snapshot, the owning writer replaces the whole value.
/// No lock is ever held, so I/O can't stall a reader.
#[derive(Debug, Clone)]
pub struct StateCell {
    inner: Arc<ArcSwap<ReplicatedState>>,
}

impl StateCell {
    pub fn new(initial: ReplicatedState) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(initial)),
        }
    }

    pub fn snapshot(&self) -> Arc<ReplicatedState> {
        self.inner.load_full()
    }

    pub fn replace(&self, state: ReplicatedState) {
        self.inner.store(Arc::new(state));
    }
}
