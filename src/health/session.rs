//! Failover/failback state machine.
//!
//! # States
//! - OnPrimary: traffic (and polling) goes to PRIMARY
//! - OnBackup: PRIMARY missed too often, BACKUP is active
//! - Critical: BACKUP missed too often as well (terminal)
//!
//! # State Transitions
//! ```text
//! OnPrimary → OnBackup: consecutive_failures >= max_failures
//! OnBackup  → Critical: consecutive_failures >= max_failures
//! OnBackup  → OnPrimary: primary_ok_streak >= ok_streak_for_failback
//! ```
//!
//! # Design Decisions
//! - Pure and synchronous, the monitor loop feeds it probe results
//! - Hysteresis on failback: PRIMARY must answer an unbroken streak
//!   of background probes before traffic returns to it

use crate::config::MonitorConfig;
use crate::health::Role;

/// Monitor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    OnPrimary,
    OnBackup,
    Critical,
}

impl MonitorState {
    /// Target polled in this state, `None` once critical.
    pub fn active_target(&self) -> Option<Role> {
        match self {
            MonitorState::OnPrimary => Some(Role::Primary),
            MonitorState::OnBackup => Some(Role::Backup),
            MonitorState::Critical => None,
        }
    }
}

/// A state change produced by one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Failover,
    Failback,
    Critical,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::Failover => "failover",
            Transition::Failback => "failback",
            Transition::Critical => "critical",
        }
    }
}

/// Thresholds driving the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailoverPolicy {
    pub max_failures: u32,
    pub probe_primary_every_n_beats: u32,
    pub ok_streak_for_failback: u32,
}

impl From<&MonitorConfig> for FailoverPolicy {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            max_failures: config.max_failures,
            probe_primary_every_n_beats: config.probe_primary_every_n_beats,
            ok_streak_for_failback: config.ok_streak_for_failback,
        }
    }
}

/// Counters and current state of one monitor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSession {
    state: MonitorState,
    consecutive_failures: u32,
    beats_since_probe: u32,
    primary_ok_streak: u32,
    policy: FailoverPolicy,
}

impl MonitorSession {
    pub fn new(policy: FailoverPolicy) -> Self {
        Self {
            state: MonitorState::OnPrimary,
            consecutive_failures: 0,
            beats_since_probe: 0,
            primary_ok_streak: 0,
            policy,
        }
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn beats_since_probe(&self) -> u32 {
        self.beats_since_probe
    }

    pub fn primary_ok_streak(&self) -> u32 {
        self.primary_ok_streak
    }

    pub fn policy(&self) -> FailoverPolicy {
        self.policy
    }

    /// Record the result of polling the active target.
    pub fn record_poll(&mut self, ok: bool) -> Option<Transition> {
        if self.state == MonitorState::Critical {
            return None;
        }

        if ok {
            self.consecutive_failures = 0;
            return None;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures < self.policy.max_failures {
            return None;
        }

        match self.state {
            MonitorState::OnPrimary => {
                self.state = MonitorState::OnBackup;
                self.consecutive_failures = 0;
                self.beats_since_probe = 0;
                self.primary_ok_streak = 0;
                Some(Transition::Failover)
            }
            MonitorState::OnBackup => {
                self.state = MonitorState::Critical;
                Some(Transition::Critical)
            }
            MonitorState::Critical => None,
        }
    }

    /// Count a cycle spent on BACKUP. True when PRIMARY should be probed now.
    pub fn tick_failback(&mut self) -> bool {
        if self.state != MonitorState::OnBackup {
            return false;
        }
        self.beats_since_probe += 1;
        if self.beats_since_probe >= self.policy.probe_primary_every_n_beats {
            self.beats_since_probe = 0;
            true
        } else {
            false
        }
    }

    /// Record the result of a background PRIMARY probe.
    pub fn record_primary_probe(&mut self, ok: bool) -> Option<Transition> {
        if self.state != MonitorState::OnBackup {
            return None;
        }

        if !ok {
            self.primary_ok_streak = 0;
            return None;
        }

        self.primary_ok_streak += 1;
        if self.primary_ok_streak >= self.policy.ok_streak_for_failback {
            self.state = MonitorState::OnPrimary;
            self.consecutive_failures = 0;
            self.primary_ok_streak = 0;
            Some(Transition::Failback)
        } else {
            None
        }
    }
}
