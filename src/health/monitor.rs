//! The monitor loop.
//!
//! One poll cycle at a time: probe the active target, feed the session,
//! maybe probe PRIMARY for failback, then sleep. Nothing overlaps.

use std::time::Duration;

use tokio::sync::watch;

use crate::config::MonitorConfig;
use crate::health::probe::{Prober, TcpProber};
use crate::health::session::{FailoverPolicy, MonitorSession, MonitorState, Transition};
use crate::health::{Endpoint, Role};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;

/// Why the monitor loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// Both replicas exhausted their miss budget.
    Critical,
    /// Stopped by the shutdown signal.
    Shutdown,
}

pub struct Monitor<P = TcpProber> {
    prober: P,
    primary: Endpoint,
    backup: Endpoint,
    interval: Duration,
    session: MonitorSession,
    state_tx: watch::Sender<MonitorState>,
}

impl Monitor<TcpProber> {
    /// Monitor probing over TCP with the configured timeout.
    pub fn new(config: &MonitorConfig) -> Self {
        Self::with_prober(config, TcpProber::new(config.timeout()))
    }
}

impl<P: Prober> Monitor<P> {
    pub fn with_prober(config: &MonitorConfig, prober: P) -> Self {
        let session = MonitorSession::new(FailoverPolicy::from(config));
        let (state_tx, _) = watch::channel(session.state());
        Self {
            prober,
            primary: Endpoint::new(Role::Primary, config.primary_host.clone(), config.primary_port),
            backup: Endpoint::new(Role::Backup, config.backup_host.clone(), config.backup_port),
            interval: config.interval(),
            session,
            state_tx,
        }
    }

    pub fn session(&self) -> &MonitorSession {
        &self.session
    }

    /// Observe state changes from another task.
    pub fn subscribe(&self) -> watch::Receiver<MonitorState> {
        self.state_tx.subscribe()
    }

    fn endpoint(&self, role: Role) -> &Endpoint {
        match role {
            Role::Primary => &self.primary,
            Role::Backup => &self.backup,
        }
    }

    async fn check(&self, role: Role) -> bool {
        let endpoint = self.endpoint(role);
        let ok = match self.prober.probe(endpoint).await {
            Ok(reply) => {
                tracing::debug!(target_role = %role, endpoint = %endpoint, reply = %reply, "Probe answered");
                true
            }
            Err(e) => {
                tracing::debug!(target_role = %role, endpoint = %endpoint, error = %e, "Probe missed");
                false
            }
        };
        metrics::record_probe(role, ok);
        ok
    }

    fn apply(&self, transition: Transition) {
        let state = self.session.state();
        match transition {
            Transition::Failover => tracing::warn!(
                max_failures = self.session.policy().max_failures,
                backup = %self.backup,
                "Switching to BACKUP"
            ),
            Transition::Failback => tracing::info!(
                primary = %self.primary,
                "Failing back to PRIMARY"
            ),
            Transition::Critical => tracing::error!(
                "CRITICAL: both PRIMARY and BACKUP appear down"
            ),
        }
        metrics::record_transition(transition, state);
        self.state_tx.send_replace(state);
    }

    /// Run one poll cycle. Returns the state after the cycle.
    pub async fn poll_once(&mut self) -> MonitorState {
        let Some(active) = self.session.state().active_target() else {
            return MonitorState::Critical;
        };

        let ok = self.check(active).await;
        let transition = self.session.record_poll(ok);
        if ok {
            tracing::info!(target_role = %active, "OK: ALIVE");
        } else {
            tracing::warn!(
                target_role = %active,
                failures = self.session.consecutive_failures(),
                "MISS #{}",
                self.session.consecutive_failures()
            );
        }
        if let Some(transition) = transition {
            self.apply(transition);
        }

        if self.session.tick_failback() {
            let primary_ok = self.check(Role::Primary).await;
            let transition = self.session.record_primary_probe(primary_ok);
            if primary_ok {
                tracing::info!(
                    streak = self.session.primary_ok_streak(),
                    required = self.session.policy().ok_streak_for_failback,
                    "Primary probe OK"
                );
            } else {
                tracing::info!("Primary probe failed; staying on BACKUP");
            }
            if let Some(transition) = transition {
                self.apply(transition);
            }
        }

        self.session.state()
    }

    /// Poll until CRITICAL or shutdown.
    pub async fn run(mut self, mut shutdown: ShutdownSignal) -> MonitorOutcome {
        tracing::info!(
            primary = %self.primary,
            backup = %self.backup,
            interval_ms = self.interval.as_millis() as u64,
            max_failures = self.session.policy().max_failures,
            "Monitor started"
        );
        metrics::record_monitor_state(self.session.state());

        loop {
            let state = tokio::select! {
                state = self.poll_once() => state,
                _ = shutdown.recv() => return MonitorOutcome::Shutdown,
            };
            if state == MonitorState::Critical {
                return MonitorOutcome::Critical;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.recv() => return MonitorOutcome::Shutdown,
            }
        }
    }
}
