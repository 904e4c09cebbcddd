//! PRIMARY node: status server with fault injection plus checkpoint publisher.

use std::sync::Arc;
use std::time::Duration;

use crate::config::PrimaryConfig;
use crate::lifecycle::ShutdownSignal;
use crate::net::Listener;
use crate::node::detector::{Detector, RandomDetector};
use crate::node::injector::{Decision, FailureInjector, RandomInjector};
use crate::node::status::{serve_status, StatusReply, StatusSource};
use crate::protocol::{alive_line, is_heartbeat};
use crate::replication::CheckpointPublisher;
use crate::state::{Clock, ReplicatedState, StateCell, StateValue, SystemClock};

pub struct PrimaryNode {
    config: PrimaryConfig,
    state: StateCell,
    injector: Arc<dyn FailureInjector>,
    detector: Arc<dyn Detector>,
    clock: Arc<dyn Clock>,
}

impl PrimaryNode {
    pub fn new(config: PrimaryConfig) -> Self {
        let (injector, detector) = match config.seed {
            Some(seed) => (
                RandomInjector::seeded(config.failure_chance, seed),
                RandomDetector::seeded(seed.wrapping_add(1)),
            ),
            None => (RandomInjector::new(config.failure_chance), RandomDetector::new()),
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let state = StateCell::new(ReplicatedState::observed(StateValue::Clear, clock.now()));

        Self {
            config,
            state,
            injector: Arc::new(injector),
            detector: Arc::new(detector),
            clock,
        }
    }

    pub fn with_injector(mut self, injector: impl FailureInjector) -> Self {
        self.injector = Arc::new(injector);
        self
    }

    pub fn with_detector(mut self, detector: impl Detector) -> Self {
        self.detector = Arc::new(detector);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle to this node's state cell.
    pub fn state(&self) -> StateCell {
        self.state.clone()
    }

    fn status_source(&self) -> PrimaryStatus {
        PrimaryStatus {
            state: self.state.clone(),
            injector: self.injector.clone(),
            detector: self.detector.clone(),
            clock: self.clock.clone(),
            hang_duration: self.config.hang_duration(),
        }
    }

    /// Start the publisher, then serve heartbeats until shutdown.
    pub async fn run(self, listener: Listener, shutdown: ShutdownSignal) {
        tracing::info!(
            failure_chance = self.config.failure_chance,
            checkpoint_target = %self.config.checkpoint_target(),
            "PRIMARY starting"
        );

        let publisher = CheckpointPublisher::new(
            self.config.checkpoint_target(),
            self.config.checkpoint_interval(),
            self.config.checkpoint_connect_timeout(),
            self.state.clone(),
        );
        let publisher_task = tokio::spawn(publisher.run(shutdown.clone()));

        let source = Arc::new(self.status_source());
        serve_status(listener, source, self.config.read_timeout(), shutdown).await;

        if let Err(e) = publisher_task.await {
            tracing::error!(error = %e, "Checkpoint publisher task failed");
        }
    }
}

/// Reply policy of PRIMARY.
struct PrimaryStatus {
    state: StateCell,
    injector: Arc<dyn FailureInjector>,
    detector: Arc<dyn Detector>,
    clock: Arc<dyn Clock>,
    hang_duration: Duration,
}

impl StatusSource for PrimaryStatus {
    fn node(&self) -> &'static str {
        "primary"
    }

    fn reply(&self, request: &str) -> StatusReply {
        match self.injector.decide() {
            Decision::Crash => return StatusReply::Crash,
            Decision::Hang => return StatusReply::Hang(self.hang_duration),
            Decision::Respond => {}
        }

        if !is_heartbeat(request) {
            return StatusReply::Ignore;
        }

        // The publisher ships whatever is stored here on its next cycle.
        let value = self.detector.detect();
        self.state
            .replace(ReplicatedState::observed(value, self.clock.now()));
        StatusReply::Alive(alive_line(value, false))
    }
}
