//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use heartbeat_failover::config::{BackupConfig, PrimaryConfig};
use heartbeat_failover::health::{Endpoint, ProbeError, Prober, Role, TcpProber};
use heartbeat_failover::lifecycle::Shutdown;
use heartbeat_failover::net::Listener;
use heartbeat_failover::node::{BackupNode, Decision, Detector, FailureInjector, PrimaryNode};
use heartbeat_failover::protocol::io::{read_line, write_line};
use heartbeat_failover::state::StateValue;
use tokio::net::TcpListener;

/// Start a status stub that counts connections and answers with `reply`,
/// or drops the connection when `reply` is `None`.
pub async fn start_counting_stub(reply: Option<&'static str>) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let count = Arc::new(AtomicUsize::new(0));
    let counter = count.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(async move {
                        let _ = read_line(&mut socket).await;
                        if let Some(reply) = reply {
                            let _ = write_line(&mut socket, reply).await;
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, count)
}

/// A running BACKUP node.
pub struct BackupHandle {
    pub status_addr: SocketAddr,
    pub checkpoint_addr: SocketAddr,
    pub shutdown: Shutdown,
}

pub async fn spawn_backup(config: BackupConfig) -> BackupHandle {
    let status = Listener::bind("127.0.0.1:0", config.max_connections).await.unwrap();
    let checkpoints = Listener::bind("127.0.0.1:0", config.max_connections).await.unwrap();
    let status_addr = status.local_addr().unwrap();
    let checkpoint_addr = checkpoints.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(BackupNode::new(config).run(status, checkpoints, signal));

    BackupHandle {
        status_addr,
        checkpoint_addr,
        shutdown,
    }
}

/// PRIMARY config pointed at a local BACKUP checkpoint port.
pub fn primary_config(checkpoint_port: u16) -> PrimaryConfig {
    PrimaryConfig {
        failure_chance: 0.0,
        backup_host: "127.0.0.1".to_string(),
        checkpoint_port,
        checkpoint_interval_ms: 100,
        checkpoint_connect_timeout_ms: 200,
        hang_duration_ms: 2_000,
        seed: Some(1),
        ..PrimaryConfig::default()
    }
}

/// A running PRIMARY node.
pub struct PrimaryHandle {
    pub status_addr: SocketAddr,
    pub shutdown: Shutdown,
}

pub async fn spawn_primary(node: PrimaryNode) -> PrimaryHandle {
    let listener = Listener::bind("127.0.0.1:0", 64).await.unwrap();
    let status_addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();
    tokio::spawn(node.run(listener, signal));
    PrimaryHandle { status_addr, shutdown }
}

/// Plays back a fixed list of decisions, then responds normally.
pub struct ScriptedInjector(Mutex<VecDeque<Decision>>);

impl ScriptedInjector {
    pub fn new(script: impl IntoIterator<Item = Decision>) -> Self {
        Self(Mutex::new(script.into_iter().collect()))
    }
}

impl FailureInjector for ScriptedInjector {
    fn decide(&self) -> Decision {
        self.0.lock().unwrap().pop_front().unwrap_or(Decision::Respond)
    }
}

/// Injector that crashes every request while its flag is set.
#[derive(Clone, Default)]
pub struct Outage(pub Arc<AtomicBool>);

impl Outage {
    pub fn set(&self, down: bool) {
        self.0.store(down, Ordering::SeqCst);
    }
}

impl FailureInjector for Outage {
    fn decide(&self) -> Decision {
        if self.0.load(Ordering::SeqCst) {
            Decision::Crash
        } else {
            Decision::Respond
        }
    }
}

/// Always detects the same value, but can be changed mid-test.
pub struct SharedDetector(pub Arc<Mutex<StateValue>>);

impl Detector for SharedDetector {
    fn detect(&self) -> StateValue {
        *self.0.lock().unwrap()
    }
}

/// TCP prober that records which port every probe went to.
pub struct RecordingProber {
    inner: TcpProber,
    pub ports: Arc<Mutex<Vec<u16>>>,
}

impl RecordingProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            inner: TcpProber::new(timeout),
            ports: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Prober for RecordingProber {
    async fn probe(&self, endpoint: &Endpoint) -> Result<String, ProbeError> {
        self.ports.lock().unwrap().push(endpoint.port);
        self.inner.probe(endpoint).await
    }
}

/// Poll `condition` until it holds or `timeout` passes.
pub async fn wait_until<F, Fut>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}

/// Probe once over TCP, returning the reply on success.
pub async fn probe(addr: SocketAddr, timeout: Duration) -> Result<String, ProbeError> {
    let endpoint = Endpoint::new(
        Role::Primary,
        addr.ip().to_string(),
        addr.port(),
    );
    TcpProber::new(timeout).probe(&endpoint).await
}
