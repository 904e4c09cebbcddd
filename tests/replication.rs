//! Checkpoint flow from PRIMARY to BACKUP and staleness over the wire.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use heartbeat_failover::config::BackupConfig;
use heartbeat_failover::node::{FixedDetector, PrimaryNode};
use heartbeat_failover::protocol::io::write_line;
use heartbeat_failover::state::StateValue;
use tokio::net::TcpStream;

mod common;

const TIMEOUT: Duration = Duration::from_millis(500);

#[tokio::test]
async fn primary_state_reaches_backup() {
    let backup = common::spawn_backup(BackupConfig::default()).await;
    let primary = common::spawn_primary(
        PrimaryNode::new(common::primary_config(backup.checkpoint_addr.port()))
            .with_detector(FixedDetector(StateValue::ObstacleDetected)),
    )
    .await;

    let reply = common::probe(primary.status_addr, TIMEOUT).await.unwrap();
    assert_eq!(reply, "ALIVE | Status: Obstacle Detected");

    let backup_addr = backup.status_addr;
    let replicated = common::wait_until(Duration::from_secs(2), move || async move {
        matches!(
            common::probe(backup_addr, TIMEOUT).await.as_deref(),
            Ok("ALIVE | Status: Obstacle Detected")
        )
    })
    .await;
    assert!(replicated, "BACKUP never reported the checkpointed state");

    primary.shutdown.trigger();
    backup.shutdown.trigger();
}

#[tokio::test]
async fn backup_goes_stale_when_checkpoints_stop() {
    let backup = common::spawn_backup(BackupConfig {
        stale_window_ms: 300,
        ..BackupConfig::default()
    })
    .await;

    // Nothing received yet.
    let reply = common::probe(backup.status_addr, TIMEOUT).await.unwrap();
    assert_eq!(reply, "ALIVE | Status: Unknown [STALE]");

    let value = Arc::new(Mutex::new(StateValue::Clear));
    let primary = common::spawn_primary(
        PrimaryNode::new(common::primary_config(backup.checkpoint_addr.port()))
            .with_detector(common::SharedDetector(value.clone())),
    )
    .await;

    let backup_addr = backup.status_addr;
    let fresh = common::wait_until(Duration::from_secs(2), move || async move {
        matches!(
            common::probe(backup_addr, TIMEOUT).await.as_deref(),
            Ok("ALIVE | Status: Clear")
        )
    })
    .await;
    assert!(fresh, "BACKUP never became fresh");

    // A served request changes PRIMARY's state; the next checkpoint carries it.
    *value.lock().unwrap() = StateValue::ObstacleDetected;
    common::probe(primary.status_addr, TIMEOUT).await.unwrap();
    let updated = common::wait_until(Duration::from_secs(2), move || async move {
        matches!(
            common::probe(backup_addr, TIMEOUT).await.as_deref(),
            Ok("ALIVE | Status: Obstacle Detected")
        )
    })
    .await;
    assert!(updated, "BACKUP never picked up the new state");

    primary.shutdown.trigger();
    let stale = common::wait_until(Duration::from_secs(2), move || async move {
        matches!(
            common::probe(backup_addr, TIMEOUT).await.as_deref(),
            Ok("ALIVE | Status: Obstacle Detected [STALE]")
        )
    })
    .await;
    assert!(stale, "BACKUP kept reporting fresh state without checkpoints");

    backup.shutdown.trigger();
}

#[tokio::test]
async fn idle_checkpoint_peer_does_not_hold_back_checkpoints() {
    // Default read timeout (10s) is longer than the stale window.
    let backup = common::spawn_backup(BackupConfig::default()).await;

    // Connects and never sends a line.
    let _idle = TcpStream::connect(backup.checkpoint_addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut publisher = TcpStream::connect(backup.checkpoint_addr).await.unwrap();
    write_line(&mut publisher, "Clear").await.unwrap();
    drop(publisher);

    let backup_addr = backup.status_addr;
    let applied = common::wait_until(Duration::from_secs(1), move || async move {
        matches!(
            common::probe(backup_addr, TIMEOUT).await.as_deref(),
            Ok("ALIVE | Status: Clear")
        )
    })
    .await;
    assert!(applied, "checkpoint waited behind the idle connection");

    backup.shutdown.trigger();
}

#[tokio::test]
async fn primary_tolerates_missing_backup() {
    // Reserve a port, then free it so nothing listens there.
    let unused = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = unused.local_addr().unwrap().port();
    drop(unused);

    let primary = common::spawn_primary(PrimaryNode::new(common::primary_config(port))).await;
    tokio::time::sleep(Duration::from_millis(350)).await;

    let reply = common::probe(primary.status_addr, TIMEOUT).await.unwrap();
    assert!(reply.starts_with("ALIVE | Status: "));

    primary.shutdown.trigger();
}
