//! Monitor failover, failback and exhaustion against live sockets.

use std::sync::atomic::Ordering;
use std::time::Duration;

use heartbeat_failover::config::{BackupConfig, MonitorConfig};
use heartbeat_failover::health::{Monitor, MonitorOutcome, MonitorState};
use heartbeat_failover::lifecycle::Shutdown;
use heartbeat_failover::node::PrimaryNode;

mod common;

fn monitor_config(primary_port: u16, backup_port: u16, max_failures: u32) -> MonitorConfig {
    MonitorConfig {
        interval_ms: 20,
        timeout_ms: 300,
        max_failures,
        primary_host: "127.0.0.1".to_string(),
        primary_port,
        backup_host: "127.0.0.1".to_string(),
        backup_port,
        probe_primary_every_n_beats: 1_000,
        ok_streak_for_failback: 2,
    }
}

#[tokio::test]
async fn primary_outage_switches_polling_to_backup() {
    let backup = common::spawn_backup(BackupConfig::default()).await;
    let outage = common::Outage::default();
    let primary = common::spawn_primary(
        PrimaryNode::new(common::primary_config(backup.checkpoint_addr.port())).with_injector(outage.clone()),
    )
    .await;

    let primary_port = primary.status_addr.port();
    let backup_port = backup.status_addr.port();
    let prober = common::RecordingProber::new(Duration::from_millis(300));
    let ports = prober.ports.clone();
    let mut monitor = Monitor::with_prober(&monitor_config(primary_port, backup_port, 2), prober);

    assert_eq!(monitor.poll_once().await, MonitorState::OnPrimary);
    assert_eq!(monitor.session().consecutive_failures(), 0);

    outage.set(true);
    assert_eq!(monitor.poll_once().await, MonitorState::OnPrimary);
    assert_eq!(monitor.poll_once().await, MonitorState::OnBackup);
    assert_eq!(monitor.session().consecutive_failures(), 0);

    for _ in 0..3 {
        assert_eq!(monitor.poll_once().await, MonitorState::OnBackup);
    }

    let ports = ports.lock().unwrap().clone();
    assert_eq!(&ports[..3], &[primary_port; 3]);
    assert_eq!(&ports[3..], &[backup_port; 3]);

    primary.shutdown.trigger();
    backup.shutdown.trigger();
}

#[tokio::test]
async fn both_replicas_down_is_critical_after_two_polls() {
    let (primary_addr, primary_hits) = common::start_counting_stub(None).await;
    let (backup_addr, backup_hits) = common::start_counting_stub(None).await;

    let config = monitor_config(primary_addr.port(), backup_addr.port(), 1);
    let shutdown = Shutdown::new();
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        Monitor::new(&config).run(shutdown.subscribe()),
    )
    .await
    .expect("monitor should terminate on its own");

    assert_eq!(outcome, MonitorOutcome::Critical);
    assert_eq!(primary_hits.load(Ordering::SeqCst), 1);
    assert_eq!(backup_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn non_alive_reply_counts_as_miss() {
    let (primary_addr, _) = common::start_counting_stub(Some("BUSY")).await;
    let (backup_addr, backup_hits) = common::start_counting_stub(Some("ALIVE | Status: Clear")).await;

    let mut monitor = Monitor::new(&monitor_config(primary_addr.port(), backup_addr.port(), 2));
    assert_eq!(monitor.poll_once().await, MonitorState::OnPrimary);
    assert_eq!(monitor.poll_once().await, MonitorState::OnBackup);
    assert_eq!(monitor.poll_once().await, MonitorState::OnBackup);
    assert_eq!(monitor.session().consecutive_failures(), 0);
    assert_eq!(backup_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn recovered_primary_fails_back_after_streak() {
    let backup = common::spawn_backup(BackupConfig::default()).await;
    let outage = common::Outage::default();
    outage.set(true);
    let primary = common::spawn_primary(
        PrimaryNode::new(common::primary_config(backup.checkpoint_addr.port())).with_injector(outage.clone()),
    )
    .await;

    let mut config = monitor_config(primary.status_addr.port(), backup.status_addr.port(), 1);
    config.probe_primary_every_n_beats = 2;
    config.ok_streak_for_failback = 2;
    let monitor = Monitor::new(&config);
    let mut states = monitor.subscribe();

    let shutdown = Shutdown::new();
    let task = tokio::spawn(monitor.run(shutdown.subscribe()));

    tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == MonitorState::OnBackup))
        .await
        .expect("should fail over")
        .unwrap();

    outage.set(false);
    tokio::time::timeout(Duration::from_secs(5), states.wait_for(|s| *s == MonitorState::OnPrimary))
        .await
        .expect("should fail back")
        .unwrap();

    shutdown.trigger();
    let outcome = task.await.unwrap();
    assert_eq!(outcome, MonitorOutcome::Shutdown);

    primary.shutdown.trigger();
    backup.shutdown.trigger();
}
