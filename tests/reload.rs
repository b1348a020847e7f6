//! Live policy reload through the update channel.

use std::fs;
use std::sync::Arc;
use tokio::sync::mpsc;
use policy_gate::config::loader::parse_config;
use policy_gate::config::watcher::ConfigWatcher;
use policy_gate::lifecycle::startup::apply_policy_updates;
use policy_gate::lifecycle::Shutdown;
use policy_gate::{PolicyEngine, PolicySettings};

mod common;

#[tokio::test]
async fn test_reload_replaces_host_ranges() {
    let settings = PolicySettings::from_tokens(Some(4), &["10.0.0.1"]).unwrap();
    let engine = Arc::new(PolicyEngine::new(settings));
    let shutdown = Shutdown::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(apply_policy_updates(Arc::clone(&engine), rx, shutdown.subscribe()));

    let held = engine.evaluate(&"10.0.0.1".parse().unwrap());
    assert!(held.is_admitted());

    let update = parse_config(
        r#"
        [policy]
        maximum_connections = 4
        allowed_hosts = ["192.168.0.0,192.168.0.255"]
        "#,
    )
    .unwrap();
    tx.send(update).unwrap();

    assert!(common::wait_until(|| engine.snapshot().host_ranges == vec!["192.168.0.0,192.168.0.255"]).await);
    assert!(!engine.evaluate(&"10.0.0.1".parse().unwrap()).is_admitted());
    assert!(engine.evaluate(&"192.168.0.9".parse().unwrap()).is_admitted());
    // The connection admitted under the old rules keeps its slot.
    assert_eq!(engine.connections_current(), 1);

    drop(held);
    shutdown.trigger();
    task.await.unwrap();
}

#[tokio::test]
async fn test_reload_keeps_maximum() {
    let engine = Arc::new(PolicyEngine::new(PolicySettings::new(Some(1), Vec::new())));
    let shutdown = Shutdown::new();
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(apply_policy_updates(Arc::clone(&engine), rx, shutdown.subscribe()));

    tx.send(parse_config("[policy]\nmaximum_connections = 50\nallowed_hosts = [\"*\"]\n").unwrap())
        .unwrap();
    assert!(common::wait_until(|| engine.snapshot().host_ranges == vec!["*"]).await);
    assert_eq!(engine.maximum_connections(), Some(1));

    drop(tx);
    task.await.unwrap();
}

fn policy_file(host: &str) -> String {
    format!("[policy]\nmaximum_connections = 4\nallowed_hosts = [\"{host}\"]\n")
}

#[tokio::test]
async fn test_watcher_survives_rename_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate.toml");
    fs::write(&path, policy_file("10.0.0.1")).unwrap();

    let engine = Arc::new(PolicyEngine::new(
        PolicySettings::from_tokens(Some(4), &["10.0.0.1"]).unwrap(),
    ));
    let shutdown = Shutdown::new();
    let (watcher, updates) = ConfigWatcher::new(&path);
    let task = tokio::spawn(apply_policy_updates(Arc::clone(&engine), updates, shutdown.subscribe()));
    let _handle = watcher.run().unwrap();

    // Write-then-rename, the way editors and deploy tools save.
    let staged = dir.path().join("gate.toml.tmp");
    fs::write(&staged, policy_file("10.0.0.2")).unwrap();
    fs::rename(&staged, &path).unwrap();
    assert!(common::wait_until(|| engine.snapshot().host_ranges == vec!["10.0.0.2"]).await);

    // The replaced file must still be watched.
    fs::write(&path, policy_file("10.0.0.3")).unwrap();
    assert!(common::wait_until(|| engine.snapshot().host_ranges == vec!["10.0.0.3"]).await);
    assert!(engine.evaluate(&"10.0.0.3".parse().unwrap()).is_admitted());
    assert!(!engine.evaluate(&"10.0.0.2".parse().unwrap()).is_admitted());

    shutdown.trigger();
    task.await.unwrap();
}

#[tokio::test]
async fn test_watcher_ignores_invalid_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gate.toml");
    fs::write(&path, policy_file("10.0.0.1")).unwrap();

    let engine = Arc::new(PolicyEngine::new(
        PolicySettings::from_tokens(Some(4), &["10.0.0.1"]).unwrap(),
    ));
    let shutdown = Shutdown::new();
    let (watcher, updates) = ConfigWatcher::new(&path);
    let task = tokio::spawn(apply_policy_updates(Arc::clone(&engine), updates, shutdown.subscribe()));
    let _handle = watcher.run().unwrap();

    fs::write(&path, policy_file("9.9.9.9,8.8.8.8")).unwrap();
    fs::write(dir.path().join("other.toml"), policy_file("10.0.0.5")).unwrap();
    fs::write(&path, policy_file("10.0.0.4")).unwrap();
    assert!(common::wait_until(|| engine.snapshot().host_ranges == vec!["10.0.0.4"]).await);

    shutdown.trigger();
    task.await.unwrap();
}
