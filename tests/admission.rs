//! End-to-end admission through a live listener.

use std::sync::Arc;
use tokio::net::TcpStream;
use policy_gate::{PolicyEngine, PolicySettings};

mod common;

#[tokio::test]
async fn test_maximum_connections_enforced() {
    let upstream = common::start_echo_backend().await;
    let engine = Arc::new(PolicyEngine::new(PolicySettings::new(Some(2), Vec::new())));
    let (gate, shutdown) = common::start_gate(Arc::clone(&engine), upstream).await;

    // two connections should be ok
    let mut c1 = TcpStream::connect(gate).await.unwrap();
    assert!(common::echo_roundtrip(&mut c1).await, "first connection should be admitted");
    let mut c2 = TcpStream::connect(gate).await.unwrap();
    assert!(common::echo_roundtrip(&mut c2).await, "second connection should be admitted");
    assert_eq!(engine.connections_current(), 2);

    // third connection should be denied
    let mut c3 = TcpStream::connect(gate).await.unwrap();
    assert!(common::is_closed_by_gate(&mut c3).await, "third connection should be closed");
    assert_eq!(engine.snapshot().limit_denials, 1);
    assert_eq!(engine.connections_current(), 2);

    // closing one frees a slot
    drop(c1);
    assert!(common::wait_until(|| engine.connections_current() == 1).await);

    let mut c4 = TcpStream::connect(gate).await.unwrap();
    assert!(common::echo_roundtrip(&mut c4).await, "slot should be reusable after close");
    assert_eq!(engine.connections_current(), 2);

    drop(c2);
    drop(c4);
    assert!(common::wait_until(|| engine.connections_current() == 0).await);
    shutdown.trigger();
}

#[tokio::test]
async fn test_disallowed_host_denied_without_slot() {
    let upstream = common::start_echo_backend().await;
    let settings = PolicySettings::from_tokens(Some(1), &["10.0.0.1,10.0.0.255"]).unwrap();
    let engine = Arc::new(PolicyEngine::new(settings));
    let (gate, shutdown) = common::start_gate(Arc::clone(&engine), upstream).await;

    for _ in 0..3 {
        let mut conn = TcpStream::connect(gate).await.unwrap();
        assert!(common::is_closed_by_gate(&mut conn).await);
    }

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.host_denials, 3);
    assert_eq!(snapshot.limit_denials, 0);
    assert_eq!(snapshot.connections_current, 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_allowed_loopback_range_admitted() {
    let upstream = common::start_echo_backend().await;
    let settings = PolicySettings::from_tokens(None, &["127.0.0.1,127.255.255.255"]).unwrap();
    let engine = Arc::new(PolicyEngine::new(settings));
    let (gate, shutdown) = common::start_gate(Arc::clone(&engine), upstream).await;

    let mut conn = TcpStream::connect(gate).await.unwrap();
    assert!(common::echo_roundtrip(&mut conn).await);
    assert_eq!(engine.snapshot().connections_denied, 0);
    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_releases_slot() {
    // Bind then drop to get a port nothing listens on.
    let dead = {
        let l = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        l.local_addr().unwrap()
    };
    let engine = Arc::new(PolicyEngine::new(PolicySettings::new(Some(1), Vec::new())));
    let (gate, shutdown) = common::start_gate(Arc::clone(&engine), dead).await;

    let mut conn = TcpStream::connect(gate).await.unwrap();
    assert!(common::is_closed_by_gate(&mut conn).await);
    assert!(common::wait_until(|| engine.connections_current() == 0).await);
    assert_eq!(engine.snapshot().limit_denials, 0);
    shutdown.trigger();
}
