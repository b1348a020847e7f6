//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use policy_gate::config::UpstreamConfig;
use policy_gate::lifecycle::Shutdown;
use policy_gate::net::Listener;
use policy_gate::PolicyEngine;

/// Start a mock upstream that echoes bytes back until the client closes.
pub async fn start_echo_backend() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    tokio::spawn(async move {
                        let mut buf = [0u8; 1024];
                        loop {
                            match socket.read(&mut buf).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => {
                                    if socket.write_all(&buf[..n]).await.is_err() {
                                        break;
                                    }
                                }
                            }
                        }
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start the gate in front of `upstream`. Returns its address and the
/// shutdown handle that stops it.
pub async fn start_gate(engine: Arc<PolicyEngine>, upstream: SocketAddr) -> (SocketAddr, Shutdown) {
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let listener = Listener::from_tcp(tcp, engine);
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    let upstream = UpstreamConfig {
        address: upstream.to_string(),
        connect_timeout_secs: 2,
    };
    tokio::spawn(async move {
        let _ = listener.run(upstream, rx).await;
    });

    (addr, shutdown)
}

/// Send a probe and expect it echoed through the gate.
pub async fn echo_roundtrip(stream: &mut TcpStream) -> bool {
    if stream.write_all(b"ping").await.is_err() {
        return false;
    }
    let mut buf = [0u8; 4];
    match tokio::time::timeout(Duration::from_secs(2), stream.read_exact(&mut buf)).await {
        Ok(Ok(_)) => &buf == b"ping",
        _ => false,
    }
}

/// True if the gate closed the connection without relaying anything.
pub async fn is_closed_by_gate(stream: &mut TcpStream) -> bool {
    let _ = stream.write_all(b"ping").await;
    let mut buf = [0u8; 4];
    matches!(
        tokio::time::timeout(Duration::from_secs(2), stream.read(&mut buf)).await,
        Ok(Ok(0)) | Ok(Err(_))
    )
}

/// Poll `cond` until it holds or a few seconds pass.
pub async fn wait_until<F: Fn() -> bool>(cond: F) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    cond()
}
