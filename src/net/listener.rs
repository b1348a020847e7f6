//! TCP listener with policy admission.
//!
//! # Responsibilities
//! - Bind to configured address
//! - Accept incoming TCP connections
//! - Evaluate every peer against the policy engine before anything else
//! - Close denied sockets without telling the peer why
//! - Graceful handling of accept errors

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use crate::config::{ListenerConfig, UpstreamConfig};
use crate::net::connection::{self, ConnectionId};
use crate::policy::{AdmissionPermit, Decision, PolicyEngine};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    Bind(std::io::Error),
    /// Failed to accept connection.
    #[error("Failed to accept: {0}")]
    Accept(std::io::Error),
}

/// A connection that passed admission. Holds its slot until dropped.
#[derive(Debug)]
pub struct AdmittedConnection {
    pub id: ConnectionId,
    pub stream: TcpStream,
    pub peer_addr: SocketAddr,
    pub permit: AdmissionPermit,
}

/// A TCP listener that admits connections through a [`PolicyEngine`].
pub struct Listener {
    /// The underlying TCP listener.
    inner: TcpListener,
    /// Shared admission policy.
    engine: Arc<PolicyEngine>,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig, engine: Arc<PolicyEngine>) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|e| ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(ListenerError::Bind)?;

        Ok(Self::from_tcp(listener, engine))
    }

    /// Wrap an already bound listener.
    pub fn from_tcp(inner: TcpListener, engine: Arc<PolicyEngine>) -> Self {
        if let Ok(local_addr) = inner.local_addr() {
            tracing::info!(
                address = %local_addr,
                max_connections = ?engine.maximum_connections(),
                "Listener bound"
            );
        }
        Self { inner, engine }
    }

    /// Accept the next admitted connection.
    ///
    /// Denied connections are closed here and never returned.
    pub async fn accept(&self) -> Result<AdmittedConnection, ListenerError> {
        loop {
            let (stream, peer_addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

            match self.engine.evaluate_ip(peer_addr.ip()) {
                Decision::Admit(permit) => {
                    let id = ConnectionId::new();
                    tracing::debug!(
                        connection_id = %id,
                        peer_addr = %peer_addr,
                        active = self.engine.connections_current(),
                        "Connection admitted"
                    );
                    return Ok(AdmittedConnection { id, stream, peer_addr, permit });
                }
                Decision::Deny(reason) => {
                    tracing::info!(
                        peer_addr = %peer_addr,
                        reason = %reason,
                        "Connection denied by policy"
                    );
                    drop(stream);
                }
            }
        }
    }

    /// Accept and relay connections until shutdown is signalled.
    pub async fn run(self, upstream: UpstreamConfig, mut shutdown: broadcast::Receiver<()>) -> Result<(), ListenerError> {
        let upstream = Arc::new(upstream);

        loop {
            tokio::select! {
                accepted = self.accept() => match accepted {
                    Ok(conn) => {
                        let upstream = Arc::clone(&upstream);
                        tokio::spawn(connection::relay(conn, upstream));
                    }
                    Err(e) => {
                        // Usually fd exhaustion; back off instead of spinning.
                        tracing::error!(error = %e, "Accept failed");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
                _ = shutdown.recv() => {
                    tracing::info!("Listener stopping");
                    return Ok(());
                }
            }
        }
    }

    /// Get the local address this listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}
