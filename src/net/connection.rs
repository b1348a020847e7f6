//! Admitted connection lifecycle.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Relay bytes between the peer and the upstream router
//! - Release the admission slot when either side closes

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::copy_bidirectional;
use tokio::net::TcpStream;
use tracing::Instrument;

use crate::config::UpstreamConfig;
use crate::net::listener::AdmittedConnection;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Relay an admitted connection to the upstream router.
///
/// The permit is released when this returns, whatever the outcome.
pub async fn relay(conn: AdmittedConnection, upstream: Arc<UpstreamConfig>) {
    let AdmittedConnection { id, mut stream, peer_addr, permit } = conn;
    let span = tracing::debug_span!("connection", connection_id = %id, peer_addr = %peer_addr);

    async move {
        let timeout = Duration::from_secs(upstream.connect_timeout_secs);
        let connect = TcpStream::connect(upstream.address.as_str());

        let mut upstream_stream = match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(s)) => s,
            Ok(Err(e)) => {
                tracing::warn!(upstream = %upstream.address, error = %e, "Upstream connect failed");
                return;
            }
            Err(_) => {
                tracing::warn!(upstream = %upstream.address, timeout = ?timeout, "Upstream connect timed out");
                return;
            }
        };

        match copy_bidirectional(&mut stream, &mut upstream_stream).await {
            Ok((to_upstream, to_peer)) => {
                tracing::debug!(to_upstream, to_peer, "Connection closed");
            }
            Err(e) => {
                tracing::debug!(error = %e, "Connection closed with error");
            }
        }
    }
    .instrument(span)
    .await;

    permit.release();
}
