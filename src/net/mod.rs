//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, policy evaluation)
//!         denied → socket closed, reason logged locally
//!         admitted → connection.rs (relay to upstream router)
//!     → permit released on close
//! ```
//!
//! # Design Decisions
//! - Admission happens before any bytes are read from the peer
//! - Denied peers see a plain close, whatever the reason
//! - Each connection's slot is tied to an RAII permit

pub mod connection;
pub mod listener;

pub use listener::{AdmittedConnection, Listener, ListenerError};
