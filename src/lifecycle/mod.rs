//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Build policy → Metrics/watcher/admin → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Stop admin API and reload task
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then policy, then listeners
//! - In-flight relays keep their permits until their sockets close

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
