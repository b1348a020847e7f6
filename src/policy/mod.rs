//! Connection admission policy.
//!
//! # Data Flow
//! ```text
//! Configuration load:
//!     allowed_hosts tokens
//!     → host_range.rs (parse "*", "<addr>", "<addr>,<addr>")
//!     → settings.rs (PolicySettings, immutable)
//!     → engine.rs (rule set + admission counter)
//!
//! Inbound connection:
//!     peer address
//!     → engine.rs evaluate()
//!         1. host-range allow-list (no slot consumed on rejection)
//!         2. counter.rs try_acquire()
//!     → Admit(permit) | Deny(reason)
//!     → permit released when the connection closes
//! ```
//!
//! # Design Decisions
//! - Fail closed: an unparsable rule never admits traffic, an unparsable
//!   peer never matches
//! - Ranges are inclusive byte-order intervals, not CIDR prefixes
//! - The counter is the only mutable shared state on the accept path
//! - Denial reasons stay local (logs, metrics, admin API)

pub mod address;
pub mod counter;
pub mod engine;
pub mod error;
pub mod host_range;
pub mod settings;

pub use address::{has_ipv6_support, AddressFamily, AddressValue};
pub use counter::AdmissionCounter;
pub use engine::{AdmissionPermit, Decision, PolicyEngine, PolicySnapshot};
pub use error::{DenyReason, HostRangeError};
pub use host_range::HostRange;
pub use settings::{PolicySettings, PolicySettingsError};
