//! Connection admission gate for a message router.
//!
//! Every inbound TCP connection is checked against a host-range allow-list
//! and an absolute connection ceiling before it is relayed to the router.

pub mod admin;
pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod policy;

pub use config::schema::GateConfig;
pub use lifecycle::Shutdown;
pub use policy::{Decision, HostRange, PolicyEngine, PolicySettings};
