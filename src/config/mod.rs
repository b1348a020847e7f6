//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, host-range parsing)
//!     → GateConfig (validated, immutable)
//!     → PolicySettings for the policy engine
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → engine swaps its host-range rule set
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - An invalid file never replaces a running policy

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::GateConfig;
pub use schema::ListenerConfig;
pub use schema::UpstreamConfig;
pub use schema::PolicyConfig;
pub use schema::AdminConfig;
pub use schema::ObservabilityConfig;
