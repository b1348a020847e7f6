//! policy-gate daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌────────────────────────────────────────────┐
//!                      │                POLICY GATE                 │
//!                      │                                            │
//!   Peer connection    │  ┌──────────┐   ┌────────────────────┐     │
//!   ───────────────────┼─▶│   net    │──▶│      policy        │     │
//!                      │  │ listener │   │ host ranges → slot │     │
//!                      │  └────┬─────┘   └─────────┬──────────┘     │
//!                      │       │ denied: close     │ admitted       │
//!                      │       ▼                   ▼                │
//!                      │                  ┌────────────────┐        │
//!                      │                  │ net connection │────────┼──▶ Router
//!                      │                  │     relay      │        │
//!                      │                  └────────────────┘        │
//!                      │                                            │
//!                      │  config (reload) · admin API · metrics     │
//!                      └────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use policy_gate::config::loader::load_config;
use policy_gate::config::GateConfig;
use policy_gate::lifecycle::startup;
use policy_gate::observability::logging;

#[derive(Parser)]
#[command(name = "policy-gate")]
#[command(about = "Connection admission gate for a message router", long_about = None)]
struct Args {
    /// Path to the TOML configuration file. Watched for changes.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loaded = match &args.config {
        Some(path) => load_config(path),
        None => Ok(GateConfig::default()),
    };
    let level = loaded
        .as_ref()
        .map(|c| c.observability.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    logging::init_logging(&level);

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            return Err(e.into());
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        "policy-gate starting"
    );

    startup::start(config, args.config.as_deref()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
