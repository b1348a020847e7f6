//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the policy engine from validated configuration
//! - Initialize metrics, config watcher and admin API
//! - Bind the listener and begin admitting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener starts last (traffic only when the policy is loaded)

use std::net::{AddrParseError, SocketAddr};
use std::path::Path;
use std::sync::Arc;

use metrics_exporter_prometheus::BuildError;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};

use crate::admin::{self, AdminState};
use crate::config::watcher::ConfigWatcher;
use crate::config::GateConfig;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::shutdown_signal;
use crate::net::{Listener, ListenerError};
use crate::observability::metrics;
use crate::policy::{PolicyEngine, PolicySettings, PolicySettingsError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid policy: {0}")]
    Policy(#[from] PolicySettingsError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("Invalid address: {0}")]
    Address(#[from] AddrParseError),
    #[error("Metrics exporter: {0}")]
    Metrics(#[from] BuildError),
    #[error("Config watcher: {0}")]
    Watcher(#[from] notify::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the gate until a shutdown signal arrives.
///
/// With `config_path`, the file is watched and host-range changes are
/// applied live.
pub async fn start(config: GateConfig, config_path: Option<&Path>) -> Result<(), StartupError> {
    let GateConfig { listener, upstream, policy, admin: admin_config, observability } = config;

    let settings = PolicySettings::from_config(&policy)?;
    tracing::info!(
        max_connections = ?settings.maximum_connections,
        host_ranges = settings.host_ranges.len(),
        "Policy loaded"
    );
    let engine = Arc::new(PolicyEngine::new(settings));

    if observability.metrics_enabled {
        let addr: SocketAddr = observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();

    // Dropping the watcher stops file events, so it lives for the whole run.
    let _watcher = match config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            tokio::spawn(apply_policy_updates(Arc::clone(&engine), updates, shutdown.subscribe()));
            Some(watcher.run()?)
        }
        None => None,
    };

    if admin_config.enabled {
        let admin_listener = TcpListener::bind(&admin_config.bind_address).await?;
        let state = AdminState {
            engine: Arc::clone(&engine),
            api_key: Arc::from(admin_config.api_key.as_str()),
        };
        let admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            if let Err(e) = admin::serve(admin_listener, state, admin_shutdown).await {
                tracing::error!(error = %e, "Admin API stopped");
            }
        });
    }

    let listener = Listener::bind(&listener, engine).await?;
    tracing::info!(upstream = %upstream.address, "Admitting connections");

    tokio::select! {
        result = listener.run(upstream, shutdown.subscribe()) => result?,
        _ = shutdown_signal() => {}
    }
    shutdown.trigger();

    Ok(())
}

/// Apply reloaded configurations to a running engine until shutdown.
///
/// Only the policy section is applied; other sections need a restart.
pub async fn apply_policy_updates(
    engine: Arc<PolicyEngine>,
    mut updates: mpsc::UnboundedReceiver<GateConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => {
                let Some(config) = update else { return };
                match PolicySettings::from_config(&config.policy) {
                    Ok(settings) => {
                        let result = if engine.reload(settings) { "applied" } else { "partial" };
                        metrics::record_config_reload(result);
                    }
                    Err(e) => {
                        metrics::record_config_reload("rejected");
                        tracing::error!(error = %e, "Reloaded policy rejected; keeping current policy");
                    }
                }
            }
            _ = shutdown.recv() => return,
        }
    }
}
