//! Hot reload of the policy file.
//!
//! The directory holding the file is watched, not the file itself. Saving by
//! rename replaces the file's inode, and a directory watch sees the new name
//! arrive the same way it sees an in-place write.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::GateConfig;
use crate::observability::metrics;

/// Watches one configuration file and forwards every version of it that
/// loads and validates.
pub struct ConfigWatcher {
    path: PathBuf,
    updates: mpsc::UnboundedSender<GateConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for validated updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<GateConfig>) {
        let (updates, rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            updates,
        };
        (watcher, rx)
    }

    /// Start watching on notify's background thread.
    ///
    /// Events stop when the returned handle is dropped. Files that fail to
    /// load or validate are logged and never forwarded.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Some(file_name) = self.path.file_name().map(OsString::from) else {
            return Err(notify::Error::generic("config path has no file name"));
        };
        let dir = watched_dir(&self.path).to_path_buf();
        let Self { path, updates } = self;
        tracing::info!(path = %path.display(), dir = %dir.display(), "Config watcher starting");

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if touches_config(&event, &file_name) => reload(&path, &updates),
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(watcher)
    }
}

fn watched_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// True for creates, writes and renames that land on `file_name`.
fn touches_config(event: &Event, file_name: &OsStr) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event
            .paths
            .iter()
            .any(|p| p.file_name() == Some(file_name))
}

fn reload(path: &Path, updates: &mpsc::UnboundedSender<GateConfig>) {
    match load_config(path) {
        Ok(config) => {
            tracing::info!(path = %path.display(), "Config change detected");
            if updates.send(config).is_err() {
                tracing::debug!("Policy updates no longer consumed; dropping reloaded config");
            }
        }
        Err(e) => {
            metrics::record_config_reload("rejected");
            tracing::error!(error = %e, path = %path.display(), "Config reload failed; keeping current policy");
        }
    }
}
