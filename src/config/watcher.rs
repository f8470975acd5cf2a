use crate::config::schema::AppConfig;
use crate::error::{DashError, Result};
use crate::event::DashEvent;
use notify::Watcher;
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Settings that are read once at startup. Reloading them has no effect.
pub fn restart_required(old: &AppConfig, new: &AppConfig) -> Vec<&'static str> {
    let mut fields = Vec::new();
    if old.controller.url != new.controller.url {
        fields.push("controller.url");
    }
    if old.controller.kind != new.controller.kind {
        fields.push("controller.kind");
    }
    if old.log.enabled != new.log.enabled {
        fields.push("log.enabled");
    }
    if old.log.transport != new.log.transport {
        fields.push("log.transport");
    }
    fields
}

/// Watch the config file and publish `ConfigReloaded` after each valid edit.
///
/// An edit that fails to parse or validate is logged and the running
/// configuration stays in place.
///
/// # Errors
/// Returns `DashError::Watcher` if the file watcher cannot be initialized.
pub async fn watch_config(
    config_path: PathBuf,
    tx: broadcast::Sender<DashEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let (changed_tx, mut changed_rx) = mpsc::channel::<()>(4);

    let mut debouncer = new_debouncer(DEBOUNCE, move |res: DebounceEventResult| match res {
        Ok(events) => {
            if events.iter().any(|e| e.kind == DebouncedEventKind::Any) {
                // Full channel means a reload is already queued.
                let _ = changed_tx.try_send(());
            }
        }
        Err(e) => warn!("file watcher error: {e}"),
    })
    .map_err(|e| DashError::Watcher(e.to_string()))?;

    debouncer
        .watcher()
        .watch(&config_path, notify::RecursiveMode::NonRecursive)
        .map_err(|e| DashError::Watcher(e.to_string()))?;
    info!("watching config file: {}", config_path.display());

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("config watcher shutting down");
                return Ok(());
            }
            changed = changed_rx.recv() => {
                if changed.is_none() {
                    return Ok(());
                }
                reload(&config_path, &tx);
            }
        }
    }
}

fn reload(path: &Path, tx: &broadcast::Sender<DashEvent>) {
    info!("config file changed, reloading...");
    match crate::config::load(path) {
        Ok(config) => {
            let _ = tx.send(DashEvent::ConfigReloaded(Arc::new(config)));
        }
        Err(e) => warn!("config reload failed, keeping old config: {e}"),
    }
}
