use crate::config::schema::AppConfig;
use crate::config::{self, watcher};
use crate::console;
use crate::dispatch::CommandDispatcher;
use crate::error::Result;
use crate::event::DashEvent;
use crate::model::command::validate;
use crate::model::{Command, CommandRequest, DeviceKind, Snapshot};
use crate::notifier;
use crate::poller::StatusPoller;
use crate::push::{self, PushHandle};
use crate::render::{self, Dashboard};
use crate::transport::ApiClient;
use arc_swap::ArcSwap;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const CHANNEL_CAPACITY: usize = 64;

/// Everything the event loop needs to react to an event.
struct Session {
    kind: DeviceKind,
    config: Arc<ArcSwap<AppConfig>>,
    dispatcher: CommandDispatcher,
    push: Option<PushHandle>,
    snapshots: watch::Receiver<Snapshot>,
    server_logging: Option<bool>,
    shown: Option<(String, Vec<render::Indicator>)>,
}

impl Session {
    fn dashboard(&self) -> Dashboard {
        let snapshot = self.snapshots.borrow().clone();
        render::dashboard(self.kind, &snapshot, &self.dispatcher.buttons().active())
    }

    /// Log the headline whenever it (or the indicator set) changes.
    fn refresh(&mut self) {
        let view = self.dashboard();
        let key = (view.headline.clone(), view.indicators.clone());
        if self.shown.as_ref() == Some(&key) {
            return;
        }
        let flags: Vec<&str> = view.indicators.iter().map(|i| i.label()).collect();
        if flags.is_empty() {
            info!("{}", view.headline);
        } else {
            info!("{} [{}]", view.headline, flags.join(", "));
        }
        self.shown = Some(key);
    }
}

/// Run the dashboard client until SIGINT or a `quit` intent.
///
/// # Errors
/// Returns `DashError` if the controller URL is unusable or the HTTP client
/// cannot be built.
pub async fn run(config: AppConfig, config_path: PathBuf) -> Result<()> {
    let cancel = CancellationToken::new();
    let (tx, _) = broadcast::channel::<DashEvent>(CHANNEL_CAPACITY);

    let client = ApiClient::new(config::controller_url(&config)?)?;
    let kind = config.controller.kind;
    let log_config = config.log.clone();
    let shared_config = Arc::new(ArcSwap::from_pointee(config));

    let poller = StatusPoller::new(client.clone(), Arc::clone(&shared_config), tx.clone());
    let snapshots = poller.subscribe();
    let (poller_handle, poller_task) = poller.spawn(cancel.clone());
    poller_handle.start();

    let dispatcher = CommandDispatcher::new(
        client.clone(),
        Arc::clone(&shared_config),
        poller_handle,
        snapshots.clone(),
        tx.clone(),
        cancel.clone(),
    );

    let mut tasks = vec![poller_task];
    let push = if log_config.enabled {
        let (handle, task) = push::spawn(&client, &log_config, tx.clone(), cancel.clone())?;
        tasks.push(task);
        let refresher = dispatcher.clone();
        tokio::spawn(async move { refresher.refresh_server_logging().await });
        Some(handle)
    } else {
        info!("log channel disabled");
        None
    };

    tasks.push(spawn_config_watcher(&tx, &cancel, config_path));
    tasks.push(spawn_console(&tx, &cancel));

    let mut session = Session {
        kind,
        config: shared_config,
        dispatcher,
        push,
        snapshots: snapshots.clone(),
        server_logging: None,
        shown: None,
    };
    let mut view_rx = snapshots;
    let mut rx = tx.subscribe();
    let mut lines = session.push.as_ref().map(PushHandle::subscribe_lines);

    info!("domelink running against {kind} controller at {}", client.base_url());

    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            () = async { tokio::signal::ctrl_c().await.ok(); } => {
                info!("received SIGINT, shutting down");
                cancel.cancel();
                break;
            }
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                session.refresh();
                continue;
            }
            Some(line) = recv_line(&mut lines) => {
                info!(source = "controller", "{line}");
                continue;
            }
            event = rx.recv() => {
                match event {
                    Ok(e) => e,
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("event loop lagged, missed {n} events");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        };

        if handle_event(event, &mut session) {
            cancel.cancel();
            break;
        }
    }

    info!("daemon shutting down...");
    cancel.cancel();

    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        for task in tasks {
            let _ = task.await;
        }
    })
    .await;

    info!("daemon stopped");
    Ok(())
}

/// Next followed log line. Pending forever once the channel is gone.
async fn recv_line(lines: &mut Option<broadcast::Receiver<String>>) -> Option<String> {
    let Some(rx) = lines else {
        return std::future::pending().await;
    };
    match rx.recv().await {
        Ok(line) => Some(line),
        Err(broadcast::error::RecvError::Lagged(n)) => {
            warn!("log echo lagged, skipped {n} lines (still in the buffer)");
            None
        }
        Err(broadcast::error::RecvError::Closed) => {
            *lines = None;
            None
        }
    }
}

fn spawn_config_watcher(
    tx: &broadcast::Sender<DashEvent>,
    cancel: &CancellationToken,
    config_path: PathBuf,
) -> JoinHandle<()> {
    let watcher_tx = tx.clone();
    let watcher_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = watcher::watch_config(config_path, watcher_tx, watcher_cancel).await {
            error!("config watcher error: {e}");
        }
    })
}

fn spawn_console(tx: &broadcast::Sender<DashEvent>, cancel: &CancellationToken) -> JoinHandle<()> {
    let console_tx = tx.clone();
    let console_cancel = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = console::read_console_loop(console_tx, console_cancel).await {
            error!("console error: {e}");
        }
    })
}

/// Handle a single event. Returns `true` if the daemon should shut down.
fn handle_event(event: DashEvent, session: &mut Session) -> bool {
    match event {
        DashEvent::Alert(alert) => {
            notifier::announce(&alert);
        }

        DashEvent::Button { command, state } => {
            debug!(%command, color = state.color(), "button {state:?}");
        }

        DashEvent::ServerLogging(status) => {
            session.server_logging = status;
            match status {
                Some(true) => info!("server logging enabled"),
                Some(false) => info!("server logging disabled"),
                None => warn!("server logging status unknown"),
            }
        }

        DashEvent::Submit { command, params } => {
            session.dispatcher.submit(command, params);
        }

        DashEvent::ClearLog => match &session.push {
            Some(push) => push.clear(),
            None => warn!("log channel disabled, nothing to clear"),
        },

        DashEvent::ToggleFollow => match &session.push {
            Some(push) => {
                push.toggle_follow();
            }
            None => warn!("log channel disabled, follow has no effect"),
        },

        DashEvent::ShowInfo => {
            print!("{}", session.dashboard());
            let logging = match session.server_logging {
                Some(true) => "enabled",
                Some(false) => "disabled",
                None => "unknown",
            };
            println!("  server-logging: {logging}");
            if let Some(push) = &session.push {
                let buffer = push.buffer();
                println!("  log-entries: {} ({})", buffer.len(), buffer.follow_label());
            }
        }

        DashEvent::ConfigReloaded(new_config) => {
            let current = session.config.load_full();
            for field in watcher::restart_required(&current, &new_config) {
                warn!("{field} changed, restart required to apply it");
            }
            session.config.store(new_config);
            info!("config reloaded");
        }

        DashEvent::Shutdown => {
            info!("shutdown event received");
            return true;
        }
    }

    false
}

/// Poll `status` once and project it.
///
/// # Errors
/// Any transport or protocol error from the poll.
pub async fn status(config: &AppConfig) -> Result<Dashboard> {
    let client = ApiClient::new(config::controller_url(config)?)?;
    let kind = config.controller.kind;
    let state = client
        .status(kind, config.controller.request_timeout())
        .await?;

    let mut snapshot = Snapshot::default();
    snapshot.replace(state);
    Ok(render::dashboard(kind, &snapshot, &HashMap::new()))
}

/// Validate and send a single command.
///
/// # Errors
/// `Validation` before anything is sent, otherwise any transport error or
/// `CommandRejected`.
pub async fn send(
    config: &AppConfig,
    command: Command,
    params: BTreeMap<String, String>,
) -> Result<()> {
    validate(&command, &params)?;
    let client = ApiClient::new(config::controller_url(config)?)?;
    let request = CommandRequest::with_params(&command, params);
    info!("sending '{command}'");
    client
        .command(&request, config.controller.request_timeout())
        .await
}
