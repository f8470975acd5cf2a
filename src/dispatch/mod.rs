pub mod button;

pub use button::{ButtonBoard, ButtonState};

use crate::config::schema::AppConfig;
use crate::error::Result;
use crate::event::{Alert, DashEvent};
use crate::model::command::validate;
use crate::model::{Command, CommandRequest, Snapshot};
use crate::poller::PollerHandle;
use crate::transport::ApiClient;
use arc_swap::ArcSwap;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Validates operator commands, sends them, and drives their buttons.
#[derive(Clone)]
pub struct CommandDispatcher {
    client: ApiClient,
    config: Arc<ArcSwap<AppConfig>>,
    poller: PollerHandle,
    snapshots: watch::Receiver<Snapshot>,
    buttons: ButtonBoard,
    server_logging: Arc<Mutex<Option<bool>>>,
    events: broadcast::Sender<DashEvent>,
    cancel: CancellationToken,
}

impl CommandDispatcher {
    pub fn new(
        client: ApiClient,
        config: Arc<ArcSwap<AppConfig>>,
        poller: PollerHandle,
        snapshots: watch::Receiver<Snapshot>,
        events: broadcast::Sender<DashEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            config,
            poller,
            snapshots,
            buttons: ButtonBoard::new(events.clone()),
            server_logging: Arc::new(Mutex::new(None)),
            events,
            cancel,
        }
    }

    pub fn buttons(&self) -> &ButtonBoard {
        &self.buttons
    }

    /// Fire and forget: the outcome is visible through button transitions
    /// and alerts only.
    pub fn submit(&self, command: Command, params: BTreeMap<String, String>) {
        let this = self.clone();
        tokio::spawn(async move {
            let _ = this.execute(command, params).await;
        });
    }

    /// Run one command lifecycle up to the controller's reply.
    ///
    /// Button decay and the post-motion release happen on background tasks
    /// after this returns.
    ///
    /// # Errors
    /// `Validation` when local checks fail (nothing is sent), otherwise any
    /// transport error or `CommandRejected`.
    pub async fn execute(&self, command: Command, params: BTreeMap<String, String>) -> Result<()> {
        if let Err(e) = validate(&command, &params) {
            warn!("'{command}' not sent: {e}");
            self.alert(Alert::ValidationFailed {
                command,
                reason: e.to_string(),
            });
            return Err(e);
        }

        let motion = command.is_motion();
        let pressed = self.buttons.set(&command, ButtonState::Pending);
        if motion {
            self.poller.stop();
        }

        let config = self.config.load_full();
        let request = CommandRequest::with_params(&command, params);
        info!("sending '{command}'");
        let outcome = self
            .client
            .command(&request, config.controller.request_timeout())
            .await;

        match &outcome {
            Ok(()) if command == Command::ServerLoggingToggle => {
                let was = self.server_logging();
                self.alert(Alert::ServerLoggingToggled { was });
            }
            Ok(()) => self.alert(Alert::CommandSucceeded(command.clone())),
            Err(e) => {
                warn!("'{command}' failed: {e}");
                self.alert(Alert::CommandFailed {
                    command: command.clone(),
                    reason: e.to_string(),
                });
            }
        }

        if motion {
            let generation = if outcome.is_ok() {
                pressed
            } else {
                self.buttons.set(&command, ButtonState::Failed)
            };
            let baseline = self.snapshots.borrow().version;
            self.poller.start();
            self.release_after_poll(command.clone(), generation, baseline);
        } else {
            let state = if outcome.is_ok() {
                ButtonState::Succeeded
            } else {
                ButtonState::Failed
            };
            self.buttons
                .settle(&command, state, config.controller.settle_delay());
        }

        if outcome.is_ok() && command == Command::ServerLoggingToggle {
            self.refresh_server_logging().await;
        }

        outcome
    }

    /// Hold a motion button until a poll newer than `baseline` succeeds, so
    /// its enablement is re-derived from fresh state.
    fn release_after_poll(&self, command: Command, generation: u64, baseline: u64) {
        let mut snapshots = self.snapshots.clone();
        let buttons = self.buttons.clone();
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            loop {
                {
                    let snapshot = snapshots.borrow_and_update();
                    if snapshot.version > baseline && !snapshot.is_stale() {
                        break;
                    }
                }
                tokio::select! {
                    () = cancel.cancelled() => return,
                    changed = snapshots.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                }
            }
            if buttons.release(&command, generation) {
                debug!("'{command}' released by fresh status");
            }
        });
    }

    /// Last `server-logging-status` read, `None` if unknown.
    pub fn server_logging(&self) -> Option<bool> {
        *self
            .server_logging
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Read `server-logging-status` and publish it; failures publish `None`.
    pub async fn refresh_server_logging(&self) -> Option<bool> {
        let timeout = self.config.load().controller.request_timeout();
        let status = match self.client.server_logging(timeout).await {
            Ok(enabled) => Some(enabled),
            Err(e) => {
                debug!("server-logging-status unavailable: {e}");
                None
            }
        };
        *self
            .server_logging
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = status;
        let _ = self.events.send(DashEvent::ServerLogging(status));
        status
    }

    fn alert(&self, alert: Alert) {
        let _ = self.events.send(DashEvent::Alert(alert));
    }
}
