//! Long-lived log subscription, independent of status polling.
//!
//! Two transports share one contract: the controller's event stream
//! (`/log_sse`) and its keep-alive websocket (`/webserialws`). Both feed a
//! [`PushCore`], which owns the log buffer and the channel's connectivity.

pub mod socket;
pub mod sse;

use crate::config::schema::{LogConfig, PushTransport};
use crate::error::{DashError, Result};
use crate::event::{Alert, Channel, DashEvent};
use crate::link::{Connectivity, LinkState};
use crate::transport::ApiClient;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub const SSE_PATH: &str = "log_sse";
pub const SOCKET_PATH: &str = "webserialws";

/// Follow-mode echo has its own channel so a burst of log lines cannot
/// push alerts out of the shared event bus.
const LINE_CAPACITY: usize = 256;

/// Received log lines, oldest first.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    entries: Vec<String>,
    follow: bool,
}

impl LogBuffer {
    pub fn new(follow: bool) -> Self {
        Self {
            entries: Vec::new(),
            follow,
        }
    }

    pub fn push(&mut self, line: String) {
        self.entries.push(line);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Flip follow mode and return the new value.
    pub fn toggle_follow(&mut self) -> bool {
        self.follow = !self.follow;
        self.follow
    }

    pub fn follow(&self) -> bool {
        self.follow
    }

    pub fn follow_label(&self) -> &'static str {
        if self.follow {
            "Follow enabled"
        } else {
            "Follow disabled"
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The whole page, entries separated by a blank line.
    pub fn text(&self) -> String {
        self.entries.join("\n\n")
    }
}

fn lock(buffer: &Mutex<LogBuffer>) -> MutexGuard<'_, LogBuffer> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Operator side of the push channel.
#[derive(Clone)]
pub struct PushHandle {
    buffer: Arc<Mutex<LogBuffer>>,
    lines: broadcast::Sender<String>,
    events: broadcast::Sender<DashEvent>,
}

impl PushHandle {
    /// Empty the log buffer.
    pub fn clear(&self) {
        lock(&self.buffer).clear();
        let _ = self
            .events
            .send(DashEvent::Alert(Alert::LogAction("Log page cleaned up".into())));
    }

    /// Flip follow mode; returns the new label.
    pub fn toggle_follow(&self) -> &'static str {
        let label = {
            let mut buffer = lock(&self.buffer);
            buffer.toggle_follow();
            buffer.follow_label()
        };
        let _ = self
            .events
            .send(DashEvent::Alert(Alert::LogAction(label.to_string())));
        label
    }

    pub fn buffer(&self) -> LogBuffer {
        lock(&self.buffer).clone()
    }

    /// Lines received while follow mode is on.
    pub fn subscribe_lines(&self) -> broadcast::Receiver<String> {
        self.lines.subscribe()
    }
}

/// Transport-independent push channel state machine.
pub struct PushCore {
    link: Connectivity,
    buffer: Arc<Mutex<LogBuffer>>,
    lines: broadcast::Sender<String>,
    events: broadcast::Sender<DashEvent>,
}

impl PushCore {
    /// Starts disconnected: the first successful open is announced.
    pub fn new(follow: bool, events: broadcast::Sender<DashEvent>) -> Self {
        Self {
            link: Connectivity::new(Channel::Log, LinkState::Disconnected),
            buffer: Arc::new(Mutex::new(LogBuffer::new(follow))),
            lines: broadcast::channel(LINE_CAPACITY).0,
            events,
        }
    }

    pub fn handle(&self) -> PushHandle {
        PushHandle {
            buffer: Arc::clone(&self.buffer),
            lines: self.lines.clone(),
            events: self.events.clone(),
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link.state()
    }

    /// The "disconnected" indicator is shown while the link is down.
    pub fn indicator_visible(&self) -> bool {
        !self.link.is_connected()
    }

    pub fn on_open(&mut self) {
        if let Some(alert) = self.link.on_success() {
            let _ = self.events.send(DashEvent::Alert(alert));
        }
    }

    pub fn on_message(&mut self, line: String) {
        let follow = {
            let mut buffer = lock(&self.buffer);
            buffer.push(line.clone());
            buffer.follow()
        };
        if follow {
            let _ = self.lines.send(line);
        }
    }

    pub fn on_error(&mut self, reason: &str) {
        if let Some(alert) = self.link.on_failure(reason) {
            let _ = self.events.send(DashEvent::Alert(alert));
        } else {
            debug!("log channel still down: {reason}");
        }
    }
}

/// Start the configured push transport on its own task.
///
/// # Errors
/// Returns `DashError::Config` if the endpoint URL cannot be derived.
pub fn spawn(
    client: &ApiClient,
    config: &LogConfig,
    events: broadcast::Sender<DashEvent>,
    cancel: CancellationToken,
) -> Result<(PushHandle, JoinHandle<()>)> {
    let core = PushCore::new(config.follow, events);
    let handle = core.handle();

    let task = match config.transport {
        PushTransport::EventStream => {
            let url = client.endpoint(SSE_PATH)?;
            info!("subscribing to log events at {url}");
            let policy = sse::Backoff::from_config(config);
            tokio::spawn(sse::run(reqwest::Client::new(), url, core, policy, cancel))
        }
        PushTransport::Socket => {
            let mut url = client.endpoint(SOCKET_PATH)?;
            let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
            url.set_scheme(scheme)
                .map_err(|()| DashError::Config(format!("cannot derive websocket URL from {url}")))?;
            info!("opening log socket at {url}");
            tokio::spawn(socket::run(url, core, config.keepalive_interval(), cancel))
        }
    };

    Ok((handle, task))
}
