use crate::config::schema::AppConfig;
use crate::error::{DashError, Result};
use crate::event::{Channel, DashEvent};
use crate::link::{Connectivity, LinkState};
use crate::model::{DeviceKind, DeviceState, Snapshot};
use crate::transport::ApiClient;
use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerPhase {
    Stopped,
    Waiting,
    Polling,
}

#[derive(Debug, Clone, Copy)]
enum Control {
    Start,
    Stop,
}

/// Start/stop remote for a spawned [`StatusPoller`]. Both calls are
/// idempotent.
#[derive(Debug, Clone)]
pub struct PollerHandle {
    control: mpsc::UnboundedSender<Control>,
    phase: watch::Receiver<PollerPhase>,
}

impl PollerHandle {
    /// Poll immediately, then on every interval tick.
    pub fn start(&self) {
        let _ = self.control.send(Control::Start);
    }

    /// Cancel the timer and drop any poll still in flight.
    pub fn stop(&self) {
        let _ = self.control.send(Control::Stop);
    }

    pub fn phase(&self) -> PollerPhase {
        *self.phase.borrow()
    }
}

/// Periodically fetches `status`, owns the current [`Snapshot`] and the
/// status channel's connectivity.
pub struct StatusPoller {
    client: ApiClient,
    kind: DeviceKind,
    config: Arc<ArcSwap<AppConfig>>,
    link: Connectivity,
    snapshot: watch::Sender<Snapshot>,
    phase: watch::Sender<PollerPhase>,
    events: broadcast::Sender<DashEvent>,
}

enum Step {
    Exit,
    Control(Control),
    Tick,
}

impl StatusPoller {
    pub fn new(
        client: ApiClient,
        config: Arc<ArcSwap<AppConfig>>,
        events: broadcast::Sender<DashEvent>,
    ) -> Self {
        let kind = config.load().controller.kind;
        Self {
            client,
            kind,
            config,
            link: Connectivity::new(Channel::Status, LinkState::Connected),
            snapshot: watch::Sender::new(Snapshot::default()),
            phase: watch::Sender::new(PollerPhase::Stopped),
            events,
        }
    }

    /// Observe snapshot replacements and expirations.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub fn connectivity(&self) -> LinkState {
        self.link.state()
    }

    /// Fetch `status` once and fold the outcome into the snapshot.
    pub async fn poll_once(&mut self) {
        let outcome = self.fetch().await;
        self.apply(outcome);
    }

    async fn fetch(&self) -> Result<DeviceState> {
        let timeout = self.config.load().controller.request_timeout();
        self.client.status(self.kind, timeout).await
    }

    /// Fold a poll outcome into the snapshot and connectivity state.
    pub fn apply(&mut self, outcome: Result<DeviceState>) {
        match outcome {
            Ok(state) => {
                self.snapshot.send_modify(|s| s.replace(state));
                if let Some(alert) = self.link.on_success() {
                    let _ = self.events.send(DashEvent::Alert(alert));
                }
            }
            Err(e) => {
                if let DashError::UnknownEnumerator { field, value } = &e {
                    error!("controller sent unknown {field} value {value}, protocol version mismatch?");
                } else {
                    debug!("status poll failed: {e}");
                }
                self.snapshot.send_modify(|s| s.expire(&e));
                if let Some(alert) = self.link.on_failure(&e.to_string()) {
                    let _ = self.events.send(DashEvent::Alert(alert));
                }
            }
        }
    }

    /// Run the poller on its own task. It starts stopped; call
    /// [`PollerHandle::start`].
    pub fn spawn(self, cancel: CancellationToken) -> (PollerHandle, JoinHandle<()>) {
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let handle = PollerHandle {
            control: control_tx,
            phase: self.phase.subscribe(),
        };
        let task = tokio::spawn(self.run(control_rx, cancel));
        (handle, task)
    }

    fn arm(&self) -> Interval {
        let period = self.config.load().controller.poll_interval();
        debug!("status polling every {} ms", period.as_millis());
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }

    async fn run(mut self, mut control: mpsc::UnboundedReceiver<Control>, cancel: CancellationToken) {
        let mut ticker: Option<Interval> = None;

        loop {
            let step = match ticker.as_mut() {
                None => tokio::select! {
                    () = cancel.cancelled() => Step::Exit,
                    msg = control.recv() => msg.map_or(Step::Exit, Step::Control),
                },
                Some(active) => tokio::select! {
                    biased;
                    () = cancel.cancelled() => Step::Exit,
                    msg = control.recv() => msg.map_or(Step::Exit, Step::Control),
                    _ = active.tick() => Step::Tick,
                },
            };

            match step {
                Step::Exit => break,
                Step::Control(Control::Start) => {
                    if ticker.is_none() {
                        info!("status poller started");
                        ticker = Some(self.arm());
                        self.phase.send_replace(PollerPhase::Waiting);
                    }
                }
                Step::Control(Control::Stop) => {
                    if ticker.take().is_some() {
                        info!("status poller stopped");
                    }
                    self.phase.send_replace(PollerPhase::Stopped);
                }
                Step::Tick => {
                    self.phase.send_replace(PollerPhase::Polling);
                    let interrupted = tokio::select! {
                        biased;
                        () = cancel.cancelled() => Some(None),
                        msg = control.recv() => Some(msg),
                        outcome = self.fetch() => {
                            self.apply(outcome);
                            None
                        }
                    };

                    match interrupted {
                        None | Some(Some(Control::Start)) => {
                            self.phase.send_replace(PollerPhase::Waiting);
                        }
                        Some(Some(Control::Stop)) => {
                            debug!("stop requested mid-poll, discarding reply");
                            ticker = None;
                            self.phase.send_replace(PollerPhase::Stopped);
                        }
                        Some(None) => break,
                    }

                    // Pick up a reloaded cadence without an extra immediate poll.
                    let period = self.config.load().controller.poll_interval();
                    if ticker.as_ref().is_some_and(|t| t.period() != period) {
                        debug!("status polling every {} ms", period.as_millis());
                        let mut next = tokio::time::interval_at(Instant::now() + period, period);
                        next.set_missed_tick_behavior(MissedTickBehavior::Delay);
                        ticker = Some(next);
                    }
                }
            }
        }

        self.phase.send_replace(PollerPhase::Stopped);
        debug!("status poller exiting");
    }
}
