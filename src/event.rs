use crate::config::schema::AppConfig;
use crate::dispatch::ButtonState;
use crate::model::Command;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// The independent connections a session keeps to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// The status poller.
    Status,
    /// The log push channel.
    Log,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status => f.write_str("status"),
            Self::Log => f.write_str("log"),
        }
    }
}

/// Semantic outcomes handed to the alert notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alert {
    Connected(Channel),
    Disconnected { channel: Channel, reason: String },
    CommandSucceeded(Command),
    /// `server-logging-toggle` accepted; carries the status seen before it.
    ServerLoggingToggled { was: Option<bool> },
    CommandFailed { command: Command, reason: String },
    ValidationFailed { command: Command, reason: String },
    /// Confirmation of a local log page action.
    LogAction(String),
}

/// Events flowing through the broadcast channel connecting all subsystems.
#[derive(Debug, Clone)]
pub enum DashEvent {
    Alert(Alert),

    /// A control's button changed its visual state.
    Button { command: Command, state: ButtonState },

    /// Result of `server-logging-status`; `None` when it could not be read.
    ServerLogging(Option<bool>),

    /// Operator asked to run a command.
    Submit {
        command: Command,
        params: BTreeMap<String, String>,
    },

    /// Operator asked to empty the log buffer.
    ClearLog,

    /// Operator asked to flip log follow mode.
    ToggleFollow,

    /// Operator asked for the detailed status listing.
    ShowInfo,

    /// Configuration was reloaded from disk.
    ConfigReloaded(Arc<AppConfig>),

    /// Shutdown the daemon.
    Shutdown,
}
