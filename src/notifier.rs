//! Alert notifier: turns semantic alerts into operator-facing toasts.

use crate::event::{Alert, Channel};
use crate::model::Command;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Warning,
    Error,
}

/// A one-shot notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub title: String,
    pub text: Option<String>,
}

impl Notice {
    fn new(severity: Severity, title: impl Into<String>, text: Option<&str>) -> Self {
        Self {
            severity,
            title: title.into(),
            text: text.map(str::to_string),
        }
    }
}

impl From<&Alert> for Notice {
    fn from(alert: &Alert) -> Self {
        match alert {
            Alert::Connected(Channel::Status) => {
                Self::new(Severity::Success, "Connection restored", None)
            }
            Alert::Connected(Channel::Log) => {
                Self::new(Severity::Success, "Connection established", None)
            }
            Alert::Disconnected {
                channel: Channel::Status,
                ..
            } => Self::new(
                Severity::Error,
                "Connection error",
                Some("Unable to connect to the controller."),
            ),
            Alert::Disconnected {
                channel: Channel::Log,
                ..
            } => Self::new(
                Severity::Error,
                "Connection lost",
                Some("Connection dropped, reinitialization in progress..."),
            ),
            Alert::CommandSucceeded(_) => Self::new(Severity::Success, "Command sent", None),
            // The toggle flips whatever was last read.
            Alert::ServerLoggingToggled { was: Some(true) } => {
                Self::new(Severity::Success, "'status' log disabled", None)
            }
            Alert::ServerLoggingToggled { was: Some(false) } => {
                Self::new(Severity::Success, "'status' log enabled", None)
            }
            Alert::ServerLoggingToggled { was: None } => {
                Self::new(Severity::Success, "Command sent", None)
            }
            Alert::CommandFailed { .. } => {
                Self::new(Severity::Error, "Failed to send the command.", None)
            }
            Alert::ValidationFailed { reason, .. } => {
                Self::new(Severity::Warning, reason.as_str(), None)
            }
            Alert::LogAction(message) => Self::new(Severity::Success, message.as_str(), None),
        }
    }
}

/// Render `alert` to the operator log and return what was shown.
pub fn announce(alert: &Alert) -> Notice {
    let notice = Notice::from(alert);
    let line = match &notice.text {
        Some(text) => format!("{}: {text}", notice.title),
        None => notice.title.clone(),
    };

    // The underlying cause goes along as a field; the toast text stays fixed.
    match alert {
        Alert::Disconnected { channel, reason } => {
            error!(%channel, cause = %reason, "{line}");
        }
        Alert::CommandFailed { command, reason } => {
            error!(%command, cause = %reason, "{line}");
        }
        Alert::CommandSucceeded(command) | Alert::ValidationFailed { command, .. } => {
            match notice.severity {
                Severity::Warning => warn!(%command, "{line}"),
                _ => info!(%command, "{line}"),
            }
        }
        Alert::ServerLoggingToggled { .. } => {
            let command = Command::ServerLoggingToggle;
            info!(%command, "{line}");
        }
        Alert::Connected(channel) => info!(%channel, "{line}"),
        Alert::LogAction(_) => info!("{line}"),
    }
    notice
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_texts_depend_on_channel() {
        let status = Notice::from(&Alert::Connected(Channel::Status));
        assert_eq!(status.title, "Connection restored");
        let log = Notice::from(&Alert::Connected(Channel::Log));
        assert_eq!(log.title, "Connection established");

        let lost = Notice::from(&Alert::Disconnected {
            channel: Channel::Log,
            reason: "reset".into(),
        });
        assert_eq!(lost.title, "Connection lost");
        assert_eq!(
            lost.text.as_deref(),
            Some("Connection dropped, reinitialization in progress...")
        );

        let down = announce(&Alert::Disconnected {
            channel: Channel::Status,
            reason: "timed out".into(),
        });
        assert_eq!(down.severity, Severity::Error);
        assert_eq!(down.text.as_deref(), Some("Unable to connect to the controller."));
    }

    #[test]
    fn command_outcomes() {
        let ok = announce(&Alert::CommandSucceeded(Command::Park));
        assert_eq!(ok.title, "Command sent");
        assert_eq!(ok.severity, Severity::Success);

        let failed = announce(&Alert::CommandFailed {
            command: Command::Close,
            reason: "HTTP 500, Internal Server Error".into(),
        });
        assert_eq!(failed.title, "Failed to send the command.");
        assert!(failed.text.is_none());
    }

    #[test]
    fn logging_toggle_names_new_state() {
        let off = announce(&Alert::ServerLoggingToggled { was: Some(true) });
        assert_eq!(off.title, "'status' log disabled");
        assert_eq!(off.severity, Severity::Success);

        let on = Notice::from(&Alert::ServerLoggingToggled { was: Some(false) });
        assert_eq!(on.title, "'status' log enabled");

        let unknown = Notice::from(&Alert::ServerLoggingToggled { was: None });
        assert_eq!(unknown.title, "Command sent");
    }

    #[test]
    fn validation_shows_reason() {
        let notice = announce(&Alert::ValidationFailed {
            command: Command::SlewToAz,
            reason: "Invalid azimuth '400'.".into(),
        });
        assert_eq!(notice.title, "Invalid azimuth '400'.");
        assert_eq!(notice.severity, Severity::Warning);
    }
}
