use crate::error::{DashError, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Parameter carrying the slew target of `slew-to-az`.
pub const AZ_TARGET_PARAM: &str = "az-target";

/// Literal reply the controller sends when a command was accepted.
pub const SUCCESS_SENTINEL: &str = "done";

/// Commands understood by the dome and shutter controllers.
///
/// Names the client does not know are carried as `Other` and sent verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
    Status,
    // dome
    SlewToAz,
    Park,
    FindZero,
    IgniteSwitchboard,
    TurnOff,
    // shutter
    Open,
    Close,
    LockMovement,
    UnlockMovement,
    ResetAlertStatus,
    // both
    Abort,
    Restart,
    ForceRestart,
    ResetEeprom,
    ServerLoggingStatus,
    ServerLoggingToggle,
    Other(String),
}

impl Command {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Status => "status",
            Self::SlewToAz => "slew-to-az",
            Self::Park => "park",
            Self::FindZero => "find-zero",
            Self::IgniteSwitchboard => "ignite-switchboard",
            Self::TurnOff => "turn-off",
            Self::Open => "open",
            Self::Close => "close",
            Self::LockMovement => "lock-movement",
            Self::UnlockMovement => "unlock-movement",
            Self::ResetAlertStatus => "reset-alert-status",
            Self::Abort => "abort",
            Self::Restart => "restart",
            Self::ForceRestart => "force-restart",
            Self::ResetEeprom => "reset-EEPROM",
            Self::ServerLoggingStatus => "server-logging-status",
            Self::ServerLoggingToggle => "server-logging-toggle",
            Self::Other(name) => name,
        }
    }

    /// Motion commands suspend status polling while they are in flight.
    pub fn is_motion(&self) -> bool {
        matches!(self, Self::SlewToAz | Self::Open | Self::Close)
    }
}

impl FromStr for Command {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "status" => Self::Status,
            "slew-to-az" => Self::SlewToAz,
            "park" => Self::Park,
            "find-zero" => Self::FindZero,
            "ignite-switchboard" => Self::IgniteSwitchboard,
            "turn-off" => Self::TurnOff,
            "open" => Self::Open,
            "close" => Self::Close,
            "lock-movement" => Self::LockMovement,
            "unlock-movement" => Self::UnlockMovement,
            "reset-alert-status" => Self::ResetAlertStatus,
            "abort" => Self::Abort,
            "restart" => Self::Restart,
            "force-restart" => Self::ForceRestart,
            "reset-EEPROM" => Self::ResetEeprom,
            "server-logging-status" => Self::ServerLoggingStatus,
            "server-logging-toggle" => Self::ServerLoggingToggle,
            other => Self::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a `/api?json=` request: `{"cmd": <name>, <param>: <value>...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandRequest {
    cmd: String,
    #[serde(flatten)]
    params: BTreeMap<String, String>,
}

impl CommandRequest {
    pub fn new(command: &Command) -> Self {
        Self {
            cmd: command.as_str().to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_params(command: &Command, params: BTreeMap<String, String>) -> Self {
        Self {
            cmd: command.as_str().to_string(),
            params,
        }
    }

    pub fn status() -> Self {
        Self::new(&Command::Status)
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Serialize to the compact JSON the controller expects.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(DashError::from)
    }
}

/// Local validation run before anything touches the network.
///
/// # Errors
/// Returns `DashError::Validation` when `slew-to-az` lacks a numeric
/// `az-target` within 0..=360.
pub fn validate(command: &Command, params: &BTreeMap<String, String>) -> Result<()> {
    if *command != Command::SlewToAz {
        return Ok(());
    }

    let raw = params.get(AZ_TARGET_PARAM).map_or("", |v| v.trim());
    match raw.parse::<f64>() {
        Ok(az) if az.is_finite() && (0.0..=360.0).contains(&az) => Ok(()),
        _ => Err(DashError::Validation(format!("Invalid azimuth '{raw}'."))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn az(value: &str) -> BTreeMap<String, String> {
        BTreeMap::from([(AZ_TARGET_PARAM.to_string(), value.to_string())])
    }

    #[test]
    fn names_round_trip() {
        for name in ["slew-to-az", "reset-EEPROM", "server-logging-toggle", "open"] {
            let cmd: Command = name.parse().unwrap();
            assert_eq!(cmd.as_str(), name);
            assert!(!matches!(cmd, Command::Other(_)));
        }
        let unknown: Command = "encoder-readconf".parse().unwrap();
        assert_eq!(unknown, Command::Other("encoder-readconf".into()));
        assert_eq!(unknown.to_string(), "encoder-readconf");
    }

    #[test]
    fn motion_commands() {
        assert!(Command::SlewToAz.is_motion());
        assert!(Command::Open.is_motion());
        assert!(Command::Close.is_motion());
        assert!(!Command::Abort.is_motion());
        assert!(!Command::Park.is_motion());
    }

    #[test]
    fn request_json_shape() {
        let req = CommandRequest::with_params(&Command::SlewToAz, az("120"));
        assert_eq!(req.to_json().unwrap(), r#"{"cmd":"slew-to-az","az-target":"120"}"#);
        assert_eq!(CommandRequest::status().to_json().unwrap(), r#"{"cmd":"status"}"#);
    }

    #[test]
    fn azimuth_bounds_are_inclusive() {
        assert!(validate(&Command::SlewToAz, &az("0")).is_ok());
        assert!(validate(&Command::SlewToAz, &az("360")).is_ok());
        assert!(validate(&Command::SlewToAz, &az(" 42.5 ")).is_ok());
    }

    #[test]
    fn azimuth_rejects_out_of_range_and_garbage() {
        for bad in ["-0.1", "360.5", "abc", "", "NaN", "inf"] {
            let err = validate(&Command::SlewToAz, &az(bad)).unwrap_err();
            assert!(matches!(err, DashError::Validation(_)), "{bad}: {err}");
        }
        let missing = validate(&Command::SlewToAz, &BTreeMap::new()).unwrap_err();
        assert_eq!(missing.to_string(), "Invalid azimuth ''.");
    }

    #[test]
    fn other_commands_are_not_validated() {
        assert!(validate(&Command::Open, &BTreeMap::new()).is_ok());
        assert!(validate(&Command::Other("x".into()), &az("999")).is_ok());
    }
}
