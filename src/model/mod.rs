pub mod command;
pub mod dome;
pub mod shutter;
mod wire;

use crate::error::{DashError, Result};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;

pub use command::{Command, CommandRequest};
pub use dome::{Azimuth, DomeState};
pub use shutter::{SecurityProcedure, ShutterPosition, ShutterState};

/// Which controller firmware sits behind the configured URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Dome,
    Shutter,
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dome => f.write_str("dome"),
            Self::Shutter => f.write_str("shutter"),
        }
    }
}

/// Fields every controller reports regardless of kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceInfo {
    pub firmware_version: String,
    /// Human-readable uptime, formatted by the firmware.
    pub uptime: String,
    pub hostname: String,
    pub mac_address: String,
    /// Raw relay readout, one bit per output.
    pub relay_list: Vec<bool>,
    /// Raw optical input readout, one bit per input.
    pub optoin_list: Vec<bool>,
}

/// One fully parsed `status` reply.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceState {
    Dome(DomeState),
    Shutter(ShutterState),
}

impl DeviceState {
    /// Parse the `rsp` field of a `status` reply for the given kind.
    ///
    /// # Errors
    /// `DashError::Protocol` if the payload does not have the expected shape
    /// (including a string reply such as `"Error: mutex acquired"`), or
    /// `DashError::UnknownEnumerator` for unmapped numeric states.
    pub fn from_rsp(kind: DeviceKind, rsp: serde_json::Value) -> Result<Self> {
        if let Some(reply) = rsp.as_str() {
            return Err(DashError::Protocol(format!(
                "status refused by controller: {reply}"
            )));
        }

        match kind {
            DeviceKind::Dome => {
                let raw: wire::DomePayload = serde_json::from_value(rsp)?;
                Ok(Self::Dome(DomeState::try_from(raw)?))
            }
            DeviceKind::Shutter => {
                let raw: wire::ShutterPayload = serde_json::from_value(rsp)?;
                Ok(Self::Shutter(ShutterState::try_from(raw)?))
            }
        }
    }

    pub fn kind(&self) -> DeviceKind {
        match self {
            Self::Dome(_) => DeviceKind::Dome,
            Self::Shutter(_) => DeviceKind::Shutter,
        }
    }

    pub fn info(&self) -> &DeviceInfo {
        match self {
            Self::Dome(d) => &d.info,
            Self::Shutter(s) => &s.info,
        }
    }

    pub fn auto_mode(&self) -> bool {
        match self {
            Self::Dome(d) => d.auto_mode,
            Self::Shutter(s) => s.auto_mode,
        }
    }
}

/// The current view of the device, published to observers after each poll.
///
/// `version` counts successful polls. A failed poll never touches `state`;
/// it only marks the snapshot stale, so readers either see the last complete
/// payload or a placeholder, never a mix.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub version: u64,
    state: Option<Arc<DeviceState>>,
    stale: bool,
    last_error: Option<String>,
}

impl Snapshot {
    /// Replace the whole state with a freshly parsed payload.
    pub fn replace(&mut self, state: DeviceState) {
        self.version += 1;
        self.state = Some(Arc::new(state));
        self.stale = false;
        self.last_error = None;
    }

    /// Mark the last payload as no longer authoritative.
    pub fn expire(&mut self, error: &DashError) {
        self.stale = true;
        self.last_error = Some(error.to_string());
    }

    /// The state the UI should show, or `None` for the placeholder.
    pub fn current(&self) -> Option<&DeviceState> {
        if self.stale {
            None
        } else {
            self.state.as_deref()
        }
    }

    /// The last successfully parsed state, even if it has since expired.
    pub fn last_good(&self) -> Option<&DeviceState> {
        self.state.as_deref()
    }

    pub fn is_stale(&self) -> bool {
        self.stale || self.state.is_none()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
