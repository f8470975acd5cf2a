use super::wire::ShutterPayload;
use super::DeviceInfo;
use crate::error::{DashError, Result};

/// Shutter position as reported in `shutter-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutterPosition {
    PartiallyOpen,
    Open,
    Closed,
    Opening,
    Closing,
}

impl TryFrom<i64> for ShutterPosition {
    type Error = DashError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            -1 => Ok(Self::PartiallyOpen),
            0 => Ok(Self::Open),
            1 => Ok(Self::Closed),
            2 => Ok(Self::Opening),
            3 => Ok(Self::Closing),
            _ => Err(DashError::UnknownEnumerator {
                field: "shutter-status",
                value,
            }),
        }
    }
}

impl ShutterPosition {
    pub fn code(self) -> i64 {
        match self {
            Self::PartiallyOpen => -1,
            Self::Open => 0,
            Self::Closed => 1,
            Self::Opening => 2,
            Self::Closing => 3,
        }
    }
}

/// Progress of the automatic close-on-network-loss sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityProcedure {
    NotNeeded,
    Waiting,
    Running,
    Finished,
    Error,
    Deactivated,
}

impl TryFrom<i64> for SecurityProcedure {
    type Error = DashError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            0 => Ok(Self::NotNeeded),
            1 => Ok(Self::Waiting),
            2 => Ok(Self::Running),
            3 => Ok(Self::Finished),
            4 => Ok(Self::Error),
            5 => Ok(Self::Deactivated),
            _ => Err(DashError::UnknownEnumerator {
                field: "security-procedures",
                value,
            }),
        }
    }
}

impl SecurityProcedure {
    pub fn code(self) -> i64 {
        match self {
            Self::NotNeeded => 0,
            Self::Waiting => 1,
            Self::Running => 2,
            Self::Finished => 3,
            Self::Error => 4,
            Self::Deactivated => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NotNeeded => "not needed",
            Self::Waiting => "waiting...",
            Self::Running => "running",
            Self::Finished => "finished",
            Self::Error => "ERROR",
            Self::Deactivated => "deactivated (manual)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareAlert {
    pub active: bool,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAlert {
    pub active: bool,
    pub security_procedure: SecurityProcedure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShutterState {
    pub info: DeviceInfo,
    pub position: ShutterPosition,
    pub moving: bool,
    pub lock_movement: bool,
    /// Controller-side view of its own Wi-Fi/internet link.
    pub network_ok: bool,
    pub hardware_alert: HardwareAlert,
    pub network_alert: NetworkAlert,
    pub auto_mode: bool,
    pub opened_sensor: bool,
    pub closed_sensor: bool,
    pub opening_motor: bool,
    pub closing_motor: bool,
}

impl ShutterState {
    /// Motion is refused by the firmware in any of these conditions, so the
    /// controls are locked too.
    pub fn motion_locked(&self) -> bool {
        !self.auto_mode
            || self.lock_movement
            || self.hardware_alert.active
            || self.network_alert.active
    }
}

impl TryFrom<ShutterPayload> for ShutterState {
    type Error = DashError;

    fn try_from(raw: ShutterPayload) -> Result<Self> {
        Ok(Self {
            position: ShutterPosition::try_from(raw.shutter_status)?,
            network_alert: NetworkAlert {
                active: raw.alert.network.status,
                security_procedure: SecurityProcedure::try_from(
                    raw.alert.network.security_procedures,
                )?,
            },
            hardware_alert: HardwareAlert {
                active: raw.alert.hardware.status,
                description: raw.alert.hardware.description,
            },
            info: DeviceInfo {
                firmware_version: raw.firmware_version,
                uptime: raw.uptime,
                hostname: raw.wifi.hostname,
                mac_address: raw.wifi.mac_address,
                relay_list: raw.relay.list,
                optoin_list: raw.optoin.list,
            },
            moving: raw.movement_status,
            lock_movement: raw.lock_movement,
            network_ok: raw.network_status,
            auto_mode: raw.optoin.auto,
            opened_sensor: raw.optoin.opened_sensor,
            closed_sensor: raw.optoin.closed_sensor,
            opening_motor: raw.relay.opening_motor,
            closing_motor: raw.relay.closing_motor,
        })
    }
}
