use super::wire::DomePayload;
use super::DeviceInfo;
use crate::error::{DashError, Result};
use tracing::debug;

/// Relay outputs of the dome control board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomeRelays {
    pub cw_motor: bool,
    pub ccw_motor: bool,
    pub switchboard: bool,
}

/// Manual override inputs wired to the panel next to the dome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ManualOverrides {
    pub cw_button: bool,
    pub ccw_button: bool,
    pub ignition: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DomeState {
    pub info: DeviceInfo,
    pub dome_azimuth: Azimuth,
    pub target_azimuth: Azimuth,
    pub moving: bool,
    pub in_park: bool,
    pub finding_park: bool,
    pub finding_zero: bool,
    pub auto_mode: bool,
    pub switchboard_energized: bool,
    pub auto_ignition: bool,
    pub ac_present: bool,
    pub relays: DomeRelays,
    pub manual: ManualOverrides,
}

/// An azimuth reading as the dome controller reports it.
///
/// The firmware overloads the field with negative sentinels: `-1` while no
/// value is known (zero search running, no target set yet), `-2`/`-3` for
/// encoder faults. None of them is a protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Azimuth {
    Degrees(u16),
    Unset,
    Fault(i32),
}

impl Azimuth {
    pub fn degrees(self) -> Option<u16> {
        match self {
            Self::Degrees(az) => Some(az),
            Self::Unset | Self::Fault(_) => None,
        }
    }

    /// The value exactly as sent by the firmware.
    pub fn raw(self) -> i32 {
        match self {
            Self::Degrees(az) => i32::from(az),
            Self::Unset => -1,
            Self::Fault(value) => value,
        }
    }
}

impl From<i32> for Azimuth {
    fn from(value: i32) -> Self {
        match value {
            -1 => Self::Unset,
            0..=360 => Self::Degrees(value as u16),
            _ => Self::Fault(value),
        }
    }
}

impl TryFrom<DomePayload> for DomeState {
    type Error = DashError;

    fn try_from(raw: DomePayload) -> Result<Self> {
        let dome_azimuth = Azimuth::from(raw.dome_azimuth);
        if let Azimuth::Fault(value) = dome_azimuth {
            debug!("dome reports encoder fault, dome-azimuth {value}");
        }

        Ok(Self {
            info: DeviceInfo {
                firmware_version: raw.firmware_version,
                uptime: raw.uptime,
                hostname: raw.wifi.hostname,
                mac_address: raw.wifi.mac_address,
                relay_list: raw.relay.list,
                optoin_list: raw.optoin.list,
            },
            dome_azimuth,
            target_azimuth: Azimuth::from(raw.target_azimuth),
            moving: raw.movement_status,
            in_park: raw.in_park,
            finding_park: raw.finding_park,
            finding_zero: raw.finding_zero,
            auto_mode: raw.optoin.auto,
            switchboard_energized: raw.optoin.switchboard_status,
            auto_ignition: raw.optoin.auto_ignition,
            ac_present: raw.optoin.ac_presence,
            relays: DomeRelays {
                cw_motor: raw.relay.cw_motor,
                ccw_motor: raw.relay.ccw_motor,
                switchboard: raw.relay.switchboard,
            },
            manual: ManualOverrides {
                cw_button: raw.optoin.manual_cw_button,
                ccw_button: raw.optoin.manual_ccw_button,
                ignition: raw.optoin.manual_ignition,
            },
        })
    }
}
