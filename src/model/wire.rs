//! Raw `status` payloads exactly as the firmware serializes them.
//!
//! Enumerators stay numeric here; conversion into the typed model happens
//! in `dome.rs` / `shutter.rs` so unmapped values surface as
//! `UnknownEnumerator` instead of a generic decode failure.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct Wifi {
    pub hostname: String,
    pub mac_address: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct DomePayload {
    pub firmware_version: String,
    pub uptime: String,
    pub dome_azimuth: i32,
    pub target_azimuth: i32,
    pub movement_status: bool,
    pub in_park: bool,
    pub finding_park: bool,
    pub finding_zero: bool,
    pub relay: DomeRelay,
    pub optoin: DomeOptoIn,
    pub wifi: Wifi,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct DomeRelay {
    #[serde(default)]
    pub list: Vec<bool>,
    pub cw_motor: bool,
    pub ccw_motor: bool,
    pub switchboard: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct DomeOptoIn {
    #[serde(default)]
    pub list: Vec<bool>,
    pub auto: bool,
    pub switchboard_status: bool,
    #[serde(default)]
    pub auto_ignition: bool,
    pub ac_presence: bool,
    pub manual_cw_button: bool,
    pub manual_ccw_button: bool,
    pub manual_ignition: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ShutterPayload {
    pub firmware_version: String,
    pub uptime: String,
    pub shutter_status: i64,
    pub movement_status: bool,
    pub lock_movement: bool,
    pub network_status: bool,
    pub alert: ShutterAlerts,
    pub relay: ShutterRelay,
    pub optoin: ShutterOptoIn,
    pub wifi: Wifi,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShutterAlerts {
    pub hardware: HardwareAlertPayload,
    pub network: NetworkAlertPayload,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HardwareAlertPayload {
    pub status: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct NetworkAlertPayload {
    pub status: bool,
    pub security_procedures: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ShutterRelay {
    #[serde(default)]
    pub list: Vec<bool>,
    pub opening_motor: bool,
    pub closing_motor: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct ShutterOptoIn {
    #[serde(default)]
    pub list: Vec<bool>,
    pub auto: bool,
    pub opened_sensor: bool,
    pub closed_sensor: bool,
}
