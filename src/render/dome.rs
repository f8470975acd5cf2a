use super::{bits, ControlView, Dashboard, Indicator, Panel};
use crate::model::{Azimuth, Command, DomeState};

pub const CONTROLS: &[Command] = &[
    Command::SlewToAz,
    Command::Park,
    Command::Abort,
    Command::IgniteSwitchboard,
    Command::FindZero,
    Command::Restart,
    Command::ForceRestart,
    Command::TurnOff,
    Command::ResetEeprom,
];

pub const DETAIL_KEYS: &[&str] = &[
    "firmware-version",
    "uptime",
    "dome-azimuth",
    "target-azimuth",
    "movement-status",
    "in-park",
    "finding-park",
    "finding-zero",
    "relay-list",
    "cw-motor",
    "ccw-motor",
    "switchboard",
    "optoin-list",
    "auto",
    "switchboard-status",
    "ac-presence",
    "manual-cw-button",
    "manual-ccw-button",
    "manual-ignition",
    "hostname",
    "mac-address",
];

fn headline(dome: &DomeState) -> String {
    let mut text = match dome.dome_azimuth {
        Azimuth::Degrees(az) => format!("Azimuth: {az}°"),
        Azimuth::Unset if dome.finding_zero => "Azimuth: finding zero".to_string(),
        Azimuth::Unset => "Azimuth: unknown".to_string(),
        Azimuth::Fault(code) => format!("Azimuth: encoder error ({code})"),
    };
    if dome.moving {
        if let Some(target) = dome.target_azimuth.degrees() {
            text.push_str(&format!(", moving to {target}°"));
        }
    }
    text
}

impl Panel for DomeState {
    fn project(&self) -> Dashboard {
        let locked = !self.auto_mode;

        let mut controls = std::collections::BTreeMap::new();
        controls.insert(
            Command::SlewToAz,
            ControlView::highlighted(!locked, self.moving),
        );
        for cmd in [Command::Park, Command::Abort, Command::FindZero, Command::TurnOff] {
            controls.insert(cmd, ControlView::new(!locked));
        }
        controls.insert(
            Command::IgniteSwitchboard,
            ControlView::new(!locked && !self.switchboard_energized),
        );
        for cmd in [Command::Restart, Command::ForceRestart, Command::ResetEeprom] {
            controls.insert(cmd, ControlView::new(true));
        }

        let indicators = if locked {
            vec![Indicator::ManualMode]
        } else {
            Vec::new()
        };

        let values = [
            self.info.firmware_version.clone(),
            self.info.uptime.clone(),
            self.dome_azimuth.raw().to_string(),
            self.target_azimuth.raw().to_string(),
            self.moving.to_string(),
            self.in_park.to_string(),
            self.finding_park.to_string(),
            self.finding_zero.to_string(),
            bits(&self.info.relay_list),
            self.relays.cw_motor.to_string(),
            self.relays.ccw_motor.to_string(),
            self.relays.switchboard.to_string(),
            bits(&self.info.optoin_list),
            self.auto_mode.to_string(),
            self.switchboard_energized.to_string(),
            self.ac_present.to_string(),
            self.manual.cw_button.to_string(),
            self.manual.ccw_button.to_string(),
            self.manual.ignition.to_string(),
            self.info.hostname.clone(),
            self.info.mac_address.clone(),
        ];

        Dashboard {
            available: true,
            headline: headline(self),
            indicators,
            controls,
            details: DETAIL_KEYS.iter().copied().zip(values).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{fixtures, DeviceKind, DeviceState};
    use serde_json::json;

    fn dome(rsp: serde_json::Value) -> DomeState {
        match DeviceState::from_rsp(DeviceKind::Dome, rsp).unwrap() {
            DeviceState::Dome(d) => d,
            DeviceState::Shutter(_) => unreachable!(),
        }
    }

    #[test]
    fn moving_dome_headline_and_highlight() {
        let view = dome(fixtures::dome_rsp()).project();
        assert_eq!(view.headline, "Azimuth: 87°, moving to 120°");
        let slew = view.control(&Command::SlewToAz).unwrap();
        assert!(slew.enabled);
        assert_eq!(slew.color, "orange");
        // switchboard already energized
        assert!(!view.control(&Command::IgniteSwitchboard).unwrap().enabled);
        assert_eq!(view.detail("relay-list"), Some("1001"));
        assert_eq!(view.details.len(), DETAIL_KEYS.len());
    }

    #[test]
    fn manual_mode_locks_motion() {
        let mut rsp = fixtures::dome_rsp();
        rsp["optoin"]["auto"] = json!(false);
        rsp["optoin"]["switchboard-status"] = json!(false);
        rsp["movement-status"] = json!(false);
        let view = dome(rsp).project();

        assert_eq!(view.headline, "Azimuth: 87°");
        assert_eq!(view.indicators, vec![Indicator::ManualMode]);
        for cmd in [
            Command::SlewToAz,
            Command::Park,
            Command::Abort,
            Command::FindZero,
            Command::TurnOff,
            Command::IgniteSwitchboard,
        ] {
            assert!(!view.control(&cmd).unwrap().enabled, "{cmd}");
        }
        assert!(view.control(&Command::Restart).unwrap().enabled);
        assert!(view.control(&Command::ResetEeprom).unwrap().enabled);
    }

    #[test]
    fn finding_zero_headline() {
        let mut rsp = fixtures::dome_rsp();
        rsp["dome-azimuth"] = json!(-1);
        rsp["target-azimuth"] = json!(-1);
        rsp["finding-zero"] = json!(true);
        let view = dome(rsp).project();
        assert!(view.available);
        assert_eq!(view.headline, "Azimuth: finding zero");
        assert_eq!(view.detail("dome-azimuth"), Some("-1"));
        assert_eq!(view.detail("target-azimuth"), Some("-1"));
        assert!(view.control(&Command::Abort).unwrap().enabled);
    }

    #[test]
    fn encoder_fault_headline() {
        let mut rsp = fixtures::dome_rsp();
        rsp["dome-azimuth"] = json!(-3);
        rsp["movement-status"] = json!(false);
        let view = dome(rsp).project();
        assert_eq!(view.headline, "Azimuth: encoder error (-3)");
        assert_eq!(view.detail("dome-azimuth"), Some("-3"));
    }
}
