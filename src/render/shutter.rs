use super::{bits, ControlView, Dashboard, Indicator, Panel};
use crate::model::{Command, ShutterPosition, ShutterState};
use std::collections::BTreeMap;

pub const CONTROLS: &[Command] = &[
    Command::Open,
    Command::Close,
    Command::Abort,
    Command::LockMovement,
    Command::UnlockMovement,
    Command::Restart,
    Command::ForceRestart,
    Command::ResetAlertStatus,
    Command::ResetEeprom,
];

pub const DETAIL_KEYS: &[&str] = &[
    "firmware-version",
    "uptime",
    "shutter-status",
    "movement-status",
    "lock-movement",
    "network-status",
    "hardware-alert-status",
    "network-alert-status",
    "EP-status",
    "relay-list",
    "opening-motor",
    "closing-motor",
    "optoin-list",
    "auto",
    "opened-sensor",
    "closed-sensor",
    "hostname",
    "mac-address",
];

fn headline(position: ShutterPosition) -> &'static str {
    match position {
        ShutterPosition::PartiallyOpen => "Shutter partially opened",
        ShutterPosition::Open => "Shutter opened",
        ShutterPosition::Closed => "Shutter closed",
        ShutterPosition::Opening => "Shutter opening...",
        ShutterPosition::Closing => "Shutter closing...",
    }
}

/// `(open, close)` for the current position. A position that is already
/// reached, or being reached, disables its own control.
fn motion_controls(position: ShutterPosition, locked: bool) -> (ControlView, ControlView) {
    let free = ControlView::new(!locked);
    match position {
        ShutterPosition::PartiallyOpen => (free, free),
        ShutterPosition::Open => (ControlView::new(false), free),
        ShutterPosition::Closed => (free, ControlView::new(false)),
        ShutterPosition::Opening => (ControlView::highlighted(false, true), free),
        ShutterPosition::Closing => (free, ControlView::highlighted(false, true)),
    }
}

impl Panel for ShutterState {
    fn project(&self) -> Dashboard {
        let locked = self.motion_locked();
        let (open, close) = motion_controls(self.position, locked);

        let mut controls = BTreeMap::new();
        controls.insert(Command::Open, open);
        controls.insert(Command::Close, close);
        controls.insert(Command::Abort, ControlView::new(!locked));
        controls.insert(Command::LockMovement, ControlView::new(!self.lock_movement));
        controls.insert(Command::UnlockMovement, ControlView::new(self.lock_movement));
        for cmd in [
            Command::Restart,
            Command::ForceRestart,
            Command::ResetAlertStatus,
            Command::ResetEeprom,
        ] {
            controls.insert(cmd, ControlView::new(true));
        }

        let indicators = [
            (!self.auto_mode, Indicator::ManualMode),
            (self.lock_movement, Indicator::MovementLocked),
            (self.hardware_alert.active, Indicator::HardwareAlert),
            (self.network_alert.active, Indicator::NetworkAlert),
        ]
        .into_iter()
        .filter_map(|(on, indicator)| on.then_some(indicator))
        .collect();

        let hardware_alert = if self.hardware_alert.active {
            format!("true, {}", self.hardware_alert.description)
        } else {
            "false".to_string()
        };
        let procedure = self.network_alert.security_procedure;

        let values = [
            self.info.firmware_version.clone(),
            self.info.uptime.clone(),
            self.position.code().to_string(),
            self.moving.to_string(),
            self.lock_movement.to_string(),
            self.network_ok.to_string(),
            hardware_alert,
            self.network_alert.active.to_string(),
            format!("{} ({})", procedure.label(), procedure.code()),
            bits(&self.info.relay_list),
            self.opening_motor.to_string(),
            self.closing_motor.to_string(),
            bits(&self.info.optoin_list),
            self.auto_mode.to_string(),
            self.opened_sensor.to_string(),
            self.closed_sensor.to_string(),
            self.info.hostname.clone(),
            self.info.mac_address.clone(),
        ];

        Dashboard {
            available: true,
            headline: headline(self.position).to_string(),
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

    fn shutter(rsp: serde_json::Value) -> ShutterState {
        match DeviceState::from_rsp(DeviceKind::Shutter, rsp).unwrap() {
            DeviceState::Shutter(s) => s,
            DeviceState::Dome(_) => unreachable!(),
        }
    }

    fn enabled(view: &Dashboard, cmd: Command) -> bool {
        view.control(&cmd).unwrap().enabled
    }

    #[test]
    fn opening_disables_open_and_allows_close() {
        let view = shutter(fixtures::shutter_rsp(2, 0)).project();
        assert_eq!(view.headline, "Shutter opening...");
        assert!(!enabled(&view, Command::Open));
        assert_eq!(view.control(&Command::Open).unwrap().color, "orange");
        assert!(enabled(&view, Command::Close));
        assert!(view.indicators.is_empty());
    }

    #[test]
    fn position_table() {
        let cases = [
            (-1, "Shutter partially opened", true, true),
            (0, "Shutter opened", false, true),
            (1, "Shutter closed", true, false),
            (2, "Shutter opening...", false, true),
            (3, "Shutter closing...", true, false),
        ];
        for (code, text, open, close) in cases {
            let view = shutter(fixtures::shutter_rsp(code, 0)).project();
            assert_eq!(view.headline, text);
            assert_eq!(enabled(&view, Command::Open), open, "open at {code}");
            assert_eq!(enabled(&view, Command::Close), close, "close at {code}");
        }
    }

    #[test]
    fn alert_locks_motion_and_shows_indicator() {
        let mut rsp = fixtures::shutter_rsp(2, 4);
        rsp["alert"]["network"]["status"] = json!(true);
        let view = shutter(rsp).project();

        assert!(!enabled(&view, Command::Close));
        assert!(!enabled(&view, Command::Abort));
        assert!(enabled(&view, Command::ResetAlertStatus));
        assert_eq!(view.indicators, vec![Indicator::NetworkAlert]);
        assert_eq!(view.detail("EP-status"), Some("ERROR (4)"));
    }

    #[test]
    fn lock_toggles_are_mutually_exclusive() {
        let mut rsp = fixtures::shutter_rsp(-1, 0);
        rsp["lock-movement"] = json!(true);
        let view = shutter(rsp).project();
        assert!(!enabled(&view, Command::LockMovement));
        assert!(enabled(&view, Command::UnlockMovement));
        assert!(!enabled(&view, Command::Open));
        assert_eq!(view.indicators, vec![Indicator::MovementLocked]);
    }

    #[test]
    fn hardware_alert_description_is_appended() {
        let mut rsp = fixtures::shutter_rsp(1, 0);
        rsp["alert"]["hardware"] = json!({ "status": true, "description": "limit switch timeout" });
        let view = shutter(rsp).project();
        assert_eq!(
            view.detail("hardware-alert-status"),
            Some("true, limit switch timeout")
        );
        assert_eq!(view.detail("EP-status"), Some("not needed (0)"));
        assert_eq!(view.detail("optoin-list"), Some("1010"));
    }
}
