//! Pure projection of the current state into what an operator sees.
//!
//! Nothing here performs I/O; the daemon decides where the result goes.

pub mod dome;
pub mod shutter;

use crate::dispatch::ButtonState;
use crate::model::{Command, DeviceKind, DeviceState, Snapshot};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Placeholder for any value while status is unavailable.
pub const PLACEHOLDER: &str = "ND";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlView {
    pub enabled: bool,
    pub color: &'static str,
}

impl ControlView {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            color: ButtonState::Idle.color(),
        }
    }

    pub fn highlighted(enabled: bool, active: bool) -> Self {
        Self {
            enabled,
            color: if active {
                ButtonState::Pending.color()
            } else {
                ButtonState::Idle.color()
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    ManualMode,
    MovementLocked,
    HardwareAlert,
    NetworkAlert,
}

impl Indicator {
    pub fn label(self) -> &'static str {
        match self {
            Self::ManualMode => "MANUAL",
            Self::MovementLocked => "LOCKED",
            Self::HardwareAlert => "HARDWARE ALERT",
            Self::NetworkAlert => "NETWORK ALERT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    pub available: bool,
    pub headline: String,
    pub indicators: Vec<Indicator>,
    pub controls: BTreeMap<Command, ControlView>,
    pub details: Vec<(&'static str, String)>,
}

impl Dashboard {
    pub fn control(&self, command: &Command) -> Option<ControlView> {
        self.controls.get(command).copied()
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Placeholder view: every control disabled, every value `ND`.
    fn unavailable(kind: DeviceKind) -> Self {
        let (controls, keys): (&[Command], &[&'static str]) = match kind {
            DeviceKind::Dome => (dome::CONTROLS, dome::DETAIL_KEYS),
            DeviceKind::Shutter => (shutter::CONTROLS, shutter::DETAIL_KEYS),
        };
        Self {
            available: false,
            headline: "Status unavailable".to_string(),
            indicators: Vec::new(),
            controls: controls
                .iter()
                .map(|c| (c.clone(), ControlView::new(false)))
                .collect(),
            details: keys.iter().map(|k| (*k, PLACEHOLDER.to_string())).collect(),
        }
    }

    /// Show in-flight and settling command outcomes on top of the derived
    /// controls. A motion control stays disabled until fresh status
    /// releases it.
    fn overlay(&mut self, buttons: &HashMap<Command, ButtonState>) {
        for (command, state) in buttons {
            if let Some(view) = self.controls.get_mut(command) {
                view.color = state.color();
                if command.is_motion() {
                    view.enabled = false;
                }
            }
        }
    }
}

impl fmt::Display for Dashboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline)?;
        for indicator in &self.indicators {
            write!(f, " [{}]", indicator.label())?;
        }
        writeln!(f)?;

        let controls: Vec<String> = self
            .controls
            .iter()
            .map(|(cmd, view)| {
                let mark = if view.enabled { "" } else { "-" };
                format!("{mark}{cmd}({})", view.color)
            })
            .collect();
        writeln!(f, "controls: {}", controls.join(" "))?;

        for (key, value) in &self.details {
            writeln!(f, "  {key}: {value}")?;
        }
        Ok(())
    }
}

/// Per-kind projection of a fresh state.
pub trait Panel {
    fn project(&self) -> Dashboard;
}

impl Panel for DeviceState {
    fn project(&self) -> Dashboard {
        match self {
            Self::Dome(d) => d.project(),
            Self::Shutter(s) => s.project(),
        }
    }
}

/// Build the dashboard for `snapshot`, overlaying button states.
pub fn dashboard(
    kind: DeviceKind,
    snapshot: &Snapshot,
    buttons: &HashMap<Command, ButtonState>,
) -> Dashboard {
    let mut view = match snapshot.current() {
        Some(state) => state.project(),
        None => Dashboard::unavailable(kind),
    };
    view.overlay(buttons);
    view
}

/// Raw bit readouts rendered as `1`/`0`.
pub(crate) fn bits(list: &[bool]) -> String {
    list.iter().map(|&b| if b { '1' } else { '0' }).collect()
}
