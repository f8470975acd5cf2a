use crate::event::DashEvent;
use crate::model::Command;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Visual lifecycle of a command control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ButtonState {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

impl ButtonState {
    pub fn color(self) -> &'static str {
        match self {
            Self::Idle => "gray",
            Self::Pending => "orange",
            Self::Succeeded => "green",
            Self::Failed => "red",
        }
    }
}

#[derive(Default)]
struct Slot {
    state: ButtonState,
    generation: u64,
    decay: Option<CancellationToken>,
}

/// Button states of every control, with their pending decay timers.
///
/// Each transition bumps the slot's generation and cancels the previous
/// decay, so a late timer can never reset a newer press.
#[derive(Clone)]
pub struct ButtonBoard {
    slots: Arc<Mutex<HashMap<Command, Slot>>>,
    events: broadcast::Sender<DashEvent>,
}

impl ButtonBoard {
    pub fn new(events: broadcast::Sender<DashEvent>) -> Self {
        Self {
            slots: Arc::new(Mutex::new(HashMap::new())),
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Command, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self, command: &Command) -> ButtonState {
        self.lock().get(command).map_or(ButtonState::Idle, |s| s.state)
    }

    /// Controls currently showing something other than idle.
    pub fn active(&self) -> HashMap<Command, ButtonState> {
        self.lock()
            .iter()
            .filter(|(_, slot)| slot.state != ButtonState::Idle)
            .map(|(cmd, slot)| (cmd.clone(), slot.state))
            .collect()
    }

    /// Move a control to `state`, cancelling any pending decay.
    /// Returns the generation of this transition.
    pub fn set(&self, command: &Command, state: ButtonState) -> u64 {
        let generation = {
            let mut slots = self.lock();
            let slot = slots.entry(command.clone()).or_default();
            if let Some(decay) = slot.decay.take() {
                decay.cancel();
            }
            slot.state = state;
            slot.generation += 1;
            slot.generation
        };
        trace!("button '{command}' → {}", state.color());
        let _ = self.events.send(DashEvent::Button {
            command: command.clone(),
            state,
        });
        generation
    }

    /// Show `state` now and fall back to idle after `delay`.
    pub fn settle(&self, command: &Command, state: ButtonState, delay: Duration) {
        let generation = self.set(command, state);
        let token = CancellationToken::new();
        if let Some(slot) = self.lock().get_mut(command) {
            if slot.generation == generation {
                slot.decay = Some(token.clone());
            }
        }

        let board = self.clone();
        let command = command.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = token.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    board.release(&command, generation);
                }
            }
        });
    }

    /// Return a control to idle unless it was pressed again since
    /// `generation`.
    pub fn release(&self, command: &Command, generation: u64) -> bool {
        {
            let mut slots = self.lock();
            match slots.get_mut(command) {
                Some(slot) if slot.generation == generation => {
                    slot.decay = None;
                    slot.state = ButtonState::Idle;
                }
                _ => return false,
            }
        }
        trace!("button '{command}' → idle");
        let _ = self.events.send(DashEvent::Button {
            command: command.clone(),
            state: ButtonState::Idle,
        });
        true
    }
}
