use crate::event::{Alert, Channel};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connected,
    Disconnected,
}

/// Edge-triggered connectivity tracker for one channel.
///
/// Repeated failures (or successes) in the same state produce nothing; only
/// the transition yields an alert, so an outage is announced once and its
/// recovery once.
#[derive(Debug, Clone)]
pub struct Connectivity {
    channel: Channel,
    state: LinkState,
}

impl Connectivity {
    pub fn new(channel: Channel, initial: LinkState) -> Self {
        Self {
            channel,
            state: initial,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Record a successful exchange. Returns the restoration alert on the
    /// `Disconnected → Connected` edge.
    pub fn on_success(&mut self) -> Option<Alert> {
        if self.state == LinkState::Connected {
            return None;
        }
        self.state = LinkState::Connected;
        info!("{} channel connected", self.channel);
        Some(Alert::Connected(self.channel))
    }

    /// Record a failure. Returns the disconnection alert on the
    /// `Connected → Disconnected` edge.
    pub fn on_failure(&mut self, reason: &str) -> Option<Alert> {
        if self.state == LinkState::Disconnected {
            return None;
        }
        self.state = LinkState::Disconnected;
        warn!("{} channel lost: {reason}", self.channel);
        Some(Alert::Disconnected {
            channel: self.channel,
            reason: reason.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_alert_once_per_outage() {
        let mut link = Connectivity::new(Channel::Status, LinkState::Connected);
        assert!(link.on_success().is_none());

        let first = link.on_failure("timeout");
        assert!(matches!(
            first,
            Some(Alert::Disconnected { channel: Channel::Status, .. })
        ));
        for _ in 0..5 {
            assert!(link.on_failure("timeout").is_none());
        }
        assert_eq!(link.state(), LinkState::Disconnected);

        assert_eq!(link.on_success(), Some(Alert::Connected(Channel::Status)));
        assert!(link.on_success().is_none());
        assert!(link.is_connected());
    }

    #[test]
    fn starting_disconnected_announces_first_connection() {
        let mut link = Connectivity::new(Channel::Log, LinkState::Disconnected);
        assert!(link.on_failure("refused").is_none());
        assert_eq!(link.on_success(), Some(Alert::Connected(Channel::Log)));
    }
}
