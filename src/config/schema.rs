use crate::model::DeviceKind;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub controller: ControllerConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// The controller this client talks to and the cadence it talks at.
#[derive(Debug, Clone, Deserialize)]
pub struct ControllerConfig {
    /// Controller root, e.g. "http://dome-controller.local".
    pub url: String,

    /// Firmware flavour behind `url`.
    pub kind: DeviceKind,

    /// Deadline for every API exchange.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Milliseconds between status polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// How long a button shows its outcome before reverting.
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,
}

impl ControllerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// How log lines are pushed from the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushTransport {
    /// `GET /log_sse`
    EventStream,
    /// `GET /webserialws`, upgraded.
    Socket,
}

/// Log push channel settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_transport")]
    pub transport: PushTransport,

    /// Socket variant: probe cadence and reconnect check.
    #[serde(default = "default_keepalive_interval")]
    pub keepalive_interval_ms: u64,

    /// Echo new lines as they arrive.
    #[serde(default = "default_true")]
    pub follow: bool,

    /// Event-stream variant: first retry delay after a drop.
    #[serde(default = "default_reconnect_initial")]
    pub reconnect_initial_ms: u64,

    /// Event-stream variant: backoff ceiling.
    #[serde(default = "default_reconnect_max")]
    pub reconnect_max_ms: u64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            transport: default_transport(),
            keepalive_interval_ms: default_keepalive_interval(),
            follow: true,
            reconnect_initial_ms: default_reconnect_initial(),
            reconnect_max_ms: default_reconnect_max(),
        }
    }
}

impl LogConfig {
    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}

// --- Defaults ---

fn default_request_timeout() -> u64 {
    3500
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_settle_delay() -> u64 {
    2000
}

fn default_true() -> bool {
    true
}

fn default_transport() -> PushTransport {
    PushTransport::EventStream
}

fn default_keepalive_interval() -> u64 {
    1000
}

fn default_reconnect_initial() -> u64 {
    1000
}

fn default_reconnect_max() -> u64 {
    30_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let toml_str = r#"
[controller]
url = "http://dome-controller.local"
kind = "dome"
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.controller.kind, DeviceKind::Dome);
        assert_eq!(config.controller.request_timeout(), Duration::from_millis(3500));
        assert_eq!(config.controller.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.controller.settle_delay(), Duration::from_secs(2));
        assert!(config.log.enabled);
        assert!(config.log.follow);
        assert_eq!(config.log.transport, PushTransport::EventStream);
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[controller]
url = "http://shutter-controller.local"
kind = "shutter"
request_timeout_ms = 5000
poll_interval_ms = 500
settle_delay_ms = 1500

[log]
transport = "socket"
keepalive_interval_ms = 2000
follow = false
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.controller.kind, DeviceKind::Shutter);
        assert_eq!(config.controller.request_timeout_ms, 5000);
        assert_eq!(config.log.transport, PushTransport::Socket);
        assert_eq!(config.log.keepalive_interval(), Duration::from_secs(2));
        assert!(!config.log.follow);
        assert_eq!(config.log.reconnect_max_ms, 30_000);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let toml_str = r#"
[controller]
url = "http://x.local"
kind = "roof"
"#;
        assert!(toml::from_str::<AppConfig>(toml_str).is_err());
    }
}
