use std::path::PathBuf;

/// Central error type for domelink.
#[derive(Debug, thiserror::Error)]
pub enum DashError {
    #[error("request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP {code}, {reason}")]
    Http { code: u16, reason: String },

    #[error("connection failed: {0}")]
    Connection(#[from] reqwest::Error),

    #[error("protocol error: {0}")]
    Protocol(String),

    /// A numeric enumerator the client does not know. Usually means the
    /// firmware speaks a newer protocol than this client.
    #[error("unknown {field} value {value}")]
    UnknownEnumerator { field: &'static str, value: i64 },

    #[error("{0}")]
    Validation(String),

    #[error("command '{command}' rejected: {reply}")]
    CommandRejected { command: String, reply: String },

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(String),

    #[error("config file not found: {0}")]
    ConfigNotFound(PathBuf),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watcher error: {0}")]
    Watcher(String),
}

impl DashError {
    /// Malformed envelope, missing field or unmapped enumerator.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol(_) | Self::UnknownEnumerator { .. })
    }

    /// Failures of the exchange itself, before any payload was understood.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Timeout { .. } | Self::Http { .. } | Self::Connection(_)
        )
    }
}

impl From<serde_json::Error> for DashError {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DashError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(DashError::Timeout { timeout_ms: 10 }.is_transport());
        assert!(DashError::Http {
            code: 500,
            reason: "Internal Server Error".into()
        }
        .is_transport());
        assert!(DashError::UnknownEnumerator {
            field: "shutter-status",
            value: 7
        }
        .is_protocol());
        assert!(!DashError::Validation("bad".into()).is_protocol());
        assert!(!DashError::Validation("bad".into()).is_transport());
    }

    #[test]
    fn http_error_display_matches_status_line() {
        let e = DashError::Http {
            code: 404,
            reason: "Not Found".into(),
        };
        assert_eq!(e.to_string(), "HTTP 404, Not Found");
    }
}
