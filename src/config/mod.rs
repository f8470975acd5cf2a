pub mod schema;
pub mod watcher;

use crate::error::{DashError, Result};
use schema::AppConfig;
use std::path::Path;
use url::Url;

/// Load and parse configuration from a TOML file.
///
/// # Errors
/// Returns `DashError::ConfigNotFound` if the file doesn't exist,
/// `DashError::Io` on read errors, `DashError::TomlParse` on syntax errors,
/// or `DashError::Config` on validation failures.
pub fn load(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(DashError::ConfigNotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

/// Parse and validate configuration text.
pub fn parse(content: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(&expand_env_vars(content))?;
    validate(&config)?;
    Ok(config)
}

/// The controller root as a URL.
///
/// # Errors
/// Returns `DashError::Config` if the configured URL is not http(s).
pub fn controller_url(config: &AppConfig) -> Result<Url> {
    let url = Url::parse(&config.controller.url)
        .map_err(|e| DashError::Config(format!("controller.url: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(DashError::Config(format!(
            "controller.url: unsupported scheme '{other}'"
        ))),
    }
}

/// Substitute `${VAR}` and `$VAR` from the environment. Unset variables are
/// left untouched so the parse error points at them.
fn expand_env_vars(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = if let Some(braced) = after.strip_prefix('{') {
            match braced.find('}') {
                Some(end) => (&braced[..end], end + 2),
                None => ("", 0),
            }
        } else {
            let end = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .unwrap_or(after.len());
            (&after[..end], end)
        };

        match std::env::var(name) {
            Ok(value) if !name.is_empty() => out.push_str(&value),
            _ => out.push_str(&rest[pos..=pos + consumed]),
        }
        rest = &rest[pos + 1 + consumed..];
    }

    out.push_str(rest);
    out
}

/// Validate config constraints.
fn validate(config: &AppConfig) -> Result<()> {
    controller_url(config)?;

    let c = &config.controller;
    for (name, value) in [
        ("request_timeout_ms", c.request_timeout_ms),
        ("poll_interval_ms", c.poll_interval_ms),
        ("settle_delay_ms", c.settle_delay_ms),
        ("log.keepalive_interval_ms", config.log.keepalive_interval_ms),
        ("log.reconnect_initial_ms", config.log.reconnect_initial_ms),
    ] {
        if value == 0 {
            return Err(DashError::Config(format!("{name} must be greater than 0")));
        }
    }

    if config.log.reconnect_max_ms < config.log.reconnect_initial_ms {
        return Err(DashError::Config(
            "log.reconnect_max_ms must not be below log.reconnect_initial_ms".to_string(),
        ));
    }

    Ok(())
}
