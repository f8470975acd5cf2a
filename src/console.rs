use crate::error::Result;
use crate::event::DashEvent;
use crate::model::command::AZ_TARGET_PARAM;
use crate::model::Command;
use std::collections::BTreeMap;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Translate one operator line into an intent.
///
/// `<command> [value]` submits a controller command; the value becomes
/// `az-target` for `slew-to-az`. `clear`, `follow`, `info` and `quit` act
/// locally.
pub fn parse_line(line: &str) -> Option<DashEvent> {
    let mut words = line.split_whitespace();
    let head = words.next()?;

    let event = match head {
        "clear" => DashEvent::ClearLog,
        "follow" => DashEvent::ToggleFollow,
        "info" => DashEvent::ShowInfo,
        "quit" | "exit" => DashEvent::Shutdown,
        _ => {
            // Infallible: unknown names are passed through to the controller.
            let command: Command = head.parse().unwrap_or_else(|e| match e {});
            let mut params = BTreeMap::new();
            if command == Command::SlewToAz {
                params.insert(
                    AZ_TARGET_PARAM.to_string(),
                    words.next().unwrap_or_default().to_string(),
                );
            }
            DashEvent::Submit { command, params }
        }
    };
    Some(event)
}

/// Read operator lines from stdin, forwarding intents to the broadcast
/// channel. Returns on EOF; the daemon keeps running without a console.
pub async fn read_console_loop(
    tx: broadcast::Sender<DashEvent>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            () = cancel.cancelled() => return Ok(()),
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            info!("console closed");
            return Ok(());
        };

        if let Some(event) = parse_line(&line) {
            debug!("console intent: {event:?}");
            let _ = tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submitted(line: &str) -> (Command, BTreeMap<String, String>) {
        match parse_line(line) {
            Some(DashEvent::Submit { command, params }) => (command, params),
            other => panic!("unexpected intent {other:?}"),
        }
    }

    #[test]
    fn slew_value_becomes_az_target() {
        let (command, params) = submitted("slew-to-az 215.5");
        assert_eq!(command, Command::SlewToAz);
        assert_eq!(params.get("az-target").map(String::as_str), Some("215.5"));
    }

    #[test]
    fn missing_azimuth_is_left_to_validation() {
        let (_, params) = submitted("slew-to-az");
        assert_eq!(params.get("az-target").map(String::as_str), Some(""));
    }

    #[test]
    fn plain_commands_carry_no_params() {
        let (command, params) = submitted("  close  ");
        assert_eq!(command, Command::Close);
        assert!(params.is_empty());

        let (command, _) = submitted("reset-EEPROM");
        assert_eq!(command, Command::ResetEeprom);
    }

    #[test]
    fn local_intents() {
        assert!(matches!(parse_line("clear"), Some(DashEvent::ClearLog)));
        assert!(matches!(parse_line("follow"), Some(DashEvent::ToggleFollow)));
        assert!(matches!(parse_line("info"), Some(DashEvent::ShowInfo)));
        assert!(matches!(parse_line("quit"), Some(DashEvent::Shutdown)));
        assert!(parse_line("   ").is_none());
    }
}
