use super::PushCore;
use crate::config::schema::LogConfig;
use crate::error::{DashError, Result};
use futures::StreamExt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

/// Exponential retry delay for a dropped event stream.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
}

impl Backoff {
    pub fn from_config(config: &LogConfig) -> Self {
        Self {
            initial: Duration::from_millis(config.reconnect_initial_ms),
            max: Duration::from_millis(config.reconnect_max_ms),
        }
    }

    /// `min(initial * 2^attempt, max)`
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.min(16));
        self.initial.saturating_mul(factor).min(self.max)
    }
}

/// Incremental `text/event-stream` decoder.
///
/// Only `data` and `retry` fields matter here; `event`, `id` and comments
/// are skipped.
#[derive(Debug, Default)]
pub struct SseParser {
    pending: Vec<u8>,
    data: Vec<String>,
    retry: Option<Duration>,
}

impl SseParser {
    /// Feed raw bytes, returning the data of every completed event.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(nl) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=nl).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.data.is_empty() {
                    events.push(self.data.join("\n"));
                    self.data.clear();
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                None => (line, ""),
            };
            match field {
                "data" => self.data.push(value.to_string()),
                "retry" => {
                    if let Ok(ms) = value.trim().parse::<u64>() {
                        self.retry = Some(Duration::from_millis(ms));
                    }
                }
                _ => {}
            }
        }

        events
    }

    /// Reconnect delay requested by the server, if any.
    pub fn retry(&self) -> Option<Duration> {
        self.retry
    }
}

/// Keep the event stream subscribed until cancelled.
pub(crate) async fn run(
    http: reqwest::Client,
    url: Url,
    mut core: PushCore,
    backoff: Backoff,
    cancel: CancellationToken,
) {
    let mut attempt: u32 = 0;
    let mut server_retry: Option<Duration> = None;

    loop {
        let mut parser = SseParser::default();
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            r = stream_once(&http, &url, &mut core, &mut parser) => r,
        };
        server_retry = parser.retry().or(server_retry);

        if core.link_state() == crate::link::LinkState::Connected {
            attempt = 0;
        }
        let reason = match result {
            Ok(()) => "event stream closed by controller".to_string(),
            Err(e) => e.to_string(),
        };
        core.on_error(&reason);

        let delay = server_retry.unwrap_or_else(|| backoff.delay(attempt));
        attempt = attempt.saturating_add(1);
        debug!("resubscribing to {url} in {} ms", delay.as_millis());

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }

    info!("log event stream stopped");
}

async fn stream_once(
    http: &reqwest::Client,
    url: &Url,
    core: &mut PushCore,
    parser: &mut SseParser,
) -> Result<()> {
    let resp = http
        .get(url.clone())
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?;

    let status = resp.status();
    if !status.is_success() {
        return Err(DashError::Http {
            code: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
        });
    }

    core.on_open();

    let mut body = resp.bytes_stream();
    while let Some(chunk) = body.next().await {
        for data in parser.feed(&chunk?) {
            core.on_message(data);
        }
    }
    Ok(())
}
