use super::PushCore;
use crate::error::{DashError, Result};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};
use url::Url;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn open(url: &Url, deadline: Duration) -> Result<Socket> {
    let (socket, _response) = tokio::time::timeout(deadline, tokio_tungstenite::connect_async(url.as_str()))
        .await
        .map_err(|_| DashError::Timeout {
            timeout_ms: deadline.as_millis() as u64,
        })?
        .map_err(|e| DashError::WebSocket(e.to_string()))?;
    debug!("log socket open");
    Ok(socket)
}

enum Wake {
    Exit,
    Tick,
    Frame(Option<std::result::Result<Message, tungstenite::Error>>),
}

/// Client-driven keep-alive loop.
///
/// Every `keepalive` tick an open socket gets an empty probe frame and the
/// channel counts as connected; a closed socket marks the channel
/// disconnected and is reopened on that same tick.
pub(crate) async fn run(url: Url, mut core: PushCore, keepalive: Duration, cancel: CancellationToken) {
    let mut socket = tokio::select! {
        () = cancel.cancelled() => return,
        s = open(&url, keepalive) => s.map_err(|e| debug!("log socket not open yet: {e}")).ok(),
    };

    let mut ticker = tokio::time::interval(keepalive);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let wake = match socket.as_mut() {
            Some(ws) => tokio::select! {
                biased;
                () = cancel.cancelled() => Wake::Exit,
                frame = ws.next() => Wake::Frame(frame),
                _ = ticker.tick() => Wake::Tick,
            },
            None => tokio::select! {
                () = cancel.cancelled() => Wake::Exit,
                _ = ticker.tick() => Wake::Tick,
            },
        };

        match wake {
            Wake::Exit => break,
            Wake::Tick => {
                if let Some(ws) = socket.as_mut() {
                    trace!("log socket probe");
                    match ws.send(Message::text("")).await {
                        Ok(()) => core.on_open(),
                        Err(e) => {
                            debug!("log socket probe failed: {e}");
                            socket = None;
                        }
                    }
                }
                if socket.is_none() {
                    core.on_error("log socket closed");
                    socket = tokio::select! {
                        () = cancel.cancelled() => break,
                        s = open(&url, keepalive) => s.map_err(|e| debug!("log socket reopen failed: {e}")).ok(),
                    };
                }
            }
            Wake::Frame(Some(Ok(Message::Text(text)))) => core.on_message(text.as_str().to_string()),
            Wake::Frame(Some(Ok(Message::Binary(bytes)))) => {
                core.on_message(String::from_utf8_lossy(&bytes).into_owned());
            }
            Wake::Frame(Some(Ok(Message::Close(frame)))) => {
                debug!("log socket closed by controller: {frame:?}");
                socket = None;
            }
            Wake::Frame(Some(Ok(_))) => {}
            Wake::Frame(Some(Err(e))) => {
                debug!("log socket error: {e}");
                socket = None;
            }
            Wake::Frame(None) => {
                debug!("log socket stream ended");
                socket = None;
            }
        }
    }

    if let Some(mut ws) = socket {
        let _ = ws.close(None).await;
    }
    info!("log socket stopped");
}
