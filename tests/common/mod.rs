#![allow(dead_code, clippy::unwrap_used)]

use domelink::config::schema::AppConfig;
use domelink::event::DashEvent;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::broadcast;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockBuilder};

pub const WAIT: Duration = Duration::from_secs(5);

/// Config pointing at `url` with fast timings; `extra` is appended verbatim.
pub fn config(url: &str, kind: &str, extra: &str) -> AppConfig {
    domelink::config::parse(&format!(
        r#"
[controller]
url = "{url}"
kind = "{kind}"
request_timeout_ms = 500
poll_interval_ms = 50
settle_delay_ms = 100
{extra}
"#
    ))
    .unwrap()
}

/// `GET /api?json=<body>` for the given request body.
pub fn api(body: &str) -> MockBuilder {
    Mock::given(method("GET"))
        .and(path("/api"))
        .and(query_param("json", body))
}

pub fn envelope(rsp: Value) -> Value {
    json!({ "rsp": rsp })
}

pub fn shutter_rsp(shutter_status: i64, security_procedures: i64) -> Value {
    json!({
        "firmware-version": "1.4.2",
        "uptime": "1 days, 0 hours, 5 minutes",
        "shutter-status": shutter_status,
        "movement-status": false,
        "lock-movement": false,
        "network-status": true,
        "alert": {
            "hardware": { "status": false, "description": "" },
            "network": { "status": false, "security-procedures": security_procedures }
        },
        "relay": { "list": [false, false, false, false], "opening-motor": false, "closing-motor": false },
        "optoin": { "list": [true, false, true, false], "auto": true, "opened-sensor": true, "closed-sensor": false },
        "wifi": { "hostname": "shutter-controller", "mac-address": "AA:BB:CC:33:44:55" }
    })
}

pub fn dome_rsp(azimuth: i64) -> Value {
    json!({
        "firmware-version": "2.1.0",
        "uptime": "0 days, 3 hours, 12 minutes",
        "dome-azimuth": azimuth,
        "target-azimuth": azimuth,
        "movement-status": false,
        "in-park": true,
        "finding-park": false,
        "finding-zero": false,
        "relay": { "cw-motor": false, "ccw-motor": false, "switchboard": true },
        "optoin": {
            "auto": true,
            "switchboard-status": true,
            "auto-ignition": false,
            "ac-presence": true,
            "manual-cw-button": false,
            "manual-ccw-button": false,
            "manual-ignition": false
        },
        "wifi": { "hostname": "dome-controller", "mac-address": "AA:BB:CC:00:11:22" }
    })
}

/// Wait for the first event matching `pred`, failing the test after `WAIT`.
pub async fn next_matching<F>(rx: &mut broadcast::Receiver<DashEvent>, mut pred: F) -> DashEvent
where
    F: FnMut(&DashEvent) -> bool,
{
    tokio::time::timeout(WAIT, async {
        loop {
            match rx.recv().await {
                Ok(event) if pred(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Every event currently queued.
pub fn drain(rx: &mut broadcast::Receiver<DashEvent>) -> Vec<DashEvent> {
    let mut out = Vec::new();
    while let Ok(event) = rx.try_recv() {
        out.push(event);
    }
    out
}

/// Poll `check` until it holds, failing the test after `WAIT`.
pub async fn eventually<F>(mut check: F)
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(WAIT, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
