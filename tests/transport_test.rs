#![allow(clippy::unwrap_used)]
// Integration tests for `ApiClient` using wiremock.

mod common;

use common::{api, envelope, shutter_rsp};
use domelink::error::DashError;
use domelink::model::{Command, CommandRequest, DeviceKind, DeviceState, ShutterPosition};
use domelink::transport::ApiClient;
use serde_json::json;
use std::time::Duration;
use url::Url;
use wiremock::{MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_millis(500);

async fn setup() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_client(reqwest::Client::new(), Url::parse(&server.uri()).unwrap());
    (server, client)
}

// ── Status ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_parses_shutter() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"status"}"#)
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(shutter_rsp(2, 0))))
        .expect(1)
        .mount(&server)
        .await;

    let state = client.status(DeviceKind::Shutter, TIMEOUT).await.unwrap();
    match state {
        DeviceState::Shutter(s) => {
            assert_eq!(s.position, ShutterPosition::Opening);
            assert_eq!(s.info.hostname, "shutter-controller");
        }
        DeviceState::Dome(_) => panic!("expected shutter state"),
    }
}

#[tokio::test]
async fn test_slow_reply_times_out() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"status"}"#)
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(shutter_rsp(1, 0)))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let result = client
        .status(DeviceKind::Shutter, Duration::from_millis(50))
        .await;
    assert!(
        matches!(result, Err(DashError::Timeout { timeout_ms: 50 })),
        "expected Timeout, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_error_carries_code() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"status"}"#)
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client.status(DeviceKind::Dome, TIMEOUT).await.unwrap_err();
    assert!(matches!(err, DashError::Http { code: 500, .. }), "got: {err:?}");
    assert_eq!(err.to_string(), "HTTP 500, Internal Server Error");
}

#[tokio::test]
async fn test_missing_rsp_is_protocol_error() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"status"}"#)
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;

    let err = client.status(DeviceKind::Dome, TIMEOUT).await.unwrap_err();
    assert!(err.is_protocol(), "got: {err:?}");
}

#[tokio::test]
async fn test_non_json_body_is_protocol_error() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"status"}"#)
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let err = client.status(DeviceKind::Shutter, TIMEOUT).await.unwrap_err();
    assert!(err.is_protocol(), "got: {err:?}");
}

#[tokio::test]
async fn test_unknown_shutter_status_is_rejected() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"status"}"#)
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(shutter_rsp(9, 0))))
        .mount(&server)
        .await;

    let err = client.status(DeviceKind::Shutter, TIMEOUT).await.unwrap_err();
    assert!(
        matches!(
            err,
            DashError::UnknownEnumerator {
                field: "shutter-status",
                value: 9
            }
        ),
        "got: {err:?}"
    );
}

// ── Commands ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_command_done() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"slew-to-az","az-target":"120"}"#)
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!("done"))))
        .expect(1)
        .mount(&server)
        .await;

    let params = [("az-target".to_string(), "120".to_string())].into();
    client
        .command(&CommandRequest::with_params(&Command::SlewToAz, params), TIMEOUT)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_command_rejected_keeps_reply() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"park"}"#)
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(json!("Error: mutex acquired"))),
        )
        .mount(&server)
        .await;

    let err = client
        .command(&CommandRequest::new(&Command::Park), TIMEOUT)
        .await
        .unwrap_err();
    match err {
        DashError::CommandRejected { command, reply } => {
            assert_eq!(command, "park");
            assert_eq!(reply, "Error: mutex acquired");
        }
        other => panic!("expected CommandRejected, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_logging_status() {
    let (server, client) = setup().await;

    api(r#"{"cmd":"server-logging-status"}"#)
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!(true))))
        .mount(&server)
        .await;

    assert!(client.server_logging(TIMEOUT).await.unwrap());
}

#[tokio::test]
async fn test_unreachable_controller_is_transport_error() {
    // Nothing listens on the discard port.
    let client = ApiClient::new(Url::parse("http://127.0.0.1:9").unwrap()).unwrap();
    let err = client
        .status(DeviceKind::Dome, Duration::from_secs(2))
        .await
        .unwrap_err();
    assert!(err.is_transport(), "got: {err:?}");
}
