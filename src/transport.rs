use crate::error::{DashError, Result};
use crate::model::command::SUCCESS_SENTINEL;
use crate::model::{Command, CommandRequest, DeviceKind, DeviceState};
use serde::Deserialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};
use url::Url;

/// Default deadline for every request/response exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(3500);

/// `{"rsp": <any>}`, the envelope every `/api` reply is wrapped in.
#[derive(Deserialize)]
struct Envelope {
    rsp: Option<serde_json::Value>,
}

/// Stateless client for the controller's `/api?json=` endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// # Errors
    /// Returns `DashError::Connection` if the HTTP client cannot be built.
    pub fn new(base_url: Url) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("domelink/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(http, base_url))
    }

    pub fn with_client(http: reqwest::Client, mut base_url: Url) -> Self {
        // Without a trailing slash `join` would replace the last segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path (e.g. `log_sse`) against the controller root.
    ///
    /// # Errors
    /// Returns `DashError::Config` if the joined URL is invalid.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| DashError::Config(format!("invalid endpoint '{path}': {e}")))
    }

    /// Build `/api?json=<urlencoded request>`.
    pub fn api_url(&self, request: &CommandRequest) -> Result<Url> {
        let mut url = self.endpoint("api")?;
        url.query_pairs_mut()
            .clear()
            .append_pair("json", &request.to_json()?);
        Ok(url)
    }

    /// Perform one exchange and return the `rsp` field.
    ///
    /// # Errors
    /// `Timeout` if no complete reply arrives within `timeout`, `Http` on a
    /// non-success status, `Connection` if the exchange itself fails, and
    /// `Protocol` if the body is not an envelope carrying `rsp`.
    pub async fn request(
        &self,
        request: &CommandRequest,
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        self.request_cancellable(request, timeout, &CancellationToken::new())
            .await
    }

    /// Like [`request`](Self::request), but also abandoned when `cancel` fires.
    ///
    /// Whichever comes first wins: reply, deadline or cancellation. Dropping
    /// the in-flight exchange stops processing of the reply; the controller
    /// may still act on a request it already received.
    pub async fn request_cancellable(
        &self,
        request: &CommandRequest,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<serde_json::Value> {
        if timeout.is_zero() {
            return Err(DashError::Validation(
                "request timeout must be positive".to_string(),
            ));
        }

        let url = self.api_url(request)?;
        trace!("GET {url}");

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(DashError::Cancelled),
            () = tokio::time::sleep(timeout) => {
                debug!("'{}' timed out after {} ms", request.cmd(), timeout.as_millis());
                Err(DashError::Timeout { timeout_ms: timeout.as_millis() as u64 })
            }
            result = self.exchange(url) => result,
        }
    }

    async fn exchange(&self, url: Url) -> Result<serde_json::Value> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();

        if !status.is_success() {
            return Err(DashError::Http {
                code: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = resp.bytes().await?;
        let envelope: Envelope = serde_json::from_slice(&body)
            .map_err(|e| DashError::Protocol(format!("malformed envelope: {e}")))?;
        envelope
            .rsp
            .ok_or_else(|| DashError::Protocol("reply has no 'rsp' field".to_string()))
    }

    /// Fetch and parse the device status.
    pub async fn status(&self, kind: DeviceKind, timeout: Duration) -> Result<DeviceState> {
        let rsp = self.request(&CommandRequest::status(), timeout).await?;
        DeviceState::from_rsp(kind, rsp)
    }

    /// Send an actuation command and require the success sentinel back.
    ///
    /// # Errors
    /// Everything [`request`](Self::request) returns, plus
    /// `CommandRejected` when `rsp` is anything other than `"done"`.
    pub async fn command(&self, request: &CommandRequest, timeout: Duration) -> Result<()> {
        let rsp = self.request(request, timeout).await?;
        if rsp.as_str() == Some(SUCCESS_SENTINEL) {
            debug!("'{}' → done", request.cmd());
            return Ok(());
        }

        let reply = match rsp {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        warn!("'{}' rejected: {reply}", request.cmd());
        Err(DashError::CommandRejected {
            command: request.cmd().to_string(),
            reply,
        })
    }

    /// Ask whether the controller logs every `status` request.
    pub async fn server_logging(&self, timeout: Duration) -> Result<bool> {
        let rsp = self
            .request(&CommandRequest::new(&Command::ServerLoggingStatus), timeout)
            .await?;
        rsp.as_bool().ok_or_else(|| {
            DashError::Protocol(format!("server-logging-status replied {rsp}"))
        })
    }
}
