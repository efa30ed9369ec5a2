//! Network seam for probes.
//!
//! `HttpTransport` is the real implementation; tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use futures::SinkExt;
use reqwest::Client;
use serde_json::Value;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::error::{ApicheckError, ProbeError, Result};

/// Upper bound on the close handshake once the setup frame is sent
const CLOSE_GRACE: Duration = Duration::from_secs(2);

/// A fully resolved HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub bearer: Option<String>,
    pub body: Value,
    pub timeout: Duration,
}

/// Status and raw body of an HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// A fully resolved socket handshake
#[derive(Debug, Clone)]
pub struct SocketRequest {
    pub url: String,
    pub frame: String,
    pub timeout: Duration,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body; any status is a reply, only I/O problems are errors
    async fn post_json(&self, request: HttpRequest) -> std::result::Result<HttpReply, ProbeError>;

    /// Connect, send one text frame, close
    async fn send_setup(&self, request: SocketRequest) -> std::result::Result<(), ProbeError>;
}

/// reqwest for REST, tokio-tungstenite for the socket
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApicheckError::Client(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

// URLs carry the API key, so reqwest errors are stripped of them before display
fn transport_error(e: reqwest::Error) -> ProbeError {
    let kind = if e.is_timeout() {
        "timed out"
    } else if e.is_connect() {
        "connection failed"
    } else if e.is_decode() || e.is_body() {
        "unreadable response body"
    } else {
        "request failed"
    };
    ProbeError::Transport(format!("{}: {}", kind, e.without_url()))
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, request: HttpRequest) -> std::result::Result<HttpReply, ProbeError> {
        let mut builder = self
            .client
            .post(&request.url)
            .timeout(request.timeout)
            .header("content-type", "application/json")
            .json(&request.body);

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;

        log::debug!("HTTP {} ({} bytes)", status, body.len());
        Ok(HttpReply { status, body })
    }

    async fn send_setup(&self, request: SocketRequest) -> std::result::Result<(), ProbeError> {
        let exchange = async {
            let (mut ws, _response) = connect_async(request.url.as_str())
                .await
                .map_err(|e| ProbeError::Transport(format!("WebSocket connection failed: {}", e)))?;

            ws.send(Message::text(request.frame))
                .await
                .map_err(|e| ProbeError::Transport(format!("WebSocket send failed: {}", e)))?;
            Ok::<_, ProbeError>(ws)
        };

        let mut ws = match tokio::time::timeout(request.timeout, exchange).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ProbeError::Transport(format!(
                    "WebSocket timed out after {}ms",
                    request.timeout.as_millis()
                )));
            }
        };

        // The setup frame is out; closing is best effort
        match tokio::time::timeout(request.timeout.min(CLOSE_GRACE), ws.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => log::debug!("WebSocket close after setup: {}", e),
            Err(_) => log::debug!("WebSocket close after setup timed out"),
        }
        Ok(())
    }
}
