//! The seam between services and the network.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use orderdesk_core::config::ApiConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransportRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `Order/10248`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: Method::Get, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Post, path: path.into(), query: Vec::new(), body: Some(body) }
    }

    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self { method: Method::Put, path: path.into(), query: Vec::new(), body: Some(body) }
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self { method: Method::Delete, path: path.into(), query: Vec::new(), body: None }
    }

    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("response could not be decoded: {0}")]
    Decode(String),
    #[error("invalid transport configuration: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<Value, TransportError>;

    fn name(&self) -> &'static str;
}

/// reqwest-backed transport against the configured base URL.
pub struct HttpTransport {
    client: Client,
    base_url: String,
    bearer_token: Option<SecretString>,
    timeout: Duration,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("auth_enabled", &self.bearer_token.is_some())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("orderdesk/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| {
                TransportError::Configuration(format!("failed to create HTTP client: {error}"))
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            bearer_token: config.bearer_token.clone(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: TransportRequest) -> Result<Value, TransportError> {
        let url = self.url_for(&request.path);
        debug!(
            event_name = "transport.http.request",
            method = request.method.as_str(),
            url = %url,
            "sending request"
        );

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token.expose_secret());
        }

        let response = builder.send().await.map_err(|error| {
            if error.is_timeout() {
                TransportError::Timeout(error.to_string())
            } else {
                TransportError::Unavailable(error.to_string())
            }
        })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|error| TransportError::Decode(format!("failed to read body: {error}")))?;

        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }

        decode_body(&text)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Empty bodies (204 and friends) decode to `Value::Null`.
pub fn decode_body(text: &str) -> Result<Value, TransportError> {
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|error| TransportError::Decode(error.to_string()))
}

/// Prefers the backend's JSON `message` field over the bare status line.
pub fn error_message(status: StatusCode, body: &str) -> String {
    let server_message = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value.get("message").and_then(Value::as_str).map(str::trim).map(str::to_string)
    });

    match server_message.filter(|message| !message.is_empty()) {
        Some(message) => format!("Error: {message}"),
        None => format!(
            "Error Code: {}, Message: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown status")
        ),
    }
}

/// Fails every request, forcing the fallback path.
#[derive(Clone, Copy, Debug, Default)]
pub struct OfflineTransport;

#[async_trait]
impl Transport for OfflineTransport {
    async fn send(&self, request: TransportRequest) -> Result<Value, TransportError> {
        Err(TransportError::Unavailable(format!(
            "offline mode: {} {} not sent",
            request.method.as_str(),
            request.path
        )))
    }

    fn name(&self) -> &'static str {
        "offline"
    }
}
