//! The HTTP transport seam.
//!
//! The dispatcher only needs "execute one request, give me the status,
//! headers and body back". [`Transport`] is that capability; the default
//! implementation, [`ReqwestTransport`], wraps a pooled `reqwest::Client`
//! together with its timeout, user agent and cookie jar.

use async_trait::async_trait;
use http::{HeaderMap, Method, StatusCode};
use reqwest::cookie::Jar;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Failures below the HTTP protocol layer.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    /// Connection, DNS, TLS or body read failure.
    #[error("Network error: {0}")]
    Network(reqwest::Error),

    /// The request took longer than the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The request's cancellation token fired before the response arrived.
    #[error("Request cancelled")]
    Cancelled,

    /// Any other transport-specific failure.
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(error)
        }
    }
}

/// Encoded request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransportBody {
    /// No body.
    #[default]
    Empty,
    /// `application/x-www-form-urlencoded` fields, in order.
    Form(Vec<(String, String)>),
    /// Raw bytes sent as-is.
    Binary(Vec<u8>),
}

/// A fully assembled, transport-ready request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// The HTTP method.
    pub method: Method,
    /// The final URL, query string included.
    pub url: Url,
    /// Merged header set (defaults, authorization, per-request).
    pub headers: HeaderMap,
    /// The encoded body.
    pub body: TransportBody,
}

/// Raw outcome of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The reason phrase for `status`.
    pub status_message: String,
    /// Response headers; a name may carry several values.
    pub headers: HeaderMap,
    /// The response body as text.
    pub data: String,
}

impl TransportResponse {
    /// Creates a response, deriving the status message from the code.
    pub fn new(status: StatusCode, headers: HeaderMap, data: impl Into<String>) -> Self {
        Self {
            status,
            status_message: status.canonical_reason().unwrap_or_default().to_string(),
            headers,
            data: data.into(),
        }
    }
}

/// Executes one HTTP request.
///
/// Implementations must be safe to call concurrently; the dispatcher shares
/// one transport across every request a client issues.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends `request` and returns the raw response, or a transport error for
    /// network, timeout or cancellation failures. Non-2xx statuses are
    /// responses, not errors.
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::Client,
    cookie_jar: Arc<Jar>,
}

impl ReqwestTransport {
    /// Builds a transport using `cookie_jar` for all requests.
    ///
    /// The jar is shared, not copied: other transports built from the same
    /// `Arc` see the same cookies.
    pub fn new(
        timeout: Option<Duration>,
        user_agent: &str,
        cookie_jar: Arc<Jar>,
    ) -> crate::Result<Self> {
        let mut builder = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_provider(Arc::clone(&cookie_jar));

        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            crate::Error::Configuration(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self {
            http_client,
            cookie_jar,
        })
    }

    /// The cookie jar shared by every request sent through this transport.
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.cookie_jar
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: TransportRequest,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers);

        builder = match request.body {
            TransportBody::Empty => builder,
            TransportBody::Form(fields) => builder.form(&fields),
            TransportBody::Binary(bytes) => builder.body(bytes),
        };

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let data = response.text().await?;

        Ok(TransportResponse::new(status, headers, data))
    }
}
