//! Executes transport requests and normalizes every outcome into an envelope.

use crate::config::ClientConfig;
use crate::envelope::{normalize_headers, ResponseEnvelope, UNHANDLED_ERROR_MESSAGE};
use crate::hooks::{HookChain, HookOutcome, RequestHooks};
use crate::transport::{Transport, TransportError, TransportRequest};
use crate::Error;
use http::StatusCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Owns the transport and the client configuration.
pub(crate) struct Dispatcher {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl Dispatcher {
    pub(crate) fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub(crate) fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub(crate) fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Folds a transport failure into an unsuccessful envelope and notifies
    /// the request's error callback.
    pub(crate) fn abort(
        &self,
        error: TransportError,
        hooks: &RequestHooks,
        latency: Duration,
    ) -> ResponseEnvelope<String> {
        let error = Error::Transport(error);
        HookChain::new(self.config.global_filter.as_ref(), hooks).notify_error(&error);
        ResponseEnvelope::failed(
            Some(StatusCode::BAD_REQUEST),
            Vec::new(),
            latency,
            UNHANDLED_ERROR_MESSAGE,
            Some(error),
        )
    }

    /// Sends `request` once and folds the outcome into an envelope.
    ///
    /// Never fails: transport errors, error statuses, hook rejections and
    /// panicking hooks all come back as an unsuccessful envelope.
    pub(crate) async fn execute(
        &self,
        request: TransportRequest,
        hooks: &RequestHooks,
        cancellation: &CancellationToken,
    ) -> ResponseEnvelope<String> {
        let chain = HookChain::new(self.config.global_filter.as_ref(), hooks);
        let method = request.method.clone();
        let url = request.url.clone();

        tracing::debug!(method = %method, url = %url, "Executing HTTP request");

        let start_time = Instant::now();
        let outcome = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Err(TransportError::Cancelled),
            result = self.transport.execute(request) => result,
        };
        let latency = start_time.elapsed();

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    method = %method,
                    url = %url,
                    latency_ms = latency.as_millis(),
                    "Request failed"
                );
                return self.abort(e, hooks, latency);
            }
        };

        let status = response.status;
        let headers = normalize_headers(&response.headers);

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            "Received HTTP response"
        );

        if status != StatusCode::OK {
            tracing::warn!(
                status = status.as_u16(),
                method = %method,
                url = %url,
                response = %response.data,
                "Unsuccessful status"
            );
            let message = if response.status_message.is_empty() {
                status.to_string()
            } else {
                response.status_message
            };
            return ResponseEnvelope::failed(Some(status), headers, latency, message, None);
        }

        match chain.evaluate(&response.data) {
            HookOutcome::Accepted => {
                ResponseEnvelope::succeeded(response.data, status, headers, latency)
            }
            HookOutcome::Rejected(message) => {
                tracing::warn!(method = %method, url = %url, reason = message, "Response rejected");
                ResponseEnvelope::failed(Some(status), headers, latency, message, None)
            }
            HookOutcome::Panicked(error) => {
                tracing::warn!(error = %error, method = %method, url = %url, "Hook panicked");
                chain.notify_error(&error);
                ResponseEnvelope::failed(
                    Some(StatusCode::BAD_REQUEST),
                    headers,
                    latency,
                    UNHANDLED_ERROR_MESSAGE,
                    Some(error),
                )
            }
        }
    }
}
