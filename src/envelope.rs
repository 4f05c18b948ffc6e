//! The uniform result of every dispatch.
//!
//! A [`ResponseEnvelope`] is produced for every call that got as far as the
//! transport, whether the server answered 200, answered with an error status,
//! was rejected by a hook, or never answered at all. It carries the timing and
//! diagnostics in every case.

use crate::hooks::{GLOBAL_FILTER_REJECTION, VALIDATOR_REJECTION};
use crate::{Error, Result};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Message recorded when the transport or a hook failed unexpectedly.
pub const UNHANDLED_ERROR_MESSAGE: &str = "Exception occurred.";

/// The single result type of a dispatch.
///
/// A successful envelope always has a payload and no error message; a failed
/// envelope never has a payload.
///
/// # Examples
///
/// ```no_run
/// use wpcall::{Client, RequestDescriptor};
///
/// # async fn example() -> Result<(), wpcall::Error> {
/// let client = Client::builder()
///     .base_url("https://site.test")?
///     .build()?;
///
/// let descriptor = RequestDescriptor::builder().get("posts").build()?;
/// let envelope = client.execute(&descriptor).await?;
///
/// if envelope.success() {
///     println!("{} bytes in {:?}", envelope.payload().map_or(0, |p| p.len()), envelope.elapsed());
/// } else {
///     eprintln!("{:?}: {:?}", envelope.status(), envelope.error_message());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResponseEnvelope<T> {
    payload: Option<T>,
    success: bool,
    status: Option<StatusCode>,
    headers: Vec<(String, String)>,
    elapsed: Duration,
    error_message: Option<String>,
    captured_error: Option<Error>,
}

impl<T> ResponseEnvelope<T> {
    pub(crate) fn succeeded(
        payload: T,
        status: StatusCode,
        headers: Vec<(String, String)>,
        elapsed: Duration,
    ) -> Self {
        Self {
            payload: Some(payload),
            success: true,
            status: Some(status),
            headers,
            elapsed,
            error_message: None,
            captured_error: None,
        }
    }

    pub(crate) fn failed(
        status: Option<StatusCode>,
        headers: Vec<(String, String)>,
        elapsed: Duration,
        error_message: impl Into<String>,
        captured_error: Option<Error>,
    ) -> Self {
        Self {
            payload: None,
            success: false,
            status,
            headers,
            elapsed,
            error_message: Some(error_message.into()),
            captured_error,
        }
    }

    /// The payload of a successful call.
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Consumes the envelope and returns the payload.
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    /// Whether the call succeeded.
    pub fn success(&self) -> bool {
        self.success
    }

    /// The HTTP status, or `400` for calls that failed before a response.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// Response headers in wire order; names are lowercase.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// The first value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Time spent on the transport round-trip.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Why the call failed.
    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// The error behind an unhandled failure, if any.
    pub fn captured_error(&self) -> Option<&Error> {
        self.captured_error.as_ref()
    }

    /// Returns `true` if a filter or validator declined the response.
    pub fn is_hook_rejection(&self) -> bool {
        matches!(
            self.error_message.as_deref(),
            Some(GLOBAL_FILTER_REJECTION) | Some(VALIDATOR_REJECTION)
        )
    }

    /// Maps the payload, keeping every other field.
    pub fn map<U, F>(self, f: F) -> ResponseEnvelope<U>
    where
        F: FnOnce(T) -> U,
    {
        ResponseEnvelope {
            payload: self.payload.map(f),
            success: self.success,
            status: self.status,
            headers: self.headers,
            elapsed: self.elapsed,
            error_message: self.error_message,
            captured_error: self.captured_error,
        }
    }

    /// Maps the payload with a fallible function, keeping every other field.
    pub fn try_map<U, E, F>(self, f: F) -> std::result::Result<ResponseEnvelope<U>, E>
    where
        F: FnOnce(T) -> std::result::Result<U, E>,
    {
        let payload = self.payload.map(f).transpose()?;
        Ok(ResponseEnvelope {
            payload,
            success: self.success,
            status: self.status,
            headers: self.headers,
            elapsed: self.elapsed,
            error_message: self.error_message,
            captured_error: self.captured_error,
        })
    }
}

impl ResponseEnvelope<String> {
    /// Decodes a raw JSON payload into `T`.
    ///
    /// Failed envelopes pass through with their diagnostics intact.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] if the payload is not valid JSON for `T`.
    ///
    /// ```
    /// # use wpcall::ResponseEnvelope;
    /// # fn check(envelope: ResponseEnvelope<String>) -> Result<(), wpcall::Error> {
    /// let ids = envelope.decode::<Vec<u64>>()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn decode<T>(self) -> Result<ResponseEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        self.try_map(|raw| {
            serde_json::from_str::<T>(&raw).map_err(|e| {
                tracing::error!(
                    error = %e,
                    raw_response = %raw,
                    "Failed to decode response"
                );
                Error::Decode {
                    serde_error: e.to_string(),
                    raw_response: raw,
                }
            })
        })
    }
}

/// Flattens a header map into `(name, value)` pairs, keeping repeated names.
pub(crate) fn normalize_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
