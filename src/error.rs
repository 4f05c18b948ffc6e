//! Error types for WordPress REST calls.
//!
//! Only programming-time problems (bad configuration, malformed descriptors,
//! missing credentials) and post-dispatch decode failures surface as [`Error`]
//! values returned from client methods. Everything that happens at or below
//! the transport boundary is folded into a
//! [`ResponseEnvelope`](crate::ResponseEnvelope) instead, with the original
//! error kept in its `captured_error` slot.

use crate::transport::TransportError;

/// The main error type for the crate.
///
/// # Examples
///
/// ```no_run
/// use wpcall::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("https://site.test")?
///     .build()?;
///
/// match client.posts().list(&[]).await {
///     Ok(envelope) if envelope.success() => {
///         println!("{} posts", envelope.payload().map(Vec::len).unwrap_or(0));
///     }
///     Ok(envelope) => eprintln!("call failed: {:?}", envelope.error_message()),
///     Err(Error::Decode { raw_response, serde_error }) => {
///         eprintln!("unexpected body {}: {}", raw_response, serde_error);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request descriptor was missing required parts or could not be
    /// turned into a transport request. Raised before any network activity.
    #[error("Invalid request: {0}")]
    Construction(String),

    /// The request required authorization but no valid credential could be
    /// resolved or attached.
    #[error("Authorization failed: {0}")]
    AuthorizationFailed(String),

    /// The transport failed (network, timeout, cancellation).
    ///
    /// Dispatch never returns this variant directly; it only appears inside a
    /// failed envelope's `captured_error` and in the error callback.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A successful response body could not be decoded into the domain type.
    ///
    /// # Fields
    ///
    /// * `raw_response` - The raw response body as a string
    /// * `serde_error` - The error message from serde
    #[error("Failed to decode response: {serde_error}")]
    Decode {
        /// The raw response body that failed to decode
        raw_response: String,
        /// The serde error message
        serde_error: String,
    },

    /// A user-supplied hook panicked while a response was being processed.
    #[error("Hook panicked: {0}")]
    HookPanicked(String),

    /// Invalid client configuration (missing base URL, bad header, ...).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl Error {
    /// Returns `true` if the error originated in the transport layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Returns `true` for errors raised before any request was sent.
    ///
    /// ```
    /// use wpcall::Error;
    ///
    /// assert!(Error::Construction("missing uri".into()).is_construction());
    /// assert!(Error::AuthorizationFailed("no token".into()).is_construction());
    /// assert!(!Error::HookPanicked("boom".into()).is_construction());
    /// ```
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Error::Construction(_)
                | Error::AuthorizationFailed(_)
                | Error::Configuration(_)
                | Error::InvalidUrl(_)
        )
    }

    /// Returns the raw response body for decode failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::Decode { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
