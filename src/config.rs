//! Immutable client configuration.

use crate::hooks::ResponseFilter;
use http::HeaderMap;
use reqwest::cookie::Jar;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// REST namespace used when no endpoint path is configured.
pub const DEFAULT_ENDPOINT_PATH: &str = "wp-json/wp/v2";

/// User agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = concat!("wpcall/", env!("CARGO_PKG_VERSION"));

/// Settings shared by every request a client issues.
///
/// Built once by [`ClientBuilder`](crate::ClientBuilder) and never mutated
/// afterwards; only the cookie jar behind it changes over time.
#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) base_url: Url,
    pub(crate) endpoint: Url,
    pub(crate) default_headers: HeaderMap,
    pub(crate) user_agent: String,
    pub(crate) timeout: Option<Duration>,
    pub(crate) cookie_jar: Arc<Jar>,
    pub(crate) global_filter: Option<ResponseFilter>,
}

impl ClientConfig {
    /// The site root, always ending in `/`.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The REST namespace root requests are resolved against, ending in `/`.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Headers applied to every request before per-request headers.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// The user agent string, sent by the built-in transport or as a default
    /// header with a custom one.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// The per-request timeout.
    ///
    /// Enforced by the built-in transport only; with a custom transport this
    /// is the configured value and nothing applies it.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The cookie jar shared by all requests from this client.
    pub fn cookie_jar(&self) -> &Arc<Jar> {
        &self.cookie_jar
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("endpoint", &self.endpoint.as_str())
            .field("default_headers", &self.default_headers)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("global_filter", &self.global_filter.is_some())
            .finish_non_exhaustive()
    }
}

/// Returns `url` with a trailing `/` so relative joins append to its path.
pub(crate) fn as_directory(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
