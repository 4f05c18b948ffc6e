//! The WordPress REST client.
//!
//! The [`Client`] type is the main entry point for making requests.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::assemble::assemble;
use crate::auth::{self, AuthorizationScheme, AuthorizationState};
use crate::config::{as_directory, ClientConfig, DEFAULT_ENDPOINT_PATH, DEFAULT_USER_AGENT};
use crate::descriptor::RequestDescriptor;
use crate::dispatch::Dispatcher;
use crate::models::{Category, Comment, Media, Page, Post, Tag, User};
use crate::resources::Resource;
use crate::transport::{ReqwestTransport, Transport, TransportError};
use crate::{Error, ResponseEnvelope, Result};
use http::header::USER_AGENT;
use http::{HeaderMap, HeaderName, HeaderValue};
use reqwest::cookie::Jar;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// A client for one WordPress site.
///
/// Cloning is cheap: clones share the transport, configuration and cookie
/// jar. The authorization state is a value: [`Client::negotiate`] returns a
/// new client rather than changing this one.
///
/// # Examples
///
/// ```no_run
/// use wpcall::{AuthorizationScheme, Client};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), wpcall::Error> {
/// let client = Client::builder()
///     .base_url("https://site.test")?
///     .timeout(Duration::from_secs(30))
///     .authorization(AuthorizationScheme::jwt("admin", "secret"))
///     .connect()
///     .await?;
///
/// let posts = client.posts().list(&[("per_page", "10")]).await?;
/// for post in posts.payload().into_iter().flatten() {
///     println!("{}: {}", post.id, post.title.rendered);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    dispatcher: Arc<Dispatcher>,
    scheme: AuthorizationScheme,
    authorization: Arc<AuthorizationState>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        self.dispatcher.config()
    }

    /// The default authorization scheme.
    pub fn authorization_scheme(&self) -> &AuthorizationScheme {
        &self.scheme
    }

    /// Where the default credential stands.
    ///
    /// After a failed best-effort login this is
    /// [`AuthorizationState::Failed`] with the reason.
    pub fn authorization_state(&self) -> &AuthorizationState {
        &self.authorization
    }

    /// Negotiates the default authorization scheme.
    ///
    /// Returns a client carrying the resulting state. When the current state
    /// already holds a valid credential, or the scheme needs no exchange, no
    /// request is sent. A failed exchange is logged and recorded as
    /// [`AuthorizationState::Failed`]; the returned client stays usable for
    /// calls that do not require authorization.
    pub async fn negotiate(&self) -> Client {
        let state = match auth::resolve(
            &self.scheme,
            &self.authorization,
            self.config().base_url(),
            self.dispatcher.transport(),
        )
        .await
        {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Authorization negotiation failed; continuing unauthenticated");
                AuthorizationState::Failed(e.to_string())
            }
        };

        Client {
            dispatcher: Arc::clone(&self.dispatcher),
            scheme: self.scheme.clone(),
            authorization: Arc::new(state),
        }
    }

    /// Executes one request and returns the raw envelope.
    ///
    /// # Errors
    ///
    /// Only errors raised before the transport is involved are returned:
    /// [`Error::Construction`] for a descriptor that cannot be assembled and
    /// [`Error::AuthorizationFailed`] when the descriptor requires a
    /// credential that is not available. Everything after that, including
    /// transport failures, is reported inside the envelope.
    ///
    /// ```no_run
    /// use wpcall::{Client, RequestDescriptor};
    ///
    /// # async fn example() -> Result<(), wpcall::Error> {
    /// let client = Client::builder().base_url("https://site.test")?.build()?;
    ///
    /// let descriptor = RequestDescriptor::builder()
    ///     .get("posts")
    ///     .query("per_page", "2")
    ///     .validator(|body| body.starts_with('['))
    ///     .on_success(|body| println!("got {} bytes", body.len()))
    ///     .build()?;
    ///
    /// let envelope = client.execute(&descriptor).await?;
    /// println!("success: {}", envelope.success());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope<String>> {
        let request = match descriptor.authorization() {
            Some(scheme) => {
                let start_time = Instant::now();
                let cancellation = descriptor.cancellation_token();
                let state = tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => None,
                    state = self.resolve_override(scheme) => Some(state),
                };
                let Some(state) = state else {
                    tracing::warn!(uri = descriptor.uri(), "Request cancelled during authorization");
                    return Ok(self.dispatcher.abort(
                        TransportError::Cancelled,
                        descriptor.hooks(),
                        start_time.elapsed(),
                    ));
                };
                assemble(
                    descriptor,
                    self.config().endpoint(),
                    &state,
                    self.config().default_headers(),
                )?
            }
            None => assemble(
                descriptor,
                self.config().endpoint(),
                &self.authorization,
                self.config().default_headers(),
            )?,
        };

        Ok(self
            .dispatcher
            .execute(request, descriptor.hooks(), descriptor.cancellation_token())
            .await)
    }

    /// Executes one request and decodes a successful payload into `T`.
    ///
    /// # Errors
    ///
    /// As [`Client::execute`], plus [`Error::Decode`] if the payload does not
    /// match `T`.
    pub async fn fetch<T>(&self, descriptor: &RequestDescriptor) -> Result<ResponseEnvelope<T>>
    where
        T: DeserializeOwned,
    {
        self.execute(descriptor).await?.decode()
    }

    /// Resolves a per-request scheme; the client default is not touched.
    async fn resolve_override(&self, scheme: &AuthorizationScheme) -> AuthorizationState {
        let initial = AuthorizationState::initial(scheme);
        match auth::resolve(
            scheme,
            &initial,
            self.config().base_url(),
            self.dispatcher.transport(),
        )
        .await
        {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(error = %e, "Per-request authorization failed");
                AuthorizationState::Failed(e.to_string())
            }
        }
    }

    /// Posts collection (`/posts`).
    pub fn posts(&self) -> Resource<'_, Post> {
        Resource::new(self, "posts")
    }

    /// Pages collection (`/pages`).
    pub fn pages(&self) -> Resource<'_, Page> {
        Resource::new(self, "pages")
    }

    /// Users collection (`/users`).
    pub fn users(&self) -> Resource<'_, User> {
        Resource::new(self, "users")
    }

    /// Categories collection (`/categories`).
    pub fn categories(&self) -> Resource<'_, Category> {
        Resource::new(self, "categories")
    }

    /// Tags collection (`/tags`).
    pub fn tags(&self) -> Resource<'_, Tag> {
        Resource::new(self, "tags")
    }

    /// Comments collection (`/comments`).
    pub fn comments(&self) -> Resource<'_, Comment> {
        Resource::new(self, "comments")
    }

    /// Media library (`/media`).
    pub fn media(&self) -> Resource<'_, Media> {
        Resource::new(self, "media")
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", self.config())
            .field("authorization", &self.authorization)
            .finish()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use wpcall::{AuthorizationScheme, ClientBuilder};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), wpcall::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://site.test")?
///     .endpoint_path("wp-json/wp/v2")
///     .timeout(Duration::from_secs(30))
///     .user_agent("my-app/1.0")
///     .default_header("Accept-Language", "en")?
///     .authorization(AuthorizationScheme::basic("admin", "abcd efgh ijkl mnop"))
///     .global_filter(|body| !body.contains("maintenance"))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    endpoint_path: String,
    default_headers: HeaderMap,
    user_agent: String,
    timeout: Option<Duration>,
    cookie_jar: Option<Arc<Jar>>,
    global_filter: Option<crate::hooks::ResponseFilter>,
    authorization: AuthorizationScheme,
    transport: Option<Arc<dyn Transport>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            default_headers: HeaderMap::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
            cookie_jar: None,
            global_filter: None,
            authorization: AuthorizationScheme::None,
            transport: None,
        }
    }

    /// Sets the site base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is empty or invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        let url = url.as_ref().trim();
        if url.is_empty() {
            return Err(Error::Configuration("Base URL must not be empty".to_string()));
        }
        self.base_url = Some(Url::parse(url)?);
        Ok(self)
    }

    /// Sets the REST namespace path under the base URL.
    ///
    /// Defaults to [`DEFAULT_ENDPOINT_PATH`].
    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// A later call with the same name replaces the earlier value.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::Configuration(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Shares an existing cookie jar instead of creating one per client.
    pub fn cookie_jar(mut self, jar: Arc<Jar>) -> Self {
        self.cookie_jar = Some(jar);
        self
    }

    /// Installs a predicate every 200 response body must pass.
    pub fn global_filter(mut self, filter: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.global_filter = Some(Arc::new(filter));
        self
    }

    /// Sets the default authorization scheme.
    pub fn authorization(mut self, scheme: AuthorizationScheme) -> Self {
        self.authorization = scheme;
        self
    }

    /// Uses a custom transport instead of the built-in `reqwest` one.
    ///
    /// The user agent is then sent as a default `User-Agent` header unless
    /// one was set explicitly. Timeout and cookie jar are up to the
    /// transport; [`ClientConfig::timeout`] only reports the configured value.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the configured `Client` without any network activity.
    ///
    /// A token-exchange scheme starts out
    /// [`Unresolved`](AuthorizationState::Unresolved); call
    /// [`Client::negotiate`] or use [`ClientBuilder::connect`].
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided, the endpoint path is
    /// empty, or the HTTP client cannot be built.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .map(as_directory)
            .ok_or_else(|| Error::Configuration("Base URL is required".to_string()))?;

        let endpoint_path = self.endpoint_path.trim().trim_matches('/');
        if endpoint_path.is_empty() {
            return Err(Error::Configuration("Endpoint path must not be empty".to_string()));
        }
        let endpoint = as_directory(base_url.join(endpoint_path)?);

        let cookie_jar = self.cookie_jar.unwrap_or_default();
        let mut default_headers = self.default_headers;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => {
                if !default_headers.contains_key(USER_AGENT) {
                    let value = HeaderValue::try_from(self.user_agent.as_str()).map_err(|e| {
                        Error::Configuration(format!("Invalid user agent: {}", e))
                    })?;
                    default_headers.insert(USER_AGENT, value);
                }
                transport
            }
            None => Arc::new(ReqwestTransport::new(
                self.timeout,
                &self.user_agent,
                Arc::clone(&cookie_jar),
            )?),
        };

        let config = ClientConfig {
            base_url,
            endpoint,
            default_headers,
            user_agent: self.user_agent,
            timeout: self.timeout,
            cookie_jar,
            global_filter: self.global_filter,
        };

        Ok(Client {
            dispatcher: Arc::new(Dispatcher::new(transport, config)),
            authorization: Arc::new(AuthorizationState::initial(&self.authorization)),
            scheme: self.authorization,
        })
    }

    /// Builds the client and negotiates its default authorization.
    ///
    /// A failed token exchange does not fail this call; see
    /// [`Client::negotiate`].
    ///
    /// # Errors
    ///
    /// Same as [`ClientBuilder::build`].
    pub async fn connect(self) -> Result<Client> {
        let client = self.build()?;
        Ok(client.negotiate().await)
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_requires_base_url() {
        let result = Client::builder().build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        assert!(matches!(Client::builder().base_url(""), Err(Error::Configuration(_))));
        assert!(matches!(Client::builder().base_url("not a url"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_empty_endpoint_path_rejected() {
        let result = Client::builder()
            .base_url("https://site.test")
            .unwrap()
            .endpoint_path("/")
            .build();
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_endpoint_under_base_path() {
        let client = Client::builder()
            .base_url("https://site.test/blog")
            .unwrap()
            .endpoint_path("/wp-json/wp/v2/")
            .build()
            .unwrap();
        assert_eq!(client.config().base_url().as_str(), "https://site.test/blog/");
        assert_eq!(
            client.config().endpoint().as_str(),
            "https://site.test/blog/wp-json/wp/v2/"
        );
    }

    #[test]
    fn test_default_header_later_wins() {
        let client = Client::builder()
            .base_url("https://site.test")
            .unwrap()
            .default_header("X-Env", "staging")
            .unwrap()
            .default_header("X-Env", "production")
            .unwrap()
            .build()
            .unwrap();
        let values: Vec<_> = client
            .config()
            .default_headers()
            .get_all("x-env")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["production"]);
    }

    #[test]
    fn test_initial_authorization_state() {
        let client = Client::builder()
            .base_url("https://site.test")
            .unwrap()
            .authorization(AuthorizationScheme::jwt("admin", "secret"))
            .build()
            .unwrap();
        assert_eq!(*client.authorization_state(), AuthorizationState::Unresolved);

        let client = Client::builder()
            .base_url("https://site.test")
            .unwrap()
            .authorization(AuthorizationScheme::bearer("abc"))
            .build()
            .unwrap();
        assert!(client.authorization_state().is_resolved());
    }

    #[test]
    fn test_shared_cookie_jar() {
        let jar = Arc::new(Jar::default());
        let a = Client::builder()
            .base_url("https://site.test")
            .unwrap()
            .cookie_jar(jar.clone())
            .build()
            .unwrap();
        let b = Client::builder()
            .base_url("https://other.test")
            .unwrap()
            .cookie_jar(jar.clone())
            .build()
            .unwrap();
        assert!(Arc::ptr_eq(a.config().cookie_jar(), b.config().cookie_jar()));
    }

    struct NoopTransport;

    #[async_trait::async_trait]
    impl Transport for NoopTransport {
        async fn execute(
            &self,
            _request: crate::transport::TransportRequest,
        ) -> std::result::Result<crate::transport::TransportResponse, TransportError> {
            Err(TransportError::Other("unused".to_string()))
        }
    }

    #[test]
    fn test_custom_transport_sends_user_agent_header() {
        let client = Client::builder()
            .base_url("https://site.test")
            .unwrap()
            .user_agent("my-app/2.0")
            .transport(Arc::new(NoopTransport))
            .build()
            .unwrap();
        assert_eq!(
            client.config().default_headers().get(USER_AGENT).unwrap(),
            "my-app/2.0"
        );

        let client = Client::builder()
            .base_url("https://site.test")
            .unwrap()
            .default_header("User-Agent", "explicit/1.0")
            .unwrap()
            .transport(Arc::new(NoopTransport))
            .build()
            .unwrap();
        let values: Vec<_> = client
            .config()
            .default_headers()
            .get_all(USER_AGENT)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["explicit/1.0"]);
    }

    #[test]
    fn test_builtin_transport_leaves_default_headers_alone() {
        let client = Client::builder()
            .base_url("https://site.test")
            .unwrap()
            .build()
            .unwrap();
        assert!(client.config().default_headers().get(USER_AGENT).is_none());
    }
}
