//! Authorization schemes and negotiation.
//!
//! A client starts with an [`AuthorizationScheme`]. Static schemes resolve
//! immediately; a token exchange needs one round-trip to the credential
//! endpoint before it can be attached. The outcome is kept as an explicit
//! [`AuthorizationState`] so requests that need a credential can check it
//! instead of guessing from the header set.

use crate::transport::{Transport, TransportBody, TransportRequest};
use crate::{Error, Result};
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use url::Url;

/// Path of the JWT token endpoint, relative to the site base URL.
pub const DEFAULT_TOKEN_PATH: &str = "wp-json/jwt-auth/v1/token";

/// How requests are credentialed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthorizationScheme {
    /// No credential.
    #[default]
    None,
    /// A fixed `Authorization: <scheme> <token>` header.
    Static {
        /// Scheme name, e.g. `Bearer` or `Basic`.
        scheme: String,
        /// The credential sent after the scheme name.
        token: String,
    },
    /// Trade credentials for a bearer token before the first call.
    TokenExchange(TokenExchange),
}

impl AuthorizationScheme {
    /// `Authorization: Bearer <token>`.
    pub fn bearer(token: impl Into<String>) -> Self {
        AuthorizationScheme::Static {
            scheme: "Bearer".to_string(),
            token: token.into(),
        }
    }

    /// HTTP Basic, e.g. a WordPress application password.
    pub fn basic(username: &str, password: &str) -> Self {
        AuthorizationScheme::Static {
            scheme: "Basic".to_string(),
            token: STANDARD.encode(format!("{}:{}", username, password)),
        }
    }

    /// JWT token exchange against [`DEFAULT_TOKEN_PATH`].
    pub fn jwt(username: impl Into<String>, password: impl Into<String>) -> Self {
        AuthorizationScheme::TokenExchange(TokenExchange::jwt(Credentials::new(username, password)))
    }
}

/// Token formats the exchange flow understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeKind {
    /// JSON Web Token, sent back as `Bearer`.
    Jwt,
}

impl ExchangeKind {
    fn scheme_name(self) -> &'static str {
        match self {
            ExchangeKind::Jwt => "Bearer",
        }
    }
}

/// Configuration for a token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenExchange {
    /// Kind of token returned.
    pub kind: ExchangeKind,
    /// Credentials sent as form fields.
    pub credentials: Credentials,
    /// Credential endpoint path, relative to the site base URL.
    pub path: String,
}

impl TokenExchange {
    /// JWT exchange against the default token endpoint.
    pub fn jwt(credentials: Credentials) -> Self {
        Self {
            kind: ExchangeKind::Jwt,
            credentials,
            path: DEFAULT_TOKEN_PATH.to_string(),
        }
    }

    /// Uses a different credential endpoint.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }
}

/// Username and password for a token exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates a credential pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// The username.
    pub fn username(&self) -> &str {
        &self.username
    }

    fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("username".to_string(), self.username.clone()),
            ("password".to_string(), self.password.clone()),
        ]
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A credential ready to be attached to requests.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedAuth {
    scheme: String,
    token: String,
    expires_at: Option<SystemTime>,
}

impl ResolvedAuth {
    /// Creates a resolved credential.
    pub fn new(scheme: impl Into<String>, token: impl Into<String>, expires_at: Option<SystemTime>) -> Self {
        Self {
            scheme: scheme.into(),
            token: token.into(),
            expires_at,
        }
    }

    /// The scheme name.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The raw token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// When the token stops being valid, if known.
    pub fn expires_at(&self) -> Option<SystemTime> {
        self.expires_at
    }

    /// Returns `true` until the expiry instant. Tokens without one never expire.
    pub fn is_valid(&self) -> bool {
        self.expires_at
            .map_or(true, |expires_at| SystemTime::now() < expires_at)
    }

    /// The `Authorization` header value, marked sensitive.
    pub fn header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::try_from(format!("{} {}", self.scheme, self.token))
            .map_err(|e| Error::AuthorizationFailed(format!("Invalid credential: {}", e)))?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for ResolvedAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedAuth")
            .field("scheme", &self.scheme)
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Where a client stands with respect to its default credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationState {
    /// No scheme configured.
    Unauthenticated,
    /// A token exchange is configured but has not run yet.
    Unresolved,
    /// A credential is available.
    Resolved(ResolvedAuth),
    /// Negotiation ran and failed; the reason is kept for diagnostics.
    Failed(String),
}

impl AuthorizationState {
    /// The state a scheme starts in before any network activity.
    pub fn initial(scheme: &AuthorizationScheme) -> Self {
        match scheme {
            AuthorizationScheme::None => AuthorizationState::Unauthenticated,
            AuthorizationScheme::Static { scheme, token } => {
                AuthorizationState::Resolved(ResolvedAuth::new(scheme.as_str(), token.as_str(), None))
            }
            AuthorizationScheme::TokenExchange(_) => AuthorizationState::Unresolved,
        }
    }

    /// The credential, if resolved and still valid.
    pub fn credential(&self) -> Option<&ResolvedAuth> {
        match self {
            AuthorizationState::Resolved(auth) if auth.is_valid() => Some(auth),
            _ => None,
        }
    }

    /// Returns `true` if a still-valid credential is available.
    pub fn is_resolved(&self) -> bool {
        self.credential().is_some()
    }

    /// Describes why no credential is available, for error messages.
    pub(crate) fn unavailable_reason(&self) -> String {
        match self {
            AuthorizationState::Unauthenticated => "no authorization scheme configured".to_string(),
            AuthorizationState::Unresolved => "token exchange has not been negotiated".to_string(),
            AuthorizationState::Resolved(_) => "token has expired".to_string(),
            AuthorizationState::Failed(reason) => format!("token exchange failed: {}", reason),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

#[derive(Deserialize)]
struct JwtClaims {
    exp: Option<u64>,
}

/// Resolves `scheme` into an [`AuthorizationState`].
///
/// Returns `current` unchanged, without any network activity, when the scheme
/// needs no negotiation or `current` already holds a valid credential. A token
/// exchange issues exactly one request to the credential endpoint under
/// `base_url`.
///
/// # Errors
///
/// Returns [`Error::AuthorizationFailed`] if the exchange fails for any
/// reason (transport error, non-200 status, undecodable body).
pub async fn resolve(
    scheme: &AuthorizationScheme,
    current: &AuthorizationState,
    base_url: &Url,
    transport: &dyn Transport,
) -> Result<AuthorizationState> {
    let exchange = match scheme {
        AuthorizationScheme::TokenExchange(exchange) => exchange,
        other => return Ok(AuthorizationState::initial(other)),
    };

    if current.is_resolved() {
        return Ok(current.clone());
    }

    exchange_token(exchange, base_url, transport)
        .await
        .map(AuthorizationState::Resolved)
}

async fn exchange_token(
    exchange: &TokenExchange,
    base_url: &Url,
    transport: &dyn Transport,
) -> Result<ResolvedAuth> {
    let url = base_url.join(exchange.path.trim_start_matches('/'))?;

    tracing::debug!(
        url = %url,
        username = exchange.credentials.username(),
        "Exchanging credentials for token"
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

    let request = TransportRequest {
        method: Method::POST,
        url,
        headers,
        body: TransportBody::Form(exchange.credentials.form_fields()),
    };

    let response = transport
        .execute(request)
        .await
        .map_err(|e| Error::AuthorizationFailed(format!("Token request failed: {}", e)))?;

    if response.status != StatusCode::OK {
        return Err(Error::AuthorizationFailed(format!(
            "Token endpoint returned {} {}",
            response.status.as_u16(),
            response.status_message
        )));
    }

    let body: TokenResponse = serde_json::from_str(&response.data)
        .map_err(|e| Error::AuthorizationFailed(format!("Invalid token response: {}", e)))?;

    let expires_at = match exchange.kind {
        ExchangeKind::Jwt => jwt_expiry(&body.token),
    };

    Ok(ResolvedAuth::new(exchange.kind.scheme_name(), body.token, expires_at))
}

/// Reads the `exp` claim from a JWT without verifying its signature.
///
/// An `exp` outside the range of [`SystemTime`] counts as no expiry.
fn jwt_expiry(token: &str) -> Option<SystemTime> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: JwtClaims = serde_json::from_slice(&bytes).ok()?;
    let expires_at = UNIX_EPOCH.checked_add(Duration::from_secs(claims.exp?));
    if expires_at.is_none() {
        tracing::warn!("Token expiry out of range; treating token as non-expiring");
    }
    expires_at
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jwt_with_exp(exp: u64) -> String {
        let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp));
        format!("{}.{}.signature", header, payload)
    }

    #[test]
    fn test_initial_states() {
        assert_eq!(
            AuthorizationState::initial(&AuthorizationScheme::None),
            AuthorizationState::Unauthenticated
        );
        assert!(AuthorizationState::initial(&AuthorizationScheme::bearer("abc")).is_resolved());
        assert_eq!(
            AuthorizationState::initial(&AuthorizationScheme::jwt("admin", "secret")),
            AuthorizationState::Unresolved
        );
    }

    #[test]
    fn test_basic_scheme_encodes_credentials() {
        let state = AuthorizationState::initial(&AuthorizationScheme::basic("admin", "pass"));
        let value = state.credential().unwrap().header_value().unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic YWRtaW46cGFzcw==");
        assert!(value.is_sensitive());
    }

    #[test]
    fn test_jwt_expiry_decoded() {
        let token = jwt_with_exp(2_000_000_000);
        assert_eq!(
            jwt_expiry(&token),
            Some(UNIX_EPOCH + Duration::from_secs(2_000_000_000))
        );
        assert_eq!(jwt_expiry("not-a-jwt"), None);
    }

    #[test]
    fn test_jwt_expiry_out_of_range() {
        assert_eq!(jwt_expiry(&jwt_with_exp(u64::MAX)), None);

        let auth = ResolvedAuth::new("Bearer", jwt_with_exp(u64::MAX), None);
        assert!(AuthorizationState::Resolved(auth).is_resolved());
    }

    #[test]
    fn test_expired_token_is_not_resolved() {
        let expired = ResolvedAuth::new("Bearer", jwt_with_exp(1), Some(UNIX_EPOCH + Duration::from_secs(1)));
        let state = AuthorizationState::Resolved(expired);
        assert!(!state.is_resolved());
        assert_eq!(state.unavailable_reason(), "token has expired");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let credentials = Credentials::new("admin", "hunter2");
        assert!(!format!("{:?}", credentials).contains("hunter2"));

        let auth = ResolvedAuth::new("Bearer", "s3cr3t", None);
        assert!(!format!("{:?}", auth).contains("s3cr3t"));
    }
}
