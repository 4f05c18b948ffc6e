//! Request descriptors: immutable descriptions of one outgoing call.

use crate::auth::AuthorizationScheme;
use crate::hooks::RequestHooks;
use crate::{Error, Result};
use http::{HeaderName, HeaderValue, Method};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The body of a request, by content kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    None,
    /// Form fields sent url-encoded, in order.
    Form(Vec<(String, String)>),
    /// A single binary file.
    Media(MediaUpload),
}

/// A one-part media upload.
///
/// The file bytes become the raw request body and every other field is sent
/// as a request header. No multipart framing is produced, which matches what
/// the WordPress media endpoint accepts for single-file uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    /// File name reported in `Content-Disposition`.
    pub file_name: String,
    /// The file contents.
    pub data: Vec<u8>,
    /// Sibling fields, promoted to headers on assembly.
    pub fields: Vec<(String, String)>,
}

impl MediaUpload {
    /// Creates an upload with a `Content-Type` field.
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            data: data.into(),
            fields: vec![("Content-Type".to_string(), content_type.into())],
        }
    }

    /// Adds a sibling field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// The `Content-Disposition` value for this file.
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.file_name.replace('"', "\\\""))
    }
}

/// An immutable description of one call.
///
/// Built with [`RequestDescriptor::builder`]. The URI and method are always
/// present: a builder without them fails to build.
///
/// # Examples
///
/// ```
/// use wpcall::RequestDescriptor;
///
/// let descriptor = RequestDescriptor::builder()
///     .get("posts")
///     .query("per_page", "5")
///     .header("X-Trace", "abc")
///     .build()
///     .unwrap();
///
/// assert_eq!(descriptor.uri(), "posts");
/// assert!(!descriptor.requires_authorization());
/// ```
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub(crate) uri: String,
    pub(crate) method: Method,
    pub(crate) headers: Vec<(HeaderName, HeaderValue)>,
    pub(crate) query: Vec<(String, String)>,
    pub(crate) body: RequestBody,
    pub(crate) requires_authorization: bool,
    pub(crate) authorization: Option<AuthorizationScheme>,
    pub(crate) cancellation: CancellationToken,
    pub(crate) hooks: RequestHooks,
}

impl RequestDescriptor {
    /// Starts building a descriptor.
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// The target URI, relative to the client endpoint or absolute.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Per-request headers, in the order they were added.
    pub fn headers(&self) -> &[(HeaderName, HeaderValue)] {
        &self.headers
    }

    /// Query parameters, in the order they were added.
    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// The request body.
    pub fn body(&self) -> &RequestBody {
        &self.body
    }

    /// Whether the call must carry a valid credential.
    pub fn requires_authorization(&self) -> bool {
        self.requires_authorization
    }

    /// The per-request authorization override, if any.
    pub fn authorization(&self) -> Option<&AuthorizationScheme> {
        self.authorization.as_ref()
    }

    /// The token that cancels this call.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub(crate) fn hooks(&self) -> &RequestHooks {
        &self.hooks
    }
}

/// Builder for [`RequestDescriptor`].
///
/// Every step consumes the builder and returns the next value. Setting a
/// scalar twice keeps the later value; headers and query pairs accumulate.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    uri: Option<String>,
    method: Option<Method>,
    headers: Vec<(String, String)>,
    query: Vec<(String, String)>,
    body: RequestBody,
    requires_authorization: bool,
    authorization: Option<AuthorizationScheme>,
    cancellation: Option<CancellationToken>,
    hooks: RequestHooks,
}

impl RequestBuilder {
    /// Sets the target URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Sets the HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Shorthand for a GET to `uri`.
    pub fn get(self, uri: impl Into<String>) -> Self {
        self.method(Method::GET).uri(uri)
    }

    /// Shorthand for a POST to `uri`.
    pub fn post(self, uri: impl Into<String>) -> Self {
        self.method(Method::POST).uri(uri)
    }

    /// Shorthand for a PUT to `uri`.
    pub fn put(self, uri: impl Into<String>) -> Self {
        self.method(Method::PUT).uri(uri)
    }

    /// Shorthand for a DELETE to `uri`.
    pub fn delete(self, uri: impl Into<String>) -> Self {
        self.method(Method::DELETE).uri(uri)
    }

    /// Adds a header. Duplicate names are kept, in order.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Adds multiple query parameters.
    pub fn query_params(mut self, params: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(params);
        self
    }

    /// Sends `fields` as a url-encoded form body.
    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(fields);
        self
    }

    /// Sends a single file as the raw body.
    pub fn media(mut self, upload: MediaUpload) -> Self {
        self.body = RequestBody::Media(upload);
        self
    }

    /// Marks the call as needing a valid credential.
    pub fn requires_authorization(mut self, required: bool) -> Self {
        self.requires_authorization = required;
        self
    }

    /// Uses `scheme` for this call instead of the client default.
    pub fn authorization(mut self, scheme: AuthorizationScheme) -> Self {
        self.authorization = Some(scheme);
        self
    }

    /// Attaches a cancellation token.
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Called with the raw body of a 200 response, before validation.
    pub fn on_success(mut self, callback: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.hooks.on_success = Some(Arc::new(callback));
        self
    }

    /// Called when a failure is captured into the envelope.
    pub fn on_unhandled_error(mut self, callback: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.hooks.on_unhandled_error = Some(Arc::new(callback));
        self
    }

    /// Rejects a 200 response when the predicate returns `false`.
    pub fn validator(mut self, predicate: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.hooks.validator = Some(Arc::new(predicate));
        self
    }

    /// Like [`validator`](Self::validator), but over the body parsed as JSON.
    ///
    /// A body that is not valid JSON is rejected without calling `predicate`.
    /// Replaces any validator set earlier.
    ///
    /// ```
    /// use wpcall::RequestDescriptor;
    ///
    /// let descriptor = RequestDescriptor::builder()
    ///     .get("posts")
    ///     .json_validator(|posts| posts.as_array().is_some_and(|p| !p.is_empty()))
    ///     .build()
    ///     .unwrap();
    /// ```
    pub fn json_validator(
        self,
        predicate: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.validator(move |body| {
            serde_json::from_str::<Value>(body).is_ok_and(|value| predicate(&value))
        })
    }

    /// Builds the descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Construction`] if the URI or method is missing, the
    /// URI is empty, or a header name or value is invalid.
    pub fn build(self) -> Result<RequestDescriptor> {
        let uri = self
            .uri
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| Error::Construction("Request URI is required".to_string()))?;
        let method = self
            .method
            .ok_or_else(|| Error::Construction("Request method is required".to_string()))?;

        let headers = self
            .headers
            .into_iter()
            .map(|(name, value)| parse_header(&name, &value))
            .collect::<Result<Vec<_>>>()?;

        Ok(RequestDescriptor {
            uri,
            method,
            headers,
            query: self.query,
            body: self.body,
            requires_authorization: self.requires_authorization,
            authorization: self.authorization,
            cancellation: self.cancellation.unwrap_or_default(),
            hooks: self.hooks,
        })
    }
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::Construction(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::Construction(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_uri_is_construction_error() {
        let result = RequestDescriptor::builder().method(Method::GET).build();
        assert!(matches!(result, Err(Error::Construction(_))));

        let result = RequestDescriptor::builder().get("  ").build();
        assert!(matches!(result, Err(Error::Construction(_))));
    }

    #[test]
    fn test_missing_method_is_construction_error() {
        let result = RequestDescriptor::builder().uri("posts").build();
        assert!(matches!(result, Err(Error::Construction(_))));
    }

    #[test]
    fn test_later_scalar_wins_headers_accumulate() {
        let descriptor = RequestDescriptor::builder()
            .get("posts")
            .post("users")
            .header("X-Tag", "a")
            .header("X-Tag", "b")
            .build()
            .unwrap();

        assert_eq!(*descriptor.method(), Method::POST);
        assert_eq!(descriptor.uri(), "users");
        let values: Vec<_> = descriptor
            .headers()
            .iter()
            .map(|(_, v)| v.to_str().unwrap())
            .collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_header_rejected() {
        let result = RequestDescriptor::builder()
            .get("posts")
            .header("bad header", "x")
            .build();
        assert!(matches!(result, Err(Error::Construction(_))));
    }

    #[test]
    fn test_media_upload_fields() {
        let upload = MediaUpload::new("cat.png", "image/png", vec![1, 2, 3])
            .with_field("X-WP-Alt", "a cat");
        assert_eq!(upload.content_disposition(), "attachment; filename=\"cat.png\"");
        assert_eq!(upload.fields.len(), 2);
    }

    #[test]
    fn test_json_validator_sees_parsed_body() {
        let descriptor = RequestDescriptor::builder()
            .get("posts")
            .json_validator(|value| value["status"] == "publish")
            .build()
            .unwrap();
        let validator = descriptor.hooks().validator.as_ref().unwrap();

        assert!(validator(r#"{"id": 1, "status": "publish"}"#));
        assert!(!validator(r#"{"id": 1, "status": "draft"}"#));
        assert!(!validator("<html>maintenance</html>"));
    }
}
