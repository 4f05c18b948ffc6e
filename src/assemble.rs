//! Turns a [`RequestDescriptor`] into a transport-ready request.

use crate::auth::AuthorizationState;
use crate::descriptor::{parse_header, RequestBody, RequestDescriptor};
use crate::transport::{TransportBody, TransportRequest};
use crate::{Error, Result};
use http::header::{AUTHORIZATION, CONTENT_DISPOSITION};
use http::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

/// Builds the final URL, header set and body for `descriptor`.
///
/// Headers are layered in this order, each layer replacing any header of the
/// same name from the layers before it: `default_headers`, the
/// `Authorization` header from `authorization`, media fields, then the
/// descriptor's own headers. Repeated names within the descriptor are all
/// kept.
///
/// # Errors
///
/// * [`Error::Construction`] if the URI cannot be resolved against `endpoint`
///   or a media field is not a valid header.
/// * [`Error::AuthorizationFailed`] if the descriptor requires authorization
///   and `authorization` holds no valid credential.
pub fn assemble(
    descriptor: &RequestDescriptor,
    endpoint: &Url,
    authorization: &AuthorizationState,
    default_headers: &HeaderMap,
) -> Result<TransportRequest> {
    let url = resolve_url(endpoint, descriptor)?;
    let mut headers = default_headers.clone();

    match authorization.credential() {
        Some(credential) => {
            headers.insert(AUTHORIZATION, credential.header_value()?);
        }
        None if descriptor.requires_authorization() => {
            return Err(Error::AuthorizationFailed(
                authorization.unavailable_reason(),
            ));
        }
        None => {}
    }

    let body = match descriptor.body() {
        RequestBody::None => TransportBody::Empty,
        RequestBody::Form(fields) => TransportBody::Form(fields.clone()),
        RequestBody::Media(upload) => {
            let disposition = HeaderValue::try_from(upload.content_disposition())
                .map_err(|e| Error::Construction(format!("Invalid file name: {}", e)))?;
            headers.insert(CONTENT_DISPOSITION, disposition);

            let fields = upload
                .fields
                .iter()
                .map(|(name, value)| parse_header(name, value))
                .collect::<Result<Vec<_>>>()?;
            override_headers(&mut headers, &fields);

            TransportBody::Binary(upload.data.clone())
        }
    };

    override_headers(&mut headers, descriptor.headers());

    Ok(TransportRequest {
        method: descriptor.method().clone(),
        url,
        headers,
        body,
    })
}

fn resolve_url(endpoint: &Url, descriptor: &RequestDescriptor) -> Result<Url> {
    let uri = descriptor.uri().trim();
    if uri.is_empty() {
        return Err(Error::Construction("Request URI is required".to_string()));
    }

    let mut url = endpoint
        .join(uri.trim_start_matches('/'))
        .map_err(|e| Error::Construction(format!("Invalid request URI '{}': {}", uri, e)))?;

    if !descriptor.query().is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in descriptor.query() {
            pairs.append_pair(key, value);
        }
    }

    Ok(url)
}

/// Replaces every header named in `layer`, then appends the layer's values in order.
fn override_headers(headers: &mut HeaderMap, layer: &[(HeaderName, HeaderValue)]) {
    for (name, _) in layer {
        headers.remove(name);
    }
    for (name, value) in layer {
        headers.append(name.clone(), value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthorizationScheme, ResolvedAuth};
    use crate::descriptor::MediaUpload;
    use http::header::{CONTENT_TYPE, USER_AGENT};

    fn endpoint() -> Url {
        Url::parse("https://site.test/wp-json/wp/v2/").unwrap()
    }

    fn defaults() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("wpcall-test"));
        headers.insert("x-source", HeaderValue::from_static("default"));
        headers
    }

    #[test]
    fn test_relative_uri_and_query() {
        let descriptor = RequestDescriptor::builder()
            .get("/posts")
            .query("per_page", "2")
            .query("search", "hello world")
            .build()
            .unwrap();

        let request = assemble(
            &descriptor,
            &endpoint(),
            &AuthorizationState::Unauthenticated,
            &defaults(),
        )
        .unwrap();

        assert_eq!(
            request.url.as_str(),
            "https://site.test/wp-json/wp/v2/posts?per_page=2&search=hello+world"
        );
        assert!(request.headers.get(AUTHORIZATION).is_none());
        assert_eq!(request.body, TransportBody::Empty);
    }

    #[test]
    fn test_absolute_uri_is_kept() {
        let descriptor = RequestDescriptor::builder()
            .get("https://other.test/wp-json/custom/v1/thing")
            .build()
            .unwrap();

        let request = assemble(
            &descriptor,
            &endpoint(),
            &AuthorizationState::Unauthenticated,
            &HeaderMap::new(),
        )
        .unwrap();
        assert_eq!(request.url.as_str(), "https://other.test/wp-json/custom/v1/thing");
    }

    #[test]
    fn test_requires_authorization_without_credential_fails() {
        let descriptor = RequestDescriptor::builder()
            .get("users/me")
            .requires_authorization(true)
            .build()
            .unwrap();

        for state in [
            AuthorizationState::Unauthenticated,
            AuthorizationState::Unresolved,
            AuthorizationState::Failed("bad password".to_string()),
        ] {
            let result = assemble(&descriptor, &endpoint(), &state, &defaults());
            assert!(
                matches!(result, Err(Error::AuthorizationFailed(_))),
                "state {:?} should fail",
                state
            );
        }
    }

    #[test]
    fn test_credential_attached() {
        let descriptor = RequestDescriptor::builder()
            .get("users/me")
            .requires_authorization(true)
            .build()
            .unwrap();
        let state = AuthorizationState::Resolved(ResolvedAuth::new("Bearer", "tok", None));

        let request = assemble(&descriptor, &endpoint(), &state, &defaults()).unwrap();
        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "Bearer tok");
    }

    #[test]
    fn test_request_headers_override_defaults() {
        let descriptor = RequestDescriptor::builder()
            .get("posts")
            .header("X-Source", "request-1")
            .header("X-Source", "request-2")
            .header("Authorization", "Custom abc")
            .build()
            .unwrap();
        let state = AuthorizationState::initial(&AuthorizationScheme::bearer("tok"));

        let request = assemble(&descriptor, &endpoint(), &state, &defaults()).unwrap();

        let sources: Vec<_> = request
            .headers
            .get_all("x-source")
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(sources, vec!["request-1", "request-2"]);
        assert_eq!(request.headers.get(AUTHORIZATION).unwrap(), "Custom abc");
        assert_eq!(request.headers.get(USER_AGENT).unwrap(), "wpcall-test");
    }

    #[test]
    fn test_form_body() {
        let fields = vec![
            ("title".to_string(), "Hello".to_string()),
            ("status".to_string(), "draft".to_string()),
        ];
        let descriptor = RequestDescriptor::builder()
            .post("posts")
            .form(fields.clone())
            .build()
            .unwrap();

        let request = assemble(
            &descriptor,
            &endpoint(),
            &AuthorizationState::Unauthenticated,
            &HeaderMap::new(),
        )
        .unwrap();
        assert_eq!(request.body, TransportBody::Form(fields));
    }

    #[test]
    fn test_media_fields_become_headers() {
        let upload = MediaUpload::new("cat.png", "image/png", vec![0x89, 0x50])
            .with_field("X-Caption", "a cat");
        let descriptor = RequestDescriptor::builder()
            .post("media")
            .media(upload)
            .build()
            .unwrap();

        let request = assemble(
            &descriptor,
            &endpoint(),
            &AuthorizationState::Unauthenticated,
            &HeaderMap::new(),
        )
        .unwrap();

        assert_eq!(request.body, TransportBody::Binary(vec![0x89, 0x50]));
        assert_eq!(request.headers.get(CONTENT_TYPE).unwrap(), "image/png");
        assert_eq!(request.headers.get("x-caption").unwrap(), "a cat");
        assert_eq!(
            request.headers.get(CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"cat.png\""
        );
    }
}
