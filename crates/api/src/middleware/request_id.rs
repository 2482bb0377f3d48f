//! Request correlation IDs.
//!
//! [`request_id_middleware`] runs outside the trace layer. It settles one
//! [`RequestId`] per request and stores it as a request extension, where the
//! `http_request` span picks it up. It also tags the Sentry scope and echoes
//! the ID in the response.
//!
//! A caller-supplied `x-request-id` is kept only when it is 1 to 128 visible
//! ASCII characters. Anything else is replaced by a fresh UUID v4, so log
//! lines never carry arbitrary client bytes.

use core::fmt;

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation ID of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    /// The ID sent by the caller, if it is acceptable.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let id = headers.get(REQUEST_ID_HEADER)?.to_str().ok()?;
        let acceptable = (1..=MAX_REQUEST_ID_LEN).contains(&id.len())
            && id.bytes().all(|b| b.is_ascii_graphic());
        acceptable.then(|| Self(id.to_owned()))
    }

    /// A fresh random ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Attach a [`RequestId`] to the request and echo it in the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id =
        RequestId::from_headers(request.headers()).unwrap_or_else(RequestId::generate);

    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", request_id.as_str());
    });
    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(request_id.as_str()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers_with(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(id).unwrap());
        headers
    }

    #[test]
    fn test_caller_id_is_kept_when_acceptable() {
        let id = RequestId::from_headers(&headers_with("abc-123")).unwrap();
        assert_eq!(id.as_str(), "abc-123");
        assert_eq!(id.to_string(), "abc-123");

        let longest = "x".repeat(MAX_REQUEST_ID_LEN);
        assert!(RequestId::from_headers(&headers_with(&longest)).is_some());
    }

    #[test]
    fn test_caller_id_is_rejected_when_unacceptable() {
        assert!(RequestId::from_headers(&HeaderMap::new()).is_none());
        assert!(RequestId::from_headers(&headers_with("")).is_none());
        assert!(RequestId::from_headers(&headers_with("has space")).is_none());

        let too_long = "x".repeat(MAX_REQUEST_ID_LEN + 1);
        assert!(RequestId::from_headers(&headers_with(&too_long)).is_none());
    }

    #[test]
    fn test_generated_ids_are_unique_uuids() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(a.as_str()).is_ok());
    }
}
