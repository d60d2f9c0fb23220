//! Request-level checks and request ID generation.
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Headers are validated before the body is read

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::rpc::error::ErrorObject;

/// Header carrying the per-exchange correlation ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

const JSON_MEDIA_TYPE: &str = "application/json";

/// Generates a UUID v4 for requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = HeaderValue::from_str(&Uuid::new_v4().to_string()).ok()?;
        Some(RequestId::new(id))
    }
}

/// `Accept` must be exactly `application/json`; `Content-Type` must contain it.
pub fn validate_headers(headers: &HeaderMap) -> Result<(), ErrorObject> {
    let accept = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok());
    if accept != Some(JSON_MEDIA_TYPE) {
        return Err(ErrorObject::invalid_request(
            "Header 'Accept' is not 'application/json'",
        ));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !content_type.contains(JSON_MEDIA_TYPE) {
        return Err(ErrorObject::invalid_request(
            "Header 'Content-Type' is not 'application/json'",
        ));
    }

    Ok(())
}

/// Request ID set by the middleware, or "unknown".
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}
