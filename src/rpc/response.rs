//! Response envelope assembly and serialization.

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::value::RawValue;

use crate::rpc::envelope::JSONRPC_VERSION;
use crate::rpc::error::ErrorObject;

/// Content type of every reply.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Written when the reply itself cannot be encoded.
const ENCODE_FAILURE_BODY: &str = r#"{"error":"Failed to encode response body"}"#;

/// Result or error of one call.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// `None` is a success with no payload, written as `"result": null`.
    Success(Option<Box<RawValue>>),
    Failure(ErrorObject),
}

/// Outbound JSON-RPC response.
#[derive(Debug, Clone)]
pub struct ResponseEnvelope {
    /// Request id echoed byte for byte. `None` when the failure happened
    /// before an id could be read.
    pub id: Option<Box<RawValue>>,
    pub outcome: Outcome,
}

impl ResponseEnvelope {
    pub fn success(result: Option<Box<RawValue>>, id: Option<Box<RawValue>>) -> Self {
        Self {
            id,
            outcome: Outcome::Success(result),
        }
    }

    pub fn failure(error: ErrorObject, id: Option<Box<RawValue>>) -> Self {
        Self {
            id,
            outcome: Outcome::Failure(error),
        }
    }

    pub fn error(&self) -> Option<&ErrorObject> {
        match &self.outcome {
            Outcome::Failure(err) => Some(err),
            Outcome::Success(_) => None,
        }
    }

    pub fn result(&self) -> Option<&RawValue> {
        match &self.outcome {
            Outcome::Success(result) => result.as_deref(),
            Outcome::Failure(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Failure(_))
    }
}

impl Serialize for ResponseEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("jsonrpc", JSONRPC_VERSION)?;
        match &self.outcome {
            Outcome::Success(result) => map.serialize_entry("result", result)?,
            Outcome::Failure(err) => map.serialize_entry("error", err)?,
        }
        map.serialize_entry("id", &self.id)?;
        map.end()
    }
}

/// Body of an HTTP reply.
#[derive(Debug, Clone)]
pub enum ReplyBody {
    Single(ResponseEnvelope),
    Batch(Vec<ResponseEnvelope>),
}

/// Everything needed to answer one HTTP exchange.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: ReplyBody,
}

impl Reply {
    pub fn single(envelope: ResponseEnvelope, status: StatusCode) -> Self {
        Self {
            status,
            body: ReplyBody::Single(envelope),
        }
    }

    /// Batches are always answered with 200; per-item outcomes live in the envelopes.
    pub fn batch(envelopes: Vec<ResponseEnvelope>) -> Self {
        Self {
            status: StatusCode::OK,
            body: ReplyBody::Batch(envelopes),
        }
    }

    /// Error reply raised by the dispatcher, status derived from the code.
    pub fn rejection(error: ErrorObject, id: Option<Box<RawValue>>) -> Self {
        let status = error.code.http_status();
        Self::single(ResponseEnvelope::failure(error, id), status)
    }

    /// Serialize the body.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        match &self.body {
            ReplyBody::Single(envelope) => serde_json::to_vec(envelope),
            ReplyBody::Batch(envelopes) => serde_json::to_vec(envelopes),
        }
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        let body = match self.to_bytes() {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode JSON-RPC reply");
                ENCODE_FAILURE_BODY.as_bytes().to_vec()
            }
        };

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = self.status;
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(JSON_CONTENT_TYPE),
        );
        response
    }
}
