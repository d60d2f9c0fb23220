//! One HTTP exchange: headers, body, single-vs-batch detection, execution.
//!
//! # Data Flow
//! ```text
//! headers ── invalid ──▶ InvalidRequest / 400 (body untouched)
//!    │
//! body bytes ── read error ──▶ InternalError / 500
//!    │
//! single envelope? ── yes ──▶ validate → lookup → Caller → envelope + status
//!    │ no
//! array of raw items? ── yes ──▶ batch executor → list / 200
//!    │ no
//! ParseError / 400
//! ```

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use serde_json::json;
use serde_json::value::RawValue;

use crate::http::request::validate_headers;
use crate::observability::metrics;
use crate::rpc::batch;
use crate::rpc::envelope::RequestEnvelope;
use crate::rpc::error::{ErrorCode, ErrorObject};
use crate::rpc::registry::ServiceRegistry;
use crate::rpc::response::{Reply, ResponseEnvelope};

/// Default body limit when none is configured (2MB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// Routes JSON-RPC calls to the Callers in a registry.
///
/// Cheap to clone; clones share the registry.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
    max_body_size: usize,
}

impl Dispatcher {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self {
            registry,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    /// Bodies longer than `limit` bytes count as read failures.
    pub fn with_max_body_size(mut self, limit: usize) -> Self {
        self.max_body_size = limit;
        self
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Handle one exchange end to end.
    pub async fn dispatch(&self, headers: &HeaderMap, body: Body) -> Reply {
        let start = Instant::now();

        if let Err(err) = validate_headers(headers) {
            tracing::warn!(reason = %err.message, "Rejected request headers");
            let reply = Reply::rejection(err, None);
            metrics::record_request("invalid", reply.status, start);
            return reply;
        }

        let bytes = match axum::body::to_bytes(body, self.max_body_size).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read request body");
                let err = ErrorObject::internal("Can't read request body").with_data(e.to_string());
                let reply = Reply::rejection(err, None);
                metrics::record_request("invalid", reply.status, start);
                return reply;
            }
        };

        self.dispatch_bytes(&bytes).await
    }

    /// Handle an already read body.
    ///
    /// A body that parses as one envelope never falls through to batch
    /// handling; the batch form is tried only when the single form fails.
    pub async fn dispatch_bytes(&self, bytes: &[u8]) -> Reply {
        let start = Instant::now();

        let single_err = match RequestEnvelope::from_slice(bytes) {
            Ok(envelope) => {
                let (response, status) = self.execute(envelope).await;
                metrics::record_request("single", status, start);
                return Reply::single(response, status);
            }
            Err(e) => e,
        };

        match serde_json::from_slice::<Vec<Box<RawValue>>>(bytes) {
            Ok(items) => {
                metrics::record_batch(items.len());
                let responses = batch::execute_batch(self, items).await;
                let reply = Reply::batch(responses);
                metrics::record_request("batch", reply.status, start);
                reply
            }
            Err(_) => {
                tracing::debug!(error = %single_err, "Body is neither an envelope nor a batch");
                let err = ErrorObject::parse_error("Can't parse request json to json rpc 2.0 struct")
                    .with_data(single_err.to_string());
                let reply = Reply::rejection(err, None);
                metrics::record_request("invalid", reply.status, start);
                reply
            }
        }
    }

    /// Run one call: validate, resolve the service, invoke, encode.
    ///
    /// Caller-reported errors are passed through verbatim but always
    /// answered with 500, whatever their code.
    pub async fn execute(&self, envelope: RequestEnvelope) -> (ResponseEnvelope, StatusCode) {
        if let Err(err) = envelope.validate() {
            let status = err.code.http_status();
            return (ResponseEnvelope::failure(err, envelope.id), status);
        }

        let id = envelope.id.clone();
        let service = envelope.service().to_string();
        let caller = match self.registry.lookup(&service) {
            Ok(caller) => caller,
            Err(_) => {
                tracing::debug!(service = %service, "Unknown service");
                // Client-chosen names stay out of metric labels.
                metrics::record_call("unknown", "not_found");
                let err = ErrorObject::method_not_found("Unknown service")
                    .with_data(json!({ "methodName": service }));
                return (
                    ResponseEnvelope::failure(err, id),
                    ErrorCode::MethodNotFound.http_status(),
                );
            }
        };

        let method = envelope.method.clone();
        let joined = tokio::task::spawn_blocking(move || {
            caller
                .call(&envelope)
                .map(|value| value.map(|value| value.encode()))
        })
        .await;

        match joined {
            Ok(Ok(None)) => {
                metrics::record_call(&service, "ok");
                (ResponseEnvelope::success(None, id), StatusCode::OK)
            }
            Ok(Ok(Some(Ok(raw)))) => {
                tracing::debug!(method = %method, "Call succeeded");
                metrics::record_call(&service, "ok");
                (ResponseEnvelope::success(Some(raw), id), StatusCode::OK)
            }
            Ok(Ok(Some(Err(e)))) => {
                tracing::error!(method = %method, error = %e, "Failed to serialize call result");
                metrics::record_call(&service, "encode_error");
                let err = ErrorObject::internal("Can't marshal response").with_data(e.to_string());
                (ResponseEnvelope::failure(err, id), StatusCode::INTERNAL_SERVER_ERROR)
            }
            Ok(Err(err)) => {
                tracing::warn!(method = %method, code = err.code.code(), message = %err.message, "Call failed");
                metrics::record_call(&service, "error");
                (ResponseEnvelope::failure(err, id), StatusCode::INTERNAL_SERVER_ERROR)
            }
            Err(e) => {
                tracing::error!(method = %method, error = %e, "Caller panicked");
                metrics::record_call(&service, "panic");
                let err = ErrorObject::internal("Internal error").with_data(e.to_string());
                (ResponseEnvelope::failure(err, id), StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}
