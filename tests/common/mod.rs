//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use jsonrpc_dispatcher::config::DispatcherConfig;
use jsonrpc_dispatcher::rpc::{reply, CallResult, ErrorObject, RequestEnvelope, ServiceRegistry};
use jsonrpc_dispatcher::{HttpServer, Shutdown};
use serde_json::Value;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Registry with a `Test` service covering every Caller outcome.
pub fn test_registry() -> Arc<ServiceRegistry> {
    let registry = ServiceRegistry::new();
    registry
        .register("Test", |req: &RequestEnvelope| -> CallResult {
            match req.method_name() {
                "Echo" => reply(req.decode_params::<Value>()?),
                "Id" => reply(req.id.clone()),
                "Empty" => Ok(None),
                "Fail" => Err(ErrorObject::invalid_params("always fails")),
                other => Err(ErrorObject::method_not_found(format!("no method {other}"))),
            }
        })
        .unwrap();
    Arc::new(registry)
}

pub fn router(registry: Arc<ServiceRegistry>) -> Router {
    HttpServer::new(DispatcherConfig::default(), registry).router()
}

/// POST `body` with the headers the protocol requires.
pub fn json_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("accept", "application/json")
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

/// Drive one request through the router in-process.
pub async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

/// Start a real server on an ephemeral port.
pub async fn start_server(registry: Arc<ServiceRegistry>) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(DispatcherConfig::default(), registry);

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, shutdown)
}
