//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router accepting any path and any verb
//! - Wire up middleware (request ID, tracing, timeout)
//! - Hand every exchange to the dispatcher
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::Instrument;

use crate::config::DispatcherConfig;
use crate::http::request::{request_id, MakeRequestUuidV4, X_REQUEST_ID};
use crate::rpc::{Dispatcher, ServiceRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher,
}

/// HTTP front of the dispatcher.
pub struct HttpServer {
    router: Router,
    config: DispatcherConfig,
}

impl HttpServer {
    /// Create a server serving the services in `registry`.
    pub fn new(config: DispatcherConfig, registry: Arc<ServiceRegistry>) -> Self {
        let dispatcher = Dispatcher::new(registry).with_max_body_size(config.limits.max_body_size);
        let router = Self::build_router(&config, AppState { dispatcher });
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &DispatcherConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(rpc_handler))
            .route("/{*path}", any(rpc_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Router with all layers applied, for driving the server in-process.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight exchanges.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }
}

/// Every path and verb lands here.
async fn rpc_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();
    let span = tracing::debug_span!("rpc", request_id = %request_id);

    let reply = state
        .dispatcher
        .dispatch(&parts.headers, body)
        .instrument(span)
        .await;

    tracing::debug!(request_id = %request_id, status = %reply.status, "Exchange complete");
    reply.into_response()
}
