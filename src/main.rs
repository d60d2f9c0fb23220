//! JSON-RPC 2.0 dispatcher server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ header check ──▶ body read
//!                                                        │
//!                                   ┌────────────────────┴──────────┐
//!                                   ▼                               ▼
//!                           single envelope                   batch (N items)
//!                                   │                     ┌───┬───┴───┬───┐
//!                                   ▼                     ▼   ▼       ▼   ▼   one task each
//!                        registry lookup ──▶ Caller      single-call pipeline
//!                                   │                     └───┴───┬───┴───┘
//!                                   ▼                             ▼ join all
//!     Client Response ◀──── envelope + status           envelope list / 200
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use jsonrpc_dispatcher::config::{load_config, DispatcherConfig};
use jsonrpc_dispatcher::lifecycle::{wait_for_signal, Shutdown};
use jsonrpc_dispatcher::observability::{logging, metrics};
use jsonrpc_dispatcher::services;
use jsonrpc_dispatcher::{HttpServer, ServiceRegistry};

#[derive(Parser)]
#[command(name = "jsonrpc-dispatcher")]
#[command(about = "JSON-RPC 2.0 dispatcher over HTTP", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => DispatcherConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;
    tracing::info!("jsonrpc-dispatcher v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        max_body_size = config.limits.max_body_size,
        "Configuration loaded"
    );

    let registry = Arc::new(ServiceRegistry::new());
    services::register_builtin(&registry)?;
    tracing::info!(services = ?registry.service_names(), "Services registered");

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if let Err(e) = wait_for_signal().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
        }
        shutdown.trigger();
    });

    let server = HttpServer::new(config, registry);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
