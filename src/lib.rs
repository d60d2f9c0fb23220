//! JSON-RPC 2.0 dispatcher behind an HTTP endpoint.
//!
//! Calls named `Service.Method` are routed to the [`rpc::Caller`] registered
//! under `Service`; batches fan out to one task per item and are answered
//! once every item has finished.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod rpc;
pub mod services;

pub use config::DispatcherConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use rpc::{Caller, Dispatcher, ServiceRegistry};
