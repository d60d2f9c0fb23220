//! HTTP transport binding.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, any path / any verb)
//!     → request.rs (request ID, header validation)
//!     → rpc::Dispatcher (envelope handling)
//!     → rpc::Reply (status + JSON body)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{validate_headers, MakeRequestUuidV4, X_REQUEST_ID};
pub use server::HttpServer;
