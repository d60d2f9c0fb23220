//! JSON-RPC 2.0 dispatch engine.
//!
//! # Data Flow
//! ```text
//! raw body
//!     → envelope.rs (decode, validate; params stay raw)
//!     → registry.rs (service name → Caller)
//!     → caller.rs (Caller invocation on the blocking pool)
//!     → response.rs (envelope + HTTP status)
//!
//! Batch:
//!     raw item list
//!     → batch.rs (one task per item, join all)
//!     → same single-call pipeline per item
//! ```
//!
//! # Design Decisions
//! - The dispatcher never inspects parameter schemas; Callers decode their own
//! - Every failure is terminal at the point of detection, nothing is retried
//! - No internal deadlines: a stalled Caller stalls its exchange

pub mod batch;
pub mod caller;
pub mod dispatcher;
pub mod envelope;
pub mod error;
pub mod registry;
pub mod response;
pub mod service;

pub use batch::{execute_batch, BatchAccumulator};
pub use caller::{reply, CallResult, CallValue, Caller};
pub use dispatcher::Dispatcher;
pub use envelope::{RequestEnvelope, JSONRPC_VERSION};
pub use error::{ErrorCode, ErrorObject, RegistryError};
pub use registry::ServiceRegistry;
pub use response::{Outcome, Reply, ReplyBody, ResponseEnvelope};
pub use service::ServiceMethods;
