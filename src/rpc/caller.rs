//! The capability a registered service exposes to the dispatcher.

use std::fmt;

use serde::Serialize;
use serde_json::value::RawValue;

use crate::rpc::envelope::RequestEnvelope;
use crate::rpc::error::ErrorObject;

/// Outcome of one Caller invocation. `Ok(None)` is a success with no payload.
pub type CallResult = Result<Option<CallValue>, ErrorObject>;

/// A registered handler for one service name.
///
/// Implementations receive the full envelope, pick the operation from
/// [`RequestEnvelope::method_name`] and decode their own parameters.
/// Calls run on the blocking pool, so sleeping or blocking I/O is acceptable.
pub trait Caller: Send + Sync {
    fn call(&self, request: &RequestEnvelope) -> CallResult;
}

impl<F> Caller for F
where
    F: Fn(&RequestEnvelope) -> CallResult + Send + Sync,
{
    fn call(&self, request: &RequestEnvelope) -> CallResult {
        self(request)
    }
}

type Encoder = Box<dyn FnOnce() -> serde_json::Result<Box<RawValue>> + Send>;

/// A successful value whose serialization is deferred to the dispatcher.
pub struct CallValue(Encoder);

impl CallValue {
    pub fn new<T>(value: T) -> Self
    where
        T: Serialize + Send + 'static,
    {
        Self(Box::new(move || serde_json::value::to_raw_value(&value)))
    }

    /// Wrap an already encoded payload.
    pub fn raw(raw: Box<RawValue>) -> Self {
        Self(Box::new(move || Ok(raw)))
    }

    pub fn encode(self) -> serde_json::Result<Box<RawValue>> {
        (self.0)()
    }
}

impl fmt::Debug for CallValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallValue(..)")
    }
}

/// Shorthand for a successful call returning `value`.
pub fn reply<T>(value: T) -> CallResult
where
    T: Serialize + Send + 'static,
{
    Ok(Some(CallValue::new(value)))
}
