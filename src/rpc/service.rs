//! Method table for a multi-method service.
//!
//! A `ServiceMethods` is a [`Caller`] that routes on the method component of
//! the envelope, decodes typed arguments and encodes typed results.

use std::collections::HashMap;
use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::rpc::caller::{CallResult, CallValue, Caller};
use crate::rpc::envelope::RequestEnvelope;
use crate::rpc::error::ErrorObject;

type Handler = Box<dyn Fn(&RequestEnvelope) -> CallResult + Send + Sync>;

pub struct ServiceMethods {
    service: String,
    methods: HashMap<String, Handler>,
}

impl ServiceMethods {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            methods: HashMap::new(),
        }
    }

    /// Service name used in error messages.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Add a method taking typed arguments.
    ///
    /// Absent params decode to `A::default()`.
    pub fn method<A, R, E, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        A: DeserializeOwned + Default,
        R: Serialize + Send + 'static,
        E: Display,
        F: Fn(A) -> Result<R, E> + Send + Sync + 'static,
    {
        let handler: Handler = Box::new(move |request: &RequestEnvelope| -> CallResult {
            let args = request.decode_params::<A>()?;
            let value = handler(args).map_err(internal_error)?;
            Ok(Some(CallValue::new(value)))
        });
        self.methods.insert(name.into(), handler);
        self
    }

    /// Add a method that refuses any params.
    pub fn method_without_params<R, E, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        R: Serialize + Send + 'static,
        E: Display,
        F: Fn() -> Result<R, E> + Send + Sync + 'static,
    {
        let handler: Handler = Box::new(move |request: &RequestEnvelope| -> CallResult {
            if request.has_params() {
                return Err(ErrorObject::invalid_params("Method does not accept params"));
            }
            let value = handler().map_err(internal_error)?;
            Ok(Some(CallValue::new(value)))
        });
        self.methods.insert(name.into(), handler);
        self
    }

    /// Add a method with no result payload.
    pub fn procedure<A, E, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        A: DeserializeOwned + Default,
        E: Display,
        F: Fn(A) -> Result<(), E> + Send + Sync + 'static,
    {
        let handler: Handler = Box::new(move |request: &RequestEnvelope| -> CallResult {
            let args = request.decode_params::<A>()?;
            handler(args).map_err(internal_error)?;
            Ok(None)
        });
        self.methods.insert(name.into(), handler);
        self
    }

    /// Method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Caller for ServiceMethods {
    fn call(&self, request: &RequestEnvelope) -> CallResult {
        let method = request.method_name();
        match self.methods.get(method) {
            Some(handler) => handler(request),
            None => Err(ErrorObject::method_not_found(format!(
                "Unknown method '{}' for service '{}'",
                method, self.service
            ))),
        }
    }
}

fn internal_error<E: Display>(err: E) -> ErrorObject {
    ErrorObject::internal("Internal error").with_data(err.to_string())
}
