//! Request envelope parsing and protocol-level validation.
//!
//! Parameters stay as raw JSON until the resolved Caller decodes them, so the
//! dispatcher never sees a parameter schema.

use std::fmt;

use serde::de::value::MapAccessDeserializer;
use serde::de::{DeserializeOwned, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use serde_json::value::{to_raw_value, RawValue};
use serde_json::Value;

use crate::rpc::error::ErrorObject;

/// The only protocol version accepted.
pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound JSON-RPC call.
///
/// `jsonrpc` and `method` default to empty strings when missing so that an
/// object with absent fields still parses and is rejected by [`validate`]
/// with its id echoed back. Only a JSON object decodes into an envelope; a
/// top-level array is left for the batch path.
///
/// [`validate`]: RequestEnvelope::validate
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    pub jsonrpc: String,

    pub method: String,

    /// Id exactly as the client sent it. `None` for both an absent and an
    /// explicit `null` id.
    pub id: Option<Box<RawValue>>,

    pub params: Option<Box<RawValue>>,
}

#[derive(Deserialize)]
struct EnvelopeFields {
    #[serde(default)]
    jsonrpc: String,

    #[serde(default)]
    method: String,

    #[serde(default)]
    id: Option<Box<RawValue>>,

    #[serde(default)]
    params: Option<Box<RawValue>>,
}

impl<'de> Deserialize<'de> for RequestEnvelope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EnvelopeVisitor;

        impl<'de> Visitor<'de> for EnvelopeVisitor {
            type Value = RequestEnvelope;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON-RPC request object")
            }

            fn visit_map<A>(self, map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let fields = EnvelopeFields::deserialize(MapAccessDeserializer::new(map))?;
                Ok(RequestEnvelope {
                    jsonrpc: fields.jsonrpc,
                    method: fields.method,
                    id: fields.id,
                    params: fields.params,
                })
            }
        }

        deserializer.deserialize_map(EnvelopeVisitor)
    }
}

impl RequestEnvelope {
    /// Build a parameterless envelope.
    pub fn new(method: impl Into<String>, id: impl Into<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            id: to_raw_value(&id.into()).ok(),
            params: None,
        }
    }

    /// Attach a raw parameter payload.
    pub fn with_params(mut self, params: Box<RawValue>) -> Self {
        self.params = Some(params);
        self
    }

    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Decode one deferred batch item.
    pub fn from_raw(raw: &RawValue) -> serde_json::Result<Self> {
        serde_json::from_str(raw.get())
    }

    /// Check version, method shape and id presence.
    pub fn validate(&self) -> Result<(), ErrorObject> {
        if self.jsonrpc != JSONRPC_VERSION {
            return Err(ErrorObject::invalid_request(
                "Bad request, field 'jsonrpc' must be '2.0'",
            ));
        }

        if !is_well_formed_method(&self.method) {
            return Err(ErrorObject::invalid_request(
                "Bad request, bad format field 'method'",
            ));
        }

        if self.id.is_none() {
            return Err(ErrorObject::invalid_request(
                "Bad request, bad format field 'id'",
            ));
        }

        Ok(())
    }

    /// Service component of `method` (the registry key).
    pub fn service(&self) -> &str {
        self.method
            .split_once('.')
            .map_or(self.method.as_str(), |(service, _)| service)
    }

    /// Method component of `method`, dispatched inside the Caller.
    pub fn method_name(&self) -> &str {
        self.method
            .split_once('.')
            .map_or("", |(_, method)| method)
    }

    pub fn has_params(&self) -> bool {
        self.params.is_some()
    }

    pub fn params(&self) -> Option<&RawValue> {
        self.params.as_deref()
    }

    pub fn id(&self) -> Option<&RawValue> {
        self.id.as_deref()
    }

    /// Decode the parameter payload into `T`, or `T::default()` when absent.
    pub fn decode_params<T>(&self) -> Result<T, ErrorObject>
    where
        T: DeserializeOwned + Default,
    {
        match self.params() {
            Some(raw) => serde_json::from_str(raw.get()).map_err(|e| {
                ErrorObject::invalid_params("Can't unmarshal params to args structure")
                    .with_data(e.to_string())
            }),
            None => Ok(T::default()),
        }
    }
}

/// Exactly one '.' with non-empty text on both sides.
fn is_well_formed_method(method: &str) -> bool {
    match method.split_once('.') {
        Some((service, name)) => !service.is_empty() && !name.is_empty() && !name.contains('.'),
        None => false,
    }
}
