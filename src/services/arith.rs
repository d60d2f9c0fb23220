//! `Arith` service, a hand-written Caller.

use serde::Deserialize;
use thiserror::Error;

use crate::rpc::{reply, CallResult, Caller, ErrorObject, RequestEnvelope};

#[derive(Debug, Default, Deserialize)]
pub struct Operands {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArithError {
    #[error("integer overflow")]
    Overflow,

    #[error("division by zero")]
    DivisionByZero,
}

impl From<ArithError> for ErrorObject {
    fn from(err: ArithError) -> Self {
        ErrorObject::internal("Internal error").with_data(err.to_string())
    }
}

/// Checked integer arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct Arith;

impl Arith {
    pub fn add(&self, ops: Operands) -> Result<i64, ArithError> {
        ops.a.checked_add(ops.b).ok_or(ArithError::Overflow)
    }

    pub fn multiply(&self, ops: Operands) -> Result<i64, ArithError> {
        ops.a.checked_mul(ops.b).ok_or(ArithError::Overflow)
    }

    pub fn divide(&self, ops: Operands) -> Result<i64, ArithError> {
        if ops.b == 0 {
            return Err(ArithError::DivisionByZero);
        }
        ops.a.checked_div(ops.b).ok_or(ArithError::Overflow)
    }
}

impl Caller for Arith {
    fn call(&self, request: &RequestEnvelope) -> CallResult {
        let result = match request.method_name() {
            "Add" => self.add(request.decode_params()?),
            "Multiply" => self.multiply(request.decode_params()?),
            "Divide" => self.divide(request.decode_params()?),
            other => {
                return Err(ErrorObject::method_not_found(format!(
                    "Unknown method '{other}' for service 'Arith'"
                )))
            }
        };
        reply(result?)
    }
}
