//! # Call-Shape Resolution
//!
//! Classifies a handler's declared parameter list into one of three calling
//! conventions, once, at registration time. Dispatch is then a switch over the
//! stored tag; no per-emission inspection happens.
//!
//! The single-parameter case is decided by name alone, and deliberately so: a
//! lone parameter literally named `payload` always receives the raw payload
//! mapping unmodified ([`CallShape::Loaded`]), while any other lone name
//! triggers per-key extraction from the payload ([`CallShape::Unpacked`]).
//! Callers relying on per-key extraction must not name their parameter
//! `payload`.

use std::fmt;

use serde_json::Value;

use crate::error::{Result, SignalError};
use crate::signal::Payload;

use super::ParamSpec;

/// The parameter name that selects the loaded convention.
pub const PAYLOAD_PARAM: &str = "payload";

/// How the dispatcher maps emission data onto a handler's declared parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallShape {
    /// Zero declared parameters: the handler receives only the signal.
    Bald,
    /// One parameter named `payload`: the handler receives the signal and the
    /// raw payload mapping unmodified.
    Loaded,
    /// Any other parameter list: the handler receives the signal and one bound
    /// value per declared parameter.
    Unpacked,
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CallShape::Bald => "bald",
            CallShape::Loaded => "loaded",
            CallShape::Unpacked => "unpacked",
        };
        f.write_str(label)
    }
}

/// Classify a declared parameter list. Total: every list maps to a shape.
pub fn resolve(params: &[ParamSpec]) -> CallShape {
    match params {
        [] => CallShape::Bald,
        [only] if only.name() == PAYLOAD_PARAM => CallShape::Loaded,
        _ => CallShape::Unpacked,
    }
}

/// Resolve one value per declared parameter for an unpacked invocation, in
/// declaration order: payload key, then declared default, then `Value::Null`
/// for nullable parameters. A required parameter with none of these is a
/// [`SignalError::MissingArgument`] naming the handler and the parameter.
pub(crate) fn bind(
    handler: &str,
    params: &[ParamSpec],
    payload: Option<&Payload>,
) -> Result<Vec<Value>> {
    params
        .iter()
        .map(|param| {
            if let Some(value) = payload.and_then(|entries| entries.get(param.name())) {
                return Ok(value.clone());
            }
            if let Some(default) = param.default() {
                return Ok(default.clone());
            }
            if param.is_nullable() {
                return Ok(Value::Null);
            }
            Err(SignalError::missing_argument(handler, param.name()))
        })
        .collect()
}
