//! # Handlers and Parameter Descriptors
//!
//! A [`Handler`] is a named, shareable callable plus the explicit parameter
//! descriptors the resolver classifies it by. Descriptors stand in for the
//! call-signature introspection a dynamic language would do: the registrant
//! states what the handler's parameters are, and
//! [`shape::resolve`](crate::handler::shape::resolve) turns that into a
//! calling convention exactly once, at subscribe or override time.
//!
//! Handlers are `Arc`-shared, and the `Arc` pointer is the handler's identity
//! for per-emission deduplication: cloning one handler into subscriptions at a
//! base and a derived type delivers once per emission, while two handlers
//! built from the same closure are distinct and both fire.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::{Result, SignalError};
use crate::signal::{Payload, Signal};

pub mod shape;

pub use shape::{resolve, CallShape, PAYLOAD_PARAM};

/// Outcome of one handler invocation.
pub type HandlerResult = Result<()>;

/// A declared handler parameter: name, optional default, optional nullability.
///
/// The descriptor equivalent of a parameter in a handler's signature,
/// excluding the signal itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    name: String,
    default: Option<Value>,
    nullable: bool,
}

impl ParamSpec {
    /// A parameter that must be present in the emission payload.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            nullable: false,
        }
    }

    /// A parameter with a declared default, used when the payload has no
    /// matching key.
    pub fn with_default(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(value.into()),
            nullable: false,
        }
    }

    /// A parameter whose declared type permits absence; it binds to
    /// `Value::Null` when the payload has no matching key.
    pub fn nullable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            nullable: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }
}

/// Arguments delivered to a handler's call surface, shaped by its resolved
/// calling convention.
pub enum CallArgs<'a> {
    /// Bald: nothing beyond the signal.
    Bare,
    /// Loaded: the raw payload mapping, unmodified.
    Payload(Option<&'a Payload>),
    /// Unpacked: one bound value per declared parameter, in declaration order.
    Bound(&'a [Value]),
}

impl CallArgs<'_> {
    /// The convention these arguments were built for.
    pub fn shape(&self) -> CallShape {
        match self {
            CallArgs::Bare => CallShape::Bald,
            CallArgs::Payload(_) => CallShape::Loaded,
            CallArgs::Bound(_) => CallShape::Unpacked,
        }
    }
}

type CallFn = Box<dyn Fn(&Signal, CallArgs<'_>) -> HandlerResult + Send + Sync>;

/// A registered callable: a diagnostic name, the declared parameter
/// descriptors, and the erased call surface.
pub struct Handler {
    name: String,
    params: Vec<ParamSpec>,
    call: CallFn,
}

impl Handler {
    /// Construct a handler from explicit descriptors and a raw call surface.
    ///
    /// The descriptors decide the calling convention; the closure must accept
    /// the [`CallArgs`] variant that convention produces. The convenience
    /// constructors [`bald`](Handler::bald), [`loaded`](Handler::loaded), and
    /// [`unpacked`](Handler::unpacked) keep descriptors and closure in
    /// agreement and should be preferred.
    pub fn new(
        name: impl Into<String>,
        params: Vec<ParamSpec>,
        call: impl Fn(&Signal, CallArgs<'_>) -> HandlerResult + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            params,
            call: Box::new(call),
        })
    }

    /// A handler that receives only the signal.
    pub fn bald(
        name: impl Into<String>,
        f: impl Fn(&Signal) -> HandlerResult + Send + Sync + 'static,
    ) -> Arc<Self> {
        Self::new(name, Vec::new(), move |signal, _args| f(signal))
    }

    /// A handler that receives the signal and the raw payload mapping.
    pub fn loaded(
        name: impl Into<String>,
        f: impl Fn(&Signal, Option<&Payload>) -> HandlerResult + Send + Sync + 'static,
    ) -> Arc<Self> {
        let name = name.into();
        let label = name.clone();
        Self::new(
            name,
            vec![ParamSpec::required(PAYLOAD_PARAM)],
            move |signal, args| match args {
                CallArgs::Payload(payload) => f(signal, payload),
                other => Err(SignalError::convention_mismatch(label.clone(), other.shape())),
            },
        )
    }

    /// A handler that receives the signal and one bound value per declared
    /// parameter.
    pub fn unpacked(
        name: impl Into<String>,
        params: Vec<ParamSpec>,
        f: impl Fn(&Signal, &[Value]) -> HandlerResult + Send + Sync + 'static,
    ) -> Arc<Self> {
        let name = name.into();
        let label = name.clone();
        Self::new(name, params, move |signal, args| match args {
            CallArgs::Bound(values) => f(signal, values),
            other => Err(SignalError::convention_mismatch(label.clone(), other.shape())),
        })
    }

    /// Diagnostic name, used in error messages and logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter descriptors, excluding the signal itself.
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Invoke under the given convention, building arguments from the payload.
    pub(crate) fn invoke(
        &self,
        shape: CallShape,
        signal: &Signal,
        payload: Option<&Payload>,
    ) -> Result<()> {
        match shape {
            CallShape::Bald => (self.call)(signal, CallArgs::Bare),
            CallShape::Loaded => (self.call)(signal, CallArgs::Payload(payload)),
            CallShape::Unpacked => {
                let bound = shape::bind(&self.name, &self.params, payload)?;
                (self.call)(signal, CallArgs::Bound(&bound))
            }
        }
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("call", &"<dyn Fn>")
            .finish()
    }
}
