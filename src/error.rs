//! # Signal Error Types
//!
//! Structured error handling for the dispatch core using thiserror. Every
//! failure surfaces to the immediate caller of `emit`/`subscribe`/`override`;
//! nothing is swallowed internally.

use thiserror::Error;

use crate::handler::CallShape;

/// Errors surfaced by the dispatch core.
#[derive(Debug, Error)]
pub enum SignalError {
    /// An unpacked handler declared a required parameter that the emission's
    /// payload does not provide, with no declared default and no nullable
    /// annotation.
    #[error("missing required payload key '{param}' for handler '{handler}'")]
    MissingArgument { handler: String, param: String },

    /// A handler was invoked under a calling convention its call surface does
    /// not implement. The parameter descriptors attached to a handler decide
    /// its convention, so this can only be reached by constructing a raw
    /// [`Handler`](crate::handler::Handler) whose closure disagrees with its
    /// own descriptors.
    #[error("handler '{handler}' does not implement the {shape} calling convention")]
    ConventionMismatch { handler: String, shape: CallShape },

    /// A handler body failed. The underlying error is carried as-is and
    /// rendered verbatim; delivery to the remaining subscriptions of that
    /// emission is aborted.
    #[error("{0}")]
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl SignalError {
    /// Create a missing-argument error
    pub fn missing_argument(handler: impl Into<String>, param: impl Into<String>) -> Self {
        Self::MissingArgument {
            handler: handler.into(),
            param: param.into(),
        }
    }

    /// Create a convention-mismatch error
    pub fn convention_mismatch(handler: impl Into<String>, shape: CallShape) -> Self {
        Self::ConventionMismatch {
            handler: handler.into(),
            shape,
        }
    }

    /// Wrap a handler-body failure
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(err.into())
    }

    /// The underlying handler failure, if this error came out of a handler body
    pub fn handler_failure(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Handler(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SignalError>;
