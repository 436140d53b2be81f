#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Signal Hub
//!
//! Typed, hierarchical, in-process publish/subscribe: signal records are
//! emitted and delivered to handlers registered against the signal's type and
//! against any ancestor type in its single-inheritance hierarchy.
//!
//! ## Overview
//!
//! The crate is built around four pieces:
//!
//! - [`SignalType`] / [`Signal`] — statically declared event types forming a
//!   hierarchy, and immutable record instances with fields fixed at
//!   construction.
//! - [`Handler`] / [`ParamSpec`] — named, shareable callables with explicit
//!   parameter descriptors. A one-time resolver classifies each handler into
//!   one of three calling conventions ([`CallShape`]): bald (signal only),
//!   loaded (signal plus raw payload mapping), or unpacked (signal plus one
//!   bound value per declared parameter).
//! - [`SignalHub`] — the registry and dispatcher: subscribe (with filters and
//!   one-shot subscriptions), unsubscribe, and emit with exactly-once
//!   delivery per handler per emission.
//! - Override stack — temporary in-place handler replacement with strict LIFO
//!   restoration, usable as a scope-bound guard ([`OverrideGuard`]).
//!
//! ## Module Organization
//!
//! - [`signal`] - Signal types, records, payload mapping
//! - [`handler`] - Handlers, parameter descriptors, call-shape resolution
//! - [`hub`] - Registry, dispatcher, subscriptions, overrides
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use signal_hub::{Handler, Signal, SignalHub, SignalType};
//!
//! static SIGNAL: SignalType = SignalType::root("signal");
//! static DEPLOY_FINISHED: SignalType = SignalType::extends("deploy_finished", &SIGNAL);
//!
//! # fn main() -> Result<(), signal_hub::SignalError> {
//! let hub = SignalHub::new();
//! let count = Arc::new(AtomicUsize::new(0));
//!
//! // A subscriber on the root sees every emission in the hierarchy.
//! let seen = count.clone();
//! hub.subscribe(
//!     &SIGNAL,
//!     Handler::bald("audit", move |_signal| {
//!         seen.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }),
//! );
//!
//! let deploy = Signal::build(&DEPLOY_FINISHED).field("env", "prod").finish();
//! hub.emit(&deploy, None)?;
//! assert_eq!(count.load(Ordering::SeqCst), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Dispatch Semantics
//!
//! Delivery order is hierarchy order (most-derived type first) in the outer
//! loop and registration order within one level; there are no priorities. A
//! handler is invoked at most once per emission even when reachable through
//! several hierarchy levels. Dispatch is synchronous and direct-call: every
//! handler runs to completion before the next, and a failing handler aborts
//! the remainder of its emission.

pub mod error;
pub mod handler;
pub mod hub;
pub mod signal;

pub use error::{Result, SignalError};
pub use handler::{CallArgs, CallShape, Handler, HandlerResult, ParamSpec};
pub use hub::{
    FilterFn, HubStats, OverrideGuard, SignalHub, Subscribe, SubscriptionDetail, SubscriptionId,
};
pub use signal::{payload, Payload, Signal, SignalBuilder, SignalType};
