//! # Signal Hub
//!
//! The dispatch core: owns the per-type subscription registry and override
//! stacks, and delivers emitted signals to every eligible subscription exactly
//! once.
//!
//! ## Overview
//!
//! Emission walks the signal's dispatch hierarchy from most-derived type to
//! root. At each level the current bucket is snapshotted under the hub's
//! mutex, then handlers run outside the lock, so a handler may re-enter the
//! hub (subscribe, unsubscribe, even emit) without deadlocking. A per-emission
//! seen-set keyed on handler identity prevents double delivery to a handler
//! reachable through more than one hierarchy level.
//!
//! Delivery order is the full ordering contract: hierarchy order in the outer
//! loop (derived before base), registration order within one level. A handler
//! that fails aborts the remainder of that emission; callers needing isolation
//! from a misbehaving handler must catch at the `emit` call site.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use signal_hub::{Handler, Signal, SignalHub, SignalType};
//!
//! static SIGNAL: SignalType = SignalType::root("signal");
//! static NOTE: SignalType = SignalType::extends("note", &SIGNAL);
//!
//! # fn main() -> Result<(), signal_hub::SignalError> {
//! let hub = SignalHub::new();
//! let warnings = Arc::new(AtomicUsize::new(0));
//!
//! let counter = warnings.clone();
//! hub.subscription(
//!     &NOTE,
//!     Handler::bald("count_warnings", move |_signal| {
//!         counter.fetch_add(1, Ordering::SeqCst);
//!         Ok(())
//!     }),
//! )
//! .filter(|signal, _payload| signal.field("level") == Some(&"warn".into()))
//! .register();
//!
//! hub.emit(&Signal::build(&NOTE).field("level", "info").finish(), None)?;
//! hub.emit(&Signal::build(&NOTE).field("level", "warn").finish(), None)?;
//! assert_eq!(warnings.load(Ordering::SeqCst), 1);
//! # Ok(())
//! # }
//! ```

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use crate::error::Result;
use crate::handler::{shape, CallShape, Handler};
use crate::signal::{Payload, Signal, SignalType};

mod registry;
mod subscription;

pub use subscription::{FilterFn, Subscription, SubscriptionId};

use registry::RegistryState;

/// The process-local (or explicitly scoped) signal dispatcher.
///
/// Hubs are plain values: construct one per process, per test, or per request,
/// whichever scope needs isolation. All registry mutation and snapshotting is
/// guarded by a single mutex; handler invocation happens outside it.
pub struct SignalHub {
    state: Mutex<RegistryState>,
    emissions: AtomicU64,
    deliveries: AtomicU64,
}

impl SignalHub {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            emissions: AtomicU64::new(0),
            deliveries: AtomicU64::new(0),
        }
    }

    /// Idempotently create the bucket for a signal type.
    ///
    /// Buckets are also created lazily on first subscribe or override, so
    /// calling this is only needed when an empty bucket should be observable
    /// before first use.
    pub fn declare(&self, ty: &'static SignalType) {
        self.state.lock().ensure(ty);
    }

    /// Register a handler with the default always-true filter, firing on every
    /// matching emission. Returns the subscription's opaque id.
    pub fn subscribe(&self, ty: &'static SignalType, handler: Arc<Handler>) -> SubscriptionId {
        self.subscription(ty, handler).register()
    }

    /// Start a subscription with options: `.filter(..)` and `.once()`.
    #[must_use = "call register() to activate the subscription"]
    pub fn subscription(&self, ty: &'static SignalType, handler: Arc<Handler>) -> Subscribe<'_> {
        Subscribe {
            hub: self,
            ty,
            handler,
            filter: None,
            once: false,
        }
    }

    fn register(
        &self,
        ty: &'static SignalType,
        handler: Arc<Handler>,
        filter: FilterFn,
        once: bool,
    ) -> SubscriptionId {
        let resolved = shape::resolve(handler.params());
        let id = SubscriptionId::new();
        let subscription = Subscription {
            id,
            handler: handler.clone(),
            shape: resolved,
            filter,
            once,
            owner: ty,
            delivered: 0,
            last_delivered_at: None,
        };
        self.state.lock().add(ty, subscription);
        debug!(
            signal_type = ty.name(),
            handler = handler.name(),
            %id,
            shape = %resolved,
            once,
            "subscribed handler"
        );
        id
    }

    /// Remove a subscription. Idempotent: unknown or already-removed ids are
    /// ignored.
    pub fn unsubscribe(&self, ty: &'static SignalType, id: SubscriptionId) {
        let removed = self.state.lock().remove(ty, id);
        match removed {
            Some(subscription) => debug!(
                signal_type = ty.name(),
                handler = subscription.handler_name(),
                %id,
                "unsubscribed handler"
            ),
            None => trace!(signal_type = ty.name(), %id, "unsubscribe for unknown id ignored"),
        }
    }

    /// Temporarily replace a subscription's handler in place, pushing the
    /// previous handler onto the type's override stack. The new handler's
    /// calling convention is re-resolved from its own descriptors; id and
    /// filter are preserved. Unknown ids are ignored.
    pub fn override_handler(
        &self,
        ty: &'static SignalType,
        id: SubscriptionId,
        new_handler: Arc<Handler>,
    ) {
        let mut state = self.state.lock();
        let previous = match state.find_mut(ty, id) {
            Some(subscription) => {
                let resolved = shape::resolve(new_handler.params());
                subscription.shape = resolved;
                std::mem::replace(&mut subscription.handler, new_handler.clone())
            }
            None => {
                warn!(signal_type = ty.name(), %id, "override target not found; ignored");
                return;
            }
        };
        state.push_override(ty, id, previous);
        debug!(
            signal_type = ty.name(),
            %id,
            handler = new_handler.name(),
            "handler overridden"
        );
    }

    /// Pop the type's most recent override and restore that subscription's
    /// handler and convention. A no-op when the stack is empty; when the
    /// target subscription has since been removed, the stack entry is still
    /// popped so nesting depth stays consistent.
    pub fn revert_last(&self, ty: &'static SignalType) {
        let mut state = self.state.lock();
        let Some((id, previous)) = state.pop_override(ty) else {
            trace!(signal_type = ty.name(), "revert on empty override stack ignored");
            return;
        };
        match state.find_mut(ty, id) {
            Some(subscription) => {
                subscription.shape = shape::resolve(previous.params());
                subscription.handler = previous;
                debug!(signal_type = ty.name(), %id, "handler restored");
            }
            None => {
                debug!(
                    signal_type = ty.name(),
                    %id,
                    "override target already removed; entry dropped"
                );
            }
        }
    }

    /// Override with scope-bound restoration: the returned guard reverts the
    /// override when dropped, including during unwinding.
    #[must_use = "dropping the guard reverts the override"]
    pub fn scoped_override(
        &self,
        ty: &'static SignalType,
        id: SubscriptionId,
        new_handler: Arc<Handler>,
    ) -> OverrideGuard<'_> {
        self.override_handler(ty, id, new_handler);
        OverrideGuard { hub: self, ty }
    }

    /// Deliver a signal to every eligible subscription exactly once.
    ///
    /// Walks the dispatch hierarchy derived-to-base; within each level the
    /// bucket is visited in registration order, snapshotted at the start of
    /// the visit. A subscription added or removed by a handler during this
    /// emission becomes visible at the next level's snapshot at the earliest.
    ///
    /// Errors from a handler body propagate immediately, aborting delivery to
    /// the not-yet-visited subscriptions of this emission.
    pub fn emit(&self, signal: &Signal, payload: Option<&Payload>) -> Result<()> {
        self.emissions.fetch_add(1, Ordering::Relaxed);
        let mut seen: HashSet<usize> = HashSet::new();
        for ty in signal.signal_type().ancestors() {
            let snapshot = self.state.lock().snapshot(ty);
            for subscription in snapshot {
                if seen.contains(&subscription.identity()) {
                    continue;
                }
                if !subscription.passes_filter(signal, payload) {
                    continue;
                }
                seen.insert(subscription.identity());
                {
                    let mut state = self.state.lock();
                    if subscription.is_once() {
                        // Consumed by the delivery attempt, not by its outcome.
                        state.remove(ty, subscription.id());
                    } else if let Some(live) = state.find_mut(ty, subscription.id()) {
                        live.delivered += 1;
                        live.last_delivered_at = Some(Utc::now());
                    }
                }
                trace!(
                    signal = signal.signal_type().name(),
                    level = ty.name(),
                    handler = subscription.handler_name(),
                    "delivering signal"
                );
                self.deliveries.fetch_add(1, Ordering::Relaxed);
                if let Err(err) = subscription
                    .handler
                    .invoke(subscription.shape(), signal, payload)
                {
                    error!(
                        signal = signal.signal_type().name(),
                        handler = subscription.handler_name(),
                        %err,
                        "handler failed; aborting emission"
                    );
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Number of active subscriptions registered directly against a type.
    pub fn subscription_count(&self, ty: &'static SignalType) -> usize {
        self.state
            .lock()
            .bucket(ty)
            .map(|bucket| bucket.subscriptions.len())
            .unwrap_or(0)
    }

    /// Depth of a type's override stack.
    pub fn override_depth(&self, ty: &'static SignalType) -> usize {
        self.state
            .lock()
            .bucket(ty)
            .map(|bucket| bucket.overrides.len())
            .unwrap_or(0)
    }

    /// Snapshot of hub activity and per-subscription delivery counters.
    pub fn stats(&self) -> HubStats {
        let state = self.state.lock();
        let mut details: Vec<SubscriptionDetail> = Vec::new();
        let mut total = 0;
        for ty in state.types() {
            let subscriptions = state.snapshot(ty);
            total += subscriptions.len();
            for subscription in subscriptions {
                details.push(SubscriptionDetail {
                    id: subscription.id(),
                    signal_type: subscription.owner().name(),
                    handler: subscription.handler_name().to_string(),
                    shape: subscription.shape(),
                    once: subscription.is_once(),
                    delivered: subscription.delivered(),
                    last_delivered_at: subscription.last_delivered_at(),
                });
            }
        }
        details.sort_by(|a, b| {
            a.signal_type
                .cmp(b.signal_type)
                .then_with(|| a.handler.cmp(&b.handler))
        });
        HubStats {
            emissions: self.emissions.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            total_subscriptions: total,
            subscription_details: details,
        }
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Pending subscription with optional filter and once-flag.
#[must_use = "call register() to activate the subscription"]
pub struct Subscribe<'a> {
    hub: &'a SignalHub,
    ty: &'static SignalType,
    handler: Arc<Handler>,
    filter: Option<FilterFn>,
    once: bool,
}

impl Subscribe<'_> {
    /// Only deliver emissions for which the predicate returns true. A failing
    /// filter never affects other subscriptions' eligibility.
    pub fn filter(
        mut self,
        predicate: impl Fn(&Signal, Option<&Payload>) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Arc::new(predicate));
        self
    }

    /// Remove the subscription after its first delivered (filter-passing)
    /// invocation. A filtered-out attempt does not consume the flag.
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }

    /// Activate the subscription.
    pub fn register(self) -> SubscriptionId {
        let filter = self
            .filter
            .unwrap_or_else(|| Arc::new(|_: &Signal, _: Option<&Payload>| true));
        self.hub.register(self.ty, self.handler, filter, self.once)
    }
}

/// Reverts the matching override when dropped.
#[must_use = "dropping the guard reverts the override"]
pub struct OverrideGuard<'a> {
    hub: &'a SignalHub,
    ty: &'static SignalType,
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        self.hub.revert_last(self.ty);
    }
}

/// Hub activity counters, in the shape of a monitoring snapshot.
#[derive(Debug, Clone)]
pub struct HubStats {
    pub emissions: u64,
    pub deliveries: u64,
    pub total_subscriptions: usize,
    pub subscription_details: Vec<SubscriptionDetail>,
}

/// Per-subscription delivery counters.
#[derive(Debug, Clone)]
pub struct SubscriptionDetail {
    pub id: SubscriptionId,
    pub signal_type: &'static str,
    pub handler: String,
    pub shape: CallShape,
    pub once: bool,
    pub delivered: u64,
    pub last_delivered_at: Option<DateTime<Utc>>,
}
