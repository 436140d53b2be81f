//! Per-type subscription buckets and override stacks.
//!
//! Pure storage: every operation here runs under the hub's mutex. Ordering is
//! FIFO registration order within a bucket, which is the delivery order within
//! one hierarchy level.

use std::collections::HashMap;
use std::sync::Arc;

use crate::handler::Handler;
use crate::signal::SignalType;

use super::subscription::{Subscription, SubscriptionId};

/// One signal type's mutable state: active subscriptions in registration
/// order, plus the stack of overridden handlers for nested scoped overrides.
#[derive(Debug, Default)]
pub(crate) struct TypeBucket {
    pub(crate) subscriptions: Vec<Subscription>,
    pub(crate) overrides: Vec<(SubscriptionId, Arc<Handler>)>,
}

/// Mapping from signal type to its bucket, keyed on type identity.
#[derive(Debug, Default)]
pub(crate) struct RegistryState {
    buckets: HashMap<&'static SignalType, TypeBucket>,
}

impl RegistryState {
    /// Idempotently create the bucket for a type.
    pub(crate) fn ensure(&mut self, ty: &'static SignalType) -> &mut TypeBucket {
        self.buckets.entry(ty).or_default()
    }

    pub(crate) fn bucket(&self, ty: &'static SignalType) -> Option<&TypeBucket> {
        self.buckets.get(ty)
    }

    /// Every type with a bucket, in no particular order.
    pub(crate) fn types(&self) -> impl Iterator<Item = &'static SignalType> + '_ {
        self.buckets.keys().copied()
    }

    /// Append a subscription. Identical callables registered twice stay as two
    /// independent subscriptions.
    pub(crate) fn add(&mut self, ty: &'static SignalType, subscription: Subscription) {
        self.ensure(ty).subscriptions.push(subscription);
    }

    /// Remove the first subscription with a matching id. `None` when absent;
    /// unsubscribing an unknown or already-removed id is not an error.
    pub(crate) fn remove(
        &mut self,
        ty: &'static SignalType,
        id: SubscriptionId,
    ) -> Option<Subscription> {
        let bucket = self.buckets.get_mut(ty)?;
        let index = bucket.subscriptions.iter().position(|sub| sub.id == id)?;
        Some(bucket.subscriptions.remove(index))
    }

    pub(crate) fn find_mut(
        &mut self,
        ty: &'static SignalType,
        id: SubscriptionId,
    ) -> Option<&mut Subscription> {
        self.buckets
            .get_mut(ty)?
            .subscriptions
            .iter_mut()
            .find(|sub| sub.id == id)
    }

    pub(crate) fn push_override(
        &mut self,
        ty: &'static SignalType,
        id: SubscriptionId,
        previous: Arc<Handler>,
    ) {
        self.ensure(ty).overrides.push((id, previous));
    }

    pub(crate) fn pop_override(
        &mut self,
        ty: &'static SignalType,
    ) -> Option<(SubscriptionId, Arc<Handler>)> {
        self.buckets.get_mut(ty)?.overrides.pop()
    }

    /// Clone the bucket's subscription list for lock-free iteration. Cheap:
    /// handlers and filters are `Arc`-shared.
    pub(crate) fn snapshot(&self, ty: &'static SignalType) -> Vec<Subscription> {
        self.buckets
            .get(ty)
            .map(|bucket| bucket.subscriptions.clone())
            .unwrap_or_default()
    }
}
