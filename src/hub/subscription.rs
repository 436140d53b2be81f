//! Subscription records: a registered handler bound to its resolved calling
//! convention, a filter predicate, a once-flag, and the owning signal type.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::handler::{CallShape, Handler};
use crate::signal::{Payload, Signal, SignalType};

/// Opaque subscription token, globally unique for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Eligibility predicate evaluated per emission with the signal and payload.
pub type FilterFn = Arc<dyn Fn(&Signal, Option<&Payload>) -> bool + Send + Sync>;

/// A registered handler and its delivery settings. Belongs to exactly one
/// signal type's bucket; reachable during emission of that type and all its
/// descendants.
#[derive(Clone)]
pub struct Subscription {
    pub(crate) id: SubscriptionId,
    pub(crate) handler: Arc<Handler>,
    pub(crate) shape: CallShape,
    pub(crate) filter: FilterFn,
    pub(crate) once: bool,
    pub(crate) owner: &'static SignalType,
    pub(crate) delivered: u64,
    pub(crate) last_delivered_at: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn handler_name(&self) -> &str {
        self.handler.name()
    }

    pub fn shape(&self) -> CallShape {
        self.shape
    }

    pub fn is_once(&self) -> bool {
        self.once
    }

    pub fn owner(&self) -> &'static SignalType {
        self.owner
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn last_delivered_at(&self) -> Option<DateTime<Utc>> {
        self.last_delivered_at
    }

    pub(crate) fn passes_filter(&self, signal: &Signal, payload: Option<&Payload>) -> bool {
        (self.filter)(signal, payload)
    }

    /// Handler identity for per-emission deduplication.
    pub(crate) fn identity(&self) -> usize {
        Arc::as_ptr(&self.handler) as usize
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("handler", &self.handler.name())
            .field("shape", &self.shape)
            .field("filter", &"<dyn Fn>")
            .field("once", &self.once)
            .field("owner", &self.owner.name())
            .field("delivered", &self.delivered)
            .field("last_delivered_at", &self.last_delivered_at)
            .finish()
    }
}
