//! # Signal Types and Records
//!
//! The data side of the dispatch core: statically declared signal types
//! forming a single-inheritance hierarchy, and immutable signal records
//! carrying named fields fixed at construction.
//!
//! ## Overview
//!
//! A [`SignalType`] is declared once as a `static` and related to its parent
//! by reference, which gives every concrete type a precomputed ancestor chain
//! that [`emit`](crate::hub::SignalHub::emit) walks from most-derived to root.
//! Type identity is pointer identity: two `static` declarations are two
//! distinct types even if they share a name.
//!
//! ## Usage
//!
//! ```rust
//! use signal_hub::{Signal, SignalType};
//!
//! static SIGNAL: SignalType = SignalType::root("signal");
//! static NOTE: SignalType = SignalType::extends("note", &SIGNAL);
//!
//! let note = Signal::build(&NOTE).field("level", "warn").finish();
//! assert_eq!(note.field("level"), Some(&"warn".into()));
//! assert!(NOTE.descends_from(&SIGNAL));
//! ```

use std::fmt;
use std::hash::{Hash, Hasher};

use serde_json::{Map, Value};

/// Emit-time supplementary data, logically distinct from a signal's own
/// fields. Used to pass call-time extras without mutating the signal.
pub type Payload = Map<String, Value>;

/// Build a [`Payload`] from key/value pairs.
///
/// ```rust
/// let extras = signal_hub::payload([("flag", true)]);
/// assert_eq!(extras.get("flag"), Some(&true.into()));
/// ```
pub fn payload<I, K, V>(entries: I) -> Payload
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    entries
        .into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

/// A node in the signal type hierarchy.
///
/// Declared as `static` items; the parent link is what `emit` follows when
/// delivering to ancestor-type subscribers.
#[derive(Debug)]
pub struct SignalType {
    name: &'static str,
    parent: Option<&'static SignalType>,
}

impl SignalType {
    /// Declare a hierarchy root.
    pub const fn root(name: &'static str) -> Self {
        Self { name, parent: None }
    }

    /// Declare a type extending `parent`. A derived signal "is-a" instance of
    /// every type on its parent chain.
    pub const fn extends(name: &'static str, parent: &'static SignalType) -> Self {
        Self {
            name,
            parent: Some(parent),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn parent(&'static self) -> Option<&'static SignalType> {
        self.parent
    }

    /// The dispatch hierarchy: this type first, then each parent up to the
    /// root. Delivery order follows this chain.
    pub fn ancestors(&'static self) -> Ancestors {
        Ancestors { next: Some(self) }
    }

    /// Whether `ancestor` appears on this type's parent chain (inclusive).
    pub fn descends_from(&'static self, ancestor: &'static SignalType) -> bool {
        self.ancestors().any(|ty| std::ptr::eq(ty, ancestor))
    }
}

// Identity semantics: a type is equal only to itself. Keeps registry buckets
// keyed on the declaration, not the name.
impl PartialEq for SignalType {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self, other)
    }
}

impl Eq for SignalType {}

impl Hash for SignalType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as *const SignalType as usize).hash(state);
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Iterator over a type's dispatch hierarchy, most-derived first.
pub struct Ancestors {
    next: Option<&'static SignalType>,
}

impl Iterator for Ancestors {
    type Item = &'static SignalType;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = current.parent;
        Some(current)
    }
}

/// An immutable event record: an instance of a [`SignalType`] with named
/// fields fixed at construction.
#[derive(Debug, Clone)]
pub struct Signal {
    ty: &'static SignalType,
    fields: Map<String, Value>,
}

impl Signal {
    /// Create a signal with no fields.
    pub fn new(ty: &'static SignalType) -> Self {
        Self {
            ty,
            fields: Map::new(),
        }
    }

    /// Start building a signal with fields.
    pub fn build(ty: &'static SignalType) -> SignalBuilder {
        SignalBuilder {
            ty,
            fields: Map::new(),
        }
    }

    pub fn signal_type(&self) -> &'static SignalType {
        self.ty
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

/// Builder for [`Signal`] records. Fields cannot change after `finish`.
pub struct SignalBuilder {
    ty: &'static SignalType,
    fields: Map<String, Value>,
}

impl SignalBuilder {
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn finish(self) -> Signal {
        Signal {
            ty: self.ty,
            fields: self.fields,
        }
    }
}
