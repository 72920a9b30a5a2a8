use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use strata_types::Hash;

/// The type of a value, carried by refs so a pointer knows what it targets.
///
/// Struct tags include the struct name: a `Commit` and a `DatasetMap` with
/// coincidentally equal fields can never be confused through a ref.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeTag {
    String,
    U64,
    Ref,
    RefSet,
    Struct(String),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => write!(f, "string"),
            Self::U64 => write!(f, "u64"),
            Self::Ref => write!(f, "ref"),
            Self::RefSet => write!(f, "refset"),
            Self::Struct(name) => write!(f, "struct {name}"),
        }
    }
}

/// A typed pointer-by-hash to a value.
///
/// Refs address a value without embedding it. The tag records the target's
/// type so readers can verify what they load.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ref {
    target: Hash,
    tag: TypeTag,
}

impl Ref {
    /// Create a ref to `target` with the given type tag.
    pub fn new(target: Hash, tag: TypeTag) -> Self {
        Self { target, tag }
    }

    /// The hash of the referenced value.
    pub fn target(&self) -> Hash {
        self.target
    }

    /// The type of the referenced value.
    pub fn tag(&self) -> &TypeTag {
        &self.tag
    }
}

/// A set of refs with canonical (hash-sorted, deduplicated) order.
///
/// Insertion order is never observable: however a set was built, equal sets
/// serialize identically and therefore hash identically. Refs are
/// deduplicated by target hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefSet(Vec<Ref>);

impl RefSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from refs, canonicalizing order and dropping duplicates.
    pub fn from_refs(refs: impl IntoIterator<Item = Ref>) -> Self {
        let mut set = Self::new();
        for r in refs {
            set.insert(r);
        }
        set
    }

    /// Insert a ref. Returns `false` if a ref with the same target hash was
    /// already present.
    pub fn insert(&mut self, r: Ref) -> bool {
        match self.0.binary_search_by(|probe| probe.target().cmp(&r.target())) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, r);
                true
            }
        }
    }

    /// Returns `true` if the set contains a ref to `target`.
    pub fn contains_target(&self, target: Hash) -> bool {
        self.0
            .binary_search_by(|probe| probe.target().cmp(&target))
            .is_ok()
    }

    /// Number of refs in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate refs in canonical (hash-sorted) order.
    pub fn iter(&self) -> impl Iterator<Item = &Ref> {
        self.0.iter()
    }

    /// The ref at canonical position `i`, if any.
    pub fn get(&self, i: usize) -> Option<&Ref> {
        self.0.get(i)
    }
}

impl FromIterator<Ref> for RefSet {
    fn from_iter<I: IntoIterator<Item = Ref>>(iter: I) -> Self {
        Self::from_refs(iter)
    }
}

impl<'a> IntoIterator for &'a RefSet {
    type Item = &'a Ref;
    type IntoIter = std::slice::Iter<'a, Ref>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A struct value: a name plus named fields in canonical (sorted) order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructValue {
    name: String,
    fields: BTreeMap<String, Value>,
}

impl StructValue {
    /// Create an empty struct with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field insertion.
    pub fn with_field(mut self, name: impl Into<String>, value: Value) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    /// Set a field, replacing any previous value under that name.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Look up a field by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// The struct's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Iterate fields in canonical (name-sorted) order.
    pub fn fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if the struct has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A typed, structurally recursive datum.
///
/// Every value has a canonical serialization and therefore a stable hash.
/// The `U64` variant is the extensibility envelope the core needs for
/// commit timestamps; user structs compose the rest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Value {
    String(String),
    U64(u64),
    Ref(Ref),
    RefSet(RefSet),
    Struct(StructValue),
}

impl Value {
    /// The type tag for this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::String(_) => TypeTag::String,
            Self::U64(_) => TypeTag::U64,
            Self::Ref(_) => TypeTag::Ref,
            Self::RefSet(_) => TypeTag::RefSet,
            Self::Struct(s) => TypeTag::Struct(s.name().to_string()),
        }
    }

    /// The string payload, if this is a string value.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The integer payload, if this is a `U64` value.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::U64(n) => Some(*n),
            _ => None,
        }
    }

    /// The ref payload, if this is a ref value.
    pub fn as_ref_value(&self) -> Option<&Ref> {
        match self {
            Self::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// The set payload, if this is a ref-set value.
    pub fn as_ref_set(&self) -> Option<&RefSet> {
        match self {
            Self::RefSet(s) => Some(s),
            _ => None,
        }
    }

    /// The struct payload, if this is a struct value.
    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Self::Struct(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::U64(n)
    }
}
