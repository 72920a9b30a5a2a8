//! The immutable commit object: a node in the history DAG.
//!
//! A commit records a payload value ref, a set of parent commit refs, and
//! metadata. Its hash is a pure function of those three, so parents form a
//! Merkle DAG: a cycle is unreachable by construction because a parent's
//! hash cannot depend on its child.

use std::collections::BTreeMap;

use strata_chunks::ChunkStore;
use strata_types::{Hash, Timestamp};
use strata_value::{Codec, Ref, RefSet, StructValue, TypeTag, Value};

use crate::error::{DbError, DbResult};

/// Struct name under which commits are encoded.
pub const COMMIT_STRUCT: &str = "Commit";

const META_STRUCT: &str = "CommitMeta";
const EXTRAS_STRUCT: &str = "Extras";

/// Commit metadata: author identity, message, and timestamps.
///
/// Metadata participates in the commit's hash: two commits differing only
/// in message or timestamp are distinct commits.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitMeta {
    pub name: String,
    pub email: String,
    pub message: String,
    /// The caller-supplied commit time; drives history ordering.
    pub user_timestamp: Timestamp,
    /// The wall-clock time the commit was composed.
    pub system_timestamp: Timestamp,
    /// Optional free-form key/value extras.
    pub extras: BTreeMap<String, String>,
}

impl CommitMeta {
    /// Metadata stamped with the current wall-clock time for both
    /// timestamps.
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            name: name.into(),
            email: email.into(),
            message: message.into(),
            user_timestamp: now,
            system_timestamp: now,
            extras: BTreeMap::new(),
        }
    }

    /// Metadata with an explicit user timestamp; the system timestamp is
    /// still the current wall-clock time.
    pub fn with_user_timestamp(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
        date: Timestamp,
    ) -> Self {
        Self {
            user_timestamp: date,
            ..Self::new(name, email, message)
        }
    }

    fn to_value(&self) -> Value {
        let mut extras = StructValue::new(EXTRAS_STRUCT);
        for (k, v) in &self.extras {
            extras.set(k.clone(), Value::from(v.clone()));
        }
        Value::Struct(
            StructValue::new(META_STRUCT)
                .with_field("name", Value::from(self.name.clone()))
                .with_field("email", Value::from(self.email.clone()))
                .with_field("message", Value::from(self.message.clone()))
                .with_field("user_timestamp", Value::U64(self.user_timestamp.as_millis()))
                .with_field(
                    "system_timestamp",
                    Value::U64(self.system_timestamp.as_millis()),
                )
                .with_field("extras", Value::Struct(extras)),
        )
    }

    fn from_value(hash: Hash, value: &Value) -> DbResult<Self> {
        let s = expect_struct(hash, value, META_STRUCT)?;
        let mut extras = BTreeMap::new();
        for (k, v) in expect_struct(hash, field(hash, s, "extras")?, EXTRAS_STRUCT)?.fields() {
            let v = v.as_string().ok_or_else(|| DbError::CorruptValue {
                hash,
                reason: format!("extra {k:?} is not a string"),
            })?;
            extras.insert(k.clone(), v.to_string());
        }
        Ok(Self {
            name: string_field(hash, s, "name")?,
            email: string_field(hash, s, "email")?,
            message: string_field(hash, s, "message")?,
            user_timestamp: Timestamp::from_millis(u64_field(hash, s, "user_timestamp")?),
            system_timestamp: Timestamp::from_millis(u64_field(hash, s, "system_timestamp")?),
            extras,
        })
    }
}

/// An immutable (value, parent-set, meta) record.
///
/// Parents are kept in canonical hash-sorted order; the order they were
/// supplied in is not part of the commit's identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    value_ref: Ref,
    parents: Vec<Ref>,
    meta: CommitMeta,
    address: Hash,
}

impl Commit {
    /// Compose a commit and write it through the codec, returning the
    /// durable commit with its address.
    pub fn write(
        codec: &Codec,
        store: &dyn ChunkStore,
        value_ref: Ref,
        parents: RefSet,
        meta: CommitMeta,
    ) -> DbResult<Self> {
        let value = Self::compose(&value_ref, &parents, &meta);
        let self_ref = codec.write(&value, store)?;
        Ok(Self {
            value_ref,
            parents: parents.iter().cloned().collect(),
            meta,
            address: self_ref.target(),
        })
    }

    /// Decode a commit from its stored value. `address` is the hash the
    /// value was read at.
    pub fn from_value(address: Hash, value: &Value) -> DbResult<Self> {
        let s = expect_struct(address, value, COMMIT_STRUCT)?;

        let value_ref = field(address, s, "value")?
            .as_ref_value()
            .ok_or_else(|| DbError::CorruptValue {
                hash: address,
                reason: "value field is not a ref".to_string(),
            })?
            .clone();

        let parents = field(address, s, "parents")?
            .as_ref_set()
            .ok_or_else(|| DbError::CorruptValue {
                hash: address,
                reason: "parents field is not a ref set".to_string(),
            })?;

        let meta = CommitMeta::from_value(address, field(address, s, "meta")?)?;

        Ok(Self {
            value_ref,
            parents: parents.iter().cloned().collect(),
            meta,
            address,
        })
    }

    fn compose(value_ref: &Ref, parents: &RefSet, meta: &CommitMeta) -> Value {
        Value::Struct(
            StructValue::new(COMMIT_STRUCT)
                .with_field("value", Value::Ref(value_ref.clone()))
                .with_field("parents", Value::RefSet(parents.clone()))
                .with_field("meta", meta.to_value()),
        )
    }

    /// Number of parents: 0 for a root commit, 1 for linear history, ≥2
    /// for a merge.
    pub fn num_parents(&self) -> usize {
        self.parents.len()
    }

    /// The parent at canonical (hash-sorted) position `i`.
    pub fn parent(&self, i: usize) -> Option<&Ref> {
        self.parents.get(i)
    }

    /// All parents in canonical order.
    pub fn parents(&self) -> &[Ref] {
        &self.parents
    }

    /// The commit metadata.
    pub fn meta(&self) -> &CommitMeta {
        &self.meta
    }

    /// Ref to the payload value.
    pub fn value_ref(&self) -> &Ref {
        &self.value_ref
    }

    /// The commit's content address.
    pub fn address(&self) -> Hash {
        self.address
    }

    /// Typed ref to this commit.
    pub fn commit_ref(&self) -> Ref {
        Ref::new(self.address, TypeTag::Struct(COMMIT_STRUCT.to_string()))
    }
}

fn expect_struct<'a>(hash: Hash, value: &'a Value, name: &str) -> DbResult<&'a StructValue> {
    value
        .as_struct()
        .filter(|s| s.name() == name)
        .ok_or_else(|| DbError::CorruptValue {
            hash,
            reason: format!("expected {name}, found {}", value.type_tag()),
        })
}

fn field<'a>(hash: Hash, s: &'a StructValue, name: &str) -> DbResult<&'a Value> {
    s.get(name).ok_or_else(|| DbError::CorruptValue {
        hash,
        reason: format!("missing field {name:?}"),
    })
}

fn string_field(hash: Hash, s: &StructValue, name: &str) -> DbResult<String> {
    field(hash, s, name)?
        .as_string()
        .map(str::to_string)
        .ok_or_else(|| DbError::CorruptValue {
            hash,
            reason: format!("field {name:?} is not a string"),
        })
}

fn u64_field(hash: Hash, s: &StructValue, name: &str) -> DbResult<u64> {
    field(hash, s, name)?
        .as_u64()
        .ok_or_else(|| DbError::CorruptValue {
            hash,
            reason: format!("field {name:?} is not a u64"),
        })
}
