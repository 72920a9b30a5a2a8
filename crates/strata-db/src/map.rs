//! The dataset map: every dataset head the store currently knows about.
//!
//! The map is persisted as a single struct value whose hash **is** the
//! store root. It is never mutated in place: advancing any dataset builds a
//! new map, writes it, and installs it with one root CAS.

use std::collections::BTreeMap;

use strata_types::Hash;
use strata_value::{Ref, StructValue, TypeTag, Value};

use crate::error::{DbError, DbResult};

/// Struct name under which the map is encoded.
pub const DATASET_MAP_STRUCT: &str = "DatasetMap";

/// Mapping from dataset name to head commit ref.
///
/// Keys are validated dataset names, so they are always safe as struct
/// field names in the encoded form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DatasetMap {
    entries: BTreeMap<String, Ref>,
}

impl DatasetMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// The head ref for `name`, if the dataset exists.
    pub fn get(&self, name: &str) -> Option<&Ref> {
        self.entries.get(name)
    }

    /// Point `name` at a new head commit.
    pub fn set(&mut self, name: impl Into<String>, head: Ref) {
        self.entries.insert(name.into(), head);
    }

    /// Remove `name`, returning its previous head if it existed.
    pub fn remove(&mut self, name: &str) -> Option<Ref> {
        self.entries.remove(name)
    }

    /// Number of datasets in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no datasets exist.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Ref)> {
        self.entries.iter()
    }

    /// Encode as the canonical struct value whose hash is the store root.
    pub fn to_value(&self) -> Value {
        let mut s = StructValue::new(DATASET_MAP_STRUCT);
        for (name, head) in &self.entries {
            s.set(name.clone(), Value::Ref(head.clone()));
        }
        Value::Struct(s)
    }

    /// Decode from a stored struct value. `hash` is only used for error
    /// reporting.
    pub fn from_value(hash: Hash, value: &Value) -> DbResult<Self> {
        let s = value
            .as_struct()
            .filter(|s| s.name() == DATASET_MAP_STRUCT)
            .ok_or_else(|| DbError::CorruptValue {
                hash,
                reason: format!("expected {DATASET_MAP_STRUCT}, found {}", value.type_tag()),
            })?;

        let mut entries = BTreeMap::new();
        for (name, field) in s.fields() {
            let head = field.as_ref_value().ok_or_else(|| DbError::CorruptValue {
                hash,
                reason: format!("dataset {name:?} maps to {}, expected a ref", field.type_tag()),
            })?;
            if !matches!(head.tag(), TypeTag::Struct(n) if n == crate::commit::COMMIT_STRUCT) {
                return Err(DbError::CorruptValue {
                    hash,
                    reason: format!("dataset {name:?} head ref targets {}", head.tag()),
                });
            }
            entries.insert(name.clone(), head.clone());
        }
        Ok(Self { entries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_types::HASH_LEN;

    fn commit_ref(b: u8) -> Ref {
        Ref::new(
            Hash::from_digest([b; HASH_LEN]),
            TypeTag::Struct(crate::commit::COMMIT_STRUCT.to_string()),
        )
    }

    #[test]
    fn set_get_remove() {
        let mut map = DatasetMap::new();
        assert!(map.get("ds").is_none());

        map.set("ds", commit_ref(1));
        assert_eq!(map.get("ds"), Some(&commit_ref(1)));
        assert_eq!(map.len(), 1);

        assert_eq!(map.remove("ds"), Some(commit_ref(1)));
        assert!(map.is_empty());
    }

    #[test]
    fn value_roundtrip() {
        let mut map = DatasetMap::new();
        map.set("alpha", commit_ref(1));
        map.set("beta/nested", commit_ref(2));

        let value = map.to_value();
        let back = DatasetMap::from_value(Hash::ZERO, &value).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn empty_map_roundtrip() {
        let map = DatasetMap::new();
        let back = DatasetMap::from_value(Hash::ZERO, &map.to_value()).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn from_value_rejects_wrong_struct() {
        let wrong = Value::Struct(StructValue::new("SomethingElse"));
        let err = DatasetMap::from_value(Hash::ZERO, &wrong).unwrap_err();
        assert!(matches!(err, DbError::CorruptValue { .. }));
    }

    #[test]
    fn from_value_rejects_non_ref_entry() {
        let bad = Value::Struct(
            StructValue::new(DATASET_MAP_STRUCT).with_field("ds", Value::from("not a ref")),
        );
        let err = DatasetMap::from_value(Hash::ZERO, &bad).unwrap_err();
        assert!(matches!(err, DbError::CorruptValue { .. }));
    }

    #[test]
    fn from_value_rejects_non_commit_target() {
        let bad = Value::Struct(StructValue::new(DATASET_MAP_STRUCT).with_field(
            "ds",
            Value::Ref(Ref::new(Hash::from_digest([7; HASH_LEN]), TypeTag::String)),
        ));
        let err = DatasetMap::from_value(Hash::ZERO, &bad).unwrap_err();
        assert!(matches!(err, DbError::CorruptValue { .. }));
    }
}
