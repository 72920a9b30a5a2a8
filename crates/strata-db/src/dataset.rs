//! Dataset handles: immutable snapshots of "what the database said this
//! dataset's head was when I asked".
//!
//! Handles own nothing and can be freely cloned and discarded. They are
//! never mutated in place: every successful commit returns a fresh handle,
//! and a handle keeps reporting the head it observed even if a winning
//! commit has since raced ahead.

use crate::commit::Commit;
use strata_value::{Ref, Value};

#[derive(Clone, Debug)]
struct Head {
    commit: Commit,
    value: Value,
}

/// A named reference to a commit at a point in time.
///
/// Accessing the head of a headless handle (`head`, `head_value`,
/// `head_ref`) is a programmer error and panics; the `maybe_` variants are
/// the checked forms.
#[derive(Clone, Debug)]
pub struct Dataset {
    name: String,
    head: Option<Head>,
}

impl Dataset {
    pub(crate) fn new(name: String, head: Option<(Commit, Value)>) -> Self {
        Self {
            name,
            head: head.map(|(commit, value)| Head { commit, value }),
        }
    }

    /// The dataset's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the dataset had a head when this handle was made.
    pub fn has_head(&self) -> bool {
        self.head.is_some()
    }

    /// The head commit. Panics if the dataset has no head.
    pub fn head(&self) -> &Commit {
        self.maybe_head()
            .unwrap_or_else(|| panic!("dataset {:?} has no head", self.name))
    }

    /// The head commit, if any.
    pub fn maybe_head(&self) -> Option<&Commit> {
        self.head.as_ref().map(|h| &h.commit)
    }

    /// The payload value at the head. Panics if the dataset has no head.
    pub fn head_value(&self) -> &Value {
        self.maybe_head_value()
            .unwrap_or_else(|| panic!("dataset {:?} has no head", self.name))
    }

    /// The payload value at the head, if any.
    pub fn maybe_head_value(&self) -> Option<&Value> {
        self.head.as_ref().map(|h| &h.value)
    }

    /// Typed ref to the head commit. Panics if the dataset has no head.
    pub fn head_ref(&self) -> Ref {
        self.maybe_head_ref()
            .unwrap_or_else(|| panic!("dataset {:?} has no head", self.name))
    }

    /// Typed ref to the head commit, if any.
    pub fn maybe_head_ref(&self) -> Option<Ref> {
        self.head.as_ref().map(|h| h.commit.commit_ref())
    }
}
