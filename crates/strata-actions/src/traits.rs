use strata_types::Hash;

use crate::error::ActionResult;

/// Read boundary for repository state.
///
/// The staged and working roots are opaque value hashes owned by the layer
/// above; the composer only sequences them.
pub trait RepoStateReader: Send + Sync {
    /// Name of the currently checked-out branch (a dataset name).
    fn current_branch(&self) -> ActionResult<String>;

    /// Hash of the staged root value.
    fn staged_root(&self) -> ActionResult<Hash>;

    /// Hash of the working root value.
    fn working_root(&self) -> ActionResult<Hash>;

    /// Returns `true` if a merge is in progress.
    fn is_merge_active(&self) -> ActionResult<bool>;

    /// The commit recorded when the active merge began, if any.
    fn merge_commit(&self) -> ActionResult<Option<Hash>>;
}

/// Write boundary for repository state.
pub trait RepoStateWriter: Send + Sync {
    /// Persist a new staged root, returning the hash actually stored.
    fn update_staged_root(&self, root: Hash) -> ActionResult<Hash>;

    /// Persist a new working root.
    fn update_working_root(&self, root: Hash) -> ActionResult<()>;

    /// Clear the merge-in-progress marker.
    fn clear_merge(&self) -> ActionResult<()>;
}

/// Operations on root values the composer treats as opaque collaborators:
/// table diffing, conflict detection, foreign-key checks, and super-schema
/// propagation all live above this crate.
pub trait RootOps: Send + Sync {
    /// Names of tables that differ between the staged root and the branch
    /// head root (`None` for an empty branch).
    fn staged_tables(&self, staged: Hash, head: Option<Hash>) -> ActionResult<Vec<String>>;

    /// Names of tables still in conflict in the working root.
    fn tables_in_conflict(&self, working: Hash) -> ActionResult<Vec<String>>;

    /// Validate foreign keys on the staged root, returning the (possibly
    /// rewritten) root. Failure aborts the commit before anything is
    /// persisted.
    fn validate_foreign_keys(&self, staged: Hash) -> ActionResult<Hash>;

    /// Propagate super-schemas for `tables` from `from` onto `onto`,
    /// returning the new root. Treated as an opaque pre-commit hook.
    fn update_super_schemas(&self, tables: &[String], from: Hash, onto: Hash)
        -> ActionResult<Hash>;
}
