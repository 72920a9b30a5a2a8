//! The staged-commit composer.
//!
//! Folds a repository's staged root, an optional in-progress merge, and
//! the current branch head into one new commit, in a fixed order: message
//! check, emptiness check, conflict check, super-schema propagation onto
//! the staged root, foreign-key validation of the result, root
//! persistence, then the commit protocol. Everything before persistence
//! aborts without persisting.

use tracing::debug;

use strata_db::{CommitMeta, CommitOptions, Database, COMMIT_STRUCT};
use strata_types::{CancelToken, Hash, Timestamp};
use strata_value::{Ref, RefSet, TypeTag, Value};

use crate::error::{ActionError, ActionResult};
use crate::traits::{RepoStateReader, RepoStateWriter, RootOps};

/// Struct name commit payload refs are tagged with: the repository root
/// value at that commit.
pub const ROOT_VALUE_STRUCT: &str = "RootValue";

/// Inputs for [`commit_staged`].
#[derive(Clone, Debug)]
pub struct CommitStagedProps {
    pub message: String,
    /// User-supplied commit time; becomes the metadata's user timestamp.
    pub date: Timestamp,
    pub allow_empty: bool,
    pub check_foreign_keys: bool,
    pub name: String,
    pub email: String,
}

impl CommitStagedProps {
    /// Props with the current time, empty commits disallowed, and
    /// foreign-key checking off.
    pub fn new(
        message: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            date: Timestamp::now(),
            allow_empty: false,
            check_foreign_keys: false,
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn with_date(mut self, date: Timestamp) -> Self {
        self.date = date;
        self
    }

    pub fn allow_empty(mut self) -> Self {
        self.allow_empty = true;
        self
    }

    pub fn check_foreign_keys(mut self) -> Self {
        self.check_foreign_keys = true;
        self
    }
}

/// Compose the staged root into a new commit on the current branch and
/// return the new commit's hash.
///
/// With a merge in progress, the recorded merge commit becomes a second
/// parent and the merge marker is cleared once the commit lands.
///
/// # Panics
///
/// Panics if the repository state reports an active merge without a
/// recorded merge commit (corrupted state, unrecoverable).
pub fn commit_staged(
    db: &Database,
    ctx: &CancelToken,
    reader: &dyn RepoStateReader,
    writer: &dyn RepoStateWriter,
    ops: &dyn RootOps,
    props: CommitStagedProps,
) -> ActionResult<Hash> {
    if props.message.is_empty() {
        return Err(ActionError::EmptyMessage);
    }

    let branch = reader.current_branch()?;
    let ds = db.get_dataset(ctx, &branch)?;
    let head_root = ds
        .maybe_head_value()
        .and_then(Value::as_ref_value)
        .map(|r| r.target());

    let mut staged = reader.staged_root()?;
    let staged_tables = ops.staged_tables(staged, head_root)?;

    let merge_active = reader.is_merge_active()?;
    if staged_tables.is_empty() && !merge_active && !props.allow_empty {
        return Err(ActionError::NothingToCommit);
    }

    let mut merge_parent: Option<Ref> = None;
    if merge_active {
        let conflicted = ops.tables_in_conflict(reader.working_root()?)?;
        if !conflicted.is_empty() {
            return Err(ActionError::MergeHasConflicts { tables: conflicted });
        }
        let recorded = reader
            .merge_commit()?
            .unwrap_or_else(|| panic!("corrupted repo state: active merge records no commit"));
        merge_parent = Some(Ref::new(recorded, TypeTag::Struct(COMMIT_STRUCT.to_string())));
    }

    // Opaque pre-commit hook: applied onto the staged root itself, then
    // from staged onto working.
    staged = ops.update_super_schemas(&staged_tables, staged, staged)?;

    if props.check_foreign_keys {
        staged = ops.validate_foreign_keys(staged)?;
    }

    let staged = writer.update_staged_root(staged)?;

    let working = reader.working_root()?;
    let working = ops.update_super_schemas(&staged_tables, staged, working)?;
    writer.update_working_root(working)?;

    let meta =
        CommitMeta::with_user_timestamp(&props.name, &props.email, &props.message, props.date);

    let mut parents = RefSet::new();
    if let Some(head) = ds.maybe_head_ref() {
        parents.insert(head);
    }
    if let Some(mp) = merge_parent {
        parents.insert(mp);
    }

    let payload = Value::Ref(Ref::new(staged, TypeTag::Struct(ROOT_VALUE_STRUCT.to_string())));
    let committed = db.commit(ctx, &ds, payload, CommitOptions { parents, meta })?;

    writer.clear_merge()?;
    let address = committed.head().address();
    debug!(branch = branch.as_str(), commit = %address, "committed staged root");
    Ok(address)
}
