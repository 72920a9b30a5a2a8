//! In-memory repository state for testing and ephemeral use.

use std::sync::RwLock;

use strata_types::Hash;

use crate::error::ActionResult;
use crate::traits::{RepoStateReader, RepoStateWriter};

struct State {
    branch: String,
    staged: Hash,
    working: Hash,
    merge_commit: Option<Hash>,
}

/// An in-memory implementation of [`RepoStateReader`] and
/// [`RepoStateWriter`]. Data is lost when the value is dropped.
pub struct MemoryRepoState {
    inner: RwLock<State>,
}

impl MemoryRepoState {
    /// Create repository state on `branch` with the given roots.
    pub fn new(branch: impl Into<String>, staged: Hash, working: Hash) -> Self {
        Self {
            inner: RwLock::new(State {
                branch: branch.into(),
                staged,
                working,
                merge_commit: None,
            }),
        }
    }

    /// Record an in-progress merge against `commit`.
    pub fn begin_merge(&self, commit: Hash) {
        self.inner.write().expect("lock poisoned").merge_commit = Some(commit);
    }

    /// The currently staged root.
    pub fn staged(&self) -> Hash {
        self.inner.read().expect("lock poisoned").staged
    }

    /// The current working root.
    pub fn working(&self) -> Hash {
        self.inner.read().expect("lock poisoned").working
    }
}

impl RepoStateReader for MemoryRepoState {
    fn current_branch(&self) -> ActionResult<String> {
        Ok(self.inner.read().expect("lock poisoned").branch.clone())
    }

    fn staged_root(&self) -> ActionResult<Hash> {
        Ok(self.inner.read().expect("lock poisoned").staged)
    }

    fn working_root(&self) -> ActionResult<Hash> {
        Ok(self.inner.read().expect("lock poisoned").working)
    }

    fn is_merge_active(&self) -> ActionResult<bool> {
        Ok(self
            .inner
            .read()
            .expect("lock poisoned")
            .merge_commit
            .is_some())
    }

    fn merge_commit(&self) -> ActionResult<Option<Hash>> {
        Ok(self.inner.read().expect("lock poisoned").merge_commit)
    }
}

impl RepoStateWriter for MemoryRepoState {
    fn update_staged_root(&self, root: Hash) -> ActionResult<Hash> {
        self.inner.write().expect("lock poisoned").staged = root;
        Ok(root)
    }

    fn update_working_root(&self, root: Hash) -> ActionResult<()> {
        self.inner.write().expect("lock poisoned").working = root;
        Ok(())
    }

    fn clear_merge(&self) -> ActionResult<()> {
        self.inner.write().expect("lock poisoned").merge_commit = None;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryRepoState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("lock poisoned");
        f.debug_struct("MemoryRepoState")
            .field("branch", &inner.branch)
            .field("staged", &inner.staged)
            .field("working", &inner.working)
            .field("merge_active", &inner.merge_commit.is_some())
            .finish()
    }
}
