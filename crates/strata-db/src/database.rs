//! The database: a view over a chunk store exposing dataset operations.
//!
//! A `Database` holds the chunk-store view and a root-keyed cache of the
//! last-observed dataset map. The cache only coalesces redundant reads:
//! staleness is exactly what the commit protocol's root CAS detects, so no
//! in-process lock is needed for correctness.
//!
//! # The commit protocol
//!
//! Advancing a dataset is optimistic: the new commit chunk is written
//! first (durable and reusable across retries, so no commit is ever lost),
//! then the dataset map is re-read and the observed head compared against
//! the handle's head. A mismatch is a concurrent-update conflict and the
//! caller gets back a fresh handle at the winning head. A match installs a
//! new map via root CAS; losing the CAS to a writer of some *other*
//! dataset retries with exponential backoff up to a configured ceiling.

use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use tracing::debug;

use strata_chunks::ChunkStore;
use strata_types::{CancelToken, Hash};
use strata_value::{Codec, Format, Ref, RefSet, TypeTag, Value};

use crate::commit::{Commit, CommitMeta};
use crate::dataset::Dataset;
use crate::error::{DbError, DbResult};
use crate::history::is_ancestor;
use crate::map::{DatasetMap, DATASET_MAP_STRUCT};
use crate::names::validate_dataset_name;

/// Options for [`Database::commit`].
///
/// An empty parent set means "fast-forward from the handle's head" (the
/// `commit_value` shorthand); explicit parents express merges and commits
/// onto datasets created by other writers.
#[derive(Clone, Debug, Default)]
pub struct CommitOptions {
    pub parents: RefSet,
    pub meta: CommitMeta,
}

/// Retry budget and backoff for the root-CAS loop.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    /// Attempts before surfacing [`DbError::RetryExhausted`].
    pub max_attempts: u32,
    /// First backoff; doubles per lost attempt.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_backoff: Duration::from_millis(1),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        self.base_backoff * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// A view over a chunk store exposing dataset operations.
///
/// Safe to share across threads: reads and independent dataset commits may
/// run concurrently, serialized only by the store's root CAS.
pub struct Database {
    store: Box<dyn ChunkStore>,
    codec: Codec,
    retry: RetryPolicy,
    cache: Mutex<Option<(Hash, DatasetMap)>>,
}

impl Database {
    /// Create a database over `store` with the current codec format.
    pub fn new<S: ChunkStore + 'static>(store: S) -> Self {
        Self::with_format(store, Format::V1)
    }

    /// Create a database with an explicit codec format.
    pub fn with_format<S: ChunkStore + 'static>(store: S, format: Format) -> Self {
        Self {
            store: Box::new(store),
            codec: Codec::new(format),
            retry: RetryPolicy::default(),
            cache: Mutex::new(None),
        }
    }

    /// Override the CAS retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The codec this database reads and writes with.
    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    /// The underlying chunk-store view.
    pub fn store(&self) -> &dyn ChunkStore {
        self.store.as_ref()
    }

    /// Consume the database and release the chunk-store view.
    pub fn close(self) -> DbResult<()> {
        self.store.close()?;
        Ok(())
    }

    /// Look up a dataset by name. Pure read: returns a headless handle if
    /// the name is absent.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid dataset name (programmer error).
    pub fn get_dataset(&self, ctx: &CancelToken, name: &str) -> DbResult<Dataset> {
        validate_dataset_name(name);
        let (_, map) = self.read_map(ctx)?;
        self.load_dataset(ctx, name, map.get(name))
    }

    /// Snapshot of the current dataset map.
    pub fn datasets(&self, ctx: &CancelToken) -> DbResult<DatasetMap> {
        Ok(self.read_map(ctx)?.1)
    }

    /// Commit `value` as the new head of `ds`, fast-forwarding from the
    /// handle's head.
    pub fn commit_value(&self, ctx: &CancelToken, ds: &Dataset, value: Value) -> DbResult<Dataset> {
        self.commit(ctx, ds, value, CommitOptions::default())
    }

    /// Advance `ds` to a fresh commit whose payload is `value` and whose
    /// parent set is `options.parents`.
    ///
    /// On a concurrent-update conflict the returned
    /// [`DbError::ConcurrentUpdate`] carries a handle at the winning head,
    /// so retrying is a plain re-call against it.
    pub fn commit(
        &self,
        ctx: &CancelToken,
        ds: &Dataset,
        value: Value,
        options: CommitOptions,
    ) -> DbResult<Dataset> {
        ctx.checkpoint()?;
        let CommitOptions { parents, meta } = options;
        let parents = if parents.is_empty() {
            match ds.maybe_head_ref() {
                Some(head) => RefSet::from_refs([head]),
                None => RefSet::new(),
            }
        } else {
            self.validate_parents(ctx, ds, &parents)?;
            parents
        };

        // Written before any CAS attempt: even a losing writer leaves its
        // commit addressable, potentially as a parent of a future merge.
        let value_ref = self.codec.write(&value, self.store.as_ref())?;
        let commit = Commit::write(&self.codec, self.store.as_ref(), value_ref, parents, meta)?;
        let new_ref = commit.commit_ref();

        let mut attempt: u32 = 0;
        loop {
            ctx.checkpoint()?;
            let (expected, map) = self.read_map(ctx)?;
            let observed = map.get(ds.name()).cloned();

            if !same_head(observed.as_ref(), ds.maybe_head_ref().as_ref()) {
                let winner = self.load_dataset(ctx, ds.name(), observed.as_ref())?;
                return Err(DbError::ConcurrentUpdate {
                    winner: Box::new(winner),
                });
            }

            let mut new_map = map;
            new_map.set(ds.name(), new_ref.clone());
            let new_root = self.codec.write(&new_map.to_value(), self.store.as_ref())?;

            ctx.checkpoint()?;
            if self.store.commit_root(expected, new_root.target())? {
                self.cache_map(new_root.target(), new_map);
                debug!(dataset = ds.name(), commit = %commit.address(), "advanced dataset head");
                return Ok(Dataset::new(ds.name().to_string(), Some((commit, value))));
            }

            attempt += 1;
            if attempt >= self.retry.max_attempts {
                return Err(DbError::RetryExhausted {
                    name: ds.name().to_string(),
                    attempts: attempt,
                });
            }
            debug!(dataset = ds.name(), attempt, "root CAS lost, backing off");
            thread::sleep(self.retry.backoff(attempt));
        }
    }

    /// Remove `ds` from the dataset map under the same fast-forward
    /// discipline as [`commit`]: if the dataset advanced since the handle
    /// was made, the conflict carries the winning head.
    ///
    /// [`commit`]: Database::commit
    pub fn delete(&self, ctx: &CancelToken, ds: &Dataset) -> DbResult<Dataset> {
        let mut attempt: u32 = 0;
        loop {
            ctx.checkpoint()?;
            let (expected, map) = self.read_map(ctx)?;
            let observed = map.get(ds.name()).cloned();

            if !same_head(observed.as_ref(), ds.maybe_head_ref().as_ref()) {
                let winner = self.load_dataset(ctx, ds.name(), observed.as_ref())?;
                return Err(DbError::ConcurrentUpdate {
                    winner: Box::new(winner),
                });
            }
            if observed.is_none() {
                // Absent entry: deleting a dataset that was never written
                // is a no-op.
                return Ok(Dataset::new(ds.name().to_string(), None));
            }

            let mut new_map = map;
            new_map.remove(ds.name());
            let new_root = self.codec.write(&new_map.to_value(), self.store.as_ref())?;

            ctx.checkpoint()?;
            if self.store.commit_root(expected, new_root.target())? {
                self.cache_map(new_root.target(), new_map);
                debug!(dataset = ds.name(), "deleted dataset");
                return Ok(Dataset::new(ds.name().to_string(), None));
            }

            attempt += 1;
            if attempt >= self.retry.max_attempts {
                return Err(DbError::RetryExhausted {
                    name: ds.name().to_string(),
                    attempts: attempt,
                });
            }
            debug!(dataset = ds.name(), attempt, "root CAS lost, backing off");
            thread::sleep(self.retry.backoff(attempt));
        }
    }

    /// Load the commit a ref points at.
    pub fn resolve_commit(&self, ctx: &CancelToken, r: &Ref) -> DbResult<Commit> {
        ctx.checkpoint()?;
        let value = self.codec.read(r, self.store.as_ref())?;
        Commit::from_value(r.target(), &value)
    }

    /// Every commit chain must extend the DAG. With a visible head, the
    /// supplied parents must contain it or strictly descend from it; all
    /// parents must name commits already in the store.
    fn validate_parents(&self, ctx: &CancelToken, ds: &Dataset, parents: &RefSet) -> DbResult<()> {
        for parent in parents {
            if !self.store.has(parent.target())? {
                return Err(DbError::MissingParent(parent.target()));
            }
        }
        if let Some(head) = ds.maybe_head_ref() {
            if parents.contains_target(head.target()) {
                return Ok(());
            }
            for parent in parents {
                if is_ancestor(self, ctx, head.target(), parent)? {
                    return Ok(());
                }
            }
            return Err(DbError::ForkedHistory {
                name: ds.name().to_string(),
            });
        }
        Ok(())
    }

    fn load_dataset(&self, ctx: &CancelToken, name: &str, head: Option<&Ref>) -> DbResult<Dataset> {
        match head {
            None => Ok(Dataset::new(name.to_string(), None)),
            Some(r) => {
                let commit = self.resolve_commit(ctx, r)?;
                let value = self.codec.read(commit.value_ref(), self.store.as_ref())?;
                Ok(Dataset::new(name.to_string(), Some((commit, value))))
            }
        }
    }

    fn read_map(&self, ctx: &CancelToken) -> DbResult<(Hash, DatasetMap)> {
        ctx.checkpoint()?;
        let root = self.store.root()?;
        if root.is_zero() {
            return Ok((root, DatasetMap::new()));
        }
        if let Some((cached_root, map)) = self.cache.lock().expect("lock poisoned").as_ref() {
            if *cached_root == root {
                return Ok((root, map.clone()));
            }
        }
        ctx.checkpoint()?;
        let root_ref = Ref::new(root, TypeTag::Struct(DATASET_MAP_STRUCT.to_string()));
        let value = self.codec.read(&root_ref, self.store.as_ref())?;
        let map = DatasetMap::from_value(root, &value)?;
        self.cache_map(root, map.clone());
        Ok((root, map))
    }

    fn cache_map(&self, root: Hash, map: DatasetMap) {
        *self.cache.lock().expect("lock poisoned") = Some((root, map));
    }
}

fn same_head(observed: Option<&Ref>, expected: Option<&Ref>) -> bool {
    match (observed, expected) {
        (None, None) => true,
        (Some(a), Some(b)) => a.target() == b.target(),
        _ => false,
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("format", &self.codec.format())
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_chunks::{ChunkError, ChunkResult, MemoryChunkStore};
    use strata_chunks::Chunk;

    fn database() -> Database {
        Database::new(MemoryChunkStore::new())
    }

    fn ctx() -> CancelToken {
        CancelToken::new()
    }

    fn text(s: &str) -> Value {
        Value::from(s)
    }

    fn head_str(ds: &Dataset) -> &str {
        ds.head_value().as_string().expect("head value is a string")
    }

    fn unwrap_conflict(err: DbError) -> Dataset {
        match err {
            DbError::ConcurrentUpdate { winner } => *winner,
            other => panic!("expected ConcurrentUpdate, got: {other}"),
        }
    }

    // -----------------------------------------------------------------------
    // Linear commits
    // -----------------------------------------------------------------------

    #[test]
    fn first_commit_on_fresh_store() {
        let db = database();
        let ds = db.get_dataset(&ctx(), "testdataset").unwrap();
        assert!(!ds.has_head());

        let ds = db.commit_value(&ctx(), &ds, text("a")).unwrap();
        assert!(ds.has_head());
        assert_eq!(head_str(&ds), "a");
        assert_eq!(ds.head().num_parents(), 0);
    }

    #[test]
    fn successive_commits_chain() {
        let db = database();
        let ds = db.get_dataset(&ctx(), "testdataset").unwrap();
        let ds_a = db.commit_value(&ctx(), &ds, text("a")).unwrap();
        let ds_b = db.commit_value(&ctx(), &ds_a, text("b")).unwrap();

        assert_eq!(head_str(&ds_b), "b");
        assert_eq!(ds_b.head().num_parents(), 1);
        assert_eq!(
            ds_b.head().parent(0).unwrap().target(),
            ds_a.head().address()
        );
        // The older handle is an immutable snapshot.
        assert_eq!(head_str(&ds_a), "a");
    }

    #[test]
    fn read_your_writes() {
        let db = database();
        let ds = db.get_dataset(&ctx(), "testdataset").unwrap();
        let committed = db.commit_value(&ctx(), &ds, text("a")).unwrap();

        let reread = db.get_dataset(&ctx(), "testdataset").unwrap();
        assert_eq!(reread.head().address(), committed.head().address());
        assert_eq!(head_str(&reread), "a");
    }

    // -----------------------------------------------------------------------
    // Explicit branching and merging
    // -----------------------------------------------------------------------

    #[test]
    fn explicit_branch_using_datasets() {
        let db = database();
        let c = ctx();

        // ds1: |a|
        let ds1 = db.get_dataset(&c, "testdataset").unwrap();
        let ds1 = db.commit_value(&c, &ds1, text("a")).unwrap();
        assert_eq!(head_str(&ds1), "a");

        // ds1: |a|
        //        \ds2
        let ds2 = db.get_dataset(&c, "othertestdataset").unwrap();
        let ds2 = db
            .commit(
                &c,
                &ds2,
                ds1.head_value().clone(),
                CommitOptions {
                    parents: RefSet::from_refs([ds1.head_ref()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(head_str(&ds2), "a");

        // ds1: |a| <- |b|
        let ds1 = db.commit_value(&c, &ds1, text("b")).unwrap();
        assert_eq!(head_str(&ds1), "b");

        // ds1: |a|    <- |b|
        //        \ds2 <- |c|
        let ds2 = db.commit_value(&c, &ds2, text("c")).unwrap();
        assert_eq!(head_str(&ds2), "c");

        // ds1: |a|    <- |b| <--|d|
        //        \ds2 <- |c| <--/
        let merge_parents = RefSet::from_refs([ds1.head_ref(), ds2.head_ref()]);
        let ds2 = db
            .commit(
                &c,
                &ds2,
                text("d"),
                CommitOptions {
                    parents: merge_parents.clone(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(head_str(&ds2), "d");
        assert_eq!(ds2.head().num_parents(), 2);

        let ds1 = db
            .commit(
                &c,
                &ds1,
                text("d"),
                CommitOptions {
                    parents: merge_parents,
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(head_str(&ds1), "d");
        assert_eq!(ds1.head().num_parents(), 2);
        // Identical payload, parents, and meta: both datasets converge on
        // the same commit.
        assert_eq!(ds1.head().address(), ds2.head().address());
    }

    #[test]
    fn merge_parents_dedup_by_hash() {
        let db = database();
        let c = ctx();
        let ds = db.get_dataset(&c, "ds").unwrap();
        let ds = db.commit_value(&c, &ds, text("a")).unwrap();

        let ds = db
            .commit(
                &c,
                &ds,
                text("b"),
                CommitOptions {
                    parents: RefSet::from_refs([ds.head_ref(), ds.head_ref()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(ds.head().num_parents(), 1);
    }

    // -----------------------------------------------------------------------
    // Two racing clients
    // -----------------------------------------------------------------------

    #[test]
    fn two_clients_with_empty_dataset() {
        let db = database();
        let c = ctx();
        let dsx = db.get_dataset(&c, "testdataset").unwrap();
        let dsy = db.get_dataset(&c, "testdataset").unwrap();

        // dsx: || -> |a|
        let dsx = db.commit_value(&c, &dsx, text("a")).unwrap();
        assert_eq!(head_str(&dsx), "a");

        // dsy: || -> |b| loses; the conflict carries the winning head.
        assert!(dsy.maybe_head().is_none());
        let err = db.commit_value(&c, &dsy, text("b")).unwrap_err();
        let dsy = unwrap_conflict(err);
        assert_eq!(head_str(&dsy), "a");

        // Commit failed, but dsy now has the latest head, so trying again
        // just works. dsy: |a| -> |b|
        let dsy = db.commit_value(&c, &dsy, text("b")).unwrap();
        assert_eq!(head_str(&dsy), "b");
    }

    #[test]
    fn two_clients_with_non_empty_dataset() {
        let db = database();
        let c = ctx();
        {
            // ds1: || -> |a|
            let ds1 = db.get_dataset(&c, "testdataset").unwrap();
            let ds1 = db.commit_value(&c, &ds1, text("a")).unwrap();
            assert_eq!(head_str(&ds1), "a");
        }

        let dsx = db.get_dataset(&c, "testdataset").unwrap();
        let dsy = db.get_dataset(&c, "testdataset").unwrap();

        // dsx: |a| -> |b|
        assert_eq!(head_str(&dsx), "a");
        let dsx = db.commit_value(&c, &dsx, text("b")).unwrap();
        assert_eq!(head_str(&dsx), "b");

        // dsy: |a| -> |c| loses to |b|.
        assert_eq!(head_str(&dsy), "a");
        let err = db.commit_value(&c, &dsy, text("c")).unwrap_err();
        let dsy = unwrap_conflict(err);
        assert_eq!(head_str(&dsy), "b");

        // dsy: |b| -> |c|
        let dsy = db.commit_value(&c, &dsy, text("c")).unwrap();
        assert_eq!(head_str(&dsy), "c");
    }

    #[test]
    fn losing_commit_chunk_stays_addressable() {
        let db = database();
        let c = ctx();
        let dsx = db.get_dataset(&c, "ds").unwrap();
        let dsy = db.get_dataset(&c, "ds").unwrap();

        let _dsx = db.commit_value(&c, &dsx, text("a")).unwrap();
        let err = db.commit_value(&c, &dsy, text("b")).unwrap_err();
        let winner = unwrap_conflict(err);

        // The loser's payload chunk was written before the CAS attempt.
        let loser_payload = db.codec().ref_to(&text("b")).unwrap();
        assert!(db.store().has(loser_payload.target()).unwrap());
        assert_eq!(head_str(&winner), "a");
    }

    // -----------------------------------------------------------------------
    // Parent-set preconditions
    // -----------------------------------------------------------------------

    #[test]
    fn commit_rejects_history_fork() {
        let db = database();
        let c = ctx();

        // An unrelated commit on another dataset.
        let other = db.get_dataset(&c, "other").unwrap();
        let other = db.commit_value(&c, &other, text("x")).unwrap();

        let ds = db.get_dataset(&c, "ds").unwrap();
        let ds = db.commit_value(&c, &ds, text("a")).unwrap();

        // Parents that neither contain nor descend from ds's head.
        let err = db
            .commit(
                &c,
                &ds,
                text("fork"),
                CommitOptions {
                    parents: RefSet::from_refs([other.head_ref()]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::ForkedHistory { .. }));
    }

    #[test]
    fn commit_accepts_descendant_parent() {
        let db = database();
        let c = ctx();
        let ds = db.get_dataset(&c, "ds").unwrap();
        let ds_a = db.commit_value(&c, &ds, text("a")).unwrap();
        let ds_b = db.commit_value(&c, &ds_a, text("b")).unwrap();

        // Commit against the stale |a| handle with parent |b|: |b| is a
        // strict descendant of |a|, so the precondition passes, but the
        // map has advanced so the CAS discipline reports the winner.
        let err = db
            .commit(
                &c,
                &ds_a,
                text("c"),
                CommitOptions {
                    parents: RefSet::from_refs([ds_b.head_ref()]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        let winner = unwrap_conflict(err);
        assert_eq!(head_str(&winner), "b");

        // Against the current handle it succeeds outright.
        let ds_c = db
            .commit(
                &c,
                &ds_b,
                text("c"),
                CommitOptions {
                    parents: RefSet::from_refs([ds_b.head_ref()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(head_str(&ds_c), "c");
    }

    #[test]
    fn commit_rejects_unknown_parent() {
        let db = database();
        let c = ctx();
        let ds = db.get_dataset(&c, "ds").unwrap();

        let dangling = db.codec().ref_to(&text("never written")).unwrap();
        let err = db
            .commit(
                &c,
                &ds,
                text("a"),
                CommitOptions {
                    parents: RefSet::from_refs([dangling.clone()]),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DbError::MissingParent(h) if h == dangling.target()));
    }

    #[test]
    fn merge_into_empty_dataset_with_existing_parent() {
        let db = database();
        let c = ctx();
        let src = db.get_dataset(&c, "src").unwrap();
        let src = db.commit_value(&c, &src, text("a")).unwrap();

        let dst = db.get_dataset(&c, "dst").unwrap();
        let dst = db
            .commit(
                &c,
                &dst,
                src.head_value().clone(),
                CommitOptions {
                    parents: RefSet::from_refs([src.head_ref()]),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(head_str(&dst), "a");
        assert_eq!(dst.head().num_parents(), 1);
    }

    // -----------------------------------------------------------------------
    // Name validation (programmer errors)
    // -----------------------------------------------------------------------

    #[test]
    fn get_dataset_accepts_valid_names() {
        let db = database();
        for name in ["foo", "foo/bar", "f1", "1f"] {
            assert!(!db.get_dataset(&ctx(), name).unwrap().has_head());
        }
    }

    #[test]
    fn get_dataset_panics_on_invalid_names() {
        let db = std::sync::Arc::new(database());
        for name in [" ", "", "a ", " a", "$", "#", ":", "\n", "💩"] {
            let db = std::sync::Arc::clone(&db);
            let result = std::thread::spawn(move || {
                let _ = db.get_dataset(&CancelToken::new(), name);
            })
            .join();
            assert!(result.is_err(), "expected panic for {name:?}");
        }
    }

    // -----------------------------------------------------------------------
    // Head accessors
    // -----------------------------------------------------------------------

    #[test]
    fn head_value_functions() {
        let db = database();
        let c = ctx();

        let ds1 = db.get_dataset(&c, "testdataset").unwrap();
        assert!(!ds1.has_head());

        let ds1 = db.commit_value(&c, &ds1, text("a")).unwrap();
        assert!(ds1.has_head());
        assert_eq!(head_str(&ds1), "a");
        assert_eq!(ds1.maybe_head_value().and_then(Value::as_string), Some("a"));

        let ds2 = db.get_dataset(&c, "otherdataset").unwrap();
        assert!(ds2.maybe_head_value().is_none());
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[test]
    fn delete_removes_entry() {
        let db = database();
        let c = ctx();
        let ds = db.get_dataset(&c, "ds").unwrap();
        let ds = db.commit_value(&c, &ds, text("a")).unwrap();

        let deleted = db.delete(&c, &ds).unwrap();
        assert!(!deleted.has_head());
        assert!(!db.get_dataset(&c, "ds").unwrap().has_head());
    }

    #[test]
    fn delete_conflicts_with_concurrent_commit() {
        let db = database();
        let c = ctx();
        let ds = db.get_dataset(&c, "ds").unwrap();
        let stale = db.commit_value(&c, &ds, text("a")).unwrap();
        let _ = db.commit_value(&c, &stale, text("b")).unwrap();

        let err = db.delete(&c, &stale).unwrap_err();
        let winner = unwrap_conflict(err);
        assert_eq!(head_str(&winner), "b");
    }

    #[test]
    fn delete_of_absent_dataset_is_noop() {
        let db = database();
        let ds = db.get_dataset(&ctx(), "never").unwrap();
        let deleted = db.delete(&ctx(), &ds).unwrap();
        assert!(!deleted.has_head());
    }

    #[test]
    fn delete_leaves_other_datasets_alone() {
        let db = database();
        let c = ctx();
        let keep = db.get_dataset(&c, "keep").unwrap();
        let keep = db.commit_value(&c, &keep, text("kept")).unwrap();
        let drop_ = db.get_dataset(&c, "drop").unwrap();
        let drop_ = db.commit_value(&c, &drop_, text("dropped")).unwrap();

        db.delete(&c, &drop_).unwrap();
        let keep = db.get_dataset(&c, keep.name()).unwrap();
        assert_eq!(head_str(&keep), "kept");
    }

    // -----------------------------------------------------------------------
    // Cancellation
    // -----------------------------------------------------------------------

    #[test]
    fn canceled_token_short_circuits() {
        let db = database();
        let token = CancelToken::new();
        let ds = db.get_dataset(&token, "ds").unwrap();

        token.cancel();
        assert!(matches!(
            db.commit_value(&token, &ds, text("a")),
            Err(DbError::Canceled(_))
        ));
        assert!(matches!(
            db.get_dataset(&token, "ds"),
            Err(DbError::Canceled(_))
        ));

        // Nothing was installed.
        let fresh = CancelToken::new();
        assert!(!db.get_dataset(&fresh, "ds").unwrap().has_head());
    }

    // -----------------------------------------------------------------------
    // Retry exhaustion
    // -----------------------------------------------------------------------

    /// A store whose root CAS always loses, as if other datasets' writers
    /// kept winning the race.
    struct AlwaysLosingStore(MemoryChunkStore);

    impl ChunkStore for AlwaysLosingStore {
        fn put(&self, data: &[u8]) -> ChunkResult<Hash> {
            self.0.put(data)
        }
        fn get(&self, hash: Hash) -> ChunkResult<Option<Chunk>> {
            self.0.get(hash)
        }
        fn has(&self, hash: Hash) -> ChunkResult<bool> {
            self.0.has(hash)
        }
        fn root(&self) -> ChunkResult<Hash> {
            self.0.root()
        }
        fn commit_root(&self, _expected: Hash, _new: Hash) -> ChunkResult<bool> {
            Ok(false)
        }
        fn close(&self) -> ChunkResult<()> {
            self.0.close()
        }
    }

    #[test]
    fn retry_budget_exhaustion() {
        let db = Database::new(AlwaysLosingStore(MemoryChunkStore::new())).with_retry_policy(
            RetryPolicy {
                max_attempts: 3,
                base_backoff: Duration::from_micros(10),
            },
        );
        let c = ctx();
        let ds = db.get_dataset(&c, "ds").unwrap();
        let err = db.commit_value(&c, &ds, text("a")).unwrap_err();
        assert!(matches!(
            err,
            DbError::RetryExhausted { attempts: 3, .. }
        ));
    }

    /// A store that reports backend failure on CAS; the protocol must
    /// propagate it rather than retry.
    struct FailingCasStore(MemoryChunkStore);

    impl ChunkStore for FailingCasStore {
        fn put(&self, data: &[u8]) -> ChunkResult<Hash> {
            self.0.put(data)
        }
        fn get(&self, hash: Hash) -> ChunkResult<Option<Chunk>> {
            self.0.get(hash)
        }
        fn has(&self, hash: Hash) -> ChunkResult<bool> {
            self.0.has(hash)
        }
        fn root(&self) -> ChunkResult<Hash> {
            self.0.root()
        }
        fn commit_root(&self, _expected: Hash, _new: Hash) -> ChunkResult<bool> {
            Err(ChunkError::Backend("cas wire failure".to_string()))
        }
        fn close(&self) -> ChunkResult<()> {
            self.0.close()
        }
    }

    #[test]
    fn backend_errors_are_never_swallowed() {
        let db = Database::new(FailingCasStore(MemoryChunkStore::new()));
        let c = ctx();
        let ds = db.get_dataset(&c, "ds").unwrap();
        let err = db.commit_value(&c, &ds, text("a")).unwrap_err();
        assert!(matches!(err, DbError::Backend(_)));
    }

    // -----------------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn racing_writers_form_a_chain() {
        use std::sync::Arc;
        use std::thread;

        let db = Arc::new(database());
        let handles: Vec<_> = (0..4u32)
            .map(|i| {
                let db = Arc::clone(&db);
                thread::spawn(move || {
                    let c = CancelToken::new();
                    let payload = format!("writer-{i}");
                    let mut ds = db.get_dataset(&c, "shared").unwrap();
                    loop {
                        match db.commit_value(&c, &ds, Value::from(payload.clone())) {
                            Ok(done) => return done.head().address(),
                            Err(DbError::ConcurrentUpdate { winner }) => ds = *winner,
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                })
            })
            .collect();

        let mut addresses: Vec<Hash> = handles
            .into_iter()
            .map(|h| h.join().expect("writer thread panicked"))
            .collect();

        // Every writer eventually landed, and the final history is a
        // single chain containing all four commits.
        let c = ctx();
        let ds = db.get_dataset(&c, "shared").unwrap();
        let history =
            crate::history::time_sorted_commits(&db, &c, ds.head(), None).unwrap();
        assert_eq!(history.len(), 4);

        let mut chained: Vec<Hash> = history.iter().map(|cm| cm.address()).collect();
        chained.sort();
        addresses.sort();
        assert_eq!(chained, addresses);
        for commit in &history {
            assert!(commit.num_parents() <= 1);
        }
    }

    #[test]
    fn close_releases_the_store() {
        let db = database();
        db.close().unwrap();
    }
}
