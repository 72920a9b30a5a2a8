use strata_types::Hash;

use crate::chunk::Chunk;
use crate::error::ChunkResult;

/// Content-addressed chunk store with a CAS-advanced root.
///
/// All implementations must satisfy these invariants:
/// - Chunks are immutable once written. Content-addressing guarantees this:
///   the same bytes always produce the same hash.
/// - `put` is idempotent; repeated puts of the same bytes are a no-op.
/// - Concurrent reads are always safe (chunks are immutable).
/// - The store never interprets chunk contents.
/// - The root is the only mutable state and advances solely through
///   [`commit_root`], which is atomic with respect to all other callers.
/// - All I/O errors are propagated, never silently ignored.
///
/// [`commit_root`]: ChunkStore::commit_root
pub trait ChunkStore: Send + Sync {
    /// Write a chunk and return its content address.
    ///
    /// If the chunk already exists, this is a no-op (idempotent).
    fn put(&self, data: &[u8]) -> ChunkResult<Hash>;

    /// Read a chunk by its content address.
    ///
    /// Returns `Ok(None)` if the chunk does not exist.
    /// Returns `Err` on I/O failure or data corruption.
    fn get(&self, hash: Hash) -> ChunkResult<Option<Chunk>>;

    /// Check whether a chunk exists in the store.
    fn has(&self, hash: Hash) -> ChunkResult<bool>;

    /// The current store root. [`Hash::ZERO`] means "empty store".
    fn root(&self) -> ChunkResult<Hash>;

    /// Atomically replace the root with `new` if it currently equals
    /// `expected`. Returns whether the swap occurred.
    ///
    /// Every chunk reachable from `new` must have been `put` before this is
    /// called; implementations may enforce the precondition.
    fn commit_root(&self, expected: Hash, new: Hash) -> ChunkResult<bool>;

    /// Release the view. Subsequent operations fail with
    /// [`ChunkError::Closed`].
    ///
    /// [`ChunkError::Closed`]: crate::error::ChunkError::Closed
    fn close(&self) -> ChunkResult<()>;
}
