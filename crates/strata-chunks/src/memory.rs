//! In-memory chunk store for testing and ephemeral use.
//!
//! [`MemoryChunkStore`] keeps all chunks in a `HashMap` protected by a
//! `RwLock`. It implements the full [`ChunkStore`] trait and is suitable
//! for unit tests, embedding, and short-lived processes.

use std::collections::HashMap;
use std::sync::RwLock;

use strata_types::Hash;

use crate::chunk::Chunk;
use crate::error::{ChunkError, ChunkResult};
use crate::traits::ChunkStore;

struct Inner {
    chunks: HashMap<Hash, Chunk>,
    root: Hash,
    closed: bool,
}

/// An in-memory implementation of [`ChunkStore`].
///
/// All data lives behind a single `RwLock`; data is lost when the store is
/// dropped. `commit_root` additionally rejects a proposed root whose chunk
/// was never written, enforcing the top level of the reachability
/// precondition.
pub struct MemoryChunkStore {
    inner: RwLock<Inner>,
}

impl MemoryChunkStore {
    /// Create a new empty in-memory store with the zero root.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                chunks: HashMap::new(),
                root: Hash::ZERO,
                closed: false,
            }),
        }
    }

    /// Number of chunks currently stored.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").chunks.len()
    }

    /// Returns `true` if the store holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.inner.read().expect("lock poisoned").chunks.is_empty()
    }

    /// Total bytes across all stored chunks.
    pub fn total_bytes(&self) -> u64 {
        self.inner
            .read()
            .expect("lock poisoned")
            .chunks
            .values()
            .map(|c| c.len() as u64)
            .sum()
    }
}

impl Default for MemoryChunkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkStore for MemoryChunkStore {
    fn put(&self, data: &[u8]) -> ChunkResult<Hash> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner.closed {
            return Err(ChunkError::Closed);
        }
        let chunk = Chunk::new(data.to_vec());
        let hash = chunk.hash();
        // Idempotent: if already present, skip (content-addressing guarantees
        // the same hash always maps to the same bytes).
        inner.chunks.entry(hash).or_insert(chunk);
        Ok(hash)
    }

    fn get(&self, hash: Hash) -> ChunkResult<Option<Chunk>> {
        let inner = self.inner.read().expect("lock poisoned");
        if inner.closed {
            return Err(ChunkError::Closed);
        }
        Ok(inner.chunks.get(&hash).cloned())
    }

    fn has(&self, hash: Hash) -> ChunkResult<bool> {
        let inner = self.inner.read().expect("lock poisoned");
        if inner.closed {
            return Err(ChunkError::Closed);
        }
        Ok(inner.chunks.contains_key(&hash))
    }

    fn root(&self) -> ChunkResult<Hash> {
        let inner = self.inner.read().expect("lock poisoned");
        if inner.closed {
            return Err(ChunkError::Closed);
        }
        Ok(inner.root)
    }

    fn commit_root(&self, expected: Hash, new: Hash) -> ChunkResult<bool> {
        let mut inner = self.inner.write().expect("lock poisoned");
        if inner.closed {
            return Err(ChunkError::Closed);
        }
        if !new.is_zero() && !inner.chunks.contains_key(&new) {
            return Err(ChunkError::MissingRoot(new));
        }
        if inner.root != expected {
            return Ok(false);
        }
        inner.root = new;
        Ok(true)
    }

    fn close(&self) -> ChunkResult<()> {
        let mut inner = self.inner.write().expect("lock poisoned");
        inner.closed = true;
        Ok(())
    }
}

impl std::fmt::Debug for MemoryChunkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().expect("lock poisoned");
        f.debug_struct("MemoryChunkStore")
            .field("chunk_count", &inner.chunks.len())
            .field("root", &inner.root)
            .field("closed", &inner.closed)
            .finish()
    }
}
