use strata_types::Hash;

/// Errors from chunk store operations.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The requested chunk was not found.
    #[error("chunk not found: {0}")]
    NotFound(Hash),

    /// A root was proposed whose chunk was never written to the store.
    #[error("proposed root {0} is not present in the store")]
    MissingRoot(Hash),

    /// The store view has been closed.
    #[error("chunk store is closed")]
    Closed,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by the storage backend.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Result alias for chunk store operations.
pub type ChunkResult<T> = Result<T, ChunkError>;
