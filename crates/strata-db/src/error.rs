use strata_types::Hash;

use crate::dataset::Dataset;

/// Errors from database operations.
///
/// Two channels: recoverable, typed failures (everything below), and
/// programmer errors, which panic instead of returning. Invalid dataset
/// names and head access on a headless handle are programmer errors.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The dataset advanced under us. The carried handle reflects the
    /// winning head, so a retry is a plain re-call against it.
    #[error("dataset {} was updated concurrently", .winner.name())]
    ConcurrentUpdate { winner: Box<Dataset> },

    /// The root CAS kept losing to writers of other datasets until the
    /// retry budget ran out.
    #[error("dataset {name}: root CAS retry budget exhausted after {attempts} attempts")]
    RetryExhausted { name: String, attempts: u32 },

    /// The supplied parent set would abandon the dataset's visible head.
    /// Every commit chain must extend the DAG, not fork away from it.
    #[error("dataset {name}: parents must contain or descend from the current head")]
    ForkedHistory { name: String },

    /// A supplied parent ref does not resolve to a commit in the store.
    #[error("parent commit not found in store: {0}")]
    MissingParent(Hash),

    /// A stored value failed to parse as the expected structure.
    #[error("corrupt value {hash}: {reason}")]
    CorruptValue { hash: Hash, reason: String },

    /// The operation was canceled through its token.
    #[error(transparent)]
    Canceled(#[from] strata_types::Canceled),

    /// Failure from the chunk storage backend. Never swallowed; only
    /// root-CAS races trigger internal retry.
    #[error("backend error: {0}")]
    Backend(#[from] strata_chunks::ChunkError),

    /// Failure from the value codec.
    #[error("codec error: {0}")]
    Codec(#[from] strata_value::CodecError),
}

/// Result alias for database operations.
pub type DbResult<T> = Result<T, DbError>;
