use strata_types::Hash;

use crate::value::TypeTag;

/// Errors from value codec operations.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// A value could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),

    /// Chunk bytes could not be decoded as a value.
    #[error("decode error: {0}")]
    Decode(String),

    /// The chunk was written under a different codec format.
    #[error("format mismatch: expected {expected:?}, found {found:?}")]
    FormatMismatch { expected: String, found: String },

    /// The decoded value's type does not match the ref it was read through.
    #[error("type mismatch for {hash}: ref expects {expected}, found {found}")]
    TypeMismatch {
        hash: Hash,
        expected: TypeTag,
        found: TypeTag,
    },

    /// The referenced chunk is not present in the store.
    #[error("missing chunk: {0}")]
    MissingChunk(Hash),

    /// Failure from the underlying chunk store.
    #[error("chunk store error: {0}")]
    Chunk(#[from] strata_chunks::ChunkError),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
