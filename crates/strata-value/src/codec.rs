//! The canonical codec: format-tagged serialization, hashing, and chunk I/O.
//!
//! Encoded bytes are `(format tag, value)` serialized with bincode. All
//! containers in the value model carry canonical internal order, so the
//! bytes (and therefore the hash) are a pure function of the value's
//! structure, never of construction order. The format tag is embedded in
//! the bytes: the same value under two formats produces two distinct
//! chunks, which is what makes equality format-scoped.

use strata_chunks::{Chunk, ChunkStore};
use strata_types::Hash;

use crate::error::{CodecError, CodecResult};
use crate::value::{Ref, Value};

/// Opaque codec version identifier.
///
/// All values in a store share one format. Two values only compare equal
/// under the same format; the tag doubles as the hash domain separator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Format {
    tag: &'static str,
}

impl Format {
    /// The current format.
    pub const V1: Self = Self::new("strata-v1");

    /// Create a format with a custom version tag.
    pub const fn new(tag: &'static str) -> Self {
        Self { tag }
    }

    /// The version tag string.
    pub fn tag(&self) -> &'static str {
        self.tag
    }
}

/// Serializes, hashes, and stores values under one [`Format`].
#[derive(Clone, Copy, Debug)]
pub struct Codec {
    format: Format,
}

impl Codec {
    /// Create a codec for the given format.
    pub fn new(format: Format) -> Self {
        Self { format }
    }

    /// The format this codec encodes under.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Canonically serialize a value.
    pub fn encode(&self, value: &Value) -> CodecResult<Vec<u8>> {
        bincode::serialize(&(self.format.tag(), value)).map_err(|e| CodecError::Encode(e.to_string()))
    }

    /// Decode chunk bytes back into a value, verifying the format tag.
    pub fn decode(&self, bytes: &[u8]) -> CodecResult<Value> {
        let (tag, value): (String, Value) =
            bincode::deserialize(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;
        if tag != self.format.tag() {
            return Err(CodecError::FormatMismatch {
                expected: self.format.tag().to_string(),
                found: tag,
            });
        }
        Ok(value)
    }

    /// The content hash of a value: a pure function of its canonical
    /// serialization.
    pub fn hash(&self, value: &Value) -> CodecResult<Hash> {
        Ok(Chunk::compute_hash(&self.encode(value)?))
    }

    /// Build a typed ref to a value without storing it.
    pub fn ref_to(&self, value: &Value) -> CodecResult<Ref> {
        Ok(Ref::new(self.hash(value)?, value.type_tag()))
    }

    /// Serialize a value into the store and return a typed ref to it.
    pub fn write(&self, value: &Value, store: &dyn ChunkStore) -> CodecResult<Ref> {
        let bytes = self.encode(value)?;
        let hash = store.put(&bytes)?;
        Ok(Ref::new(hash, value.type_tag()))
    }

    /// Read the value a ref points at, verifying format and type tag.
    pub fn read(&self, r: &Ref, store: &dyn ChunkStore) -> CodecResult<Value> {
        let chunk = store
            .get(r.target())?
            .ok_or(CodecError::MissingChunk(r.target()))?;
        let value = self.decode(chunk.data())?;
        let found = value.type_tag();
        if found != *r.tag() {
            return Err(CodecError::TypeMismatch {
                hash: r.target(),
                expected: r.tag().clone(),
                found,
            });
        }
        Ok(value)
    }

    /// Structural equality under this codec's format.
    ///
    /// Implemented over content hashes, so it agrees with [`hash`] by
    /// construction: values written under different formats never compare
    /// equal because their encodings differ.
    ///
    /// [`hash`]: Codec::hash
    pub fn equals(&self, a: &Value, b: &Value) -> CodecResult<bool> {
        Ok(self.hash(a)? == self.hash(b)?)
    }
}
