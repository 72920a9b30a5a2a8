use strata_types::{Hash, HASH_LEN};

/// The unit of storage: an immutable byte-blob addressed by its hash.
///
/// A `Chunk` is always constructed by hashing its bytes, so the pair is
/// consistent by construction. The digest is the leading [`HASH_LEN`] bytes
/// of the BLAKE3 hash of the data; identical bytes always produce the same
/// chunk address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
    hash: Hash,
    data: Vec<u8>,
}

impl Chunk {
    /// Create a chunk from raw bytes, computing its address.
    pub fn new(data: Vec<u8>) -> Self {
        let hash = Self::compute_hash(&data);
        Self { hash, data }
    }

    /// Compute the content address for a byte slice without storing it.
    pub fn compute_hash(data: &[u8]) -> Hash {
        let digest = blake3::hash(data);
        let mut truncated = [0u8; HASH_LEN];
        truncated.copy_from_slice(&digest.as_bytes()[..HASH_LEN]);
        Hash::from_digest(truncated)
    }

    /// The content address of this chunk.
    pub fn hash(&self) -> Hash {
        self.hash
    }

    /// The raw bytes of this chunk.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the chunk, yielding its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Length of the chunk in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the chunk holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
