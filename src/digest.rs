//! Streaming content digest used for file fingerprints.
//!
//! XXH3-64: non-cryptographic, fast enough to disappear behind file I/O, and
//! stable across runs so fingerprints survive a viewer restart. Change
//! detection only ever compares digests computed by this module against each
//! other, so the digest width (64 bits) bounds the collision probability of
//! fast modification checks.

use xxhash_rust::xxh3::Xxh3;

/// Fixed-width fingerprint value.
pub type Digest = u64;

/// Incremental digest over an arbitrary sequence of byte runs.
///
/// Feeding the same byte sequence with different chunking yields the same
/// digest; the rolling fingerprint relies on this when it re-hashes retained
/// blocks.
#[derive(Clone, Default)]
pub struct FileDigest {
    hasher: Xxh3,
}

impl FileDigest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds `data` into the digest.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Returns the digest of everything fed so far, without consuming the
    /// builder; more data may still be fed afterwards.
    pub fn digest(&self) -> Digest {
        self.hasher.digest()
    }

    /// Resets the builder to its initial (empty) state.
    pub fn reset(&mut self) {
        self.hasher.reset();
    }

    /// One-shot digest of a byte slice.
    pub fn of(data: &[u8]) -> Digest {
        let mut digest = Self::new();
        digest.update(data);
        digest.digest()
    }
}

impl std::fmt::Debug for FileDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileDigest({:#018x})", self.digest())
    }
}
