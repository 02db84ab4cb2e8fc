//! Rolling header/body/tail fingerprint of the indexed content.
//!
//! Three digests are maintained per file:
//!
//! - `full_digest`: streaming digest over every byte committed so far;
//! - `header_digest`: digest of the first blocks, up to the first block that
//!   carries the total past [`INDEXING_BLOCK_SIZE`];
//! - `tail_digest`: digest of a sliding window of recent blocks, bounded at
//!   `2 * INDEXING_BLOCK_SIZE` retained bytes.
//!
//! Header and tail digests are recomputed from retained raw bytes on every
//! update rather than maintained by rolling subtraction; the retained window
//! is at most 3 MiB, so the recompute cost per block is a bounded constant.
//! The retained blocks own their bytes outright: their lifetime is
//! independent of any read buffer upstream.

use std::collections::VecDeque;

use crate::digest::{Digest, FileDigest};
use crate::types::INDEXING_BLOCK_SIZE;

/// Copyable fingerprint snapshot handed to the change detector.
///
/// A default-constructed value (digests zero, sizes zero) represents "nothing
/// indexed" and will never compare equal to a digest of on-disk bytes, so an
/// empty index is always classified as needing a full re-index.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IndexedHash {
    /// Total bytes covered by `full_digest`.
    pub size: u64,
    pub full_digest: Digest,
    /// Bytes covered by `header_digest`; stops growing once it reaches
    /// `INDEXING_BLOCK_SIZE`.
    pub header_size: u64,
    pub header_digest: Digest,
    /// File offset of the first retained tail byte.
    pub tail_offset: u64,
    /// Bytes covered by `tail_digest`, at most `2 * INDEXING_BLOCK_SIZE`.
    pub tail_size: u64,
    pub tail_digest: Digest,
}

/// Streaming fingerprint builder: the full-digest state plus the retained
/// header and tail blocks.
#[derive(Clone, Debug, Default)]
pub struct RollingFingerprint {
    builder: FileDigest,
    header_blocks: Vec<Vec<u8>>,
    /// (offset in file, block bytes) pairs, oldest first.
    tail_blocks: VecDeque<(u64, Vec<u8>)>,
    hash: IndexedHash,
}

impl RollingFingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current fingerprint snapshot.
    pub fn hash(&self) -> IndexedHash {
        self.hash
    }

    pub fn indexed_size(&self) -> u64 {
        self.hash.size
    }

    /// Drops all state, returning to the "nothing indexed" fingerprint.
    pub fn clear(&mut self) {
        self.builder.reset();
        self.header_blocks.clear();
        self.tail_blocks.clear();
        self.hash = IndexedHash::default();
    }

    /// Folds one non-empty committed block into the fingerprint.
    pub fn add_block(&mut self, block: &[u8]) {
        debug_assert!(!block.is_empty(), "empty blocks never reach the fingerprint");
        debug_assert!(block.len() <= INDEXING_BLOCK_SIZE);

        self.builder.update(block);
        self.hash.full_digest = self.builder.digest();

        if self.hash.header_size < INDEXING_BLOCK_SIZE as u64 {
            self.header_blocks.push(block.to_vec());

            let mut header_digest = FileDigest::new();
            for header_block in &self.header_blocks {
                header_digest.update(header_block);
            }
            self.hash.header_digest = header_digest.digest();
            self.hash.header_size += block.len() as u64;
        }

        self.tail_blocks.push_back((self.hash.size, block.to_vec()));
        let mut retained: u64 = self.tail_blocks.iter().map(|(_, b)| b.len() as u64).sum();
        while retained > 2 * INDEXING_BLOCK_SIZE as u64 {
            let (_, dropped) = self
                .tail_blocks
                .pop_front()
                .expect("retained > 0 implies a block to drop");
            retained -= dropped.len() as u64;
        }

        let mut tail_digest = FileDigest::new();
        self.hash.tail_size = 0;
        for (_, tail_block) in &self.tail_blocks {
            tail_digest.update(tail_block);
            self.hash.tail_size += tail_block.len() as u64;
        }
        self.hash.tail_offset = self
            .tail_blocks
            .front()
            .map(|(offset, _)| *offset)
            .unwrap_or(0);
        self.hash.tail_digest = tail_digest.digest();

        self.hash.size += block.len() as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLOCK: usize = INDEXING_BLOCK_SIZE;

    fn filled(byte: u8, len: usize) -> Vec<u8> {
        vec![byte; len]
    }

    #[test]
    fn small_file_header_tail_and_full_agree() {
        let mut fp = RollingFingerprint::new();
        fp.add_block(b"hello world");

        let hash = fp.hash();
        assert_eq!(hash.size, 11);
        assert_eq!(hash.header_size, 11);
        assert_eq!(hash.tail_size, 11);
        assert_eq!(hash.tail_offset, 0);
        assert_eq!(hash.full_digest, FileDigest::of(b"hello world"));
        assert_eq!(hash.header_digest, hash.full_digest);
        assert_eq!(hash.tail_digest, hash.full_digest);
    }

    #[test]
    fn full_digest_matches_streaming_over_all_blocks() {
        let mut fp = RollingFingerprint::new();
        let a = filled(b'a', BLOCK);
        let b = filled(b'b', BLOCK);
        fp.add_block(&a);
        fp.add_block(&b);

        let mut reference = FileDigest::new();
        reference.update(&a);
        reference.update(&b);
        assert_eq!(fp.hash().full_digest, reference.digest());
        assert_eq!(fp.hash().size, 2 * BLOCK as u64);
    }

    #[test]
    fn header_stops_growing_at_block_size() {
        let mut fp = RollingFingerprint::new();
        fp.add_block(&filled(b'a', BLOCK));
        let after_first = fp.hash();
        assert_eq!(after_first.header_size, BLOCK as u64);

        fp.add_block(&filled(b'b', BLOCK));
        let after_second = fp.hash();
        assert_eq!(after_second.header_size, BLOCK as u64);
        assert_eq!(after_second.header_digest, after_first.header_digest);
    }

    #[test]
    fn short_first_block_keeps_header_open_past_the_bound() {
        // header_size was still below the bound when the second block was
        // added, so that block is included even though the total passes 1 MiB.
        let mut fp = RollingFingerprint::new();
        fp.add_block(&filled(b'a', BLOCK / 2));
        fp.add_block(&filled(b'b', BLOCK));

        let hash = fp.hash();
        assert_eq!(hash.header_size, (BLOCK + BLOCK / 2) as u64);

        fp.add_block(&filled(b'c', BLOCK));
        assert_eq!(fp.hash().header_size, (BLOCK + BLOCK / 2) as u64);
    }

    #[test]
    fn tail_window_slides_and_stays_bounded() {
        let mut fp = RollingFingerprint::new();
        for i in 0..4u8 {
            fp.add_block(&filled(b'a' + i, BLOCK));
        }

        let hash = fp.hash();
        assert_eq!(hash.size, 4 * BLOCK as u64);
        assert!(hash.tail_size <= 2 * BLOCK as u64);
        // Blocks 2 and 3 are retained; the window starts where block 2 began.
        assert_eq!(hash.tail_offset, 2 * BLOCK as u64);

        let mut reference = FileDigest::new();
        reference.update(&filled(b'c', BLOCK));
        reference.update(&filled(b'd', BLOCK));
        assert_eq!(hash.tail_digest, reference.digest());
    }

    #[test]
    fn tail_bound_holds_for_mixed_block_sizes() {
        let mut fp = RollingFingerprint::new();
        fp.add_block(&filled(b'a', 16));
        fp.add_block(&filled(b'b', BLOCK));
        fp.add_block(&filled(b'c', BLOCK));
        fp.add_block(&filled(b'd', BLOCK));

        assert!(fp.hash().tail_size <= 2 * BLOCK as u64);
    }

    #[test]
    fn tail_offset_plus_size_never_exceeds_size() {
        let mut fp = RollingFingerprint::new();
        for len in [100usize, BLOCK, 3, BLOCK, BLOCK / 3] {
            fp.add_block(&filled(b'x', len));
            let hash = fp.hash();
            assert!(hash.tail_offset + hash.tail_size <= hash.size);
            assert!(hash.header_size <= BLOCK as u64);
        }
    }

    #[test]
    fn clear_resets_to_default() {
        let mut fp = RollingFingerprint::new();
        fp.add_block(b"data");
        fp.clear();

        assert_eq!(fp.hash(), IndexedHash::default());

        // Re-adding the same content reproduces the same fingerprint.
        fp.add_block(b"data");
        assert_eq!(fp.hash().full_digest, FileDigest::of(b"data"));
    }
}
