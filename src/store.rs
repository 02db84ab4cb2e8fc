//! Authoritative indexing store and its scoped accessors.
//!
//! The store is the only shared mutable state in the crate. All access goes
//! through [`ConstAccessor`] (shared read) or [`MutateAccessor`] (exclusive
//! write), each holding the store's lock for exactly its own lifetime. A
//! multi-field read that needs a consistent snapshot (fingerprint plus size,
//! say) must happen under a single accessor.
//!
//! Discipline: no I/O and no parsing while an accessor is alive. The
//! pipeline parses into local buffers first and only then takes the write
//! lock to commit.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::encoding::TextCodec;
use crate::fingerprint::{IndexedHash, RollingFingerprint};
use crate::line_positions::{BlockLinePositions, LinePositionArray};
use crate::types::{LineLength, LineNumber, LineOffset, LinesCount};

#[derive(Debug, Default)]
struct StoreState {
    line_positions: LinePositionArray,
    max_length: LineLength,
    fingerprint: RollingFingerprint,
    encoding_guess: Option<TextCodec>,
    encoding_forced: Option<TextCodec>,
}

/// Concurrency-guarded container for one file's index.
///
/// Lives for the lifetime of a logical file session; cleared on full-index
/// start and on cancellation.
#[derive(Debug, Default)]
pub struct IndexingStore {
    state: RwLock<StoreState>,
}

impl IndexingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the shared read lock for the accessor's lifetime.
    pub fn read(&self) -> ConstAccessor<'_> {
        ConstAccessor {
            state: self.state.read().expect("indexing store lock poisoned"),
        }
    }

    /// Takes the exclusive write lock for the accessor's lifetime.
    pub fn write(&self) -> MutateAccessor<'_> {
        MutateAccessor {
            state: self.state.write().expect("indexing store lock poisoned"),
        }
    }
}

/// Shared-read view of the store.
pub struct ConstAccessor<'a> {
    state: RwLockReadGuard<'a, StoreState>,
}

impl ConstAccessor<'_> {
    /// Bytes covered by the index so far (fake final LF excluded: only real
    /// bytes are fingerprinted).
    pub fn indexed_size(&self) -> u64 {
        self.state.fingerprint.indexed_size()
    }

    pub fn hash(&self) -> IndexedHash {
        self.state.fingerprint.hash()
    }

    pub fn max_length(&self) -> LineLength {
        self.state.max_length
    }

    pub fn nb_lines(&self) -> LinesCount {
        self.state.line_positions.nb_lines()
    }

    /// Byte offset at which line `line + 1` begins.
    ///
    /// # Panics
    /// Panics if `line` is out of range.
    pub fn pos_for_line(&self, line: LineNumber) -> LineOffset {
        self.state.line_positions.at(line)
    }

    pub fn fake_final_lf(&self) -> bool {
        self.state.line_positions.fake_final_lf()
    }

    pub fn encoding_guess(&self) -> Option<TextCodec> {
        self.state.encoding_guess
    }

    pub fn forced_encoding(&self) -> Option<TextCodec> {
        self.state.encoding_forced
    }

    /// Bytes allocated for line-position storage.
    pub fn allocated_size(&self) -> usize {
        self.state.line_positions.allocated_size()
    }
}

/// Exclusive-write view of the store.
pub struct MutateAccessor<'a> {
    state: RwLockWriteGuard<'a, StoreState>,
}

impl MutateAccessor<'_> {
    /// Resets line positions, max length, and fingerprint; no codec survives.
    pub fn clear(&mut self) {
        self.state.line_positions = LinePositionArray::new();
        self.state.max_length = LineLength(0);
        self.state.fingerprint.clear();
        self.state.encoding_guess = None;
        self.state.encoding_forced = None;
    }

    pub fn force_encoding(&mut self, codec: Option<TextCodec>) {
        self.state.encoding_forced = codec;
    }

    pub fn set_encoding_guess(&mut self, codec: Option<TextCodec>) {
        self.state.encoding_guess = codec;
    }

    pub fn encoding_guess(&self) -> Option<TextCodec> {
        self.state.encoding_guess
    }

    /// Bytes allocated for line-position storage.
    pub fn allocated_size(&self) -> usize {
        self.state.line_positions.allocated_size()
    }

    /// Commits one parsed block: the only path that grows the store.
    ///
    /// Extends the line positions, folds `length` into the max, feeds a
    /// non-empty `block` into the rolling fingerprint, and refreshes the
    /// encoding guess. The fake-final-LF fixup commits an empty block so the
    /// fingerprint only ever covers real file bytes.
    pub fn add_all(
        &mut self,
        block: &[u8],
        length: LineLength,
        line_positions: &BlockLinePositions,
        encoding: Option<TextCodec>,
    ) {
        if length > self.state.max_length {
            self.state.max_length = length;
        }
        self.state.line_positions.extend_from_block(line_positions);

        if !block.is_empty() {
            self.state.fingerprint.add_block(block);
        }

        self.state.encoding_guess = encoding;
    }
}
