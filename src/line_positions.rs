//! Line-position storage.
//!
//! Entry *i* holds the byte offset of the first byte of line *i + 1*: one
//! past the LF code unit of line *i*. The sequence is strictly increasing.
//! A file whose last line has no terminating LF gets a synthetic final entry
//! at `file_size + 1`, marked by the fake-final-LF flag so downstream readers
//! can compute the real length of the last line.

use crate::types::{LineNumber, LineOffset, LinesCount};

/// Line positions produced while parsing a single block.
///
/// Blocks are at most 1 MiB, so this stays small; the store batch-appends it
/// under its write lock. The fake-final-LF marker rides along only for the
/// end-of-scan fixup commit.
#[derive(Clone, Debug, Default)]
pub struct BlockLinePositions {
    positions: Vec<LineOffset>,
    fake_final_lf: bool,
}

impl BlockLinePositions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, position: LineOffset) {
        self.positions.push(position);
    }

    pub fn set_fake_final_lf(&mut self) {
        self.fake_final_lf = true;
    }

    pub fn fake_final_lf(&self) -> bool {
        self.fake_final_lf
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn as_slice(&self) -> &[LineOffset] {
        &self.positions
    }
}

/// Authoritative append-only line-position array for one file.
#[derive(Clone, Debug, Default)]
pub struct LinePositionArray {
    positions: Vec<LineOffset>,
    fake_final_lf: bool,
}

impl LinePositionArray {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nb_lines(&self) -> LinesCount {
        LinesCount(self.positions.len() as u64)
    }

    /// Position at which line `line + 1` begins.
    ///
    /// # Panics
    /// Panics if `line` is out of range.
    pub fn at(&self, line: LineNumber) -> LineOffset {
        self.positions[line.0 as usize]
    }

    pub fn fake_final_lf(&self) -> bool {
        self.fake_final_lf
    }

    /// Batch-appends the positions found in one block.
    ///
    /// If the array currently ends with a synthetic entry, that entry is
    /// dropped first: the bytes behind it are being re-scanned (a partial
    /// index resuming over a previously unterminated last line) and the real
    /// boundary, or a fresh synthetic one, replaces it.
    pub fn extend_from_block(&mut self, block: &BlockLinePositions) {
        if self.fake_final_lf {
            self.positions.pop();
        }
        self.positions.extend_from_slice(block.as_slice());
        self.fake_final_lf = block.fake_final_lf();
    }

    /// Bytes allocated for position storage.
    pub fn allocated_size(&self) -> usize {
        self.positions.capacity() * std::mem::size_of::<LineOffset>()
    }
}
