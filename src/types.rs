//! Core value types shared across the indexer.
//!
//! All offsets are byte positions; widths are display columns after tab
//! expansion. The newtypes are deliberately thin `Copy` wrappers so hot-path
//! arithmetic stays explicit at the call site.

use std::sync::atomic::{AtomicBool, Ordering};

/// Size of a single read block, in bytes.
///
/// The reader never hands the parser more than this per block, and the
/// rolling fingerprint bounds its retained header/tail bytes in multiples
/// of it.
pub const INDEXING_BLOCK_SIZE: usize = 1024 * 1024;

/// Fixed column grid against which `\t` expands.
pub const TAB_STOP: u64 = 8;

/// Byte position within the indexed file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineOffset(pub u64);

/// 0-based index into the line-position array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineNumber(pub u64);

/// Width of a line in display columns, after tab expansion.
///
/// For multi-byte encodings this counts bytes of the line's code units, the
/// same unit in which offsets advance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LineLength(pub u32);

/// Number of indexed lines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinesCount(pub u64);

/// Cooperative interrupt flag shared between an operation and its pipeline.
///
/// Set-once per operation lifetime: the dispatcher clears it when a new
/// operation starts and sets it on `interrupt()` or teardown. The reader and
/// parser observe it between blocks only; an in-progress block always
/// completes.
#[derive(Debug, Default)]
pub struct InterruptRequest {
    flag: AtomicBool,
}

impl InterruptRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
