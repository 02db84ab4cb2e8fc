//! Indexing configuration.
//!
//! Loading and persistence belong to the embedding application; the core
//! only consumes the resolved values.

use serde::{Deserialize, Serialize};

use crate::types::INDEXING_BLOCK_SIZE;

/// Tunables consumed by the indexing pipeline and the change detector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Read-ahead budget in MiB. One block is 1 MiB, so this is the bounded
    /// channel capacity between reader and parser; in-flight memory is capped
    /// at this many blocks.
    pub index_read_buffer_size_mb: usize,

    /// When true, change detection on files larger than 2 MiB compares only
    /// the header and tail digests instead of re-reading the whole indexed
    /// range.
    pub fast_modification_detection: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_read_buffer_size_mb: 16,
            fast_modification_detection: false,
        }
    }
}

impl IndexConfig {
    /// Prefetch capacity in blocks; a zero configuration still admits one
    /// in-flight block so the pipeline can make progress.
    pub fn prefetch_blocks(&self) -> usize {
        self.index_read_buffer_size_mb.max(1)
    }

    /// Upper bound on in-flight pipeline memory, in bytes.
    pub fn prefetch_memory_bound(&self) -> usize {
        self.prefetch_blocks() * INDEXING_BLOCK_SIZE
    }
}
