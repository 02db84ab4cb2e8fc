//! Line indexer and change detector for very large log files.
//!
//! Scans a text file sequentially and builds a compact index that lets a
//! viewer locate and render any line in O(1) without rescanning:
//! - per-line byte positions (one `u64` per line) with a synthetic final
//!   entry for files whose last line has no terminating LF;
//! - the widest line seen, in display columns after tab expansion;
//! - a rolling header/body/tail content fingerprint used later to classify
//!   the on-disk file as unchanged, appended-to, or anything else.
//!
//! Indexing flow (single operation):
//!
//! ```text
//! File -> reader thread -> bounded channel -> parse_data_block -> IndexingStore
//!                                                   |
//!                                                   +-> progress / finished events
//! ```
//!
//! The reader and parser run concurrently with bounded memory; commits land
//! in file order through the store's write accessor. Operations (FullIndex,
//! PartialIndex, CheckFileChanges) are serialised by [`IndexWorker`] onto a
//! single background slot with cooperative cancellation.
//!
//! The crate never decodes text and never writes to disk; the indexed file
//! is read-only input.

pub mod change;
pub mod config;
pub mod digest;
pub mod encoding;
pub mod error;
pub mod events;
pub mod fingerprint;
pub mod line_positions;
pub mod parse;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod worker;

pub use change::{check_file_changes, MonitoredFileStatus};
pub use config::IndexConfig;
pub use digest::{Digest, FileDigest};
pub use encoding::{detect_encoding, EncodingParameters, TextCodec};
pub use error::ScanSetupError;
pub use events::{CollectingObserver, IndexingObserver, NullObserver, ObserverEvent};
pub use fingerprint::IndexedHash;
pub use line_positions::{BlockLinePositions, LinePositionArray};
pub use pipeline::IndexOperation;
pub use store::IndexingStore;
pub use types::{
    InterruptRequest, LineLength, LineNumber, LineOffset, LinesCount, INDEXING_BLOCK_SIZE,
    TAB_STOP,
};
pub use worker::IndexWorker;
