//! Error types for the indexing operations.
//!
//! Failures never cross an operation boundary: FullIndex and PartialIndex
//! convert them into the empty-file path or a success/cancelled signal, and
//! CheckFileChanges folds them into `Truncated`. These types cover the
//! fallible seams inside an operation so call sites decide policy by
//! variant instead of by log line.
//!
//! # Design Notes
//! - I/O errors preserve their source to keep diagnostics actionable.
//! - The enum is `#[non_exhaustive]` so variants can be added without
//!   breaking callers; consumers should include a fallback match arm.

use std::fmt;
use std::io;

/// Errors from opening and positioning a file at scan start.
#[derive(Debug)]
#[non_exhaustive]
pub enum ScanSetupError {
    /// The file could not be opened.
    Open(io::Error),
    /// The file opened but its size could not be read.
    Metadata(io::Error),
    /// Seeking to the scan start position failed.
    Seek { offset: u64, source: io::Error },
}

impl ScanSetupError {
    /// True for the variants treated as "the file is effectively absent":
    /// the operation then presents an empty file instead of failing.
    pub fn file_is_gone(&self) -> bool {
        matches!(self, Self::Open(_) | Self::Metadata(_))
    }
}

impl fmt::Display for ScanSetupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(err) => write!(f, "cannot open file: {err}"),
            Self::Metadata(err) => write!(f, "cannot read file size: {err}"),
            Self::Seek { offset, source } => {
                write!(f, "cannot seek to offset {offset}: {source}")
            }
        }
    }
}

impl std::error::Error for ScanSetupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open(err) | Self::Metadata(err) => Some(err),
            Self::Seek { source, .. } => Some(source),
        }
    }
}
