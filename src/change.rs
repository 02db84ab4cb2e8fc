//! Change detection against the stored fingerprint.
//!
//! Classifies the on-disk file relative to what was indexed. Any
//! non-appending change collapses to [`MonitoredFileStatus::Truncated`]: the
//! consumer re-indexes from scratch in that case, so distinguishing rewrite
//! from shrink buys nothing.
//!
//! Fast mode skips re-reading the whole indexed range and compares only the
//! header and tail digests. It is probabilistic in the digest width, and only
//! engages above `2 * INDEXING_BLOCK_SIZE` indexed bytes, below which the
//! full re-read is cheap anyway.

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use tracing::{debug, info};

use crate::config::IndexConfig;
use crate::digest::{Digest, FileDigest};
use crate::events::IndexingObserver;
use crate::fingerprint::IndexedHash;
use crate::store::IndexingStore;
use crate::types::INDEXING_BLOCK_SIZE;

/// Classification of the on-disk file relative to the stored index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitoredFileStatus {
    /// The indexed prefix is intact and nothing follows it.
    Unchanged,
    /// The indexed prefix is intact and the file grew past it.
    DataAdded,
    /// The file shrank, vanished, or changed inside the indexed range.
    Truncated,
}

/// CheckFileChanges operation: classifies and emits the completion event.
pub fn run_check(
    file_path: &Path,
    store: &IndexingStore,
    config: &IndexConfig,
    observer: &dyn IndexingObserver,
) -> MonitoredFileStatus {
    let status = check_file_changes(file_path, store, config);
    observer.file_check_finished(status);
    status
}

/// Compares the file on disk against the stored fingerprint.
pub fn check_file_changes(
    file_path: &Path,
    store: &IndexingStore,
    config: &IndexConfig,
) -> MonitoredFileStatus {
    let indexed_hash = store.read().hash();
    // A file we cannot stat is gone as far as the index is concerned.
    let real_file_size = fs::metadata(file_path).map(|m| m.len()).unwrap_or(0);

    if real_file_size == 0 || real_file_size < indexed_hash.size {
        info!(file = %file_path.display(), "file truncated");
        return MonitoredFileStatus::Truncated;
    }

    let mut file = match File::open(file_path) {
        Ok(file) => file,
        Err(err) => {
            info!(file = %file_path.display(), %err, "file failed to open");
            return MonitoredFileStatus::Truncated;
        }
    };

    let fast_eligible = config.fast_modification_detection
        && indexed_hash.size > 2 * INDEXING_BLOCK_SIZE as u64;

    // A file that cannot be read back cannot be verified either; both count
    // as modified.
    let modified = match digests_differ(&mut file, &indexed_hash, fast_eligible) {
        Ok(modified) => modified,
        Err(err) => {
            info!(file = %file_path.display(), %err, "digest read failed");
            true
        }
    };

    if modified {
        info!(file = %file_path.display(), "file changed in indexed range");
        MonitoredFileStatus::Truncated
    } else if real_file_size > indexed_hash.size {
        info!(file = %file_path.display(), "new data on disk");
        MonitoredFileStatus::DataAdded
    } else {
        debug!(file = %file_path.display(), "no change");
        MonitoredFileStatus::Unchanged
    }
}

/// Compares on-disk digests against the stored ones over the indexed range.
///
/// Fast mode checks the header digest first and only reads the tail window
/// when the header still matches; full mode re-digests the whole indexed
/// prefix.
fn digests_differ(
    file: &mut File,
    indexed_hash: &IndexedHash,
    fast: bool,
) -> io::Result<bool> {
    let mut buffer = vec![0u8; INDEXING_BLOCK_SIZE];

    if fast {
        let header_digest = digest_prefix(file, indexed_hash.header_size, &mut buffer)?;
        debug!(
            indexed = indexed_hash.header_digest,
            current = header_digest,
            size = indexed_hash.header_size,
            "header digest comparison"
        );
        if header_digest != indexed_hash.header_digest {
            return Ok(true);
        }

        file.seek(SeekFrom::Start(indexed_hash.tail_offset))?;
        let tail_digest = digest_prefix(file, indexed_hash.tail_size, &mut buffer)?;
        debug!(
            indexed = indexed_hash.tail_digest,
            current = tail_digest,
            size = indexed_hash.tail_size,
            "tail digest comparison"
        );
        Ok(tail_digest != indexed_hash.tail_digest)
    } else {
        let full_digest = digest_prefix(file, indexed_hash.size, &mut buffer)?;
        debug!(
            indexed = indexed_hash.full_digest,
            current = full_digest,
            "full digest comparison"
        );
        Ok(full_digest != indexed_hash.full_digest)
    }
}

/// Digests the next `len` bytes of `file`.
///
/// A short read means the file shrank under us; the run ends early and the
/// partial digest then fails its comparison, which is the correct outcome
/// for a file in flux. Read errors propagate to the caller.
fn digest_prefix(file: &mut File, len: u64, buffer: &mut [u8]) -> io::Result<Digest> {
    let mut digest = FileDigest::new();
    let mut total: u64 = 0;

    while total < len {
        let to_read = buffer.len().min((len - total) as usize);
        let read = file.read(&mut buffer[..to_read])?;
        if read == 0 {
            break;
        }
        digest.update(&buffer[..read]);
        total += read as u64;
    }

    Ok(digest.digest())
}
