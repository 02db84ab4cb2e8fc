//! Property tests for the indexing core.
//!
//! Content is generated as printable lines (tabs included), written to a
//! real file, and indexed through the full pipeline. A straightforward
//! reference computation over the raw bytes checks positions, counts,
//! widths, and resumption equivalence.

use std::fs;
use std::path::Path;

use proptest::prelude::*;
use tempfile::TempDir;

use logdex::{
    FileDigest, IndexConfig, IndexOperation, IndexingStore, InterruptRequest, LineNumber,
    NullObserver, TAB_STOP,
};

fn full_index(path: &Path, store: &IndexingStore) {
    let config = IndexConfig::default();
    let interrupt = InterruptRequest::new();
    let observer = NullObserver;
    assert!(IndexOperation::new(path, store, &config, &interrupt, &observer).run_full(None));
}

fn partial_index(path: &Path, store: &IndexingStore) {
    let config = IndexConfig::default();
    let interrupt = InterruptRequest::new();
    let observer = NullObserver;
    assert!(IndexOperation::new(path, store, &config, &interrupt, &observer).run_partial());
}

fn positions(store: &IndexingStore) -> Vec<u64> {
    let accessor = store.read();
    (0..accessor.nb_lines().0)
        .map(|line| accessor.pos_for_line(LineNumber(line)).0)
        .collect()
}

/// Reference width of one line: tab-expanded display columns.
fn reference_width(line: &[u8]) -> u64 {
    let mut column = 0u64;
    for &byte in line {
        if byte == b'\t' {
            column += TAB_STOP - column % TAB_STOP;
        } else {
            column += 1;
        }
    }
    column
}

/// Reference line split: (start, end-exclusive-of-LF) pairs plus whether the
/// last line is unterminated.
fn reference_lines(content: &[u8]) -> (Vec<(usize, usize)>, bool) {
    let mut lines = Vec::new();
    let mut start = 0usize;
    for (i, &byte) in content.iter().enumerate() {
        if byte == b'\n' {
            lines.push((start, i));
            start = i + 1;
        }
    }
    let dangling = start < content.len();
    if dangling {
        lines.push((start, content.len()));
    }
    (lines, dangling)
}

fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    (
        proptest::collection::vec("[a-zA-Z0-9 \\t]{0,40}", 0..30),
        any::<bool>(),
    )
        .prop_map(|(lines, terminated)| {
            let mut content = lines.join("\n").into_bytes();
            if terminated && !content.is_empty() {
                content.push(b'\n');
            }
            content
        })
}

proptest! {
    #[test]
    fn index_matches_reference_split(content in content_strategy()) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("gen.log");
        fs::write(&path, &content).expect("write fixture");

        let store = IndexingStore::new();
        full_index(&path, &store);

        let (lines, dangling) = reference_lines(&content);
        let positions = positions(&store);

        prop_assert_eq!(positions.len(), lines.len());
        prop_assert_eq!(store.read().fake_final_lf(), dangling);

        // Strict monotonicity.
        for pair in positions.windows(2) {
            prop_assert!(pair[0] < pair[1]);
        }

        // Entry i is one past line i's terminator: start of line i + 1.
        for (i, &(start, end)) in lines.iter().enumerate() {
            let expected = if dangling && i == lines.len() - 1 {
                content.len() as u64 + 1 // synthetic final boundary
            } else {
                end as u64 + 1
            };
            prop_assert_eq!(positions[i], expected);

            // Round-trip: previous boundary is this line's start.
            let line_start = if i == 0 { 0 } else { positions[i - 1] };
            prop_assert_eq!(line_start, start as u64);
        }

        // Max width equals the widest reference line.
        let expected_max = lines
            .iter()
            .map(|&(start, end)| reference_width(&content[start..end]))
            .max()
            .unwrap_or(0);
        prop_assert_eq!(u64::from(store.read().max_length().0), expected_max);

        // Fingerprint covers exactly the real bytes.
        let accessor = store.read();
        prop_assert_eq!(accessor.hash().size, content.len() as u64);
        prop_assert_eq!(accessor.hash().full_digest, FileDigest::of(&content));
    }

    #[test]
    fn double_full_index_is_idempotent(content in content_strategy()) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("gen.log");
        fs::write(&path, &content).expect("write fixture");

        let store = IndexingStore::new();
        full_index(&path, &store);
        let first = (
            positions(&store),
            store.read().max_length(),
            store.read().hash(),
        );

        full_index(&path, &store);
        prop_assert_eq!(positions(&store), first.0);
        prop_assert_eq!(store.read().max_length(), first.1);
        prop_assert_eq!(store.read().hash(), first.2);
    }

    #[test]
    fn resumed_index_equals_fresh_index(
        content in content_strategy(),
        split in 0.0f64..1.0,
    ) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("gen.log");

        let split_at = (content.len() as f64 * split) as usize;

        // Index the prefix, grow the file, index the rest incrementally.
        fs::write(&path, &content[..split_at]).expect("write prefix");
        let resumed = IndexingStore::new();
        full_index(&path, &resumed);
        fs::write(&path, &content).expect("grow file");
        partial_index(&path, &resumed);

        // One full scan of the final content.
        let fresh = IndexingStore::new();
        full_index(&path, &fresh);

        prop_assert_eq!(positions(&resumed), positions(&fresh));
        prop_assert_eq!(
            resumed.read().fake_final_lf(),
            fresh.read().fake_final_lf()
        );
        prop_assert_eq!(resumed.read().hash().size, fresh.read().hash().size);
        prop_assert_eq!(
            resumed.read().hash().full_digest,
            fresh.read().hash().full_digest
        );
    }
}
