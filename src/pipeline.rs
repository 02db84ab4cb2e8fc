//! Indexing pipeline: reader thread, bounded prefetch channel, serial
//! parser/committer.
//!
//! ```text
//! reader thread ──(offset, block)──► sync_channel(prefetch) ──► parse ──► commit ──► progress
//! ```
//!
//! The reader owns the file handle outright; the parser never touches it.
//! The bounded channel is the prefetch limiter: a blocking send back-
//! pressures the reader, capping in-flight memory at
//! `prefetch_blocks * INDEXING_BLOCK_SIZE`. The channel closing is the
//! end-of-stream signal. Blocks arrive FIFO and the parser is the single
//! consumer, so line positions and fingerprint updates are committed in
//! strictly increasing block-offset order.
//!
//! Cancellation is cooperative: both stages check the interrupt flag between
//! blocks only. When the parser stops receiving, the channel drops and a
//! reader stuck on a full channel unblocks with a send error; the scope then
//! joins it, so an interrupted pipeline always drains to quiescence before
//! the operation cleans up.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::mpsc::{self, SyncSender};
use std::thread;
use std::time::Instant;

use tracing::{debug, warn};

use crate::config::IndexConfig;
use crate::encoding::{self, EncodingParameters, TextCodec};
use crate::error::ScanSetupError;
use crate::events::IndexingObserver;
use crate::line_positions::BlockLinePositions;
use crate::parse::{parse_data_block, IndexingState};
use crate::store::IndexingStore;
use crate::types::{InterruptRequest, LineLength, LineOffset, INDEXING_BLOCK_SIZE};

/// One scan operation over a single file.
///
/// Borrowed context only; the dispatcher owns everything and hands the
/// operation references for the duration of one run.
pub struct IndexOperation<'a> {
    file_path: &'a Path,
    store: &'a IndexingStore,
    config: &'a IndexConfig,
    interrupt: &'a InterruptRequest,
    observer: &'a dyn IndexingObserver,
}

impl<'a> IndexOperation<'a> {
    pub fn new(
        file_path: &'a Path,
        store: &'a IndexingStore,
        config: &'a IndexConfig,
        interrupt: &'a InterruptRequest,
        observer: &'a dyn IndexingObserver,
    ) -> Self {
        Self {
            file_path,
            store,
            config,
            interrupt,
            observer,
        }
    }

    /// FullIndex: clears the store, applies the forced codec, scans from
    /// offset 0. Returns false iff cancelled.
    pub fn run_full(&self, forced_encoding: Option<TextCodec>) -> bool {
        debug!(file = %self.file_path.display(), "full index starting");
        self.observer.indexing_progressed(0);

        {
            let mut store = self.store.write();
            store.clear();
            store.force_encoding(forced_encoding);
        }

        self.do_index(LineOffset(0));

        let success = !self.interrupt.is_set();
        debug!(success, "full index finished");
        self.observer.indexing_finished(success);
        success
    }

    /// PartialIndex: resumes scanning at the currently indexed size.
    /// Returns false iff cancelled.
    pub fn run_partial(&self) -> bool {
        let initial_position = LineOffset(self.store.read().indexed_size());
        debug!(
            file = %self.file_path.display(),
            from = initial_position.0,
            "partial index starting"
        );
        self.observer.indexing_progressed(0);

        self.do_index(initial_position);

        let success = !self.interrupt.is_set();
        debug!(success, "partial index finished");
        self.observer.indexing_finished(success);
        success
    }

    fn do_index(&self, initial_position: LineOffset) {
        let (file, file_size) = match self.open_for_scan(initial_position.0) {
            Ok(opened) => opened,
            Err(err) => {
                warn!(file = %self.file_path.display(), %err, "scan setup failed");
                if err.file_is_gone() {
                    // An unopenable file is presented as an empty one; the
                    // viewer prefers an empty view to a modal error.
                    let mut store = self.store.write();
                    store.clear();
                    store.set_encoding_guess(Some(TextCodec::locale_default()));
                    drop(store);
                    self.observer.indexing_progressed(100);
                }
                return;
            }
        };

        let mut state = IndexingState::new(initial_position.0, file_size);

        {
            let store = self.store.read();
            state.file_codec = store.forced_encoding().or_else(|| store.encoding_guess());
            state.encoding_guess = store.encoding_guess();
        }
        if let Some(codec) = state.file_codec {
            state.encoding_params = EncodingParameters::for_codec(codec);
        }

        let indexing_start = Instant::now();
        let prefetch_blocks = self.config.prefetch_blocks();

        thread::scope(|scope| {
            let (block_tx, block_rx) = mpsc::sync_channel::<(u64, Vec<u8>)>(prefetch_blocks);
            let interrupt = self.interrupt;
            let reader_start = state.pos;

            scope.spawn(move || {
                if let Err(err) = read_blocks(file, reader_start, interrupt, block_tx) {
                    // Keep whatever was indexed; a later change check will
                    // reclassify the file.
                    warn!(%err, "block read failed, stopping reader");
                }
            });

            for (block_beginning, block) in block_rx.iter() {
                self.guess_encoding(&block, &mut state);

                let line_positions = parse_data_block(block_beginning, &block, &mut state);
                {
                    let mut store = self.store.write();
                    store.add_all(
                        &block,
                        LineLength(state.max_length),
                        &line_positions,
                        state.encoding_guess,
                    );
                }

                let progress = if state.file_size > 0 {
                    (state.pos.saturating_mul(100) / state.file_size).min(100) as u32
                } else {
                    100
                };
                self.observer.indexing_progressed(progress);

                if self.interrupt.is_set() {
                    break;
                }
            }
            // block_rx drops here; a blocked reader sees the send fail and
            // exits before the scope joins it.
        });

        let mut store = self.store.write();
        debug!(indexed_to = state.pos, "pipeline drained");

        // A trailing line without its LF gets a synthetic boundary one past
        // the end of the file so its real length stays computable.
        if !self.interrupt.is_set() && state.file_size > state.pos {
            debug!("file not LF-terminated, appending synthetic final line");
            // The dangling line still counts toward the max width.
            let trailing = state
                .file_size
                .saturating_sub(state.pos)
                .saturating_add(u64::from(state.additional_spaces));
            let trailing = LineLength(trailing.min(u64::from(u32::MAX)) as u32);

            let mut line_position = BlockLinePositions::new();
            line_position.append(LineOffset(state.file_size + 1));
            line_position.set_fake_final_lf();
            store.add_all(&[], trailing, &line_position, state.encoding_guess);
        }

        let elapsed = indexing_start.elapsed();
        debug!(
            ?elapsed,
            allocated = store.allocated_size(),
            throughput_mib_s =
                state.file_size as f64 / (1024.0 * 1024.0) / elapsed.as_secs_f64().max(1e-9),
            "indexing done"
        );

        if self.interrupt.is_set() {
            store.clear();
        }
        if store.encoding_guess().is_none() {
            store.set_encoding_guess(Some(TextCodec::locale_default()));
        }
    }

    /// Opens the file and positions it at `offset`, reading the size
    /// snapshot along the way.
    fn open_for_scan(&self, offset: u64) -> Result<(File, u64), ScanSetupError> {
        let mut file = File::open(self.file_path).map_err(ScanSetupError::Open)?;
        let file_size = file
            .metadata()
            .map(|metadata| metadata.len())
            .map_err(ScanSetupError::Metadata)?;
        file.seek(SeekFrom::Start(offset))
            .map_err(|source| ScanSetupError::Seek { offset, source })?;
        Ok((file, file_size))
    }

    /// Resolves the codec used for LF geometry, once, from the first block.
    ///
    /// Priority: user-forced codec, then the guess already stored from an
    /// earlier scan, then the fresh heuristic guess. The store's guess is
    /// refreshed on every commit afterwards.
    fn guess_encoding(&self, block: &[u8], state: &mut IndexingState) {
        if state.encoding_guess.is_none() {
            let guess = encoding::detect_encoding(block);
            debug!(codec = guess.name(), "encoding guess");
            state.encoding_guess = Some(guess);
        }

        if state.file_codec.is_none() {
            let store = self.store.read();
            let codec = store
                .forced_encoding()
                .or_else(|| store.encoding_guess())
                .or(state.encoding_guess);
            drop(store);

            state.file_codec = codec;
            if let Some(codec) = codec {
                state.encoding_params = EncodingParameters::for_codec(codec);
                debug!(
                    codec = codec.name(),
                    line_feed_width = state.encoding_params.line_feed_width,
                    "active encoding resolved"
                );
            }
        }
    }
}

/// Reader stage: sequential block reads on a dedicated thread.
///
/// Emits `(absolute offset, bytes)` per successful read; EOF ends the stream
/// by dropping the sender, and a read error does the same after propagating
/// to the spawn site for logging. Short reads are forwarded as-is. The
/// interrupt flag is checked between reads only.
fn read_blocks(
    mut file: File,
    mut pos: u64,
    interrupt: &InterruptRequest,
    blocks: SyncSender<(u64, Vec<u8>)>,
) -> io::Result<()> {
    let mut read_buffer = vec![0u8; INDEXING_BLOCK_SIZE];
    loop {
        if interrupt.is_set() {
            return Ok(());
        }

        let read = file.read(&mut read_buffer)?;
        if read == 0 {
            return Ok(());
        }

        // The parser outlives this buffer; hand it owned bytes.
        let block = read_buffer[..read].to_vec();
        if blocks.send((pos, block)).is_err() {
            // Receiver gone: the parser stopped early.
            return Ok(());
        }
        pos += read as u64;
    }
}
