//! Operation dispatcher.
//!
//! Serialises FullIndex / PartialIndex / CheckFileChanges onto a single
//! background execution slot. Submitting while an operation is in flight
//! waits for it to finish first; submission never sets the interrupt flag,
//! so callers that want to abandon a running scan must call
//! [`IndexWorker::interrupt`] explicitly. Dropping the worker interrupts and
//! joins whatever is running.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::change;
use crate::config::IndexConfig;
use crate::encoding::TextCodec;
use crate::events::IndexingObserver;
use crate::pipeline::IndexOperation;
use crate::store::IndexingStore;
use crate::types::InterruptRequest;

/// Everything an operation needs, snapshotted at submission time.
struct OperationContext {
    file_path: PathBuf,
    store: Arc<IndexingStore>,
    config: IndexConfig,
    interrupt: Arc<InterruptRequest>,
    observer: Arc<dyn IndexingObserver>,
}

/// Background worker owning the single operation slot for one file session.
pub struct IndexWorker {
    store: Arc<IndexingStore>,
    observer: Arc<dyn IndexingObserver>,
    config: IndexConfig,
    interrupt: Arc<InterruptRequest>,
    file_path: Mutex<PathBuf>,
    operation: Mutex<Option<JoinHandle<bool>>>,
}

impl IndexWorker {
    pub fn new(
        store: Arc<IndexingStore>,
        observer: Arc<dyn IndexingObserver>,
        config: IndexConfig,
    ) -> Self {
        Self {
            store,
            observer,
            config,
            interrupt: Arc::new(InterruptRequest::new()),
            file_path: Mutex::new(PathBuf::new()),
            operation: Mutex::new(None),
        }
    }

    /// Sets the file targeted by subsequent operations.
    pub fn attach_file(&self, file_path: impl Into<PathBuf>) {
        let mut path = self.file_path.lock().expect("worker file path poisoned");
        *path = file_path.into();
    }

    /// Requests a FullIndex, optionally pinning the codec.
    pub fn index_all(&self, forced_encoding: Option<TextCodec>) {
        debug!("full index requested");
        self.submit(move |ctx| {
            IndexOperation::new(
                &ctx.file_path,
                &ctx.store,
                &ctx.config,
                &ctx.interrupt,
                ctx.observer.as_ref(),
            )
            .run_full(forced_encoding)
        });
    }

    /// Requests a PartialIndex from the currently indexed size.
    pub fn index_additional_lines(&self) {
        debug!("partial index requested");
        self.submit(|ctx| {
            IndexOperation::new(
                &ctx.file_path,
                &ctx.store,
                &ctx.config,
                &ctx.interrupt,
                ctx.observer.as_ref(),
            )
            .run_partial()
        });
    }

    /// Requests a change check against the stored fingerprint.
    pub fn check_file_changes(&self) {
        debug!("file change check requested");
        self.submit(|ctx| {
            change::run_check(
                &ctx.file_path,
                &ctx.store,
                &ctx.config,
                ctx.observer.as_ref(),
            );
            true
        });
    }

    /// Sets the interrupt flag observed by the running operation at its next
    /// block boundary. Does not wait.
    pub fn interrupt(&self) {
        info!("interrupt requested");
        self.interrupt.set();
    }

    /// Blocks until the in-flight operation, if any, has finished.
    pub fn wait_for_finished(&self) {
        let mut slot = self.operation.lock().expect("worker operation slot poisoned");
        if let Some(handle) = slot.take() {
            let _ = handle.join();
        }
    }

    fn submit(&self, run: impl FnOnce(&OperationContext) -> bool + Send + 'static) {
        let mut slot = self.operation.lock().expect("worker operation slot poisoned");

        // One slot: the previous operation runs to completion first.
        if let Some(previous) = slot.take() {
            let _ = previous.join();
        }
        self.interrupt.clear();

        let ctx = OperationContext {
            file_path: self
                .file_path
                .lock()
                .expect("worker file path poisoned")
                .clone(),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            interrupt: Arc::clone(&self.interrupt),
            observer: Arc::clone(&self.observer),
        };

        let handle = thread::Builder::new()
            .name("logdex-worker".into())
            .spawn(move || run(&ctx))
            .expect("failed to spawn indexing worker thread");
        *slot = Some(handle);
    }
}

impl Drop for IndexWorker {
    fn drop(&mut self) {
        self.interrupt.set();
        self.wait_for_finished();
    }
}
