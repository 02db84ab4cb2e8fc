//! Observer interface for indexing progress and completion.
//!
//! The core emits through this trait and never assumes where the callbacks
//! land: the integration layer may forward them to a channel, a UI signal,
//! or drop them. Implementations must tolerate calls from whichever thread
//! runs the operation.
//!
//! Delivery contract, per operation: progress events arrive in commit order,
//! and exactly one completion event (`indexing_finished` or
//! `file_check_finished`) arrives after all of them.

use std::sync::Mutex;

use crate::change::MonitoredFileStatus;

/// Receives operation lifecycle events.
///
/// All methods default to no-ops so observers implement only what they need.
pub trait IndexingObserver: Send + Sync {
    /// Indexing progress in integer percent, 0..=100. At least one event per
    /// committed non-empty block.
    fn indexing_progressed(&self, _percent: u32) {}

    /// Terminal event of FullIndex / PartialIndex. `success` is false iff
    /// the operation was cancelled.
    fn indexing_finished(&self, _success: bool) {}

    /// Terminal event of CheckFileChanges.
    fn file_check_finished(&self, _status: MonitoredFileStatus) {}
}

/// Observer that drops every event.
#[derive(Debug, Default)]
pub struct NullObserver;

impl IndexingObserver for NullObserver {}

/// Event record captured by [`CollectingObserver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObserverEvent {
    Progressed(u32),
    Finished(bool),
    FileCheckFinished(MonitoredFileStatus),
}

/// Observer that appends every event to an in-memory list.
///
/// Mainly for tests and headless diagnostics; the mutex is held only for the
/// push, never across user code.
#[derive(Debug, Default)]
pub struct CollectingObserver {
    events: Mutex<Vec<ObserverEvent>>,
}

impl CollectingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything observed so far.
    pub fn events(&self) -> Vec<ObserverEvent> {
        self.events
            .lock()
            .expect("collecting observer mutex poisoned")
            .clone()
    }
}

impl IndexingObserver for CollectingObserver {
    fn indexing_progressed(&self, percent: u32) {
        self.events
            .lock()
            .expect("collecting observer mutex poisoned")
            .push(ObserverEvent::Progressed(percent));
    }

    fn indexing_finished(&self, success: bool) {
        self.events
            .lock()
            .expect("collecting observer mutex poisoned")
            .push(ObserverEvent::Finished(success));
    }

    fn file_check_finished(&self, status: MonitoredFileStatus) {
        self.events
            .lock()
            .expect("collecting observer mutex poisoned")
            .push(ObserverEvent::FileCheckFinished(status));
    }
}
