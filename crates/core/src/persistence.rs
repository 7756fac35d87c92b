//! Debounced durable saving.
//!
//! Every dirty-marking write sends a touch to a background saver thread.
//! The thread restarts a fixed quiet-period window on each touch and, once
//! the window expires with no further writes, serializes the record and
//! saves it through the [`SnapshotStorage`]. A failed save records the
//! problem in the store status and leaves the dirty flag set, so the next
//! window retries; nothing in this path can panic the session.
//!
//! The saver thread is the only writer besides the façade, and both go
//! through the same mutex, so a save observes a settled record (a primary
//! write and its propagated writes are applied under one lock).

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use chrono::Utc;

use crate::reducer::{reduce, Action, StoreState};
use crate::storage::SnapshotStorage;

pub(crate) enum SaverMessage {
    /// A dirty-marking write happened; restart the quiet window.
    Touch,
    /// The store is closing; flush once if dirty and exit.
    Shutdown,
}

/// Owns the saver thread for one store.
pub(crate) struct PersistenceManager {
    tx: Sender<SaverMessage>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PersistenceManager {
    /// Spawns the saver thread.
    pub(crate) fn spawn(
        state: Arc<Mutex<StoreState>>,
        storage: Arc<dyn SnapshotStorage>,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel::<SaverMessage>();

        let handle = thread::Builder::new()
            .name("intake-autosave".into())
            .spawn(move || loop {
                match rx.recv() {
                    Ok(SaverMessage::Touch) => {
                        // Armed: wait until a full quiet window passes.
                        loop {
                            match rx.recv_timeout(debounce) {
                                Ok(SaverMessage::Touch) => continue,
                                Ok(SaverMessage::Shutdown) => {
                                    save_if_dirty(&state, storage.as_ref());
                                    return;
                                }
                                Err(RecvTimeoutError::Timeout) => {
                                    save_if_dirty(&state, storage.as_ref());
                                    break;
                                }
                                Err(RecvTimeoutError::Disconnected) => {
                                    save_if_dirty(&state, storage.as_ref());
                                    return;
                                }
                            }
                        }
                    }
                    Ok(SaverMessage::Shutdown) | Err(_) => {
                        save_if_dirty(&state, storage.as_ref());
                        return;
                    }
                }
            });

        match handle {
            Ok(handle) => Self {
                tx,
                handle: Some(handle),
            },
            Err(e) => {
                // Autosave degrades to explicit flushes only.
                tracing::warn!("failed to spawn autosave thread: {e}");
                Self { tx, handle: None }
            }
        }
    }

    /// Signals that a dirty-marking write happened.
    pub(crate) fn touch(&self) {
        // A closed channel means the saver already exited; flush-on-drop
        // still covers the data.
        let _ = self.tx.send(SaverMessage::Touch);
    }
}

impl Drop for PersistenceManager {
    fn drop(&mut self) {
        let _ = self.tx.send(SaverMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Serializes and saves the record if it has unsaved edits.
///
/// Holds the state lock across the save so a write cannot slip between
/// serialization and the saved-mark. On failure the in-memory record stays
/// authoritative, `is_dirty` stays set and the problem is surfaced through
/// the store status.
pub(crate) fn save_if_dirty(state: &Mutex<StoreState>, storage: &dyn SnapshotStorage) {
    let mut guard = match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if !guard.is_dirty {
        return;
    }
    persist_locked(&mut guard, storage, "autosave");
}

/// Serializes and saves the record unconditionally, under an already-held
/// lock. Used by autosave (via [`save_if_dirty`]) and by the immediate-save
/// paths of the façade.
pub(crate) fn persist_locked(
    state: &mut StoreState,
    storage: &dyn SnapshotStorage,
    context: &str,
) {
    let bytes = match serde_json::to_vec_pretty(&state.record) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("{context}: failed to serialize record: {e}");
            state.error = Some(format!("{context} failed: {e}"));
            return;
        }
    };

    match storage.save(&bytes) {
        Ok(()) => {
            reduce(state, Action::MarkSaved { at: Utc::now() });
            tracing::debug!("{context}: record saved ({} bytes)", bytes.len());
        }
        Err(e) => {
            tracing::warn!("{context}: failed to save record: {e}");
            state.error = Some(format!("{context} failed: {e}"));
        }
    }
}
