//! The public store façade.
//!
//! [`IntakeStore`] is the single owner of the canonical record and the only
//! interface presentation surfaces talk to. It wires together the pieces
//! specified elsewhere in this crate: the reducer applies writes, the rule
//! table fans one edit out to every duplicated copy of the same fact, and
//! the persistence manager keeps the result durable.
//!
//! Every `update_field` call is applied synchronously: the primary write and
//! all of its propagated writes are visible to the next read before the call
//! returns. Durable persistence may lag by up to the autosave window;
//! wholesale replacement and clearing persist immediately.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use intake_types::FieldPath;
use serde_json::Value;

use crate::config::StoreConfig;
use crate::error::{StoreError, StoreResult};
use crate::persistence::{persist_locked, save_if_dirty, PersistenceManager};
use crate::reducer::{reduce, Action, StoreState};
use crate::rules::RuleTable;
use crate::schema::IntakeRecord;
use crate::storage::{FileStorage, SnapshotStorage};

/// Save-state snapshot for surfaces that render indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatus {
    pub is_dirty: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// The synchronized intake record store.
///
/// Single logical writer: all mutation goes through this façade, and a
/// primary write plus its propagated writes are applied under one lock, so
/// there is no interleaving hazard between them. Presentation surfaces hold
/// read-only snapshots obtained from [`IntakeStore::snapshot`] or
/// [`IntakeStore::record_value`].
pub struct IntakeStore {
    state: Arc<Mutex<StoreState>>,
    rules: RuleTable,
    storage: Arc<dyn SnapshotStorage>,
    saver: PersistenceManager,
}

impl IntakeStore {
    /// Opens a store over file-backed storage resolved from `config`.
    ///
    /// Reads the persisted snapshot if one exists: a well-formed snapshot
    /// becomes the current record, an absent one leaves the default empty
    /// record without error, and a malformed one leaves the default record
    /// and surfaces a warning through the status.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let storage = Arc::new(FileStorage::new(config.snapshot_path()));
        Self::with_storage(storage, config)
    }

    /// Opens a store over the given storage backend.
    pub fn with_storage(
        storage: Arc<dyn SnapshotStorage>,
        config: &StoreConfig,
    ) -> StoreResult<Self> {
        let mut state = StoreState::new();
        load_initial(&mut state, storage.as_ref());

        let state = Arc::new(Mutex::new(state));
        let saver = PersistenceManager::spawn(
            state.clone(),
            storage.clone(),
            config.autosave_debounce(),
        );

        Ok(Self {
            state,
            rules: RuleTable::standard(),
            storage,
            saver,
        })
    }

    /// Writes one field by path and propagates the edit to every other copy
    /// of the same fact, then schedules an autosave.
    ///
    /// The expansion is computed against the pre-write record, and each
    /// propagated value depends only on the triggering edit, so propagation
    /// order is unobservable. An expansion entry naming the triggering path
    /// itself is dropped defensively.
    pub fn update_field(&self, path: &FieldPath, value: Value) {
        let mut guard = self.lock_state();
        let expansions = self.rules.expand(path, &value, &guard.record);
        let at = Utc::now();

        reduce(
            &mut guard,
            Action::UpdateField {
                path: path.clone(),
                value,
                at,
            },
        );
        for (target, propagated) in expansions {
            if &target == path {
                continue;
            }
            reduce(
                &mut guard,
                Action::UpdateField {
                    path: target,
                    value: propagated,
                    at,
                },
            );
        }
        drop(guard);

        self.saver.touch();
    }

    /// Replaces the whole record atomically and saves it immediately,
    /// bypassing the autosave window.
    ///
    /// Per-field synchronization rules are not run: the producer (typically
    /// the extraction service) is responsible for internal consistency, and
    /// the record is stored exactly as given. The immediate save closes the
    /// race where a reload could observe stale persisted data just after an
    /// authoritative replacement.
    pub fn set_record(&self, record: IntakeRecord) {
        let value = match serde_json::to_value(&record) {
            Ok(value) => value,
            Err(e) => {
                // Struct-to-JSON conversion of a plain data tree should not
                // fail; keep the current record rather than guessing.
                tracing::warn!("failed to convert replacement record: {e}");
                self.lock_state().error = Some(format!("replace failed: {e}"));
                return;
            }
        };

        let mut guard = self.lock_state();
        reduce(&mut guard, Action::ReplaceRecord(value));
        // ReplaceRecord leaves the state clean, so save unconditionally.
        persist_locked(&mut guard, self.storage.as_ref(), "replace-save");
    }

    /// Resets the record to its default empty shape and erases the persisted
    /// copy synchronously.
    ///
    /// No autosave is scheduled by the clear itself, and a successful erase
    /// leaves the state clean (an absent snapshot loads as the default shape,
    /// so there is nothing unsaved), so storage stays absent through both the
    /// autosave window and the shutdown flush until the next field write.
    pub fn clear(&self) {
        let mut guard = self.lock_state();
        reduce(&mut guard, Action::ClearAll);
        match self.storage.erase() {
            Ok(()) => guard.is_dirty = false,
            Err(e) => {
                // Storage still holds the old record; stay dirty so a later
                // save replaces it with the cleared one.
                tracing::warn!("failed to erase persisted record: {e}");
                guard.error = Some(format!("clear failed: {e}"));
            }
        }
    }

    /// Saves immediately if there are unsaved edits.
    ///
    /// The escape hatch for callers that cannot wait out the autosave
    /// window, such as a one-shot CLI invocation.
    pub fn flush(&self) {
        save_if_dirty(&self.state, self.storage.as_ref());
    }

    /// Returns the current record as its canonical JSON tree.
    pub fn record_value(&self) -> Value {
        self.lock_state().record.clone()
    }

    /// Returns the current record as the typed schema.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Deserialization` if a surface has written a
    /// value whose type contradicts the schema (e.g. a number into a name
    /// field); [`IntakeStore::record_value`] always works.
    pub fn snapshot(&self) -> StoreResult<IntakeRecord> {
        serde_json::from_value(self.record_value()).map_err(StoreError::Deserialization)
    }

    /// Reads one field by path from the current record.
    pub fn get(&self, path: &FieldPath) -> Option<Value> {
        crate::paths::get(&self.lock_state().record, path).cloned()
    }

    /// Returns the current save-state for indicator surfaces.
    pub fn status(&self) -> StoreStatus {
        let guard = self.lock_state();
        StoreStatus {
            is_dirty: guard.is_dirty,
            last_saved_at: guard.last_saved_at,
            is_loading: guard.is_loading,
            error: guard.error.clone(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, StoreState> {
        match self.state.lock() {
            Ok(guard) => guard,
            // The reducer cannot panic mid-transition; the state behind a
            // poisoned lock is still coherent.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Applies the load-on-start policy to a fresh state.
fn load_initial(state: &mut StoreState, storage: &dyn SnapshotStorage) {
    state.is_loading = true;

    match storage.load() {
        Ok(None) => {}
        Ok(Some(bytes)) => match serde_json::from_slice::<IntakeRecord>(&bytes) {
            Ok(record) => match serde_json::to_value(&record) {
                Ok(value) => reduce(
                    state,
                    Action::LoadFromPersistence {
                        record: value,
                        at: Utc::now(),
                    },
                ),
                Err(e) => {
                    tracing::warn!("failed to convert persisted record: {e}");
                    state.error = Some(format!("load failed: {e}"));
                }
            },
            Err(e) => {
                tracing::warn!("persisted record is malformed, starting empty: {e}");
                state.error = Some(format!("persisted record is malformed: {e}"));
            }
        },
        Err(e) => {
            tracing::warn!("failed to read persisted record: {e}");
            state.error = Some(format!("load failed: {e}"));
        }
    }

    state.is_loading = false;
}
