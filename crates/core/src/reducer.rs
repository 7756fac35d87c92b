//! The store's single state-transition function.
//!
//! The reducer is deliberately boring: a pure function from `(state, action)`
//! to the next state. It performs no I/O, no rule expansion (the façade in
//! [`crate::store`] issues one [`Action::UpdateField`] per expansion entry),
//! and cannot fail: an invalid path degrades inside the resolver to
//! creating an unused field. Timestamps travel inside actions so transitions
//! stay clock-free and trivially testable.

use chrono::{DateTime, Utc};
use intake_types::FieldPath;
use serde_json::Value;

use crate::paths;
use crate::schema::IntakeRecord;

/// The full state held by the store.
#[derive(Debug, Clone)]
pub struct StoreState {
    /// The canonical record tree.
    pub record: Value,
    /// True when the record has edits not yet durably saved.
    pub is_dirty: bool,
    /// When the record was last durably saved or loaded, if ever.
    pub last_saved_at: Option<DateTime<Utc>>,
    /// True while the persisted snapshot is being read at startup.
    pub is_loading: bool,
    /// Last recoverable problem, for surfaces that render save-state
    /// indicators. Cleared by the next successful save or load.
    pub error: Option<String>,
}

impl StoreState {
    /// The initial state: default empty record, nothing saved yet.
    pub fn new() -> Self {
        Self {
            record: IntakeRecord::empty_value(),
            is_dirty: false,
            last_saved_at: None,
            is_loading: false,
            error: None,
        }
    }
}

impl Default for StoreState {
    fn default() -> Self {
        Self::new()
    }
}

/// The five state transitions the store responds to.
#[derive(Debug, Clone)]
pub enum Action {
    /// Unconditionally swap the whole record. The producer guarantees
    /// internal consistency; per-field rules are explicitly not re-run, since
    /// the replacement may touch dozens of fields atomically and re-deriving
    /// every pairwise sync could overwrite a just-set value with a stale one.
    ReplaceRecord(Value),
    /// Apply one field write and stamp `updatedAt`.
    UpdateField {
        path: FieldPath,
        value: Value,
        at: DateTime<Utc>,
    },
    /// Record a completed durable save.
    MarkSaved { at: DateTime<Utc> },
    /// Swap in a persisted snapshot; "just loaded" counts as "just saved".
    LoadFromPersistence {
        record: Value,
        at: DateTime<Utc>,
    },
    /// Reset to the default empty shape.
    ClearAll,
}

/// Applies one action to the state.
pub fn reduce(state: &mut StoreState, action: Action) {
    match action {
        Action::ReplaceRecord(record) => {
            state.record = record;
            state.is_dirty = false;
        }
        Action::UpdateField { path, value, at } => {
            paths::write(&mut state.record, &path, value);
            if let Some(map) = state.record.as_object_mut() {
                map.insert("updatedAt".to_string(), serde_json::json!(at));
            }
            state.is_dirty = true;
        }
        Action::MarkSaved { at } => {
            state.is_dirty = false;
            state.last_saved_at = Some(at);
            state.error = None;
        }
        Action::LoadFromPersistence { record, at } => {
            state.record = record;
            state.is_dirty = false;
            state.last_saved_at = Some(at);
            state.error = None;
        }
        Action::ClearAll => {
            state.record = IntakeRecord::empty_value();
            state.is_dirty = true;
            state.last_saved_at = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> FieldPath {
        FieldPath::new(s).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-01-22T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_update_field_marks_dirty_and_stamps_updated_at() {
        let mut state = StoreState::new();
        reduce(
            &mut state,
            Action::UpdateField {
                path: path("patient.firstName"),
                value: json!("Jane"),
                at: now(),
            },
        );
        assert!(state.is_dirty);
        assert_eq!(state.record["patient"]["firstName"], "Jane");
        assert_eq!(state.record["updatedAt"], json!(now()));
    }

    #[test]
    fn test_replace_record_swaps_and_clears_dirty() {
        let mut state = StoreState::new();
        state.is_dirty = true;
        // Internally inconsistent on purpose: replace must not "fix" it.
        let replacement = json!({"patient": {"firstName": "A"}, "form2": {"patientFirstName": "B"}});
        reduce(&mut state, Action::ReplaceRecord(replacement.clone()));
        assert_eq!(state.record, replacement);
        assert!(!state.is_dirty);
    }

    #[test]
    fn test_mark_saved_clears_dirty_and_error() {
        let mut state = StoreState::new();
        state.is_dirty = true;
        state.error = Some("storage full".into());
        reduce(&mut state, Action::MarkSaved { at: now() });
        assert!(!state.is_dirty);
        assert_eq!(state.last_saved_at, Some(now()));
        assert!(state.error.is_none());
    }

    #[test]
    fn test_load_from_persistence_counts_as_saved() {
        let mut state = StoreState::new();
        let loaded = json!({"patient": {"firstName": "Jane"}});
        reduce(
            &mut state,
            Action::LoadFromPersistence {
                record: loaded.clone(),
                at: now(),
            },
        );
        assert_eq!(state.record, loaded);
        assert!(!state.is_dirty);
        assert_eq!(state.last_saved_at, Some(now()));
    }

    #[test]
    fn test_clear_all_resets_to_default_shape() {
        let mut state = StoreState::new();
        reduce(
            &mut state,
            Action::UpdateField {
                path: path("patient.firstName"),
                value: json!("Jane"),
                at: now(),
            },
        );
        reduce(&mut state, Action::MarkSaved { at: now() });
        reduce(&mut state, Action::ClearAll);

        assert_eq!(state.record, crate::schema::IntakeRecord::empty_value());
        assert!(state.is_dirty);
        assert!(state.last_saved_at.is_none());
    }

    #[test]
    fn test_invalid_path_degrades_without_failing() {
        let mut state = StoreState::new();
        reduce(
            &mut state,
            Action::UpdateField {
                path: path("patient.firstName.oops"),
                value: json!("x"),
                at: now(),
            },
        );
        // The stray write landed in a freshly created container.
        assert_eq!(state.record["patient"]["firstName"]["oops"], "x");
        assert!(state.is_dirty);
    }
}
