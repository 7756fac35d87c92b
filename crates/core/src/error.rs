//! Error types for the intake record store.

/// Errors surfaced by the store façade and its collaborators.
///
/// Persistence problems are deliberately non-fatal: the in-memory record
/// stays authoritative and a failed save is retried on the next autosave
/// window. Only configuration mistakes abort store construction.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("storage error: {0}")]
    Storage(#[from] crate::storage::StorageError),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
