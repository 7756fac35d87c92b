//! Durable snapshot storage.
//!
//! The store persists exactly one snapshot: the serialized form of the full
//! record tree. [`SnapshotStorage`] is the narrow blocking byte-store
//! boundary the persistence layer talks to; [`FileStorage`] is the standard
//! implementation, writing to a temporary file in the snapshot's directory
//! and renaming it into place so a crash mid-write never leaves a truncated
//! snapshot behind.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// Errors from the durable byte store.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to create snapshot directory: {0}")]
    DirCreation(std::io::Error),
    #[error("failed to write snapshot: {0}")]
    Write(std::io::Error),
    #[error("failed to move snapshot into place: {0}")]
    Rename(std::io::Error),
    #[error("failed to read snapshot: {0}")]
    Read(std::io::Error),
    #[error("failed to erase snapshot: {0}")]
    Erase(std::io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// A blocking key-less byte store holding at most one snapshot.
pub trait SnapshotStorage: Send + Sync {
    /// Persists the snapshot, replacing any previous one. Must be atomic
    /// from the caller's point of view: either the whole snapshot lands or
    /// the previous one survives.
    fn save(&self, bytes: &[u8]) -> StorageResult<()>;

    /// Reads the persisted snapshot. `Ok(None)` means no snapshot exists,
    /// which is not an error.
    fn load(&self) -> StorageResult<Option<Vec<u8>>>;

    /// Removes the persisted snapshot. Erasing an absent snapshot succeeds.
    fn erase(&self) -> StorageResult<()>;
}

/// File-backed snapshot storage with write-then-rename atomicity.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Creates storage for the given snapshot path. The file and its parent
    /// directory are created lazily on the first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SnapshotStorage for FileStorage {
    fn save(&self, bytes: &[u8]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(StorageError::DirCreation)?;
            }
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(StorageError::Write)?;
        file.write_all(bytes).map_err(StorageError::Write)?;
        file.sync_all().map_err(StorageError::Write)?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(StorageError::Rename)
    }

    fn load(&self) -> StorageResult<Option<Vec<u8>>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read(e)),
        }
    }

    fn erase(&self) -> StorageResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Erase(e)),
        }
    }
}
