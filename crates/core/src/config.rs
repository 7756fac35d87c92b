//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process
//! startup and then passed into the store. The intent is to avoid reading
//! process-wide environment variables during normal operation, which can lead
//! to inconsistent behaviour in test harnesses.

use crate::{StoreError, StoreResult};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default quiet period between the last field write and the autosave.
pub const DEFAULT_AUTOSAVE_DEBOUNCE: Duration = Duration::from_secs(10);

/// Store configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    snapshot_path: PathBuf,
    autosave_debounce: Duration,
}

impl StoreConfig {
    /// Create a new `StoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidInput` if `snapshot_path` is empty or
    /// `autosave_debounce` is zero.
    pub fn new(snapshot_path: PathBuf, autosave_debounce: Duration) -> StoreResult<Self> {
        if snapshot_path.as_os_str().is_empty() {
            return Err(StoreError::InvalidInput(
                "snapshot_path cannot be empty".into(),
            ));
        }
        if autosave_debounce.is_zero() {
            return Err(StoreError::InvalidInput(
                "autosave_debounce cannot be zero".into(),
            ));
        }

        Ok(Self {
            snapshot_path,
            autosave_debounce,
        })
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn autosave_debounce(&self) -> Duration {
        self.autosave_debounce
    }
}

/// Resolve a `StoreConfig` from optional environment values.
///
/// `snapshot_path` falls back to `intake-record.json` in the current working
/// directory. `debounce_secs` accepts a whole number of seconds and falls
/// back to [`DEFAULT_AUTOSAVE_DEBOUNCE`]; empty or whitespace values are
/// treated as absent.
///
/// # Errors
///
/// Returns `StoreError::InvalidInput` if `debounce_secs` is present but not
/// a positive integer.
pub fn config_from_env_values(
    snapshot_path: Option<String>,
    debounce_secs: Option<String>,
) -> StoreResult<StoreConfig> {
    let snapshot_path = snapshot_path
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("intake-record.json"));

    let debounce = debounce_secs
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(|v| {
            v.parse::<u64>()
                .map_err(|_| StoreError::InvalidInput(format!("invalid autosave seconds: {v:?}")))
        })
        .transpose()?
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_AUTOSAVE_DEBOUNCE);

    StoreConfig::new(snapshot_path, debounce)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_applied_when_values_absent() {
        let cfg = config_from_env_values(None, None).unwrap();
        assert_eq!(cfg.snapshot_path(), Path::new("intake-record.json"));
        assert_eq!(cfg.autosave_debounce(), DEFAULT_AUTOSAVE_DEBOUNCE);
    }

    #[test]
    fn test_blank_values_treated_as_absent() {
        let cfg = config_from_env_values(Some("  ".into()), Some("".into())).unwrap();
        assert_eq!(cfg.snapshot_path(), Path::new("intake-record.json"));
        assert_eq!(cfg.autosave_debounce(), DEFAULT_AUTOSAVE_DEBOUNCE);
    }

    #[test]
    fn test_explicit_values_resolved() {
        let cfg =
            config_from_env_values(Some("/tmp/record.json".into()), Some("3".into())).unwrap();
        assert_eq!(cfg.snapshot_path(), Path::new("/tmp/record.json"));
        assert_eq!(cfg.autosave_debounce(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_debounce_rejected() {
        assert!(config_from_env_values(None, Some("soon".into())).is_err());
        assert!(StoreConfig::new(PathBuf::from("r.json"), Duration::ZERO).is_err());
    }
}
