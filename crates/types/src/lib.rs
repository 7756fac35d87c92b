//! Validated value types shared across the intake record system.
//!
//! This crate holds small, dependency-light types used by every other crate:
//! [`FieldPath`] for addressing fields inside the record tree, and
//! [`EntryId`] for identifying repeatable rows (medications, contacts).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur when creating validated path types.
#[derive(Debug, thiserror::Error)]
pub enum PathError {
    /// The input path was empty or contained only whitespace
    #[error("field path cannot be empty")]
    Empty,
    /// A dot-separated segment of the path was empty
    #[error("field path contains an empty segment: {0:?}")]
    EmptySegment(String),
}

/// A dot-separated path addressing one field inside the record tree.
///
/// Paths are sequences of non-empty field names separated by `.`, for example
/// `"form2.patientFirstName"` or `"patient.phone"`. A single-segment path
/// addresses a top-level field (e.g. `"updatedAt"`). Paths never index into
/// arrays; array-valued fields are addressed as a whole (e.g.
/// `"form1.medications"`) and replaced wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath(String);

impl FieldPath {
    /// Creates a new `FieldPath` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace.
    ///
    /// # Errors
    ///
    /// Returns `PathError::Empty` if the trimmed input is empty, or
    /// `PathError::EmptySegment` if any dot-separated segment is empty
    /// (e.g. `"patient..phone"` or a trailing dot).
    pub fn new(input: impl AsRef<str>) -> Result<Self, PathError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PathError::Empty);
        }
        if trimmed.split('.').any(|segment| segment.is_empty()) {
            return Err(PathError::EmptySegment(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the full dotted path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates over the dot-separated segments of the path.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FieldPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldPath::new(s)
    }
}

impl Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FieldPath::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Generated unique identifier for one repeatable row inside a section.
///
/// Rows (a medication entry, a clinician contact) are owned by exactly one
/// section and are appended, edited, or removed by whole-array replacement;
/// the id is what lets presentation surfaces address a row stably across
/// those replacements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(Uuid);

impl EntryId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_path_accepts_dotted_names() {
        let path = FieldPath::new("form2.patientFirstName").unwrap();
        assert_eq!(path.as_str(), "form2.patientFirstName");
        let segments: Vec<&str> = path.segments().collect();
        assert_eq!(segments, vec!["form2", "patientFirstName"]);
    }

    #[test]
    fn test_field_path_accepts_single_segment() {
        let path = FieldPath::new("updatedAt").unwrap();
        assert_eq!(path.segments().count(), 1);
    }

    #[test]
    fn test_field_path_trims_whitespace() {
        let path = FieldPath::new("  patient.phone  ").unwrap();
        assert_eq!(path.as_str(), "patient.phone");
    }

    #[test]
    fn test_field_path_rejects_empty() {
        assert!(matches!(FieldPath::new(""), Err(PathError::Empty)));
        assert!(matches!(FieldPath::new("   "), Err(PathError::Empty)));
    }

    #[test]
    fn test_field_path_rejects_empty_segments() {
        assert!(matches!(
            FieldPath::new("patient..phone"),
            Err(PathError::EmptySegment(_))
        ));
        assert!(matches!(
            FieldPath::new("patient."),
            Err(PathError::EmptySegment(_))
        ));
    }

    #[test]
    fn test_entry_ids_are_unique() {
        assert_ne!(EntryId::new(), EntryId::new());
    }
}
