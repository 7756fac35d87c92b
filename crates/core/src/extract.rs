//! Extraction-service boundary.
//!
//! Free-text clinical notes can be turned into a partial record by an
//! external extraction service. The store only accepts the eventual result
//! wholesale through [`crate::store::IntakeStore::set_record`]; this module
//! defines the contract that producer must satisfy and the local fallback
//! used when the external service fails.
//!
//! A failed extraction never touches the store: the caller's record is read
//! only as the starting point for the result, and no partial output from a
//! failed call is applied.

use intake_types::FieldPath;
use serde_json::Value;

use crate::paths;
use crate::rules::RuleTable;
use crate::schema::IntakeRecord;

/// Errors from an extraction attempt.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("extraction service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("extraction service returned an unusable response: {0}")]
    UnusableResponse(String),
    #[error("free text contained nothing extractable")]
    NothingExtracted,
}

/// Turns free text into a record, starting from the caller's current one.
///
/// Implementations must return an internally consistent record: every local
/// copy of a shared fact equal to the shared section's value, since the
/// store applies the result without re-running per-field synchronization.
/// Threading and timeouts around slow implementations belong to the caller.
pub trait RecordExtractor {
    fn extract(&self, free_text: &str, current: &IntakeRecord) -> Result<IntakeRecord, ExtractError>;
}

/// Tries the primary extractor and falls back to a secondary on failure.
///
/// The standard policy for wiring an external AI extractor with the local
/// [`HeuristicExtractor`]: an external failure is logged and recovered, and
/// only the fallback's error surfaces if both fail.
pub fn extract_with_fallback(
    primary: &dyn RecordExtractor,
    fallback: &dyn RecordExtractor,
    free_text: &str,
    current: &IntakeRecord,
) -> Result<IntakeRecord, ExtractError> {
    match primary.extract(free_text, current) {
        Ok(record) => Ok(record),
        Err(e) => {
            tracing::warn!("primary extractor failed, using fallback: {e}");
            fallback.extract(free_text, current)
        }
    }
}

/// Local line-oriented extractor used when the external service fails.
///
/// Scans the text for `Label: value` lines with a small fixed label
/// vocabulary (name, phone, email, address parts, pharmacy, provider) and
/// applies each recognised fact through the same rule table the store uses
/// for field edits, so the produced record is internally consistent by
/// construction. Later occurrences of a label win.
#[derive(Debug, Default, Clone)]
pub struct HeuristicExtractor {
    rules: RuleTable,
}

impl HeuristicExtractor {
    pub fn new() -> Self {
        Self {
            rules: RuleTable::standard(),
        }
    }
}

/// Label vocabulary: lowercase label to the shared-section path it fills.
const LABEL_PATHS: &[(&str, &str)] = &[
    ("name", "form1.patientName"),
    ("patient", "form1.patientName"),
    ("patient name", "form1.patientName"),
    ("first name", "patient.firstName"),
    ("last name", "patient.lastName"),
    ("phone", "patient.phone"),
    ("telephone", "patient.phone"),
    ("email", "patient.email"),
    ("unit", "patient.unit"),
    ("street number", "patient.streetNumber"),
    ("street", "patient.streetName"),
    ("street name", "patient.streetName"),
    ("po box", "patient.poBox"),
    ("city", "patient.city"),
    ("province", "patient.province"),
    ("postal code", "patient.postalCode"),
    ("health card", "patient.healthCard"),
    ("date of birth", "patient.dateOfBirth"),
    ("dob", "patient.dateOfBirth"),
    ("pharmacy", "pharmacy.name"),
    ("pharmacy name", "pharmacy.name"),
    ("pharmacy phone", "pharmacy.phone"),
    ("pharmacy fax", "pharmacy.fax"),
    ("pharmacist", "pharmacy.pharmacistName"),
    ("doctor", "primaryCareProvider.name"),
    ("physician", "primaryCareProvider.name"),
    ("provider", "primaryCareProvider.name"),
    ("provider phone", "primaryCareProvider.phone"),
    ("provider fax", "primaryCareProvider.fax"),
    ("allergies", "form2.allergies"),
    ("conditions", "form2.conditions"),
];

impl RecordExtractor for HeuristicExtractor {
    fn extract(&self, free_text: &str, current: &IntakeRecord) -> Result<IntakeRecord, ExtractError> {
        let mut tree = serde_json::to_value(current)
            .map_err(|e| ExtractError::UnusableResponse(e.to_string()))?;
        let mut extracted_any = false;

        for line in free_text.lines() {
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            let label = label.trim().to_lowercase();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            let Some((_, target)) = LABEL_PATHS.iter().find(|(l, _)| *l == label) else {
                continue;
            };
            let Ok(path) = FieldPath::new(target) else {
                continue;
            };

            apply_fact(&mut tree, &self.rules, &path, value);
            extracted_any = true;
        }

        if !extracted_any {
            return Err(ExtractError::NothingExtracted);
        }

        serde_json::from_value(tree).map_err(|e| ExtractError::UnusableResponse(e.to_string()))
    }
}

/// Writes one fact plus everything the rule table derives from it.
fn apply_fact(tree: &mut Value, rules: &RuleTable, path: &FieldPath, text: &str) {
    let value = Value::String(text.to_string());
    let expansions = rules.expand(path, &value, tree);
    paths::write(tree, path, value);
    for (target, propagated) in expansions {
        if &target != path {
            paths::write(tree, &target, propagated);
        }
    }
}
