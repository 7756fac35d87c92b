//! Typed shape of the canonical intake record.
//!
//! The record is a tree of named sections: three *shared* sections (patient,
//! pharmacy, primary care provider) that hold the source of truth for facts
//! appearing on more than one form, and one section per form holding fields
//! unique to that form plus local copies of shared facts. The local copies
//! are kept equal to the shared sections by the synchronization rules in
//! [`crate::rules`]; the schema itself makes no attempt to deduplicate them,
//! because each form reads and exports its own copy field-for-field.
//!
//! Every field carries `#[serde(default)]`, so the record is always fully
//! shaped: scalars default to the empty string or `false`, row arrays to
//! empty, and `updatedAt` to `null`. Reads never fail and presentation
//! surfaces never branch on missing data. Field names serialize in camelCase
//! and double as the path vocabulary for [`crate::paths`] and the rule table.

use chrono::{DateTime, Utc};
use intake_types::EntryId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single canonical record for one in-progress intake.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntakeRecord {
    /// Shared source of truth for patient identity and contact facts.
    pub patient: PatientSection,
    /// Shared source of truth for pharmacy identity facts.
    pub pharmacy: PharmacySection,
    /// Shared source of truth for the primary care provider.
    pub primary_care_provider: ProviderSection,
    /// Medication review cover sheet (combined patient name, full address,
    /// medication rows).
    pub form1: MedicationReviewForm,
    /// Pharmacy care plan (split patient name, allergies, conditions,
    /// consent).
    pub form2: CarePlanForm,
    /// Provider follow-up form (split patient name, provider identity,
    /// clinician contacts).
    pub form3: FollowUpForm,
    /// Timestamp of the last field write, `null` until the first edit.
    pub updated_at: Option<DateTime<Utc>>,
}

impl IntakeRecord {
    /// Returns the default empty record as a JSON tree.
    ///
    /// This is the canonical in-store representation: a fully shaped object
    /// whose keys are exactly the camelCase path vocabulary.
    pub fn empty_value() -> Value {
        // Default serialization of a plain struct tree cannot fail.
        serde_json::to_value(IntakeRecord::default())
            .unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
    }
}

/// Patient identity and contact details, shared across every form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientSection {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: String,
    pub phone: String,
    pub email: String,
    pub unit: String,
    pub street_number: String,
    pub street_name: String,
    pub po_box: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub health_card: String,
}

/// Pharmacy identity, shared by the cover sheet and care plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PharmacySection {
    pub name: String,
    pub phone: String,
    pub fax: String,
    pub pharmacist_name: String,
}

/// Primary care provider identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderSection {
    pub name: String,
    pub phone: String,
    pub fax: String,
}

/// Form 1: medication review cover sheet.
///
/// The only form that stores the patient name as a single combined field;
/// the name rules split and recompose it against the first/last pairs held
/// by the other sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationReviewForm {
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: String,
    pub unit: String,
    pub street_number: String,
    pub street_name: String,
    pub po_box: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub pharmacy_name: String,
    pub pharmacy_phone: String,
    pub pharmacy_fax: String,
    pub pharmacist_name: String,
    pub provider_phone: String,
    pub provider_fax: String,
    pub medications: Vec<MedicationRow>,
    pub discontinued_medications: Vec<DiscontinuedMedicationRow>,
    pub comments: String,
    pub date: String,
}

/// Form 2: pharmacy care plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarePlanForm {
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_phone: String,
    pub patient_email: String,
    pub city: String,
    pub province: String,
    pub postal_code: String,
    pub pharmacy_name: String,
    pub pharmacy_phone: String,
    pub pharmacy_fax: String,
    pub pharmacist_name: String,
    pub provider_phone: String,
    pub provider_fax: String,
    pub allergies: String,
    pub conditions: String,
    pub consent_given: bool,
    pub date: String,
}

/// Form 3: provider follow-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FollowUpForm {
    pub patient_first_name: String,
    pub patient_last_name: String,
    pub patient_phone: String,
    pub postal_code: String,
    pub provider_name: String,
    pub provider_phone: String,
    pub provider_fax: String,
    pub follow_up_notes: String,
    pub clinician_contacts: Vec<ContactRow>,
}

/// One medication entry on the cover sheet.
///
/// Rows are owned by their containing array and mutated only by whole-array
/// replacement through a single field write; the generated id gives surfaces
/// a stable handle across replacements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationRow {
    pub id: EntryId,
    pub name: String,
    pub strength: String,
    pub dosage: String,
    pub indication: String,
    pub comments: String,
}

impl Default for MedicationRow {
    fn default() -> Self {
        Self {
            id: EntryId::new(),
            name: String::new(),
            strength: String::new(),
            dosage: String::new(),
            indication: String::new(),
            comments: String::new(),
        }
    }
}

/// One discontinued-medication entry on the cover sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiscontinuedMedicationRow {
    pub id: EntryId,
    pub name: String,
    pub reason: String,
}

impl Default for DiscontinuedMedicationRow {
    fn default() -> Self {
        Self {
            id: EntryId::new(),
            name: String::new(),
            reason: String::new(),
        }
    }
}

/// One clinician contact on the follow-up form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRow {
    pub id: EntryId,
    pub name: String,
    pub role: String,
    pub phone: String,
}

impl Default for ContactRow {
    fn default() -> Self {
        Self {
            id: EntryId::new(),
            name: String::new(),
            role: String::new(),
            phone: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_fully_shaped(value: &Value) {
        match value {
            Value::Object(map) => {
                assert!(!map.is_empty(), "sections must not serialize empty");
                for nested in map.values() {
                    match nested {
                        Value::Object(_) => assert_fully_shaped(nested),
                        Value::String(_) | Value::Bool(_) | Value::Array(_) | Value::Null => {}
                        other => panic!("unexpected default leaf: {other:?}"),
                    }
                }
            }
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_record_is_fully_shaped() {
        let value = IntakeRecord::empty_value();
        assert_fully_shaped(&value);
        assert_eq!(value["patient"]["firstName"], "");
        assert_eq!(value["form2"]["consentGiven"], false);
        assert_eq!(value["form1"]["medications"], serde_json::json!([]));
        assert!(value["updatedAt"].is_null());
    }

    #[test]
    fn test_field_names_serialize_in_camel_case() {
        let value = IntakeRecord::empty_value();
        assert!(value["primaryCareProvider"].is_object());
        assert!(value["form1"].get("patientName").is_some());
        assert!(value["form2"].get("patientFirstName").is_some());
        assert!(value["patient"].get("postalCode").is_some());
    }

    #[test]
    fn test_partial_snapshot_fills_defaults() {
        let partial = r#"{"patient": {"firstName": "Jane"}}"#;
        let record: IntakeRecord = serde_json::from_str(partial).unwrap();
        assert_eq!(record.patient.first_name, "Jane");
        assert_eq!(record.patient.last_name, "");
        assert_eq!(record.form1.patient_name, "");
        assert!(record.form3.clinician_contacts.is_empty());
        assert!(record.updated_at.is_none());
    }

    #[test]
    fn test_malformed_snapshot_rejected() {
        assert!(serde_json::from_str::<IntakeRecord>("not json").is_err());
        assert!(serde_json::from_str::<IntakeRecord>(r#"{"patient": 7}"#).is_err());
    }

    #[test]
    fn test_medication_rows_round_trip_with_ids() {
        let row = MedicationRow {
            name: "Metformin".into(),
            strength: "500 mg".into(),
            ..MedicationRow::default()
        };
        let json = serde_json::to_string(&row).unwrap();
        let back: MedicationRow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, row);
    }
}
