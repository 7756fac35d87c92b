//! Synchronization rules for facts duplicated across forms.
//!
//! Several facts (patient name, phone, address, pharmacy and provider
//! identity) appear verbatim on more than one form. The rule table is the
//! declarative description of those duplications: given one field change it
//! computes the additional writes needed to bring every other copy of the
//! same fact back in line.
//!
//! Two rule shapes cover everything:
//!
//! - [`MirrorGroup`]: a set of paths that must always hold the identical
//!   value. A change to any member fans the new value out to all others.
//! - [`NameBridge`]: the full-name family. One form stores the patient name
//!   as a single combined field while the other sections store first/last
//!   pairs. A change to the combined field splits it; a change to either
//!   half propagates the half and recomposes the combined field.
//!
//! Invariant every rule must keep: each emitted value is a pure function of
//! the triggering edit and the pre-write snapshot, never of another emitted
//! write. Propagation order is therefore unobservable. Expansion never emits
//! the triggering path itself, and no path belongs to more than one group
//! (both are checked by tests below).

use intake_types::FieldPath;
use serde_json::Value;

use crate::paths;

/// A set of paths that must all hold the identical value.
#[derive(Debug, Clone, Copy)]
pub struct MirrorGroup {
    /// Short name of the duplicated fact, used in propagation logs.
    pub fact: &'static str,
    /// Every path holding a copy of the fact. First entry is the shared
    /// section's copy by convention.
    pub paths: &'static [&'static str],
}

/// The combined-name ↔ first/last-name rule family.
///
/// `pairs` lists every section holding the name split in two, as
/// `(first, last)` path pairs; the shared patient section comes first by
/// convention. When one half of a pair changes, the recomposed combined
/// value reads the *other* half of the same pair from the pre-write
/// snapshot, so a form whose two halves are edited in sequence composes
/// from its own local state.
#[derive(Debug, Clone, Copy)]
pub struct NameBridge {
    /// Path of the single combined full-name field.
    pub combined: &'static str,
    /// (first-name path, last-name path) per section.
    pub pairs: &'static [(&'static str, &'static str)],
}

/// Splits a combined full name on whitespace.
///
/// The first token is the first name; all remaining tokens join into the
/// last name. Multi-word first names therefore end up in the last-name
/// field; this matches the long-standing splitting behaviour the forms are
/// built around, so it is kept as-is rather than guessed at.
pub fn split_full_name(combined: &str) -> (String, String) {
    let mut tokens = combined.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let last = tokens.collect::<Vec<_>>().join(" ");
    (first, last)
}

/// Recomposes a combined full name from its halves, trimming the join.
pub fn compose_full_name(first: &str, last: &str) -> String {
    format!("{first} {last}").trim().to_string()
}

/// The declarative table of every synchronization rule.
#[derive(Debug, Clone)]
pub struct RuleTable {
    mirrors: Vec<MirrorGroup>,
    bridges: Vec<NameBridge>,
}

/// Scalar facts replicated verbatim across sections.
const MIRROR_GROUPS: &[MirrorGroup] = &[
    MirrorGroup {
        fact: "patientPhone",
        paths: &[
            "patient.phone",
            "form1.patientPhone",
            "form2.patientPhone",
            "form3.patientPhone",
        ],
    },
    MirrorGroup {
        fact: "patientEmail",
        paths: &[
            "patient.email",
            "form1.patientEmail",
            "form2.patientEmail",
        ],
    },
    MirrorGroup {
        fact: "unit",
        paths: &["patient.unit", "form1.unit"],
    },
    MirrorGroup {
        fact: "streetNumber",
        paths: &["patient.streetNumber", "form1.streetNumber"],
    },
    MirrorGroup {
        fact: "streetName",
        paths: &["patient.streetName", "form1.streetName"],
    },
    MirrorGroup {
        fact: "poBox",
        paths: &["patient.poBox", "form1.poBox"],
    },
    MirrorGroup {
        fact: "city",
        paths: &["patient.city", "form1.city", "form2.city"],
    },
    MirrorGroup {
        fact: "province",
        paths: &["patient.province", "form1.province", "form2.province"],
    },
    MirrorGroup {
        fact: "postalCode",
        paths: &[
            "patient.postalCode",
            "form1.postalCode",
            "form2.postalCode",
            "form3.postalCode",
        ],
    },
    MirrorGroup {
        fact: "pharmacyName",
        paths: &[
            "pharmacy.name",
            "form1.pharmacyName",
            "form2.pharmacyName",
        ],
    },
    MirrorGroup {
        fact: "pharmacyPhone",
        paths: &[
            "pharmacy.phone",
            "form1.pharmacyPhone",
            "form2.pharmacyPhone",
        ],
    },
    MirrorGroup {
        fact: "pharmacyFax",
        paths: &["pharmacy.fax", "form1.pharmacyFax", "form2.pharmacyFax"],
    },
    MirrorGroup {
        fact: "pharmacistName",
        paths: &[
            "pharmacy.pharmacistName",
            "form1.pharmacistName",
            "form2.pharmacistName",
        ],
    },
    MirrorGroup {
        fact: "providerName",
        paths: &["primaryCareProvider.name", "form3.providerName"],
    },
    MirrorGroup {
        fact: "providerPhone",
        paths: &[
            "primaryCareProvider.phone",
            "form1.providerPhone",
            "form2.providerPhone",
            "form3.providerPhone",
        ],
    },
    MirrorGroup {
        fact: "providerFax",
        paths: &[
            "primaryCareProvider.fax",
            "form1.providerFax",
            "form2.providerFax",
            "form3.providerFax",
        ],
    },
];

/// The patient full-name family.
const NAME_BRIDGES: &[NameBridge] = &[NameBridge {
    combined: "form1.patientName",
    pairs: &[
        ("patient.firstName", "patient.lastName"),
        ("form2.patientFirstName", "form2.patientLastName"),
        ("form3.patientFirstName", "form3.patientLastName"),
    ],
}];

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl RuleTable {
    /// The standard table covering every duplicated fact on the intake
    /// record.
    pub fn standard() -> Self {
        Self {
            mirrors: MIRROR_GROUPS.to_vec(),
            bridges: NAME_BRIDGES.to_vec(),
        }
    }

    /// Computes the additional writes implied by one field change.
    ///
    /// `snapshot` is the pre-write record; it is read for values that depend
    /// on more than the changed field (the sibling half of a name pair). A
    /// change to a path that participates in no rule returns an empty list;
    /// the default, not an exception. The triggering path itself is never
    /// emitted.
    pub fn expand(
        &self,
        path: &FieldPath,
        value: &Value,
        snapshot: &Value,
    ) -> Vec<(FieldPath, Value)> {
        let mut out = Vec::new();

        for group in &self.mirrors {
            if group.paths.contains(&path.as_str()) {
                tracing::debug!(fact = group.fact, path = %path, "propagating mirrored fact");
                for &other in group.paths {
                    if other != path.as_str() {
                        out.push((known_path(other), value.clone()));
                    }
                }
            }
        }

        for bridge in &self.bridges {
            self.expand_bridge(bridge, path, value, snapshot, &mut out);
        }

        out.retain(|(target, _)| target != path);
        out
    }

    fn expand_bridge(
        &self,
        bridge: &NameBridge,
        path: &FieldPath,
        value: &Value,
        snapshot: &Value,
        out: &mut Vec<(FieldPath, Value)>,
    ) {
        // Name rules only make sense for textual values; anything else
        // produces no expansion rather than clobbering the other copies.
        let Some(text) = value.as_str() else {
            return;
        };

        if path.as_str() == bridge.combined {
            let (first, last) = split_full_name(text);
            tracing::debug!(path = %path, "splitting combined name");
            for &(first_path, last_path) in bridge.pairs {
                out.push((known_path(first_path), Value::String(first.clone())));
                out.push((known_path(last_path), Value::String(last.clone())));
            }
            return;
        }

        for &(first_path, last_path) in bridge.pairs {
            if path.as_str() == first_path {
                let last = paths::get_str(snapshot, &known_path(last_path)).unwrap_or_default();
                tracing::debug!(path = %path, "recomposing combined name from first half");
                for &(other_first, _) in bridge.pairs {
                    if other_first != first_path {
                        out.push((known_path(other_first), Value::String(text.to_string())));
                    }
                }
                out.push((
                    known_path(bridge.combined),
                    Value::String(compose_full_name(text, last)),
                ));
                return;
            }
            if path.as_str() == last_path {
                let first = paths::get_str(snapshot, &known_path(first_path)).unwrap_or_default();
                tracing::debug!(path = %path, "recomposing combined name from last half");
                for &(_, other_last) in bridge.pairs {
                    if other_last != last_path {
                        out.push((known_path(other_last), Value::String(text.to_string())));
                    }
                }
                out.push((
                    known_path(bridge.combined),
                    Value::String(compose_full_name(first, text)),
                ));
                return;
            }
        }
    }

    /// Every path participating in any rule, for exhaustive tests.
    pub fn participant_paths(&self) -> Vec<FieldPath> {
        let mut all = Vec::new();
        for group in &self.mirrors {
            all.extend(group.paths.iter().map(|&p| known_path(p)));
        }
        for bridge in &self.bridges {
            all.push(known_path(bridge.combined));
            for &(first, last) in bridge.pairs {
                all.push(known_path(first));
                all.push(known_path(last));
            }
        }
        all
    }
}

/// Builds a `FieldPath` from a table constant.
///
/// Table entries are fixed strings validated by the table's own tests, so a
/// failure here is a table typo; degrading to a single-segment path keeps
/// expansion total without panicking in release builds.
fn known_path(raw: &'static str) -> FieldPath {
    debug_assert!(FieldPath::new(raw).is_ok(), "rule table path {raw:?}");
    FieldPath::new(raw).unwrap_or_else(|_| {
        FieldPath::new("invalidRulePath").unwrap_or_else(|_| unreachable!())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::{get_str, set};
    use crate::schema::IntakeRecord;
    use serde_json::json;
    use std::collections::HashSet;

    fn path(s: &str) -> FieldPath {
        FieldPath::new(s).unwrap()
    }

    /// Applies an edit plus its expansion, as the store façade does.
    fn apply(record: &Value, table: &RuleTable, p: &str, v: Value) -> Value {
        let p = path(p);
        let expansions = table.expand(&p, &v, record);
        let mut next = set(record, &p, v);
        for (target, value) in expansions {
            next = set(&next, &target, value);
        }
        next
    }

    #[test]
    fn test_every_table_path_is_valid() {
        for p in RuleTable::standard().participant_paths() {
            assert_ne!(p.as_str(), "invalidRulePath");
        }
    }

    #[test]
    fn test_no_path_belongs_to_two_groups() {
        let mut seen = HashSet::new();
        for p in RuleTable::standard().participant_paths() {
            assert!(seen.insert(p.as_str().to_string()), "duplicated: {p}");
        }
    }

    #[test]
    fn test_non_participant_produces_empty_expansion() {
        let table = RuleTable::standard();
        let record = IntakeRecord::empty_value();
        for p in ["form2.allergies", "form1.comments", "form1.medications"] {
            assert!(table.expand(&path(p), &json!("x"), &record).is_empty());
        }
    }

    #[test]
    fn test_no_self_propagation_for_any_participant() {
        let table = RuleTable::standard();
        let record = IntakeRecord::empty_value();
        for p in table.participant_paths() {
            for (target, _) in table.expand(&p, &json!("Jane Doe"), &record) {
                assert_ne!(target, p, "self-propagation from {p}");
            }
        }
    }

    #[test]
    fn test_mirror_groups_converge_from_any_participant() {
        let table = RuleTable::standard();
        let record = IntakeRecord::empty_value();
        for group in MIRROR_GROUPS {
            for trigger in group.paths {
                let next = apply(&record, &table, trigger, json!("some value"));
                for member in group.paths {
                    assert_eq!(
                        get_str(&next, &path(member)),
                        Some("some value"),
                        "fact {} not converged at {member} after editing {trigger}",
                        group.fact
                    );
                }
            }
        }
    }

    #[test]
    fn test_phone_fan_out_scenario() {
        let table = RuleTable::standard();
        let record = IntakeRecord::empty_value();
        let next = apply(&record, &table, "patient.phone", json!("416-555-0000"));
        for p in [
            "form1.patientPhone",
            "form2.patientPhone",
            "form3.patientPhone",
        ] {
            assert_eq!(get_str(&next, &path(p)), Some("416-555-0000"));
        }
    }

    #[test]
    fn test_first_name_edit_fans_out_and_recomposes() {
        let table = RuleTable::standard();
        let mut record = IntakeRecord::empty_value();
        // Settled record where the last name is already "Doe" everywhere.
        for p in [
            "patient.lastName",
            "form2.patientLastName",
            "form3.patientLastName",
        ] {
            record = set(&record, &path(p), json!("Doe"));
        }

        let next = apply(&record, &table, "form2.patientFirstName", json!("Jane"));

        assert_eq!(get_str(&next, &path("patient.firstName")), Some("Jane"));
        assert_eq!(get_str(&next, &path("form3.patientFirstName")), Some("Jane"));
        assert_eq!(get_str(&next, &path("form1.patientName")), Some("Jane Doe"));
        // Last names are not touched by a first-name edit.
        assert_eq!(get_str(&next, &path("form3.patientLastName")), Some("Doe"));
        assert_eq!(get_str(&next, &path("patient.lastName")), Some("Doe"));
    }

    #[test]
    fn test_last_name_edit_recomposes_combined() {
        let table = RuleTable::standard();
        let mut record = IntakeRecord::empty_value();
        record = set(&record, &path("patient.firstName"), json!("Jane"));

        let next = apply(&record, &table, "patient.lastName", json!("Smith"));

        assert_eq!(get_str(&next, &path("form2.patientLastName")), Some("Smith"));
        assert_eq!(get_str(&next, &path("form3.patientLastName")), Some("Smith"));
        assert_eq!(get_str(&next, &path("form1.patientName")), Some("Jane Smith"));
    }

    #[test]
    fn test_combined_name_edit_splits_to_all_pairs() {
        let table = RuleTable::standard();
        let record = IntakeRecord::empty_value();
        let next = apply(&record, &table, "form1.patientName", json!("Jane van Doe"));

        for (first, last) in [
            ("patient.firstName", "patient.lastName"),
            ("form2.patientFirstName", "form2.patientLastName"),
            ("form3.patientFirstName", "form3.patientLastName"),
        ] {
            assert_eq!(get_str(&next, &path(first)), Some("Jane"));
            // First token only: everything after it lands in the last name.
            assert_eq!(get_str(&next, &path(last)), Some("van Doe"));
        }
    }

    #[test]
    fn test_recompose_with_empty_other_half_trims() {
        let table = RuleTable::standard();
        let record = IntakeRecord::empty_value();
        let next = apply(&record, &table, "form2.patientFirstName", json!("Jane"));
        assert_eq!(get_str(&next, &path("form1.patientName")), Some("Jane"));
    }

    #[test]
    fn test_repeat_write_is_idempotent() {
        let table = RuleTable::standard();
        let record = IntakeRecord::empty_value();
        let once = apply(&record, &table, "pharmacy.name", json!("Main St Pharmacy"));
        let twice = apply(&once, &table, "pharmacy.name", json!("Main St Pharmacy"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_non_string_value_skips_name_bridge() {
        let table = RuleTable::standard();
        let record = IntakeRecord::empty_value();
        let expansions = table.expand(&path("form1.patientName"), &json!(42), &record);
        assert!(expansions.is_empty());
    }

    #[test]
    fn test_split_full_name_policy() {
        assert_eq!(split_full_name("Jane Doe"), ("Jane".into(), "Doe".into()));
        assert_eq!(
            split_full_name("  Jane   van   Doe "),
            ("Jane".into(), "van Doe".into())
        );
        assert_eq!(split_full_name("Jane"), ("Jane".into(), "".into()));
        assert_eq!(split_full_name(""), ("".into(), "".into()));
    }

    #[test]
    fn test_compose_full_name_trims() {
        assert_eq!(compose_full_name("Jane", "Doe"), "Jane Doe");
        assert_eq!(compose_full_name("Jane", ""), "Jane");
        assert_eq!(compose_full_name("", "Doe"), "Doe");
    }
}
