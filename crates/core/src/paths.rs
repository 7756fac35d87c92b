//! Dotted-path reads and writes over the record tree.
//!
//! The resolver is the one place that touches the record by path. It is
//! deliberately forgiving: a read of an unresolvable path returns `None` and
//! a write through a missing or non-object intermediate creates a fresh
//! empty object and keeps going. A coding error in a caller therefore
//! degrades to silently creating an unused field rather than failing the
//! session.
//!
//! Array-valued fields (medication rows, contacts) are addressed as a whole
//! and replaced wholesale; paths never index into arrays.

use intake_types::FieldPath;
use serde_json::{Map, Value};

/// Reads the value at `path`, or `None` if any container on the way is
/// missing or not an object.
pub fn get<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Reads the value at `path` as a string slice, or `None` if the path does
/// not resolve to a string.
pub fn get_str<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a str> {
    get(root, path).and_then(Value::as_str)
}

/// Writes `value` at `path`, mutating `root` in place.
///
/// Missing intermediate containers are created as empty objects. An
/// intermediate that exists but is not an object (a scalar or an array) is
/// replaced by an empty object; the write then lands inside it.
pub fn write(root: &mut Value, path: &FieldPath, value: Value) {
    let segments: Vec<&str> = path.segments().collect();
    let mut current = root;

    for segment in &segments[..segments.len() - 1] {
        current = ensure_object(current)
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    let leaf = segments[segments.len() - 1];
    ensure_object(current).insert(leaf.to_string(), value);
}

/// Returns the node's object map, resetting the node to an empty object
/// first if it holds anything else.
fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was reset to an object above"),
    }
}

/// Pure variant of [`write`]: returns a new root and leaves the input
/// untouched.
pub fn set(root: &Value, path: &FieldPath, value: Value) -> Value {
    let mut next = root.clone();
    write(&mut next, path, value);
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::IntakeRecord;
    use serde_json::json;

    fn path(s: &str) -> FieldPath {
        FieldPath::new(s).unwrap()
    }

    #[test]
    fn test_get_set_round_trip() {
        let record = IntakeRecord::empty_value();
        for (p, v) in [
            ("patient.firstName", json!("Jane")),
            ("form2.consentGiven", json!(true)),
            ("form1.medications", json!([{"name": "Metformin"}])),
            ("updatedAt", json!("2026-01-22T10:30:00Z")),
        ] {
            let p = path(p);
            let next = set(&record, &p, v.clone());
            assert_eq!(get(&next, &p), Some(&v));
        }
    }

    #[test]
    fn test_set_never_mutates_input() {
        let record = IntakeRecord::empty_value();
        let before = record.clone();
        let _ = set(&record, &path("patient.phone"), json!("416-555-0000"));
        assert_eq!(record, before);
    }

    #[test]
    fn test_get_missing_container_returns_none() {
        let record = IntakeRecord::empty_value();
        assert_eq!(get(&record, &path("noSuchSection.field")), None);
        assert_eq!(get(&record, &path("patient.noSuchField")), None);
        // Reading through a string leaf does not resolve either.
        assert_eq!(get(&record, &path("patient.firstName.nested")), None);
    }

    #[test]
    fn test_write_creates_missing_intermediates() {
        let mut record = IntakeRecord::empty_value();
        write(&mut record, &path("scratch.nested.field"), json!("x"));
        assert_eq!(get_str(&record, &path("scratch.nested.field")), Some("x"));
    }

    #[test]
    fn test_write_through_scalar_degrades_to_fresh_object() {
        let mut record = IntakeRecord::empty_value();
        write(&mut record, &path("patient.firstName.oops"), json!("x"));
        assert_eq!(get_str(&record, &path("patient.firstName.oops")), Some("x"));
        // Siblings are untouched.
        assert_eq!(get_str(&record, &path("patient.lastName")), Some(""));
    }

    #[test]
    fn test_whole_array_replacement_preserves_order() {
        let mut record = IntakeRecord::empty_value();
        let rows = json!([{"name": "a"}, {"name": "b"}, {"name": "c"}]);
        write(&mut record, &path("form1.medications"), rows.clone());
        assert_eq!(get(&record, &path("form1.medications")), Some(&rows));
    }

    #[test]
    fn test_set_leaves_sibling_sections_equal() {
        let record = IntakeRecord::empty_value();
        let next = set(&record, &path("form2.patientPhone"), json!("555"));
        assert_eq!(next["form1"], record["form1"]);
        assert_eq!(next["pharmacy"], record["pharmacy"]);
    }
}
