//! Stored catalog document model.
//!
//! # Invariants
//! - Records are loosely typed field maps; unknown keys and key order survive
//!   a read-merge-write cycle unchanged.
//! - `etag` is the token observed at the latest successful read or write of
//!   the backing blob.

use serde_json::{Map, Value};

pub const FIELD_NAME: &str = "name";
pub const FIELD_ATOMIC_NUMBER: &str = "atomic_number";
pub const FIELD_ALTERNATIVE_NAME: &str = "alternative_name";
pub const FIELD_GROUP_BLOCK: &str = "group_block";

/// One element row as stored: an ordered, string-keyed map of JSON values.
pub type ElementRecord = Map<String, Value>;

/// Full catalog content plus the version token it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogDocument {
    pub records: Vec<ElementRecord>,
    pub etag: String,
}

impl CatalogDocument {
    pub fn new(records: Vec<ElementRecord>, etag: impl Into<String>) -> Self {
        Self {
            records,
            etag: etag.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First record carrying `atomic_number`.
    pub fn record(&self, atomic_number: u32) -> Option<&ElementRecord> {
        self.records
            .iter()
            .find(|record| record_atomic_number(record) == Some(atomic_number))
    }
}

/// Reads a record's atomic number.
///
/// Returns `None` when the field is missing or fails `atomic_number_from_value`.
pub fn record_atomic_number(record: &ElementRecord) -> Option<u32> {
    atomic_number_from_value(record.get(FIELD_ATOMIC_NUMBER)?)
}

/// Interprets a stored `atomic_number` value.
///
/// Accepts a JSON integer or a string of digits. Padded strings such as
/// `" 26 "`, zero, and values outside `u32` are rejected.
pub fn atomic_number_from_value(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(text) => text.parse::<u32>().ok(),
        _ => None,
    }?;
    (number > 0).then_some(number)
}

#[cfg(test)]
mod tests {
    use super::{record_atomic_number, CatalogDocument, ElementRecord};
    use serde_json::json;

    fn record(value: serde_json::Value) -> ElementRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn atomic_number_accepts_integer_and_numeric_string() {
        assert_eq!(record_atomic_number(&record(json!({"atomic_number": 8}))), Some(8));
        assert_eq!(
            record_atomic_number(&record(json!({"atomic_number": "26"}))),
            Some(26)
        );
    }

    #[test]
    fn atomic_number_string_must_not_be_padded() {
        assert_eq!(
            record_atomic_number(&record(json!({"atomic_number": " 26 "}))),
            None
        );
        assert_eq!(
            record_atomic_number(&record(json!({"atomic_number": "26\n"}))),
            None
        );
    }

    #[test]
    fn atomic_number_rejects_missing_zero_and_garbage() {
        assert_eq!(record_atomic_number(&record(json!({"name": "x"}))), None);
        assert_eq!(record_atomic_number(&record(json!({"atomic_number": 0}))), None);
        assert_eq!(record_atomic_number(&record(json!({"atomic_number": -3}))), None);
        assert_eq!(record_atomic_number(&record(json!({"atomic_number": 1.5}))), None);
        assert_eq!(
            record_atomic_number(&record(json!({"atomic_number": "one"}))),
            None
        );
    }

    #[test]
    fn record_lookup_returns_first_match() {
        let document = CatalogDocument::new(
            vec![
                record(json!({"atomic_number": 1, "name": "first"})),
                record(json!({"atomic_number": 1, "name": "second"})),
            ],
            "\"e1\"",
        );
        assert_eq!(document.record(1).unwrap()["name"], "first");
        assert!(document.record(2).is_none());
        assert_eq!(document.len(), 2);
    }
}
