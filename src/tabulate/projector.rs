//! Narrowing of records to a chosen set of top-level fields.

use serde_json::{Map, Value};

/// Column name used for records that are not JSON objects
pub(crate) const SCALAR_COLUMN: &str = "value";

/// One record with top-level fields in a fixed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlatRecord(Map<String, Value>);

impl FlatRecord {
    /// Empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its position if already present
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Value of a field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field names in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Value> for FlatRecord {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            other => {
                let mut map = Map::new();
                map.insert(SCALAR_COLUMN.to_string(), other);
                Self(map)
            }
        }
    }
}

impl From<FlatRecord> for Value {
    fn from(record: FlatRecord) -> Self {
        Value::Object(record.0)
    }
}

/// Keep only `fields` of each record, in the requested order; absent
/// fields become null. With no fields every record is kept whole.
pub fn project<S: AsRef<str>>(records: &[Value], fields: &[S]) -> Vec<FlatRecord> {
    if fields.is_empty() {
        return records.iter().cloned().map(FlatRecord::from).collect();
    }

    records
        .iter()
        .map(|record| {
            let mut flat = FlatRecord::new();
            for field in fields {
                let field = field.as_ref();
                let value = record.get(field).cloned().unwrap_or(Value::Null);
                flat.insert(field, value);
            }
            flat
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_follows_requested_order() {
        let records = vec![json!({"id": "C1", "name": "general", "is_private": false})];
        let projected = project(&records, &["name", "id"]);

        let keys: Vec<&str> = projected[0].keys().collect();
        assert_eq!(keys, vec!["name", "id"]);
    }

    #[test]
    fn test_project_missing_field_is_null() {
        let records = vec![json!({"id": "C1"})];
        let projected = project(&records, &["id", "topic"]);

        assert_eq!(projected[0].get("topic"), Some(&Value::Null));
    }

    #[test]
    fn test_project_keeps_nested_values() {
        let records = vec![json!({"topic": {"value": "hi"}})];
        let projected = project(&records, &["topic"]);

        assert_eq!(projected[0].get("topic"), Some(&json!({"value": "hi"})));
    }

    #[test]
    fn test_project_without_fields_is_noop() {
        let records = vec![json!({"b": 1, "a": 2}), json!(3)];
        let none: [&str; 0] = [];
        let projected = project(&records, &none);

        assert_eq!(Value::from(projected[0].clone()), records[0]);
        assert_eq!(projected[1].get(SCALAR_COLUMN), Some(&json!(3)));
    }
}
