//! Flattening of nested API responses into rectangular tables.
//!
//! The pipeline is `extract_records` (descend to the list of interest),
//! [`project`] (optionally narrow to named fields) and
//! [`Table::from_records`] (union of keys, scalar cells).

mod projector;
mod sink;
mod table;

pub use projector::{project, FlatRecord};
pub use sink::{RowsSink, TableSink};
pub use table::{to_table, Cell, Table};

use serde_json::Value;

/// Descend into `value` along `key_path` and return the records found there.
///
/// A path segment indexes an array when it parses as a number. A missing
/// path yields no records, an array yields its elements and any other
/// value yields a single record.
pub fn extract_records<S: AsRef<str>>(value: Value, key_path: &[S]) -> Vec<Value> {
    let mut current = value;
    for part in key_path {
        let part = part.as_ref();
        current = match current {
            Value::Object(mut map) => map.remove(part).unwrap_or(Value::Null),
            Value::Array(mut items) => match part.parse::<usize>() {
                Ok(index) if index < items.len() => items.swap_remove(index),
                _ => Value::Null,
            },
            _ => Value::Null,
        };
    }

    match current {
        Value::Null => Vec::new(),
        Value::Array(items) => items,
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_extract_array() {
        let body = json!({"ok": true, "channels": [{"id": "C1"}, {"id": "C2"}]});
        assert_eq!(extract_records(body, &["channels"]).len(), 2);
    }

    #[test]
    fn test_extract_nested_path() {
        let body = json!({"messages": {"matches": [{"ts": "1"}]}});
        assert_eq!(
            extract_records(body, &["messages", "matches"]),
            vec![json!({"ts": "1"})]
        );
    }

    #[test]
    fn test_extract_wraps_single_object() {
        let body = json!({"ok": true, "team": {"id": "T1"}});
        assert_eq!(extract_records(body, &["team"]), vec![json!({"id": "T1"})]);
    }

    #[test]
    fn test_extract_empty_path_is_whole_body() {
        let body = json!({"ok": true});
        let empty: [&str; 0] = [];
        assert_eq!(extract_records(body.clone(), &empty), vec![body]);
    }

    #[test_case(json!({"ok": true}), &["channels"]; "missing key")]
    #[test_case(json!({"channels": null}), &["channels"]; "null value")]
    #[test_case(json!({"channels": [1]}), &["channels", "3"]; "index out of range")]
    fn test_extract_missing_yields_nothing(body: Value, path: &[&str]) {
        assert!(extract_records(body, path).is_empty());
    }

    #[test]
    fn test_extract_array_index() {
        let body = json!({"channels": [{"id": "C1"}, {"id": "C2"}]});
        assert_eq!(
            extract_records(body, &["channels", "1"]),
            vec![json!({"id": "C2"})]
        );
    }
}
