//! Projection and flattening tests.

use crate::fixtures;
use crate::tabulate::{extract_records, project, to_table, Cell, RowsSink, Table, TableSink};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

#[test]
fn test_union_of_keys_first_seen() {
    let table = to_table(&[
        json!({"id": 1, "name": "a"}),
        json!({"id": 2, "color": "red"}),
    ]);

    assert_eq!(table.header(), &["id", "name", "color"]);
    assert_eq!(
        table.rows(),
        &[
            vec![Cell::from(json!(1)), Cell::Text("a".into()), Cell::Null],
            vec![Cell::from(json!(2)), Cell::Null, Cell::Text("red".into())],
        ]
    );
}

#[test]
fn test_every_row_matches_header() {
    let records = vec![
        json!({"a": 1}),
        json!({"b": [1, 2], "a": null}),
        json!({"c": {"d": true}}),
        json!({}),
    ];
    let table = to_table(&records);

    assert_eq!(table.header(), &["a", "b", "c"]);
    assert!(table.rows().iter().all(|row| row.len() == table.header().len()));
    assert_eq!(table.rows()[1][1], Cell::Text("[1,2]".into()));
    assert_eq!(table.rows()[2][2], Cell::Text(r#"{"d":true}"#.into()));
    assert_eq!(table.rows()[3], vec![Cell::Null, Cell::Null, Cell::Null]);
}

#[test]
fn test_empty_records() {
    let table = to_table(&[]);

    assert_eq!(table, Table::default());
    assert!(table.header().is_empty());
    assert!(table.rows().is_empty());
}

#[test]
fn test_projection_then_flatten() {
    let body = fixtures::conversations_page(
        vec![
            fixtures::channel("C1", "general"),
            fixtures::channel("C2", "random"),
        ],
        "",
    );
    let records = extract_records(body, &["channels"]);
    let table = Table::from_records(&project(&records, &["name", "num_members", "missing"]));

    assert_eq!(table.header(), &["name", "num_members", "missing"]);
    assert_eq!(
        table.to_rows(),
        vec![
            vec![json!("name"), json!("num_members"), json!("missing")],
            vec![json!("general"), json!(3), Value::Null],
            vec![json!("random"), json!(3), Value::Null],
        ]
    );
}

#[test]
fn test_select_columns_after_flatten() {
    let table = to_table(&[
        json!({"id": "C1", "name": "general", "is_private": false}),
        json!({"id": "C2", "name": "random", "is_private": true}),
    ]);

    let rows = table.select_columns(&["is_private", "id", "unknown"]).to_rows();

    assert_eq!(
        rows,
        vec![
            vec![json!("is_private"), json!("id")],
            vec![json!(false), json!("C1")],
            vec![json!(true), json!("C2")],
        ]
    );
}

#[test]
fn test_scalar_records() {
    let records = extract_records(json!({"ok": true, "ids": ["U1", "U2"]}), &["ids"]);
    let table = to_table(&records);

    assert_eq!(table.header(), &["value"]);
    assert_eq!(table.len(), 2);
}

#[test]
fn test_rows_sink() {
    let mut sink = RowsSink::new();
    sink.write_table(&to_table(&[json!({"id": "C1"})])).unwrap();

    assert_eq!(sink.rows(), &[vec![json!("id")], vec![json!("C1")]]);
}
