//! Rectangular tables of scalar cells.

use super::projector::FlatRecord;
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::HashSet;

/// A single table value; nested JSON is stored as its compact text
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    /// Absent or null
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(Number),
    /// String, or serialized object/array
    Text(String),
}

impl From<&Value> for Cell {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => Cell::Number(n.clone()),
            Value::String(s) => Cell::Text(s.clone()),
            nested => Cell::Text(nested.to_string()),
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => Cell::Text(s),
            other => Cell::from(&other),
        }
    }
}

impl From<&Cell> for Value {
    fn from(cell: &Cell) -> Self {
        match cell {
            Cell::Null => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Number(n) => Value::Number(n.clone()),
            Cell::Text(s) => Value::String(s.clone()),
        }
    }
}

/// Header plus rows; every row is as long as the header
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table from flat records.
    ///
    /// The header is the union of all keys in first-seen order; a record
    /// missing a column gets a null cell there.
    pub fn from_records(records: &[FlatRecord]) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut header: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key) {
                    header.push(key.to_string());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                header
                    .iter()
                    .map(|key| record.get(key).map(Cell::from).unwrap_or(Cell::Null))
                    .collect()
            })
            .collect();

        Self { header, rows }
    }

    /// Column names
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keep the named columns in the given order. Names not in the
    /// header and repeats of an already kept name are skipped; a table
    /// without header is returned as is.
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Table {
        if self.header.is_empty() {
            return self.clone();
        }

        let mut indices: Vec<usize> = Vec::with_capacity(names.len());
        for name in names {
            if let Some(i) = self.header.iter().position(|h| h == name.as_ref()) {
                if !indices.contains(&i) {
                    indices.push(i);
                }
            }
        }

        Table {
            header: indices.iter().map(|&i| self.header[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Header row followed by the data rows
    pub fn to_rows(&self) -> Vec<Vec<Value>> {
        let mut out = Vec::with_capacity(self.rows.len() + 1);
        out.push(self.header.iter().cloned().map(Value::String).collect());
        out.extend(
            self.rows
                .iter()
                .map(|row| row.iter().map(Value::from).collect()),
        );
        out
    }
}

/// Flatten raw records straight into a table
pub fn to_table(records: &[Value]) -> Table {
    let flat: Vec<FlatRecord> = records.iter().cloned().map(FlatRecord::from).collect();
    Table::from_records(&flat)
}
