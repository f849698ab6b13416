//! Destinations for finished tables.

use super::table::Table;
use crate::errors::SlackResult;
use serde_json::Value;

/// Receives a whole table at once
pub trait TableSink {
    /// Write `table`, replacing anything written before
    fn write_table(&mut self, table: &Table) -> SlackResult<()>;
}

/// Sink that keeps the header-plus-rows matrix in memory
#[derive(Debug, Clone, Default)]
pub struct RowsSink {
    rows: Vec<Vec<Value>>,
}

impl RowsSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows written so far
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Take the rows
    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }
}

impl TableSink for RowsSink {
    fn write_table(&mut self, table: &Table) -> SlackResult<()> {
        self.rows = table.to_rows();
        Ok(())
    }
}
