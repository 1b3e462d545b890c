//! Row sets exchanged between the host and a running transformation
//!
//! A [`RowSet`] carries ordered rows together with their column metadata.
//! The host uses row sets in two directions: to inject rows into an
//! injector step before a run starts, and to read the monitored step's
//! output and error rows back after the run finishes.

#![allow(clippy::must_use_candidate)]

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A single row of cell values
pub type Row = Vec<Value>;

/// An ordered set of rows with column metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RowSet {
    /// Column names, in cell order
    columns: Vec<String>,
    /// Rows, each with one cell per column
    rows: Vec<Row>,
}

impl RowSet {
    /// Creates an empty row set with the given columns
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates an empty row set from column name references
    pub fn with_columns(columns: &[&str]) -> Self {
        Self::new(columns.iter().map(|c| (*c).to_string()).collect())
    }

    /// Appends a row
    ///
    /// The row is expected to have one cell per column, in column order;
    /// shape conformance is the caller's contract and is not checked here.
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Appends a row of string cells
    pub fn add_string_row(&mut self, cells: &[&str]) {
        self.rows
            .push(cells.iter().map(|c| Value::String((*c).to_string())).collect());
    }

    /// Returns the column names in cell order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the index of a column by name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the set has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cell at the given row and column, if present
    pub fn value_at(&self, row: usize, column: usize) -> Option<&Value> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Returns the cell at the given row for a named column, if present
    pub fn value_by_name(&self, row: usize, column: &str) -> Option<&Value> {
        self.column_index(column)
            .and_then(|idx| self.value_at(row, idx))
    }

    /// Returns an iterator over the rows
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Consumes the set and returns its rows
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl fmt::Display for RowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RowSet({} columns, {} rows)",
            self.columns.len(),
            self.rows.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rowset_creation() {
        let rows = RowSet::with_columns(&["REGION", "DEPARTMENT"]);
        assert_eq!(rows.column_count(), 2);
        assert_eq!(rows.row_count(), 0);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_rowset_add_and_access() {
        let mut rows = RowSet::with_columns(&["REGION", "DEPARTMENT"]);
        rows.add_string_row(&["Central", "Sales"]);
        rows.add_row(vec![json!("West"), json!("Marketing")]);

        assert_eq!(rows.row_count(), 2);
        assert_eq!(rows.value_at(0, 0), Some(&json!("Central")));
        assert_eq!(rows.value_at(1, 1), Some(&json!("Marketing")));
        assert_eq!(rows.value_at(2, 0), None);
    }

    #[test]
    fn test_rowset_column_lookup() {
        let mut rows = RowSet::with_columns(&["REGION", "DEPARTMENT"]);
        rows.add_string_row(&["Central", "Sales"]);

        assert_eq!(rows.column_index("DEPARTMENT"), Some(1));
        assert_eq!(rows.column_index("ABSENT"), None);
        assert_eq!(rows.value_by_name(0, "DEPARTMENT"), Some(&json!("Sales")));
    }

    #[test]
    fn test_rowset_display() {
        let rows = RowSet::with_columns(&["A"]);
        assert_eq!(rows.to_string(), "RowSet(1 columns, 0 rows)");
    }

    #[test]
    fn test_rowset_serde_roundtrip() {
        let mut rows = RowSet::with_columns(&["A", "B"]);
        rows.add_string_row(&["1", "2"]);
        let text = serde_json::to_string(&rows).unwrap();
        let back: RowSet = serde_json::from_str(&text).unwrap();
        assert_eq!(rows, back);
    }
}
