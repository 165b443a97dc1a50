//! FILENAME: core/engine/src/table.rs
//! PURPOSE: Manages a rectangular collection of cells with named columns.
//! CONTEXT: This file defines the `Table` struct, the flat dataset fed into
//! the pivot engine and the shape of its results. Rows are dense vectors
//! aligned with the column list; a missing cell is `CellValue::Empty`.

use serde::{Deserialize, Serialize};
use crate::cell::CellValue;
use crate::error::TableError;

/// An ordered list of uniquely named columns plus an ordered list of rows.
/// Row order is significant and preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Column names, in display order.
    columns: Vec<String>,

    /// Row data. Every row has exactly `columns.len()` cells.
    rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Result<Self, TableError> {
        let mut names: Vec<String> = Vec::new();
        for column in columns {
            let column = column.into();
            if names.contains(&column) {
                return Err(TableError::DuplicateColumn(column));
            }
            names.push(column);
        }
        Ok(Table {
            columns: names,
            rows: Vec::new(),
        })
    }

    /// Creates a table from column names and positional rows.
    pub fn with_rows<S: Into<String>>(
        columns: impl IntoIterator<Item = S>,
        rows: impl IntoIterator<Item = Vec<CellValue>>,
    ) -> Result<Self, TableError> {
        let mut table = Table::new(columns)?;
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    /// Creates a table from records (column name -> value mappings).
    /// Columns a record does not mention are left `Empty`.
    pub fn from_records<S, R, K>(
        columns: impl IntoIterator<Item = S>,
        records: impl IntoIterator<Item = R>,
    ) -> Result<Self, TableError>
    where
        S: Into<String>,
        R: IntoIterator<Item = (K, CellValue)>,
        K: AsRef<str>,
    {
        let mut table = Table::new(columns)?;
        for record in records {
            table.push_record(record)?;
        }
        Ok(table)
    }

    /// Appends a positional row. The width must match the column count.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    /// Appends a record keyed by column name.
    pub fn push_record<K: AsRef<str>>(
        &mut self,
        record: impl IntoIterator<Item = (K, CellValue)>,
    ) -> Result<(), TableError> {
        let mut row = vec![CellValue::Empty; self.columns.len()];
        for (name, value) in record {
            let name = name.as_ref();
            let index = self
                .column_index(name)
                .ok_or_else(|| TableError::UnknownColumn(name.to_string()))?;
            row[index] = value;
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Retrieves a single cell by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_columns() {
        let err = Table::new(["A", "B", "A"]).unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("A".to_string()));
    }

    #[test]
    fn rejects_ragged_rows() {
        let mut table = Table::new(["A", "B"]).unwrap();
        let err = table.push_row(vec![CellValue::Number(1.0)]).unwrap_err();
        assert_eq!(
            err,
            TableError::RowWidth { row: 0, expected: 2, found: 1 }
        );
        assert!(table.is_empty());
    }

    #[test]
    fn records_fill_missing_columns_with_empty() {
        let table = Table::from_records(
            ["Name", "Score"],
            vec![
                vec![("Name", CellValue::from("Ann")), ("Score", CellValue::from(3.0))],
                vec![("Name", CellValue::from("Bob"))],
            ],
        )
        .unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cell(1, "Score"), Some(&CellValue::Empty));
        assert_eq!(table.cell(0, "Score"), Some(&CellValue::Number(3.0)));
        assert_eq!(table.cell(0, "Missing"), None);
    }

    #[test]
    fn records_with_unknown_column_fail() {
        let err = Table::from_records(["A"], vec![vec![("B", CellValue::Empty)]]).unwrap_err();
        assert_eq!(err, TableError::UnknownColumn("B".to_string()));
    }
}
