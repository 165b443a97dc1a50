//! FILENAME: core/pivot-engine/src/view.rs
//! Pivot View - Output shapes of the subtotal engine.
//!
//! - `ColumnLabel`: two-part column label as produced by one aggregation pass
//! - `PassFrame`: the result of one group-by pass
//! - `SubtotalView`: all passes stacked, labels flattened, sentinel filled

use engine::{CellValue, Table, TableError};
use serde::{Deserialize, Serialize};

// ============================================================================
// COLUMN LABELS
// ============================================================================

/// Flattens a two-part column label into a single name.
/// `("sum", "Score")` becomes `"sum_Score"`, `("Score", "")` becomes `"Score"`.
pub fn flatten_label(first: &str, second: &str) -> String {
    if second.is_empty() {
        first.to_string()
    } else {
        format!("{}_{}", first, second)
    }
}

/// A hierarchical column label. Single-level labels have an empty `second`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnLabel {
    pub first: String,
    pub second: String,
}

impl ColumnLabel {
    pub fn flat(name: impl Into<String>) -> Self {
        ColumnLabel {
            first: name.into(),
            second: String::new(),
        }
    }

    pub fn pair(first: impl Into<String>, second: impl Into<String>) -> Self {
        ColumnLabel {
            first: first.into(),
            second: second.into(),
        }
    }

    pub fn flatten(&self) -> String {
        flatten_label(&self.first, &self.second)
    }
}

// ============================================================================
// PASS FRAME
// ============================================================================

/// One row of a pass frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRow {
    pub cells: Vec<CellValue>,

    /// True for the margins row.
    pub is_grand_total: bool,
}

/// Result of a single group-by pass: grouping columns first, then one
/// column per aggregation function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassFrame {
    /// Grouping columns used in this pass, outermost first.
    pub keys: Vec<String>,

    /// Labels of every column (keys, then values).
    pub labels: Vec<ColumnLabel>,

    pub rows: Vec<FrameRow>,
}

impl PassFrame {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of groups, excluding the margins row.
    pub fn group_count(&self) -> usize {
        self.rows.iter().filter(|r| !r.is_grand_total).count()
    }

    pub fn grand_total(&self) -> Option<&FrameRow> {
        self.rows.iter().find(|r| r.is_grand_total)
    }

    /// Position of a column by label.
    pub fn label_index(&self, label: &ColumnLabel) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}

// ============================================================================
// SUBTOTAL VIEW
// ============================================================================

/// What a combined row represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowKind {
    /// Fully grouped row from the first pass.
    Detail,
    /// Row from a coarser pass.
    Subtotal,
    /// The margins row.
    GrandTotal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtotalRow {
    /// Pass that produced this row (0 = full grouping).
    pub pass: usize,
    pub kind: RowKind,
    pub cells: Vec<CellValue>,
}

/// The combined, flattened result of all passes.
/// Rows are pass-major; within a pass they keep the pass order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtotalView {
    /// Flattened column names: grouping columns, then value columns.
    pub columns: Vec<String>,

    /// How many leading columns are grouping columns.
    pub key_count: usize,

    pub rows: Vec<SubtotalRow>,
}

impl SubtotalView {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Names of the aggregated columns.
    pub fn value_columns(&self) -> &[String] {
        self.columns.get(self.key_count..).unwrap_or(&[])
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    pub fn rows_for_pass(&self, pass: usize) -> impl Iterator<Item = &SubtotalRow> {
        self.rows.iter().filter(move |r| r.pass == pass)
    }

    pub fn grand_total(&self) -> Option<&SubtotalRow> {
        self.rows.iter().find(|r| r.kind == RowKind::GrandTotal)
    }

    /// Drops the row metadata and returns a plain table.
    pub fn into_table(self) -> Result<Table, TableError> {
        Table::with_rows(self.columns, self.rows.into_iter().map(|r| r.cells))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattening_joins_non_empty_parts() {
        assert_eq!(flatten_label("sum", "Score"), "sum_Score");
        assert_eq!(flatten_label("count", ""), "count");
        assert_eq!(ColumnLabel::flat("Enrolled").flatten(), "Enrolled");
        assert_eq!(ColumnLabel::pair("mean", "Score").flatten(), "mean_Score");
    }

    #[test]
    fn view_lookups() {
        let view = SubtotalView {
            columns: vec!["Region".to_string(), "Sales".to_string()],
            key_count: 1,
            rows: vec![
                SubtotalRow {
                    pass: 0,
                    kind: RowKind::Detail,
                    cells: vec![CellValue::from("North"), CellValue::from(250.0)],
                },
                SubtotalRow {
                    pass: 0,
                    kind: RowKind::GrandTotal,
                    cells: vec![CellValue::from("All"), CellValue::from(250.0)],
                },
            ],
        };

        assert_eq!(view.value_columns(), ["Sales".to_string()]);
        assert_eq!(view.cell(0, "Region"), Some(&CellValue::from("North")));
        assert_eq!(view.grand_total().map(|r| r.cells[0].clone()), Some(CellValue::from("All")));
        assert_eq!(view.rows_for_pass(0).count(), 2);

        let table = view.into_table().unwrap();
        assert_eq!(table.columns(), ["Region".to_string(), "Sales".to_string()]);
        assert_eq!(table.row_count(), 2);
    }
}
