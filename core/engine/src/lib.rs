//! FILENAME: core/engine/src/lib.rs
//! PURPOSE: Main library entry point for the table data model.
//! CONTEXT: Re-exports public types and modules for use by other crates.

pub mod cell;
pub mod error;
pub mod table;

// Re-export commonly used types at the crate root
pub use cell::{CellError, CellValue};
pub use error::TableError;
pub use table::Table;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_builds_tables() {
        let mut table = Table::new(["Enrolled", "School", "Score"]).unwrap();
        table
            .push_row(vec![CellValue::from("Yes"), CellValue::from("A"), CellValue::from(10.0)])
            .unwrap();

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column_count(), 3);
        assert_eq!(table.cell(0, "Score"), Some(&CellValue::Number(10.0)));
    }

    #[test]
    fn tables_round_trip_through_json() {
        let table = Table::with_rows(
            ["Region", "Sales"],
            vec![vec![CellValue::from("North"), CellValue::from(100.0)]],
        )
        .unwrap();

        let json = serde_json::to_string(&table).unwrap();
        let back: Table = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }
}
