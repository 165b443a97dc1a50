//! FILENAME: core/engine/src/cell.rs
//! PURPOSE: Defines the value held by a single table cell.
//! CONTEXT: `CellValue` is shared by the table model and the pivot engine.
//! `Empty` stands in for a missing/undefined cell. It is designed to be
//! lightweight as millions of these instances may exist.

use serde::{Deserialize, Serialize};

/// Represents the possible errors a cell can hold (e.g., #DIV/0!)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellError {
    Div0,       // Division by zero
    Ref,        // Invalid reference
    Name,       // Unknown function name
    Value,      // Wrong type of argument
    NA,         // Value not available
}

/// Represents the raw or calculated data within a cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Returns the numeric payload, if any.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the display value of the cell as a String.
    pub fn display_value(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                // Format without unnecessary decimal places
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CellValue::Text(s) => s.clone(),
            CellValue::Boolean(b) => {
                if *b { "TRUE" } else { "FALSE" }.to_string()
            }
            CellValue::Error(e) => format!("#{:?}", e).to_uppercase(),
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_drops_trailing_zero_decimals() {
        assert_eq!(CellValue::Number(35.0).display_value(), "35");
        assert_eq!(CellValue::Number(2.5).display_value(), "2.5");
        assert_eq!(CellValue::Boolean(true).display_value(), "TRUE");
        assert_eq!(CellValue::Error(CellError::Div0).display_value(), "#DIV0");
        assert_eq!(CellValue::Empty.display_value(), "");
    }

    #[test]
    fn conversions() {
        assert_eq!(CellValue::from("Yes"), CellValue::Text("Yes".to_string()));
        assert_eq!(CellValue::from(10i64), CellValue::Number(10.0));
        assert_eq!(CellValue::from(1.5).as_number(), Some(1.5));
        assert!(CellValue::default().is_empty());
    }
}
