//! FILENAME: core/pivot-engine/src/error.rs

use engine::TableError;
use thiserror::Error;

use crate::definition::AggregationType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PivotError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Cannot compute '{aggregation}' over column '{column}': found {found} value")]
    IncompatibleAggregation {
        aggregation: AggregationType,
        column: String,
        found: &'static str,
    },

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

impl PivotError {
    /// True for caller misuse (bad keys, levels or column names).
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, PivotError::InvalidArgument(_) | PivotError::UnknownColumn(_))
    }
}
