//! FILENAME: core/pivot-engine/src/lib.rs
//! Subtotaled pivot tables.
//!
//! Groups a flat table by an ordered list of key columns, then repeats the
//! grouping with one trailing key dropped per pass and stacks the results,
//! so every coarser pass reads as a block of subtotal rows. The last pass can
//! carry a grand total row. It depends on `engine` only for shared types
//! (CellValue, Table).
//!
//! Layers:
//! - `definition`: Serializable configuration (what the pivot IS)
//! - `cache`: Internal grouping representation (HOW we group)
//! - `view`: Pass frames and the combined output (WHAT we return)
//! - `engine`: Calculation engine (HOW we calculate)

pub mod definition;
pub mod cache;
pub mod view;
pub mod engine;
pub mod error;

pub use definition::*;
pub use view::*;
pub use crate::engine::{group_aggregate, pivot_with_subtotals, SubtotaledPivotBuilder};
pub use error::PivotError;
