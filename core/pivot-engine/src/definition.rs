//! FILENAME: core/pivot-engine/src/definition.rs
//! Subtotal Pivot Definition - The serializable configuration.
//!
//! This module contains all the types needed to DESCRIBE a subtotaled pivot.
//! These structures are designed to be:
//! - Serializable (so a host can send them across a bridge as JSON)
//! - Immutable snapshots of user intent
//!
//! Only `index`, `values` and `levels` are required when deserializing;
//! everything else falls back to its default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PivotError;

/// Label written into the grouping cells of the grand total row by default.
pub const DEFAULT_MARGINS_NAME: &str = "All";

/// Label written into grouping cells that a subtotal pass did not group by.
/// Independent of the margins name.
pub const SUBTOTAL_FILL_LABEL: &str = "Total";

// ============================================================================
// AGGREGATION
// ============================================================================

/// Supported aggregation functions for the value column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    #[default]
    Sum,
    Count,
    Mean,
    Median,
    Min,
    Max,
    #[serde(rename = "prod")]
    Product,
    /// Sample standard deviation (n - 1).
    Std,
    /// Sample variance (n - 1).
    Var,
    #[serde(rename = "nunique")]
    CountDistinct,
    First,
    Last,
}

impl AggregationType {
    /// The function name used in flattened column labels (e.g. `sum_Score`).
    pub fn name(self) -> &'static str {
        match self {
            AggregationType::Sum => "sum",
            AggregationType::Count => "count",
            AggregationType::Mean => "mean",
            AggregationType::Median => "median",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::Product => "prod",
            AggregationType::Std => "std",
            AggregationType::Var => "var",
            AggregationType::CountDistinct => "nunique",
            AggregationType::First => "first",
            AggregationType::Last => "last",
        }
    }

    /// Whether the function only accepts numeric input.
    pub fn requires_numbers(self) -> bool {
        !matches!(
            self,
            AggregationType::Count
                | AggregationType::CountDistinct
                | AggregationType::First
                | AggregationType::Last
        )
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregationType {
    type Err = PivotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let aggregation = match s.trim().to_ascii_lowercase().as_str() {
            "sum" => AggregationType::Sum,
            "count" => AggregationType::Count,
            "mean" | "average" | "avg" => AggregationType::Mean,
            "median" => AggregationType::Median,
            "min" => AggregationType::Min,
            "max" => AggregationType::Max,
            "prod" | "product" => AggregationType::Product,
            "std" | "stddev" => AggregationType::Std,
            "var" => AggregationType::Var,
            "nunique" => AggregationType::CountDistinct,
            "first" => AggregationType::First,
            "last" => AggregationType::Last,
            other => {
                return Err(PivotError::InvalidArgument(format!(
                    "unknown aggregation function '{}'",
                    other
                )))
            }
        };
        Ok(aggregation)
    }
}

/// One aggregation function, or a list of them.
///
/// The two forms label their output differently: a single function keeps the
/// value column's own name, a list (even of one) yields one column per
/// function labelled `(function, column)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AggregationSpec {
    Single(AggregationType),
    List(Vec<AggregationType>),
}

impl Default for AggregationSpec {
    fn default() -> Self {
        AggregationSpec::Single(AggregationType::default())
    }
}

impl AggregationSpec {
    pub fn functions(&self) -> &[AggregationType] {
        match self {
            AggregationSpec::Single(f) => std::slice::from_ref(f),
            AggregationSpec::List(fs) => fs,
        }
    }
}

impl From<AggregationType> for AggregationSpec {
    fn from(value: AggregationType) -> Self {
        AggregationSpec::Single(value)
    }
}

impl From<Vec<AggregationType>> for AggregationSpec {
    fn from(value: Vec<AggregationType>) -> Self {
        AggregationSpec::List(value)
    }
}

/// The value column together with how to aggregate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueAggregation {
    /// Name of the source column holding the values.
    pub column: String,

    /// The aggregation function(s) to apply.
    #[serde(default)]
    pub aggregation: AggregationSpec,
}

impl ValueAggregation {
    pub fn new(column: impl Into<String>, aggregation: impl Into<AggregationSpec>) -> Self {
        ValueAggregation {
            column: column.into(),
            aggregation: aggregation.into(),
        }
    }
}

// ============================================================================
// ORDERING
// ============================================================================

/// Order of groups within one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
    /// Order of first appearance in the source table.
    DataSourceOrder,
}

// ============================================================================
// AGGREGATION PRIMITIVE OPTIONS
// ============================================================================

/// Options for a single group-by pass.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    pub sort: SortOrder,

    /// Skip rows with an empty grouping cell and drop groups whose
    /// aggregates are all missing.
    pub dropna: bool,

    /// When set, append a grand total row carrying this label in every
    /// grouping cell.
    pub margins_name: Option<String>,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        AggregateOptions {
            sort: SortOrder::Ascending,
            dropna: true,
            margins_name: None,
        }
    }
}

// ============================================================================
// MAIN DEFINITION STRUCT
// ============================================================================

/// The complete, serializable definition of a subtotaled pivot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtotalDefinition {
    /// Grouping columns, outermost first. Subtotal passes drop from the right.
    pub index: Vec<String>,

    /// The value column and its aggregation.
    pub values: ValueAggregation,

    /// Number of aggregation passes (1 ..= index.len()).
    pub levels: usize,

    /// Add a grand total row on the last pass.
    #[serde(default = "default_true")]
    pub include_margins: bool,

    /// Label for the grand total row.
    #[serde(default = "default_margins_name")]
    pub margins_name: String,

    #[serde(default)]
    pub sort: SortOrder,

    #[serde(default = "default_true")]
    pub dropna: bool,
}

fn default_true() -> bool {
    true
}

fn default_margins_name() -> String {
    DEFAULT_MARGINS_NAME.to_string()
}

impl SubtotalDefinition {
    /// Creates a definition with default margins, sorting and NA handling.
    pub fn new<S: Into<String>>(
        index: impl IntoIterator<Item = S>,
        value_column: impl Into<String>,
        aggregation: impl Into<AggregationSpec>,
        levels: usize,
    ) -> Self {
        SubtotalDefinition {
            index: index.into_iter().map(Into::into).collect(),
            values: ValueAggregation::new(value_column, aggregation),
            levels,
            include_margins: true,
            margins_name: default_margins_name(),
            sort: SortOrder::default(),
            dropna: true,
        }
    }

    pub fn with_margins(mut self, include: bool) -> Self {
        self.include_margins = include;
        self
    }

    pub fn with_margins_name(mut self, name: impl Into<String>) -> Self {
        self.margins_name = name.into();
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_dropna(mut self, dropna: bool) -> Self {
        self.dropna = dropna;
        self
    }

    /// The grouping keys for each pass: `index[..k]`, `index[..k-1]`, ...
    /// Yields at most `levels` entries and never an empty key list.
    pub fn pass_keys(&self) -> Vec<&[String]> {
        let k = self.index.len();
        (0..self.levels.min(k))
            .map(|pass| &self.index[..k - pass])
            .collect()
    }

    /// Options for the pass at `pass` (0-based).
    pub fn options_for_pass(&self, pass: usize) -> AggregateOptions {
        let is_last = pass + 1 == self.levels;
        AggregateOptions {
            sort: self.sort,
            dropna: self.dropna,
            margins_name: (is_last && self.include_margins).then(|| self.margins_name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aggregation_names() {
        assert_eq!("sum".parse::<AggregationType>().unwrap(), AggregationType::Sum);
        assert_eq!("Average".parse::<AggregationType>().unwrap(), AggregationType::Mean);
        assert_eq!("nunique".parse::<AggregationType>().unwrap(), AggregationType::CountDistinct);
        assert!("mode".parse::<AggregationType>().unwrap_err().is_invalid_argument());
    }

    #[test]
    fn pass_keys_drop_from_the_right() {
        let def = SubtotalDefinition::new(
            ["Enrolled", "Time", "School", "Grade"],
            "Score",
            AggregationType::Count,
            3,
        );
        let passes = def.pass_keys();
        assert_eq!(passes.len(), 3);
        assert_eq!(passes[0], ["Enrolled", "Time", "School", "Grade"]);
        assert_eq!(passes[1], ["Enrolled", "Time", "School"]);
        assert_eq!(passes[2], ["Enrolled", "Time"]);
    }

    #[test]
    fn margins_only_on_last_pass() {
        let def = SubtotalDefinition::new(["A", "B"], "V", AggregationType::Sum, 2)
            .with_margins_name("Grand");
        assert_eq!(def.options_for_pass(0).margins_name, None);
        assert_eq!(def.options_for_pass(1).margins_name.as_deref(), Some("Grand"));

        let def = def.with_margins(false);
        assert_eq!(def.options_for_pass(1).margins_name, None);
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "index": ["Enrolled", "School"],
            "values": { "column": "Score", "aggregation": "sum" },
            "levels": 2
        }"#;
        let def: SubtotalDefinition = serde_json::from_str(json).unwrap();

        assert!(def.include_margins);
        assert_eq!(def.margins_name, "All");
        assert_eq!(def.sort, SortOrder::Ascending);
        assert!(def.dropna);
        assert_eq!(def.values.aggregation, AggregationSpec::Single(AggregationType::Sum));
        assert_eq!(AggregationType::default(), AggregationType::Sum);
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
    }

    #[test]
    fn deserializes_function_lists() {
        let json = r#"{ "column": "Score", "aggregation": ["count", "prod"] }"#;
        let values: ValueAggregation = serde_json::from_str(json).unwrap();
        assert_eq!(
            values.aggregation.functions(),
            &[AggregationType::Count, AggregationType::Product]
        );
    }
}
