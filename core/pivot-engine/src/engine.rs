//! FILENAME: core/pivot-engine/src/engine.rs
//! Subtotal Engine - The calculation core that turns a flat table into a
//! pivot with subtotal and grand total rows.
//!
//! Algorithm:
//! 1. Validate the definition against the source table
//! 2. Build the per-pass key lists up front, dropping one trailing key per pass
//! 3. Run the group-by primitive once per pass (margins only on the last pass)
//! 4. Stack the pass frames, reconciling columns by label
//! 5. Flatten the two-part labels and fill unused grouping cells with "Total"

use engine::{CellValue, Table};
use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache::{AggregateAccumulator, CacheValue, FieldCache, GroupKey};
use crate::definition::{
    AggregateOptions, AggregationSpec, SortOrder, SubtotalDefinition, ValueAggregation,
    SUBTOTAL_FILL_LABEL,
};
use crate::error::PivotError;
use crate::view::{ColumnLabel, FrameRow, PassFrame, RowKind, SubtotalRow, SubtotalView};

// ============================================================================
// GROUP AGGREGATOR
// ============================================================================

/// Runs one group-by pass over the source table.
struct GroupAggregator<'a> {
    table: &'a Table,
    keys: &'a [String],
    values: &'a ValueAggregation,
    options: &'a AggregateOptions,

    /// One cache per grouping field, in key order.
    fields: Vec<FieldCache>,

    /// Source column position of the value column.
    value_index: usize,
}

impl<'a> GroupAggregator<'a> {
    fn new(
        table: &'a Table,
        keys: &'a [String],
        values: &'a ValueAggregation,
        options: &'a AggregateOptions,
    ) -> Result<Self, PivotError> {
        check_unique_keys(keys)?;
        check_functions(&values.aggregation)?;
        if keys.contains(&values.column) {
            return Err(PivotError::InvalidArgument(format!(
                "value column '{}' is also a grouping key",
                values.column
            )));
        }

        let fields = keys
            .iter()
            .map(|key| resolve_column(table, key).map(FieldCache::new))
            .collect::<Result<Vec<_>, _>>()?;
        let value_index = resolve_column(table, &values.column)?;

        Ok(GroupAggregator {
            table,
            keys,
            values,
            options,
            fields,
            value_index,
        })
    }

    fn aggregate(mut self) -> Result<PassFrame, PivotError> {
        let mut slots: FxHashMap<GroupKey, usize> = FxHashMap::default();
        let mut groups: Vec<(GroupKey, AggregateAccumulator)> = Vec::new();
        let mut margin = self
            .options
            .margins_name
            .as_ref()
            .map(|_| AggregateAccumulator::new());

        for row in self.table.rows() {
            let value = CacheValue::from(&row[self.value_index]);
            if let Some(acc) = margin.as_mut() {
                acc.add(&value);
            }

            let key = GroupKey::new(
                self.fields
                    .iter_mut()
                    .map(|field| field.intern(CacheValue::from(&row[field.source_index]))),
            );
            if self.options.dropna && key.has_empty() {
                continue;
            }

            let slot = *slots.entry(key.clone()).or_insert_with(|| {
                groups.push((key, AggregateAccumulator::new()));
                groups.len() - 1
            });
            groups[slot].1.add(&value);
        }

        self.sort_groups(&mut groups);

        let mut rows = Vec::with_capacity(groups.len() + 1);
        for (key, acc) in &groups {
            let aggregates = self.compute_row(acc)?;
            if self.options.dropna && aggregates.iter().all(CellValue::is_empty) {
                continue;
            }

            let mut cells: Vec<CellValue> = key
                .values
                .iter()
                .zip(&self.fields)
                .map(|(&id, field)| field.get_value(id).map_or(CellValue::Empty, CellValue::from))
                .collect();
            cells.extend(aggregates);
            rows.push(FrameRow {
                cells,
                is_grand_total: false,
            });
        }

        if let (Some(name), Some(acc)) = (&self.options.margins_name, &margin) {
            let mut cells = vec![CellValue::text(name.as_str()); self.fields.len()];
            cells.extend(self.compute_row(acc)?);
            rows.push(FrameRow {
                cells,
                is_grand_total: true,
            });
        }

        debug!(
            "group pass over {:?}: {} source rows, {} groups, margins={}",
            self.keys,
            self.table.row_count(),
            groups.len(),
            margin.is_some()
        );

        Ok(PassFrame {
            keys: self.keys.to_vec(),
            labels: self.labels(),
            rows,
        })
    }

    /// Orders groups in place. The sort is stable.
    fn sort_groups(&self, groups: &mut [(GroupKey, AggregateAccumulator)]) {
        match self.options.sort {
            SortOrder::Ascending => {
                groups.sort_by(|a, b| a.0.compare(&b.0, &self.fields));
            }
            SortOrder::Descending => {
                groups.sort_by(|a, b| b.0.compare(&a.0, &self.fields));
            }
            SortOrder::DataSourceOrder => {
                // Keep original order (order of first appearance)
            }
        }
    }

    /// Computes every requested aggregate for one group.
    fn compute_row(&self, acc: &AggregateAccumulator) -> Result<Vec<CellValue>, PivotError> {
        self.values
            .aggregation
            .functions()
            .iter()
            .map(|&aggregation| {
                if aggregation.requires_numbers() {
                    if let Some(found) = acc.non_number() {
                        return Err(PivotError::IncompatibleAggregation {
                            aggregation,
                            column: self.values.column.clone(),
                            found: found.type_name(),
                        });
                    }
                }
                Ok(acc.compute(aggregation))
            })
            .collect()
    }

    /// Column labels: grouping keys, then one label per aggregation output.
    fn labels(&self) -> Vec<ColumnLabel> {
        let mut labels: Vec<ColumnLabel> = self.keys.iter().map(ColumnLabel::flat).collect();
        labels.extend(value_labels(self.values));
        labels
    }
}

/// One label per aggregation output. A single function keeps the column
/// name; a list yields `(function, column)` pairs.
fn value_labels(values: &ValueAggregation) -> Vec<ColumnLabel> {
    match &values.aggregation {
        AggregationSpec::Single(_) => vec![ColumnLabel::flat(&values.column)],
        AggregationSpec::List(functions) => functions
            .iter()
            .map(|f| ColumnLabel::pair(f.name(), &values.column))
            .collect(),
    }
}

// ============================================================================
// VALIDATION HELPERS
// ============================================================================

fn resolve_column(table: &Table, name: &str) -> Result<usize, PivotError> {
    table
        .column_index(name)
        .ok_or_else(|| PivotError::UnknownColumn(name.to_string()))
}

fn check_unique_keys(keys: &[String]) -> Result<(), PivotError> {
    let mut seen = FxHashSet::default();
    for key in keys {
        if !seen.insert(key.as_str()) {
            return Err(PivotError::InvalidArgument(format!(
                "duplicate grouping key '{}'",
                key
            )));
        }
    }
    Ok(())
}

fn check_functions(spec: &AggregationSpec) -> Result<(), PivotError> {
    let functions = spec.functions();
    if functions.is_empty() {
        return Err(PivotError::InvalidArgument(
            "no aggregation function given".to_string(),
        ));
    }
    for (i, f) in functions.iter().enumerate() {
        if functions[..i].contains(f) {
            return Err(PivotError::InvalidArgument(format!(
                "aggregation function '{}' listed twice",
                f
            )));
        }
    }
    Ok(())
}

// ============================================================================
// SUBTOTALED PIVOT BUILDER
// ============================================================================

/// Builds a pivot with subtotal rows for every dropped trailing key, plus an
/// optional grand total row.
pub struct SubtotaledPivotBuilder<'a> {
    table: &'a Table,
    definition: &'a SubtotalDefinition,
}

impl<'a> SubtotaledPivotBuilder<'a> {
    pub fn new(table: &'a Table, definition: &'a SubtotalDefinition) -> Self {
        SubtotaledPivotBuilder { table, definition }
    }

    /// Checks the definition against the table without aggregating anything.
    pub fn validate(&self) -> Result<(), PivotError> {
        let def = self.definition;

        if def.index.is_empty() {
            return Err(PivotError::InvalidArgument(
                "grouping key list is empty".to_string(),
            ));
        }
        check_unique_keys(&def.index)?;

        if def.levels < 1 || def.levels > def.index.len() {
            return Err(PivotError::InvalidArgument(format!(
                "levels must be between 1 and {}, got {}",
                def.index.len(),
                def.levels
            )));
        }

        if def.index.contains(&def.values.column) {
            return Err(PivotError::InvalidArgument(format!(
                "value column '{}' is also a grouping key",
                def.values.column
            )));
        }
        check_functions(&def.values.aggregation)?;

        for label in value_labels(&def.values) {
            let name = label.flatten();
            if def.index.contains(&name) {
                return Err(PivotError::InvalidArgument(format!(
                    "grouping key '{}' collides with an aggregated column name",
                    name
                )));
            }
        }

        for key in &def.index {
            resolve_column(self.table, key)?;
        }
        resolve_column(self.table, &def.values.column)?;

        Ok(())
    }

    /// Runs every pass and combines the results.
    pub fn build(&self) -> Result<SubtotalView, PivotError> {
        self.validate()?;

        let frames = self
            .definition
            .pass_keys()
            .into_iter()
            .enumerate()
            .map(|(pass, keys)| {
                group_aggregate(
                    self.table,
                    keys,
                    &self.definition.values,
                    &self.definition.options_for_pass(pass),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let view = combine_frames(
            &frames,
            self.definition.index.len(),
            &self.definition.margins_name,
        );
        debug!(
            "subtotal pivot: {} passes, {} rows, columns {:?}",
            frames.len(),
            view.row_count(),
            view.columns
        );
        Ok(view)
    }
}

// ============================================================================
// COMBINING PASSES
// ============================================================================

/// Stacks pass frames row-wise. Columns are matched by label in order of
/// first appearance; a row gets `Empty` for columns its pass lacks, except
/// the margins row, which carries `margins_name` in every grouping column.
fn combine_frames(frames: &[PassFrame], key_count: usize, margins_name: &str) -> SubtotalView {
    let mut labels: Vec<ColumnLabel> = Vec::new();
    for frame in frames {
        for label in &frame.labels {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }
    }

    let mut rows = Vec::with_capacity(frames.iter().map(PassFrame::row_count).sum());
    for (pass, frame) in frames.iter().enumerate() {
        let positions: Vec<Option<usize>> =
            labels.iter().map(|label| frame.label_index(label)).collect();

        for row in &frame.rows {
            let cells = positions
                .iter()
                .enumerate()
                .map(|(col, pos)| match pos {
                    Some(i) => row.cells[*i].clone(),
                    None if row.is_grand_total && col < key_count => {
                        CellValue::text(margins_name)
                    }
                    None => CellValue::Empty,
                })
                .collect();
            let kind = if row.is_grand_total {
                RowKind::GrandTotal
            } else if pass == 0 {
                RowKind::Detail
            } else {
                RowKind::Subtotal
            };
            rows.push(SubtotalRow { pass, kind, cells });
        }
    }

    let columns = labels
        .iter()
        .map(|label| {
            let name = label.flatten();
            trace!("flattened column label {:?} -> {}", label, name);
            name
        })
        .collect();

    fill_subtotal_cells(&mut rows, key_count);

    SubtotalView {
        columns,
        key_count,
        rows,
    }
}

/// Writes the subtotal label into every empty cell of the first `key_count`
/// columns. Value columns are never touched.
fn fill_subtotal_cells(rows: &mut [SubtotalRow], key_count: usize) {
    let mut filled = 0usize;
    for row in rows.iter_mut() {
        for cell in row.cells.iter_mut().take(key_count) {
            if cell.is_empty() {
                *cell = CellValue::text(SUBTOTAL_FILL_LABEL);
                filled += 1;
            }
        }
    }
    trace!("filled {} grouping cells with '{}'", filled, SUBTOTAL_FILL_LABEL);
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Groups `table` by `keys` and aggregates the value column.
/// This is the primitive each subtotal pass is built from.
pub fn group_aggregate(
    table: &Table,
    keys: &[String],
    values: &ValueAggregation,
    options: &AggregateOptions,
) -> Result<PassFrame, PivotError> {
    GroupAggregator::new(table, keys, values, options)?.aggregate()
}

/// Builds the subtotaled pivot and returns it as a plain table.
/// This is the main entry point for the calculation engine.
pub fn pivot_with_subtotals(
    table: &Table,
    definition: &SubtotalDefinition,
) -> Result<Table, PivotError> {
    let view = SubtotaledPivotBuilder::new(table, definition).build()?;
    Ok(view.into_table()?)
}
