//! FILENAME: core/pivot-engine/src/cache.rs
//! Pivot Cache - Internal representation used while grouping.
//!
//! Architecture:
//! - Each unique grouping value is stored once per field and referenced by id
//! - A group is identified by the tuple of its field value ids
//! - Aggregates are accumulated incrementally, one accumulator per group

use std::cmp::Ordering;

use engine::{CellError, CellValue};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::definition::AggregationType;

// ============================================================================
// VALUE INTERNING
// ============================================================================

/// A reference to an interned value within a field's unique value store.
/// Using u32 to save memory (supports up to 4B unique values per field).
pub type ValueId = u32;

/// Represents a "null" or missing value in the cache.
pub const VALUE_ID_EMPTY: ValueId = u32::MAX;

/// A normalized, hashable representation of a cell value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheValue {
    Empty,
    Number(OrderedFloat),
    Text(String),
    Boolean(bool),
    Error(CellError),
}

impl From<&CellValue> for CacheValue {
    fn from(value: &CellValue) -> Self {
        match value {
            CellValue::Empty => CacheValue::Empty,
            // NaN is a missing number
            CellValue::Number(n) if n.is_nan() => CacheValue::Empty,
            CellValue::Number(n) => CacheValue::Number(OrderedFloat(*n)),
            CellValue::Text(s) => CacheValue::Text(s.clone()),
            CellValue::Boolean(b) => CacheValue::Boolean(*b),
            CellValue::Error(e) => CacheValue::Error(*e),
        }
    }
}

impl From<&CacheValue> for CellValue {
    fn from(value: &CacheValue) -> Self {
        match value {
            CacheValue::Empty => CellValue::Empty,
            CacheValue::Number(n) => CellValue::Number(n.0),
            CacheValue::Text(s) => CellValue::Text(s.clone()),
            CacheValue::Boolean(b) => CellValue::Boolean(*b),
            CacheValue::Error(e) => CellValue::Error(*e),
        }
    }
}

impl CacheValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            CacheValue::Empty => "empty",
            CacheValue::Number(_) => "number",
            CacheValue::Text(_) => "text",
            CacheValue::Boolean(_) => "boolean",
            CacheValue::Error(_) => "error",
        }
    }
}

/// Wrapper around f64 that implements Eq and Hash for use as HashMap keys.
/// NaN values are treated as equal to each other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrderedFloat(pub f64);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        if self.0.is_nan() && other.0.is_nan() {
            true
        } else {
            self.0 == other.0
        }
    }
}

impl Eq for OrderedFloat {}

impl std::hash::Hash for OrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        if self.0.is_nan() {
            // All NaN values hash to the same thing
            u64::MAX.hash(state);
        } else if self.0 == 0.0 {
            // -0.0 == 0.0, so they must hash alike
            0u64.hash(state);
        } else {
            self.0.to_bits().hash(state);
        }
    }
}

// ============================================================================
// FIELD CACHE
// ============================================================================

/// Cache for a single grouping field (column).
/// Stores unique values and provides O(1) lookup by ValueId.
#[derive(Debug, Clone)]
pub struct FieldCache {
    /// Source column position in the input table.
    pub source_index: usize,

    /// Map from value to its unique ID (for deduplication during build).
    value_to_id: FxHashMap<CacheValue, ValueId>,

    /// Ordered list of unique values (indexed by ValueId), in order of
    /// first appearance.
    id_to_value: Vec<CacheValue>,
}

impl FieldCache {
    pub fn new(source_index: usize) -> Self {
        FieldCache {
            source_index,
            value_to_id: FxHashMap::default(),
            id_to_value: Vec::new(),
        }
    }

    /// Interns a value and returns its ValueId.
    /// If the value already exists, returns the existing ID.
    pub fn intern(&mut self, value: CacheValue) -> ValueId {
        if let CacheValue::Empty = value {
            return VALUE_ID_EMPTY;
        }

        if let Some(&id) = self.value_to_id.get(&value) {
            return id;
        }

        let id = self.id_to_value.len() as ValueId;
        self.id_to_value.push(value.clone());
        self.value_to_id.insert(value, id);
        id
    }

    /// Gets the value for a given ID.
    pub fn get_value(&self, id: ValueId) -> Option<&CacheValue> {
        if id == VALUE_ID_EMPTY {
            return Some(&CacheValue::Empty);
        }
        self.id_to_value.get(id as usize)
    }

    /// Returns the number of unique values (excluding empty).
    pub fn unique_count(&self) -> usize {
        self.id_to_value.len()
    }

    /// Compares two interned values by their underlying value.
    pub fn compare_ids(&self, a: ValueId, b: ValueId) -> Ordering {
        match (self.get_value(a), self.get_value(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(va), Some(vb)) => compare_cache_values(va, vb),
        }
    }
}

/// Comparison function for sorting CacheValues.
/// Empty < Number < Text < Boolean < Error.
pub fn compare_cache_values(a: &CacheValue, b: &CacheValue) -> Ordering {
    match (a, b) {
        (CacheValue::Empty, CacheValue::Empty) => Ordering::Equal,
        (CacheValue::Empty, _) => Ordering::Less,
        (_, CacheValue::Empty) => Ordering::Greater,

        (CacheValue::Number(na), CacheValue::Number(nb)) => na.0.total_cmp(&nb.0),
        (CacheValue::Number(_), _) => Ordering::Less,
        (_, CacheValue::Number(_)) => Ordering::Greater,

        (CacheValue::Text(ta), CacheValue::Text(tb)) => ta.cmp(tb),
        (CacheValue::Text(_), _) => Ordering::Less,
        (_, CacheValue::Text(_)) => Ordering::Greater,

        (CacheValue::Boolean(ba), CacheValue::Boolean(bb)) => ba.cmp(bb),
        (CacheValue::Boolean(_), _) => Ordering::Less,
        (_, CacheValue::Boolean(_)) => Ordering::Greater,

        (CacheValue::Error(ea), CacheValue::Error(eb)) => ea.cmp(eb),
    }
}

// ============================================================================
// GROUP KEY
// ============================================================================

/// A key representing a unique combination of grouping field values.
/// Most pivots group by a handful of fields, so the ids live inline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    /// ValueIds for each grouping field, outermost first.
    pub values: SmallVec<[ValueId; 4]>,
}

impl GroupKey {
    pub fn new(values: impl IntoIterator<Item = ValueId>) -> Self {
        GroupKey {
            values: values.into_iter().collect(),
        }
    }

    /// True when any field of the key is empty.
    pub fn has_empty(&self) -> bool {
        self.values.contains(&VALUE_ID_EMPTY)
    }

    /// Lexicographic comparison of two keys, field by field.
    pub fn compare(&self, other: &GroupKey, fields: &[FieldCache]) -> Ordering {
        for ((a, b), field) in self.values.iter().zip(other.values.iter()).zip(fields) {
            match field.compare_ids(*a, *b) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }
        self.values.len().cmp(&other.values.len())
    }
}

// ============================================================================
// AGGREGATE ACCUMULATOR
// ============================================================================

/// Accumulator for computing aggregates incrementally.
/// Stores intermediate state needed for all aggregation types.
#[derive(Debug, Clone)]
pub struct AggregateAccumulator {
    pub sum: f64,
    /// Non-empty values seen.
    pub count: u64,
    pub count_numbers: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub product: f64,
    /// For variance/stddev: sum of squared differences from mean.
    /// Using Welford's algorithm for numerical stability.
    pub m2: f64,
    pub mean: f64,
    /// Numbers in arrival order, kept for the median.
    numbers: Vec<f64>,
    distinct: FxHashSet<CacheValue>,
    first: Option<CacheValue>,
    last: Option<CacheValue>,
    /// First non-numeric value seen, reported by numeric-only aggregations.
    non_number: Option<CacheValue>,
}

impl Default for AggregateAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl AggregateAccumulator {
    pub fn new() -> Self {
        AggregateAccumulator {
            sum: 0.0,
            count: 0,
            count_numbers: 0,
            min: None,
            max: None,
            product: 1.0,
            m2: 0.0,
            mean: 0.0,
            numbers: Vec::new(),
            distinct: FxHashSet::default(),
            first: None,
            last: None,
            non_number: None,
        }
    }

    /// Adds a value of any type. Empty values are skipped.
    pub fn add(&mut self, value: &CacheValue) {
        match value {
            CacheValue::Empty => return,
            CacheValue::Number(n) => self.add_number(n.0),
            other => self.add_non_number(other),
        }

        self.count += 1;
        if self.first.is_none() {
            self.first = Some(value.clone());
        }
        self.last = Some(value.clone());
        if !self.distinct.contains(value) {
            self.distinct.insert(value.clone());
        }
    }

    /// Updates the numeric statistics.
    fn add_number(&mut self, value: f64) {
        self.count_numbers += 1;

        // Sum
        self.sum += value;

        // Min/Max
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));

        // Product
        self.product *= value;

        // Welford's algorithm for variance
        let delta = value - self.mean;
        self.mean += delta / (self.count_numbers as f64);
        let delta2 = value - self.mean;
        self.m2 += delta * delta2;

        self.numbers.push(value);
    }

    fn add_non_number(&mut self, value: &CacheValue) {
        if self.non_number.is_none() {
            self.non_number = Some(value.clone());
        }
    }

    /// The first non-numeric value seen, if any.
    pub fn non_number(&self) -> Option<&CacheValue> {
        self.non_number.as_ref()
    }

    /// Computes the final aggregate value. Missing results are `Empty`.
    /// Callers check `non_number` before asking for numeric-only results.
    pub fn compute(&self, aggregation: AggregationType) -> CellValue {
        let n = self.count_numbers;
        match aggregation {
            AggregationType::Sum => CellValue::Number(self.sum),
            AggregationType::Count => CellValue::Number(self.count as f64),
            AggregationType::CountDistinct => CellValue::Number(self.distinct.len() as f64),
            AggregationType::Mean => {
                if n > 0 {
                    CellValue::Number(self.sum / (n as f64))
                } else {
                    CellValue::Empty
                }
            }
            AggregationType::Median => match self.median() {
                Some(m) => CellValue::Number(m),
                None => CellValue::Empty,
            },
            AggregationType::Min => self.min.map_or(CellValue::Empty, CellValue::Number),
            AggregationType::Max => self.max.map_or(CellValue::Empty, CellValue::Number),
            AggregationType::Product => CellValue::Number(self.product),
            AggregationType::Var => {
                if n > 1 {
                    CellValue::Number(self.m2 / ((n - 1) as f64))
                } else {
                    CellValue::Empty
                }
            }
            AggregationType::Std => {
                if n > 1 {
                    CellValue::Number((self.m2 / ((n - 1) as f64)).sqrt())
                } else {
                    CellValue::Empty
                }
            }
            AggregationType::First => self.first.as_ref().map_or(CellValue::Empty, CellValue::from),
            AggregationType::Last => self.last.as_ref().map_or(CellValue::Empty, CellValue::from),
        }
    }

    fn median(&self) -> Option<f64> {
        if self.numbers.is_empty() {
            return None;
        }
        let mut sorted = self.numbers.clone();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 0 {
            Some((sorted[mid - 1] + sorted[mid]) / 2.0)
        } else {
            Some(sorted[mid])
        }
    }
}
