//! Typed column storage and the dataset container.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FacetError, Result};

/// Underlying storage type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    /// Whole numbers (no decimal point).
    Int,
    /// Floating-point numbers.
    Float,
    /// Boolean values (true/false).
    Bool,
    /// Free-form text values.
    Text,
    /// Dictionary-encoded low-cardinality text.
    Categorical,
    /// Date-like values (kept verbatim, not profiled).
    Date,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Int => write!(f, "int64"),
            StorageType::Float => write!(f, "float64"),
            StorageType::Bool => write!(f, "bool"),
            StorageType::Text => write!(f, "object"),
            StorageType::Categorical => write!(f, "category"),
            StorageType::Date => write!(f, "date"),
        }
    }
}

/// Typed cell storage for one column. Missing values stay `None` end to end.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
    /// Dictionary-encoded: `codes[i]` indexes into `dictionary`.
    Categorical {
        dictionary: Vec<String>,
        codes: Vec<Option<u32>>,
    },
    /// Date-like strings retained verbatim.
    Date(Vec<Option<String>>),
}

impl ColumnData {
    /// Storage type of this column.
    pub fn storage_type(&self) -> StorageType {
        match self {
            ColumnData::Int(_) => StorageType::Int,
            ColumnData::Float(_) => StorageType::Float,
            ColumnData::Bool(_) => StorageType::Bool,
            ColumnData::Text(_) => StorageType::Text,
            ColumnData::Categorical { .. } => StorageType::Categorical,
            ColumnData::Date(_) => StorageType::Date,
        }
    }

    /// Number of rows (missing included).
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Text(v) => v.len(),
            ColumnData::Categorical { codes, .. } => codes.len(),
            ColumnData::Date(v) => v.len(),
        }
    }

    /// True when the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, ordered sequence of values of a single storage type.
#[derive(Debug, Clone)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Typed cell storage.
    pub data: ColumnData,
}

impl Column {
    /// Create a new column.
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Storage type of this column.
    pub fn storage_type(&self) -> StorageType {
        self.data.storage_type()
    }

    /// Total number of rows, missing included.
    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Number of missing values.
    pub fn missing_count(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Float(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Bool(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Text(v) => v.iter().filter(|x| x.is_none()).count(),
            ColumnData::Categorical { codes, .. } => {
                codes.iter().filter(|x| x.is_none()).count()
            }
            ColumnData::Date(v) => v.iter().filter(|x| x.is_none()).count(),
        }
    }

    /// Whether the value at `idx` is missing.
    pub fn is_missing(&self, idx: usize) -> bool {
        self.label_at(idx).is_none()
    }

    /// Number of distinct non-missing values.
    pub fn distinct_count(&self) -> usize {
        match &self.data {
            ColumnData::Int(v) => {
                let set: std::collections::HashSet<i64> = v.iter().flatten().copied().collect();
                set.len()
            }
            ColumnData::Float(v) => {
                // Distinct by bit pattern; NaN never appears in parsed data.
                let set: std::collections::HashSet<u64> =
                    v.iter().flatten().map(|x| x.to_bits()).collect();
                set.len()
            }
            ColumnData::Bool(v) => {
                let set: std::collections::HashSet<bool> = v.iter().flatten().copied().collect();
                set.len()
            }
            ColumnData::Text(v) => {
                let set: std::collections::HashSet<&str> =
                    v.iter().flatten().map(|s| s.as_str()).collect();
                set.len()
            }
            ColumnData::Categorical { codes, .. } => {
                let set: std::collections::HashSet<u32> = codes.iter().flatten().copied().collect();
                set.len()
            }
            ColumnData::Date(v) => {
                let set: std::collections::HashSet<&str> =
                    v.iter().flatten().map(|s| s.as_str()).collect();
                set.len()
            }
        }
    }

    /// Non-missing values as `f64`, in row order. `None` for non-numeric storage.
    pub fn numeric_values(&self) -> Option<Vec<f64>> {
        match &self.data {
            ColumnData::Int(v) => Some(v.iter().flatten().map(|&x| x as f64).collect()),
            ColumnData::Float(v) => Some(v.iter().flatten().copied().collect()),
            _ => None,
        }
    }

    /// Numeric value at `idx`, or `None` when missing or non-numeric.
    pub fn numeric_at(&self, idx: usize) -> Option<f64> {
        match &self.data {
            ColumnData::Int(v) => v.get(idx).copied().flatten().map(|x| x as f64),
            ColumnData::Float(v) => v.get(idx).copied().flatten(),
            _ => None,
        }
    }

    /// Display label for the value at `idx`, or `None` when missing.
    pub fn label_at(&self, idx: usize) -> Option<String> {
        match &self.data {
            ColumnData::Int(v) => v.get(idx).copied().flatten().map(|x| x.to_string()),
            ColumnData::Float(v) => v.get(idx).copied().flatten().map(format_float_label),
            ColumnData::Bool(v) => v.get(idx).copied().flatten().map(|x| x.to_string()),
            ColumnData::Text(v) => v.get(idx).cloned().flatten(),
            ColumnData::Categorical { dictionary, codes } => codes
                .get(idx)
                .copied()
                .flatten()
                .and_then(|c| dictionary.get(c as usize).cloned()),
            ColumnData::Date(v) => v.get(idx).cloned().flatten(),
        }
    }

    /// Frequency counts of display labels, ordered by descending count.
    ///
    /// Ties keep first-seen order, which makes the ordering deterministic
    /// for a fixed input.
    pub fn value_counts(&self) -> IndexMap<String, usize> {
        let mut counts: IndexMap<String, usize> = IndexMap::new();
        for idx in 0..self.row_count() {
            if let Some(label) = self.label_at(idx) {
                *counts.entry(label).or_insert(0) += 1;
            }
        }
        counts.sort_by(|_, a, _, b| b.cmp(a));
        counts
    }
}

/// Integers print without a decimal point, everything else as-is.
fn format_float_label(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{}", x)
    }
}

/// A named, ordered collection of columns.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    columns: Vec<Column>,
}

impl Dataset {
    /// Create an empty dataset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dataset from columns.
    pub fn with_columns(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Append a column. All columns must share the same row count.
    pub fn add_column(&mut self, column: Column) -> Result<()> {
        if let Some(first) = self.columns.first() {
            if first.row_count() != column.row_count() {
                return Err(FacetError::ShapeMismatch(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.row_count(),
                    first.row_count()
                )));
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows (0 when there are no columns).
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.row_count())
    }

    /// All columns in input order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names in input order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column by name, erroring when absent.
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| FacetError::UnknownColumn(name.to_string()))
    }
}
