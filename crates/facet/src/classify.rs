//! Semantic type classification for columns.
//!
//! The semantic type drives which statistics and charts apply to a column.
//! Classification is a pure function of the storage type and the column's
//! distinct-value statistics; the column name and position play no part.

use serde::{Deserialize, Serialize};

use crate::input::{Column, ColumnData, StorageType};

/// Distinct-value count at or below which a numeric column is treated as
/// condensed (category-like).
const CONDENSED_THRESHOLD: usize = 10;

/// Analysis-relevant category of a column, distinct from its storage type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SemanticType {
    /// Continuous numeric column.
    Numeric,
    /// Numeric column with few distinct values; behaves like a category
    /// visually while retaining numeric summary statistics.
    NumericCondensed,
    /// Text or fixed-category column.
    Text,
    /// Boolean column, including numeric columns holding exactly {0, 1}.
    Bool,
    /// Storage type the profiler has no operations for.
    Unsupported,
}

impl SemanticType {
    /// True for either numeric flavor.
    pub fn is_numeric(&self) -> bool {
        matches!(self, SemanticType::Numeric | SemanticType::NumericCondensed)
    }

    /// True for the category-like types (text and bool).
    pub fn is_categorical(&self) -> bool {
        matches!(self, SemanticType::Text | SemanticType::Bool)
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SemanticType::Numeric => write!(f, "numeric"),
            SemanticType::NumericCondensed => write!(f, "numeric-condensed"),
            SemanticType::Text => write!(f, "string"),
            SemanticType::Bool => write!(f, "bool"),
            SemanticType::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// Classify a column. Deterministic and idempotent; first match wins.
pub fn classify(column: &Column) -> SemanticType {
    match column.storage_type() {
        StorageType::Text => SemanticType::Text,
        StorageType::Bool => SemanticType::Bool,
        StorageType::Int | StorageType::Float => classify_numeric(column),
        StorageType::Categorical => SemanticType::Text,
        StorageType::Date => SemanticType::Unsupported,
    }
}

/// Cardinality rules for numeric storage.
fn classify_numeric(column: &Column) -> SemanticType {
    let distinct = column.distinct_count();
    if distinct <= CONDENSED_THRESHOLD {
        if distinct == 2 && is_zero_one(column) {
            SemanticType::Bool
        } else {
            SemanticType::NumericCondensed
        }
    } else {
        SemanticType::Numeric
    }
}

/// Whether the two distinct values of a numeric column are exactly {0, 1}.
fn is_zero_one(column: &Column) -> bool {
    match &column.data {
        ColumnData::Int(v) => v.iter().flatten().all(|&x| x == 0 || x == 1),
        ColumnData::Float(v) => v.iter().flatten().all(|&x| x == 0.0 || x == 1.0),
        _ => false,
    }
}
