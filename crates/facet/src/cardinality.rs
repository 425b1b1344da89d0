//! Cardinality reduction for grouping columns.
//!
//! Collapses a high-cardinality column into a handful of labeled buckets
//! so it can serve as a hue/grouping dimension without overwhelming a
//! legend. The derived column is the only mutation the engine ever makes
//! to a dataset.

use crate::classify::{SemanticType, classify};
use crate::input::{Column, ColumnData, Dataset};
use crate::error::Result;
use crate::stats;

/// Suffix of the derived low-cardinality column.
pub const DERIVED_SUFFIX: &str = "_lc";

/// Reduce a column to at most `desired` labeled buckets.
///
/// Returns one label per row (missing rows stay `None`), or `None` when
/// the column cannot serve as a grouping dimension (bool-with-overflow,
/// unsupported storage).
pub fn reduce_labels(
    column: &Column,
    semantic: SemanticType,
    desired: usize,
) -> Option<Vec<Option<String>>> {
    let rows = column.row_count();

    // Already small enough: keep the values themselves as labels.
    if column.distinct_count() <= desired {
        return Some((0..rows).map(|i| column.label_at(i)).collect());
    }

    match semantic {
        SemanticType::Text => Some(reduce_text(column, desired)),
        SemanticType::Numeric | SemanticType::NumericCondensed => reduce_numeric(column),
        // A bool column never exceeds two distinct values, so reaching
        // here means the type has no defined reduction.
        SemanticType::Bool | SemanticType::Unsupported => None,
    }
}

/// Keep the `desired - 1` most frequent values verbatim; everything else
/// becomes "Other".
fn reduce_text(column: &Column, desired: usize) -> Vec<Option<String>> {
    let counts = column.value_counts();
    let keep: Vec<&String> = counts.keys().take(desired.saturating_sub(1)).collect();

    (0..column.row_count())
        .map(|i| {
            column.label_at(i).map(|label| {
                if keep.iter().any(|k| **k == label) {
                    label
                } else {
                    "Other".to_string()
                }
            })
        })
        .collect()
}

/// Partition into three bands around mean +/- std, with the boundaries
/// embedded in the label text.
fn reduce_numeric(column: &Column) -> Option<Vec<Option<String>>> {
    let values = column.numeric_values()?;
    let mean = stats::mean(&values)?;
    let std = stats::std_dev(&values)?;
    let low = mean - std;
    let high = mean + std;
    let name = column.name.as_str();

    let low_label = format!("low ({}<{:.2})", name, low);
    let medium_label = format!("medium ({:.2}<{}<{:.2})", low, name, high);
    let high_label = format!("high ({}>{:.2})", name, high);

    Some(
        (0..column.row_count())
            .map(|i| {
                column.numeric_at(i).map(|x| {
                    if x < low {
                        low_label.clone()
                    } else if x > high {
                        high_label.clone()
                    } else {
                        medium_label.clone()
                    }
                })
            })
            .collect(),
    )
}

/// Append the derived low-cardinality version of `target` to the dataset.
///
/// Returns the derived column name, or `None` when the target cannot be
/// reduced to a grouping dimension.
pub fn add_derived_target(
    dataset: &mut Dataset,
    target: &str,
    desired: usize,
) -> Result<Option<String>> {
    let column = dataset.require_column(target)?;
    let semantic = classify(column);

    let Some(labels) = reduce_labels(column, semantic, desired) else {
        return Ok(None);
    };

    let derived_name = format!("{}{}", target, DERIVED_SUFFIX);
    dataset.add_column(Column::new(
        derived_name.clone(),
        labels_to_storage(labels),
    ))?;
    Ok(Some(derived_name))
}

/// Bucket labels are few by construction; store them dictionary-encoded.
fn labels_to_storage(labels: Vec<Option<String>>) -> ColumnData {
    let mut dictionary: Vec<String> = Vec::new();
    let codes = labels
        .into_iter()
        .map(|label| {
            label.map(|l| match dictionary.iter().position(|d| *d == l) {
                Some(pos) => pos as u32,
                None => {
                    dictionary.push(l);
                    (dictionary.len() - 1) as u32
                }
            })
        })
        .collect();
    ColumnData::Categorical { dictionary, codes }
}
