//! Statistic operation registry.
//!
//! A static, ordered table per semantic type mapping metric names to
//! operation functions. Iteration order is declaration order, which keeps
//! console and report output reproducible. `Unsupported` has no entry;
//! callers must branch on the absence before profiling.

use crate::classify::SemanticType;
use crate::error::{FacetError, Result};
use crate::input::Column;
use crate::stats;

/// A computed metric value with an explicit kind.
///
/// The kind is set by the operation itself; the dispatcher applies exactly
/// one formatting rule per kind at the render boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum OpValue {
    /// Passed through untouched.
    Text(String),
    /// Integer format.
    Int(i64),
    /// Two-decimal display; full precision kept internally.
    Float(f64),
    /// Fraction in [0, 1]; scaled x100 and percent-formatted at display.
    Percent(f64),
}

/// Signature of a statistic operation.
pub type StatFn = fn(&StatContext) -> Result<OpValue>;

/// Input to every statistic operation.
pub struct StatContext<'a> {
    /// The column under analysis.
    pub column: &'a Column,
    /// Its classified semantic type.
    pub semantic: SemanticType,
}

/// Ordered statistic operations for a semantic type, or `None` when the
/// type cannot be profiled.
pub fn stat_ops(semantic: SemanticType) -> Option<&'static [(&'static str, StatFn)]> {
    match semantic {
        SemanticType::Numeric | SemanticType::NumericCondensed => Some(NUMERIC_OPS),
        SemanticType::Text | SemanticType::Bool => Some(CATEGORICAL_OPS),
        SemanticType::Unsupported => None,
    }
}

const NUMERIC_OPS: &[(&str, StatFn)] = &[
    ("Column Name", op_column_name),
    ("Data Type Grouping", op_type_grouping),
    ("Data Type", op_storage_dtype),
    ("Row Count", op_row_count),
    ("Distinct Count", op_distinct_count),
    ("Missing Values", op_missing_count),
    ("Missing Value %", op_missing_percent),
    ("Mean", op_mean),
    ("Median", op_median),
    ("Min", op_min),
    ("Max", op_max),
    ("Standard Deviation", op_std_dev),
    ("Text Box Plot", op_text_box_plot),
];

const CATEGORICAL_OPS: &[(&str, StatFn)] = &[
    ("Column Name", op_column_name),
    ("Data Type Grouping", op_type_grouping),
    ("Data Type", op_storage_dtype),
    ("Row Count", op_row_count),
    ("Distinct Count", op_distinct_count),
    ("Missing Values", op_missing_count),
    ("Missing Value %", op_missing_percent),
];

// =============================================================================
// OPERATIONS
// =============================================================================
// Every operation ignores missing values except the missing counts.

fn op_column_name(ctx: &StatContext) -> Result<OpValue> {
    Ok(OpValue::Text(ctx.column.name.clone()))
}

fn op_type_grouping(ctx: &StatContext) -> Result<OpValue> {
    Ok(OpValue::Text(ctx.semantic.to_string()))
}

fn op_storage_dtype(ctx: &StatContext) -> Result<OpValue> {
    Ok(OpValue::Text(ctx.column.storage_type().to_string()))
}

fn op_row_count(ctx: &StatContext) -> Result<OpValue> {
    Ok(OpValue::Int(ctx.column.row_count() as i64))
}

fn op_distinct_count(ctx: &StatContext) -> Result<OpValue> {
    Ok(OpValue::Int(ctx.column.distinct_count() as i64))
}

fn op_missing_count(ctx: &StatContext) -> Result<OpValue> {
    Ok(OpValue::Int(ctx.column.missing_count() as i64))
}

fn op_missing_percent(ctx: &StatContext) -> Result<OpValue> {
    let rows = ctx.column.row_count();
    if rows == 0 {
        return Err(empty(ctx));
    }
    Ok(OpValue::Percent(
        ctx.column.missing_count() as f64 / rows as f64,
    ))
}

fn op_mean(ctx: &StatContext) -> Result<OpValue> {
    numeric_stat(ctx, stats::mean)
}

fn op_median(ctx: &StatContext) -> Result<OpValue> {
    numeric_stat(ctx, stats::median)
}

fn op_min(ctx: &StatContext) -> Result<OpValue> {
    numeric_stat(ctx, stats::min)
}

fn op_max(ctx: &StatContext) -> Result<OpValue> {
    numeric_stat(ctx, stats::max)
}

fn op_std_dev(ctx: &StatContext) -> Result<OpValue> {
    numeric_stat(ctx, stats::std_dev)
}

/// Compact five-number summary: `|min --||q1 ~ med ~ q3||-- max|`.
fn op_text_box_plot(ctx: &StatContext) -> Result<OpValue> {
    let values = ctx
        .column
        .numeric_values()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| empty(ctx))?;

    let (mn, q1, med, q3, mx) = (
        stats::min(&values).ok_or_else(|| empty(ctx))?,
        stats::quantile(&values, 0.25).ok_or_else(|| empty(ctx))?,
        stats::median(&values).ok_or_else(|| empty(ctx))?,
        stats::quantile(&values, 0.75).ok_or_else(|| empty(ctx))?,
        stats::max(&values).ok_or_else(|| empty(ctx))?,
    );

    Ok(OpValue::Text(format!(
        "|{:.2} --||{:.2} ~ {:.2} ~ {:.2}||-- {:.2}|",
        mn, q1, med, q3, mx
    )))
}

fn numeric_stat(ctx: &StatContext, f: fn(&[f64]) -> Option<f64>) -> Result<OpValue> {
    let values = ctx.column.numeric_values().ok_or_else(|| empty(ctx))?;
    f(&values).map(OpValue::Float).ok_or_else(|| empty(ctx))
}

fn empty(ctx: &StatContext) -> FacetError {
    FacetError::EmptyData(format!(
        "no non-missing values in column '{}'",
        ctx.column.name
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::input::ColumnData;

    fn metric_column() -> Column {
        Column::new(
            "metric",
            ColumnData::Float(vec![
                Some(5.1),
                Some(4.9),
                Some(4.7),
                Some(4.6),
                Some(5.0),
                None,
            ]),
        )
    }

    fn run(col: &Column, name: &str) -> OpValue {
        let semantic = classify(col);
        let ctx = StatContext {
            column: col,
            semantic,
        };
        let ops = stat_ops(semantic).unwrap();
        let (_, f) = ops.iter().find(|(n, _)| *n == name).unwrap();
        f(&ctx).unwrap()
    }

    #[test]
    fn test_numeric_registry_order() {
        let names: Vec<&str> = NUMERIC_OPS.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "Column Name",
                "Data Type Grouping",
                "Data Type",
                "Row Count",
                "Distinct Count",
                "Missing Values",
                "Missing Value %",
                "Mean",
                "Median",
                "Min",
                "Max",
                "Standard Deviation",
                "Text Box Plot",
            ]
        );
    }

    #[test]
    fn test_reference_scenario_values() {
        let col = metric_column();
        assert_eq!(run(&col, "Row Count"), OpValue::Int(6));
        assert_eq!(run(&col, "Missing Values"), OpValue::Int(1));
        assert_eq!(run(&col, "Distinct Count"), OpValue::Int(5));

        match run(&col, "Mean") {
            OpValue::Float(m) => assert!((m - 4.86).abs() < 0.005),
            other => panic!("unexpected {:?}", other),
        }
        match run(&col, "Median") {
            OpValue::Float(m) => assert!((m - 4.9).abs() < 1e-9),
            other => panic!("unexpected {:?}", other),
        }
        match run(&col, "Standard Deviation") {
            OpValue::Float(s) => assert!((s - 0.1855).abs() < 0.0001),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_missing_percent_bounded() {
        let col = metric_column();
        match run(&col, "Missing Value %") {
            OpValue::Percent(p) => {
                assert!((0.0..=1.0).contains(&p));
                assert!((p - 1.0 / 6.0).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_text_box_plot_format() {
        let col = metric_column();
        match run(&col, "Text Box Plot") {
            OpValue::Text(s) => {
                assert!(s.starts_with("|4.60 --||"));
                assert!(s.ends_with("||-- 5.10|"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_categorical_set_has_no_mean() {
        let col = Column::new(
            "cat",
            ColumnData::Text(vec![Some("a".into()), Some("b".into())]),
        );
        let ops = stat_ops(classify(&col)).unwrap();
        assert!(ops.iter().all(|(n, _)| *n != "Mean"));
        assert_eq!(ops.len(), 7);
    }

    #[test]
    fn test_unsupported_has_no_ops() {
        assert!(stat_ops(SemanticType::Unsupported).is_none());
    }
}
