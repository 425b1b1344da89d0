//! Visual operation registry.
//!
//! Mirrors the statistic registry: a static, ordered table per semantic
//! type, mapping chart names to builder functions that produce typed
//! [`ChartSpec`] requests. The builders decide what to draw; the render
//! backend decides how.

use crate::classify::SemanticType;
use crate::distfit::DistributionFitReport;
use crate::error::{FacetError, Result};
use crate::input::Column;
use crate::render::{Bar, CategoryColor, ChartSpec, Curve};
use crate::stats;

/// Categories shown by the top-N count charts.
const TOP_CATEGORIES: usize = 10;

/// Grid points for kernel density curves.
const KDE_POINTS: usize = 200;

/// Input to every chart builder.
pub struct VisualContext<'a> {
    /// The column under analysis.
    pub column: &'a Column,
    /// Distribution fit report, present for `Numeric` columns whose fit
    /// converged. Computed once per column and shared by the fit charts.
    pub fit: Option<&'a DistributionFitReport>,
}

/// Signature of a chart builder.
pub type VisualFn = fn(&VisualContext) -> Result<ChartSpec>;

/// Ordered chart builders for a semantic type, or `None` when the type
/// has no visual battery.
pub fn visual_ops(semantic: SemanticType) -> Option<&'static [(&'static str, VisualFn)]> {
    match semantic {
        SemanticType::Numeric => Some(NUMERIC_VISUALS),
        SemanticType::NumericCondensed => Some(CONDENSED_VISUALS),
        SemanticType::Text => Some(TEXT_VISUALS),
        SemanticType::Bool => Some(BOOL_VISUALS),
        SemanticType::Unsupported => None,
    }
}

const NUMERIC_VISUALS: &[(&str, VisualFn)] = &[
    ("Box Plot", build_box_plot),
    ("Histogram", build_histogram_with_density),
    ("Distribution Fits", build_fit_overlay),
    ("Best Fit", build_best_fit_overlay),
    ("Fit Errors", build_fit_error_bars),
];

const CONDENSED_VISUALS: &[(&str, VisualFn)] = &[("Histogram", build_histogram_plain)];

const TEXT_VISUALS: &[(&str, VisualFn)] = &[
    ("Count Plot", build_count_plot),
    ("Count Plot %", build_percent_count_plot),
];

const BOOL_VISUALS: &[(&str, VisualFn)] = &[("Histogram", build_level_counts)];

// =============================================================================
// BUILDERS
// =============================================================================

fn numeric_sample(ctx: &VisualContext) -> Result<Vec<f64>> {
    ctx.column
        .numeric_values()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            FacetError::EmptyData(format!(
                "no non-missing values in column '{}'",
                ctx.column.name
            ))
        })
}

fn fit_report<'a>(ctx: &'a VisualContext) -> Result<&'a DistributionFitReport> {
    ctx.fit.ok_or_else(|| {
        FacetError::EmptyData(format!(
            "no distribution fit available for column '{}'",
            ctx.column.name
        ))
    })
}

fn build_box_plot(ctx: &VisualContext) -> Result<ChartSpec> {
    Ok(ChartSpec::Box {
        title: format!("{} Box Plot", ctx.column.name),
        values: numeric_sample(ctx)?,
    })
}

fn build_histogram_with_density(ctx: &VisualContext) -> Result<ChartSpec> {
    let values = numeric_sample(ctx)?;
    let curve = stats::gaussian_kde(&values, KDE_POINTS);
    Ok(ChartSpec::Histogram {
        title: format!("{} Histogram", ctx.column.name),
        values,
        curve,
    })
}

fn build_histogram_plain(ctx: &VisualContext) -> Result<ChartSpec> {
    Ok(ChartSpec::Histogram {
        title: format!("{} Histogram", ctx.column.name),
        values: numeric_sample(ctx)?,
        curve: None,
    })
}

/// Empirical density plus every converged candidate curve.
fn build_fit_overlay(ctx: &VisualContext) -> Result<ChartSpec> {
    let report = fit_report(ctx)?;
    let mut curves = vec![empirical_curve(report)];
    for fitted in &report.curves {
        curves.push(Curve {
            label: fitted.dist.label(),
            points: report
                .midpoints
                .iter()
                .copied()
                .zip(fitted.densities.iter().copied())
                .collect(),
        });
    }
    Ok(ChartSpec::DensityOverlay {
        title: format!("{} Distribution Fits", ctx.column.name),
        curves,
    })
}

/// Empirical density plus the rank-0 candidate only.
fn build_best_fit_overlay(ctx: &VisualContext) -> Result<ChartSpec> {
    let report = fit_report(ctx)?;
    let best = report.best().ok_or_else(|| {
        FacetError::EmptyData(format!(
            "no candidate distribution converged for column '{}'",
            ctx.column.name
        ))
    })?;
    let curves = vec![
        empirical_curve(report),
        Curve {
            label: best.dist.label(),
            points: report
                .midpoints
                .iter()
                .copied()
                .zip(best.densities.iter().copied())
                .collect(),
        },
    ];
    Ok(ChartSpec::DensityOverlay {
        title: format!("{} Best Fit", ctx.column.name),
        curves,
    })
}

fn build_fit_error_bars(ctx: &VisualContext) -> Result<ChartSpec> {
    let report = fit_report(ctx)?;
    let bars = report
        .ranked_scores()
        .into_iter()
        .map(|(name, error)| Bar {
            label: name,
            value: error,
            color: CategoryColor::Plain,
        })
        .collect();
    Ok(ChartSpec::BarChart {
        title: format!("{} Fit Error (RMSE)", ctx.column.name),
        bars,
        horizontal: false,
    })
}

fn empirical_curve(report: &DistributionFitReport) -> Curve {
    Curve {
        label: "empirical".to_string(),
        points: report
            .midpoints
            .iter()
            .copied()
            .zip(report.empirical.iter().copied())
            .collect(),
    }
}

fn build_count_plot(ctx: &VisualContext) -> Result<ChartSpec> {
    let bars = top_category_bars(ctx.column, |count, _total| count as f64);
    Ok(ChartSpec::BarChart {
        title: format!("{} Counts", ctx.column.name),
        bars,
        horizontal: false,
    })
}

fn build_percent_count_plot(ctx: &VisualContext) -> Result<ChartSpec> {
    let bars = top_category_bars(ctx.column, |count, total| {
        100.0 * count as f64 / total as f64
    });
    Ok(ChartSpec::BarChart {
        title: format!("{} Counts %", ctx.column.name),
        bars,
        horizontal: false,
    })
}

/// True/false level counts for boolean columns.
fn build_level_counts(ctx: &VisualContext) -> Result<ChartSpec> {
    let bars = ctx
        .column
        .value_counts()
        .into_iter()
        .map(|(label, count)| Bar {
            label,
            value: count as f64,
            color: CategoryColor::Plain,
        })
        .collect();
    Ok(ChartSpec::BarChart {
        title: format!("{} Histogram", ctx.column.name),
        bars,
        horizontal: false,
    })
}

fn top_category_bars(column: &Column, value: fn(usize, usize) -> f64) -> Vec<Bar> {
    let counts = column.value_counts();
    let total: usize = counts.values().sum();
    counts
        .into_iter()
        .take(TOP_CATEGORIES)
        .map(|(label, count)| Bar {
            label,
            value: value(count, total.max(1)),
            color: CategoryColor::Plain,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distfit;
    use crate::input::ColumnData;

    fn numeric_column() -> Column {
        let values: Vec<Option<f64>> = (0..60).map(|i| Some((i % 23) as f64 * 0.7)).collect();
        Column::new("metric", ColumnData::Float(values))
    }

    #[test]
    fn test_numeric_visual_order() {
        let names: Vec<&str> = NUMERIC_VISUALS.iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "Box Plot",
                "Histogram",
                "Distribution Fits",
                "Best Fit",
                "Fit Errors"
            ]
        );
    }

    #[test]
    fn test_condensed_has_histogram_only() {
        let names: Vec<&str> = CONDENSED_VISUALS.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["Histogram"]);
    }

    #[test]
    fn test_box_plot_builder() {
        let col = numeric_column();
        let ctx = VisualContext {
            column: &col,
            fit: None,
        };
        match build_box_plot(&ctx).unwrap() {
            ChartSpec::Box { title, values } => {
                assert_eq!(title, "metric Box Plot");
                assert_eq!(values.len(), 60);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fit_overlay_includes_empirical() {
        let col = numeric_column();
        let report = distfit::fit_and_rank(&col).unwrap();
        let ctx = VisualContext {
            column: &col,
            fit: Some(&report),
        };
        match build_fit_overlay(&ctx).unwrap() {
            ChartSpec::DensityOverlay { curves, .. } => {
                assert_eq!(curves[0].label, "empirical");
                assert_eq!(curves.len(), report.curves.len() + 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_fit_charts_error_without_report() {
        let col = numeric_column();
        let ctx = VisualContext {
            column: &col,
            fit: None,
        };
        assert!(build_fit_overlay(&ctx).is_err());
        assert!(build_best_fit_overlay(&ctx).is_err());
        assert!(build_fit_error_bars(&ctx).is_err());
    }

    #[test]
    fn test_count_plot_top_n() {
        let values: Vec<Option<String>> = (0..40).map(|i| Some(format!("c{}", i % 15))).collect();
        let col = Column::new("cat", ColumnData::Text(values));
        let ctx = VisualContext {
            column: &col,
            fit: None,
        };
        match build_count_plot(&ctx).unwrap() {
            ChartSpec::BarChart { bars, .. } => assert_eq!(bars.len(), TOP_CATEGORIES),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_percent_count_plot_sums_to_100_when_within_top_n() {
        let values = vec![
            Some("a".to_string()),
            Some("a".to_string()),
            Some("b".to_string()),
            Some("c".to_string()),
        ];
        let col = Column::new("cat", ColumnData::Text(values));
        let ctx = VisualContext {
            column: &col,
            fit: None,
        };
        match build_percent_count_plot(&ctx).unwrap() {
            ChartSpec::BarChart { bars, .. } => {
                let total: f64 = bars.iter().map(|b| b.value).sum();
                assert!((total - 100.0).abs() < 1e-9);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_bool_histogram_levels() {
        let col = Column::new(
            "flag",
            ColumnData::Bool(vec![Some(true), Some(false), Some(true), None]),
        );
        let ctx = VisualContext {
            column: &col,
            fit: None,
        };
        match build_level_counts(&ctx).unwrap() {
            ChartSpec::BarChart { bars, .. } => {
                assert_eq!(bars.len(), 2);
                assert_eq!(bars[0].label, "true");
                assert_eq!(bars[0].value, 2.0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_has_no_visuals() {
        assert!(visual_ops(SemanticType::Unsupported).is_none());
    }
}
