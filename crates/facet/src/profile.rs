//! Top-level profiling driver.
//!
//! Walks every selected column (single-variable section), then every
//! unordered column pair (multi-variable section), routes results through
//! the dispatcher, and finalizes the report sink. Columns and pairs are
//! processed strictly in input order; the single-variable section is
//! fully populated before the multi-variable section begins.

use std::path::{Path, PathBuf};

use crate::cardinality;
use crate::classify::{SemanticType, classify};
use crate::distfit;
use crate::error::Result;
use crate::input::{Dataset, Parser, SourceMetadata};
use crate::ops::{StatContext, stat_ops};
use crate::pairwise::{self, HueMapping};
use crate::report::{Dispatcher, HtmlReport, Section};
use crate::stats;
use crate::render::ChartSpec;
use crate::visuals::{VisualContext, visual_ops};

/// Configuration for a profiling run.
#[derive(Debug, Clone)]
pub struct ProfilerConfig {
    /// Column allow-list (None = every column, in dataset order).
    pub columns: Option<Vec<String>>,
    /// Target column used as the grouping/hue dimension.
    pub target: Option<String>,
    /// Desired bucket count for the reduced target column.
    pub target_buckets: usize,
    /// Report output directory (None = console only).
    pub output: Option<PathBuf>,
    /// Contain per-column and per-pair failures (default on).
    pub isolate_errors: bool,
    /// Build and render charts (default on; requires an output directory).
    pub render_charts: bool,
    /// Suppress console output.
    pub quiet: bool,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            columns: None,
            target: None,
            target_buckets: 3,
            output: None,
            isolate_errors: true,
            render_charts: true,
            quiet: false,
        }
    }
}

/// Per-column result of the single-variable pass. Skips are contained at
/// column granularity; they never abort the run.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnOutcome {
    /// The column was profiled end to end.
    Profiled,
    /// The column was skipped, with a human-readable reason.
    Skipped(String),
}

/// Summary of a completed profiling run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Columns profiled successfully, in processing order.
    pub columns_profiled: Vec<String>,
    /// Columns skipped, with the reason.
    pub columns_skipped: Vec<(String, String)>,
    /// Column pairs that produced a relationship chart.
    pub pairs_rendered: usize,
    /// Column pairs with no defined relationship or a contained failure.
    pub pairs_skipped: usize,
    /// Location of the finalized report, when an output directory was set.
    pub report_path: Option<PathBuf>,
    /// Source metadata, when the run started from a file.
    pub source: Option<SourceMetadata>,
}

/// The profiling engine.
pub struct Profiler {
    config: ProfilerConfig,
    dispatcher: Dispatcher,
}

impl Profiler {
    /// Create a profiler with default configuration.
    pub fn new() -> Self {
        Self::with_config(ProfilerConfig::default())
    }

    /// Create a profiler with custom configuration.
    pub fn with_config(config: ProfilerConfig) -> Self {
        let dispatcher = Dispatcher::new(config.isolate_errors, config.quiet);
        Self { config, dispatcher }
    }

    /// Parse a delimited file and profile it.
    pub fn profile_file(&self, path: impl AsRef<Path>) -> Result<RunSummary> {
        let parser = Parser::new();
        let (mut dataset, source) = parser.parse_file(path)?;
        let mut summary = self.profile(&mut dataset)?;
        summary.source = Some(source);
        Ok(summary)
    }

    /// Profile a dataset: single-variable section, multi-variable section,
    /// sink finalization.
    pub fn profile(&self, dataset: &mut Dataset) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        // Selected columns, in input order.
        let selected: Vec<String> = match &self.config.columns {
            Some(list) => list.clone(),
            None => dataset.column_names().iter().map(|s| s.to_string()).collect(),
        };

        // Derive the low-cardinality grouping column once per run.
        let hue = match &self.config.target {
            Some(target) => cardinality::add_derived_target(
                dataset,
                target,
                self.config.target_buckets,
            )?
            .and_then(|name| dataset.column(&name).map(HueMapping::for_column)),
            None => None,
        };

        let mut report = match &self.config.output {
            Some(dir) => Some(HtmlReport::create(dir)?),
            None => None,
        };

        // ---- Single-variable section ----
        for name in &selected {
            self.emit_header(name, &mut report, Section::SingleVariable);

            match self.profile_column(dataset, name, &mut report) {
                Ok(ColumnOutcome::Profiled) => summary.columns_profiled.push(name.clone()),
                Ok(ColumnOutcome::Skipped(reason)) => {
                    summary.columns_skipped.push((name.clone(), reason));
                }
                Err(err) if self.config.isolate_errors => {
                    let message = format!("{} was not able to be profiled due to errors", name);
                    self.emit_text(&message, &mut report, Section::SingleVariable);
                    summary.columns_skipped.push((name.clone(), err.to_string()));
                }
                Err(err) => return Err(err),
            }
        }

        // ---- Multi-variable section ----
        if self.config.render_charts && report.is_some() {
            self.profile_pairs(dataset, &selected, hue.as_ref(), &mut report, &mut summary)?;
        }

        // ---- Finalize ----
        if let Some(sink) = &report {
            let path = sink.finalize()?;
            if !self.config.quiet {
                println!("Open web view of this report at {}.", path.display());
            }
            summary.report_path = Some(path);
        }

        Ok(summary)
    }

    /// Profile one column: classification, statistics table, chart grid.
    fn profile_column(
        &self,
        dataset: &Dataset,
        name: &str,
        report: &mut Option<HtmlReport>,
    ) -> Result<ColumnOutcome> {
        let column = dataset.require_column(name)?;
        let semantic = classify(column);

        // Classification failure is a per-column skip, never fatal.
        let Some(ops) = stat_ops(semantic) else {
            let message = format!(
                "{} data type ({}) cannot be parsed.",
                name,
                column.storage_type()
            );
            self.emit_text(&message, report, Section::SingleVariable);
            return Ok(ColumnOutcome::Skipped(message));
        };

        let ctx = StatContext { column, semantic };
        self.dispatcher
            .run_table(&ctx, ops, report, Section::SingleVariable)?;

        if self.config.render_charts && report.is_some() {
            // The fit report is computed once and shared by every fit chart.
            let fit = if semantic == SemanticType::Numeric {
                distfit::fit_and_rank(column)
            } else {
                None
            };
            let visual_ctx = VisualContext {
                column,
                fit: fit.as_ref(),
            };

            if let Some(visuals) = visual_ops(semantic) {
                let charts: Vec<(String, Result<ChartSpec>)> = visuals
                    .iter()
                    .map(|(chart_name, builder)| (chart_name.to_string(), builder(&visual_ctx)))
                    .collect();
                self.dispatcher.run_chart_grid(
                    charts,
                    &format!("single_var_{}", name),
                    report,
                    Section::SingleVariable,
                )?;
            }
        }

        Ok(ColumnOutcome::Profiled)
    }

    /// Build and render every pairwise relationship chart, then the
    /// correlation heatmap.
    fn profile_pairs(
        &self,
        dataset: &Dataset,
        selected: &[String],
        hue: Option<&HueMapping>,
        report: &mut Option<HtmlReport>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        self.emit_header("Column Relationships", report, Section::MultiVariable);

        let mut charts: Vec<(String, Result<ChartSpec>)> = Vec::new();
        for (i, first) in selected.iter().enumerate() {
            for second in &selected[i + 1..] {
                let label = format!("{}-{}", first, second);
                match pairwise::build_request(dataset, first, second, hue) {
                    Ok(Some(request)) => {
                        charts.push((label, Ok(request.spec)));
                        summary.pairs_rendered += 1;
                    }
                    Ok(None) => {
                        let message = format!("{} combination cannot be visualized", label);
                        self.emit_text(&message, report, Section::MultiVariable);
                        summary.pairs_skipped += 1;
                    }
                    Err(_) if self.config.isolate_errors => {
                        let message =
                            format!("{} was not able to be profiled due to errors", label);
                        self.emit_text(&message, report, Section::MultiVariable);
                        summary.pairs_skipped += 1;
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        if !charts.is_empty() {
            self.dispatcher.run_chart_grid(
                charts,
                "multi_var_relationships",
                report,
                Section::MultiVariable,
            )?;
        }

        if let Some(spec) = self.build_heatmap(dataset, selected) {
            self.dispatcher.run_single_chart(
                spec,
                "multi_var_heatmap",
                report,
                Section::MultiVariable,
            )?;
        }

        Ok(())
    }

    /// Pairwise Pearson correlations over the numeric columns. With a
    /// numeric target, a single-column heatmap sorted by correlation
    /// against the target.
    fn build_heatmap(&self, dataset: &Dataset, selected: &[String]) -> Option<ChartSpec> {
        let numeric: Vec<&str> = selected
            .iter()
            .map(|s| s.as_str())
            .filter(|name| {
                dataset
                    .column(name)
                    .map(|c| classify(c).is_numeric())
                    .unwrap_or(false)
            })
            .collect();
        if numeric.len() < 2 {
            return None;
        }

        let corr = |a: &str, b: &str| -> Option<f64> {
            let col_a = dataset.column(a)?;
            let col_b = dataset.column(b)?;
            let rows: Vec<usize> = (0..col_a.row_count())
                .filter(|&i| col_a.numeric_at(i).is_some() && col_b.numeric_at(i).is_some())
                .collect();
            let xs: Vec<f64> = rows.iter().filter_map(|&i| col_a.numeric_at(i)).collect();
            let ys: Vec<f64> = rows.iter().filter_map(|&i| col_b.numeric_at(i)).collect();
            stats::pearson(&xs, &ys)
        };

        let target = self
            .config
            .target
            .as_deref()
            .filter(|t| numeric.contains(t));

        if let Some(target) = target {
            // One-column heatmap against the target, strongest first.
            let mut rows: Vec<(String, Option<f64>)> = numeric
                .iter()
                .map(|&name| (name.to_string(), corr(name, target)))
                .collect();
            rows.sort_by(|a, b| {
                let av = a.1.unwrap_or(f64::NEG_INFINITY);
                let bv = b.1.unwrap_or(f64::NEG_INFINITY);
                bv.partial_cmp(&av).unwrap_or(std::cmp::Ordering::Equal)
            });

            return Some(ChartSpec::Heatmap {
                title: format!("Correlation with {}", target),
                row_labels: rows.iter().map(|(n, _)| n.clone()).collect(),
                col_labels: vec![target.to_string()],
                matrix: rows.iter().map(|(_, v)| vec![*v]).collect(),
            });
        }

        let matrix: Vec<Vec<Option<f64>>> = numeric
            .iter()
            .map(|&a| {
                numeric
                    .iter()
                    .map(|&b| if a == b { Some(1.0) } else { corr(a, b) })
                    .collect()
            })
            .collect();

        Some(ChartSpec::Heatmap {
            title: "Correlation Heatmap".to_string(),
            row_labels: numeric.iter().map(|s| s.to_string()).collect(),
            col_labels: numeric.iter().map(|s| s.to_string()).collect(),
            matrix,
        })
    }

    fn emit_header(&self, title: &str, report: &mut Option<HtmlReport>, section: Section) {
        if !self.config.quiet {
            println!("========== {} ==========", title);
        }
        if let Some(sink) = report {
            sink.append_title(title, section);
        }
    }

    fn emit_text(&self, text: &str, report: &mut Option<HtmlReport>, section: Section) {
        if !self.config.quiet {
            println!("{}", text);
        }
        if let Some(sink) = report {
            sink.append_text(text, section);
        }
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Profile a dataset with default settings (console output, no charts).
pub fn auto_eda(dataset: &mut Dataset, config: ProfilerConfig) -> Result<RunSummary> {
    Profiler::with_config(config).profile(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Column, ColumnData};

    fn sample_dataset() -> Dataset {
        let metric: Vec<Option<f64>> = (0..40)
            .map(|i| Some(4.0 + (i as f64) * 0.13 + ((i * 3) % 7) as f64 * 0.21))
            .collect();
        let category: Vec<Option<String>> =
            (0..40).map(|i| Some(["a", "b", "c"][i % 3].to_string())).collect();
        Dataset::with_columns(vec![
            Column::new("metric", ColumnData::Float(metric)),
            Column::new("category", ColumnData::Text(category)),
        ])
    }

    fn quiet_config() -> ProfilerConfig {
        ProfilerConfig {
            quiet: true,
            ..ProfilerConfig::default()
        }
    }

    #[test]
    fn test_console_only_run() {
        let mut ds = sample_dataset();
        let summary = Profiler::with_config(quiet_config()).profile(&mut ds).unwrap();
        assert_eq!(summary.columns_profiled, vec!["metric", "category"]);
        assert!(summary.columns_skipped.is_empty());
        assert!(summary.report_path.is_none());
        assert_eq!(summary.pairs_rendered, 0);
    }

    #[test]
    fn test_report_run_renders_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let mut ds = sample_dataset();
        let config = ProfilerConfig {
            output: Some(dir.path().to_path_buf()),
            ..quiet_config()
        };
        let summary = Profiler::with_config(config).profile(&mut ds).unwrap();

        assert_eq!(summary.pairs_rendered, 1);
        let report_path = summary.report_path.unwrap();
        assert!(report_path.exists());
        let html = std::fs::read_to_string(&report_path).unwrap();
        assert!(html.contains("Column Relationships"));
    }

    #[test]
    fn test_unsupported_column_skipped() {
        let dates: Vec<Option<String>> = (0..40)
            .map(|i| Some(format!("2023-01-{:02}", i % 28 + 1)))
            .collect();
        let mut ds = sample_dataset();
        ds.add_column(Column::new("when", ColumnData::Date(dates)))
            .unwrap();

        let summary = Profiler::with_config(quiet_config()).profile(&mut ds).unwrap();
        assert_eq!(summary.columns_profiled, vec!["metric", "category"]);
        assert_eq!(summary.columns_skipped.len(), 1);
        assert_eq!(summary.columns_skipped[0].0, "when");
    }

    #[test]
    fn test_column_allow_list_order() {
        let mut ds = sample_dataset();
        let config = ProfilerConfig {
            columns: Some(vec!["category".to_string()]),
            ..quiet_config()
        };
        let summary = Profiler::with_config(config).profile(&mut ds).unwrap();
        assert_eq!(summary.columns_profiled, vec!["category"]);
    }

    #[test]
    fn test_unknown_column_isolated() {
        let mut ds = sample_dataset();
        let config = ProfilerConfig {
            columns: Some(vec!["metric".to_string(), "ghost".to_string()]),
            ..quiet_config()
        };
        let summary = Profiler::with_config(config).profile(&mut ds).unwrap();
        assert_eq!(summary.columns_profiled, vec!["metric"]);
        assert_eq!(summary.columns_skipped.len(), 1);
    }

    #[test]
    fn test_unknown_column_fatal_when_strict() {
        let mut ds = sample_dataset();
        let config = ProfilerConfig {
            columns: Some(vec!["ghost".to_string()]),
            isolate_errors: false,
            ..quiet_config()
        };
        assert!(Profiler::with_config(config).profile(&mut ds).is_err());
    }

    #[test]
    fn test_target_derives_grouping_column() {
        let dir = tempfile::tempdir().unwrap();
        let mut ds = sample_dataset();
        let config = ProfilerConfig {
            output: Some(dir.path().to_path_buf()),
            target: Some("metric".to_string()),
            ..quiet_config()
        };
        Profiler::with_config(config).profile(&mut ds).unwrap();

        let derived = ds.column("metric_lc").unwrap();
        assert!(derived.distinct_count() <= 3);
    }
}
