//! Report dispatcher: runs operation registries and routes results.
//!
//! The dispatcher is the single place where operation results are
//! formatted (one rule per result kind) and where chart grids are laid
//! out. Everything it does is terminal: console lines, sink appends,
//! SVG files.

use super::sink::{HtmlReport, MetricRow, Section};
use crate::error::Result;
use crate::ops::{OpValue, StatContext, StatFn};
use crate::render::{ChartSpec, Figure, grid_layout};

/// Fixed column count of chart grids.
const GRID_COLUMNS: usize = 2;

/// Console/report dispatch for statistic tables and chart grids.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    /// Contain per-operation failures instead of propagating them.
    pub isolate_errors: bool,
    /// Suppress console output (report-sink only mode).
    pub quiet: bool,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self {
            isolate_errors: true,
            quiet: false,
        }
    }
}

/// Format a value for console display. Exactly one rule per kind.
pub fn format_console(value: &OpValue) -> String {
    match value {
        OpValue::Text(s) => s.clone(),
        OpValue::Int(i) => i.to_string(),
        OpValue::Float(f) => format!("{:.2}", f),
        OpValue::Percent(p) => format!("{:.2}%", p * 100.0),
    }
}

/// Format a value for a report table cell.
pub fn format_cell(value: &OpValue) -> String {
    match value {
        OpValue::Text(s) => s.clone(),
        OpValue::Int(i) => i.to_string(),
        OpValue::Float(f) => format!("{:.2}", f),
        OpValue::Percent(p) => format!("{:.2}", p * 100.0),
    }
}

impl Dispatcher {
    /// Create a dispatcher with the given isolation policy.
    pub fn new(isolate_errors: bool, quiet: bool) -> Self {
        Self {
            isolate_errors,
            quiet,
        }
    }

    /// Execute every statistic operation in registry order against a
    /// column, print the formatted block, and append table rows to the
    /// sink.
    pub fn run_table(
        &self,
        ctx: &StatContext,
        ops: &[(&'static str, StatFn)],
        report: &mut Option<HtmlReport>,
        section: Section,
    ) -> Result<()> {
        let mut console = String::new();
        let mut rows = Vec::new();

        for (name, op) in ops {
            match op(ctx) {
                Ok(value) => {
                    console.push_str(&format!("{:<20}: {}\n", name, format_console(&value)));
                    rows.push(MetricRow {
                        metric: name.to_string(),
                        value: format_cell(&value),
                    });
                }
                Err(err) if self.isolate_errors => {
                    // One bad cell never sinks the rest of the table.
                    console.push_str(&format!("{:<20}: <{}>\n", name, err));
                    rows.push(MetricRow {
                        metric: name.to_string(),
                        value: format!("<{}>", err),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        if !self.quiet {
            println!("{}", console);
        }
        if let Some(sink) = report {
            sink.append_table(rows, section);
        }
        Ok(())
    }

    /// Lay out built charts in a fixed-width grid, render the figure into
    /// the sink's asset directory, and append the image reference.
    ///
    /// Chart builders that failed are reported and skipped (or propagated
    /// when isolation is off); trailing unused cells stay hidden.
    pub fn run_chart_grid(
        &self,
        charts: Vec<(String, Result<ChartSpec>)>,
        chart_name: &str,
        report: &mut Option<HtmlReport>,
        section: Section,
    ) -> Result<()> {
        let mut specs = Vec::new();
        for (name, built) in charts {
            match built {
                Ok(spec) => specs.push(spec),
                Err(err) if self.isolate_errors => {
                    if !self.quiet {
                        println!("chart '{}' could not be built: {}", name, err);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        let Some(sink) = report else {
            return Ok(());
        };
        if specs.is_empty() {
            return Ok(());
        }

        let (rows, cols) = grid_layout(specs.len(), GRID_COLUMNS);
        let path = sink.asset_file(chart_name);
        let mut figure = Figure::new(&path, rows, cols);
        for (idx, spec) in specs.into_iter().enumerate() {
            figure.set_cell(idx, spec);
        }
        figure.save()?;

        let file_name = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        sink.append_image(&file_name, section);
        Ok(())
    }

    /// Render exactly one chart as its own figure.
    pub fn run_single_chart(
        &self,
        spec: ChartSpec,
        chart_name: &str,
        report: &mut Option<HtmlReport>,
        section: Section,
    ) -> Result<()> {
        self.run_chart_grid(
            vec![(spec.title().to_string(), Ok(spec))],
            chart_name,
            report,
            section,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::error::FacetError;
    use crate::input::{Column, ColumnData};
    use crate::ops::stat_ops;

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

    #[test]
    fn test_format_contract() {
        assert_eq!(format_console(&OpValue::Text("abc".into())), "abc");
        assert_eq!(format_console(&OpValue::Int(42)), "42");
        assert_eq!(format_console(&OpValue::Float(4.8611)), "4.86");
        assert_eq!(format_console(&OpValue::Percent(1.0 / 6.0)), "16.67%");
        assert_eq!(format_cell(&OpValue::Percent(1.0 / 6.0)), "16.67");
    }

    #[test]
    fn test_run_table_appends_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = Some(HtmlReport::create(dir.path()).unwrap());
        let col = metric_column();
        let semantic = classify(&col);
        let ctx = StatContext {
            column: &col,
            semantic,
        };

        let dispatcher = Dispatcher::new(true, true);
        dispatcher
            .run_table(
                &ctx,
                stat_ops(semantic).unwrap(),
                &mut report,
                Section::SingleVariable,
            )
            .unwrap();

        let blocks = report.as_ref().unwrap().section(Section::SingleVariable);
        assert_eq!(blocks.len(), 1);
        match &blocks[0] {
            crate::report::RenderBlock::Table(rows) => {
                assert_eq!(rows[0].metric, "Column Name");
                assert_eq!(rows[0].value, "metric");
                let pct = rows.iter().find(|r| r.metric == "Missing Value %").unwrap();
                assert_eq!(pct.value, "16.67");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_chart_grid_writes_asset() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = Some(HtmlReport::create(dir.path()).unwrap());

        let dispatcher = Dispatcher::new(true, true);
        dispatcher
            .run_chart_grid(
                vec![
                    (
                        "box".to_string(),
                        Ok(ChartSpec::Box {
                            title: "box".into(),
                            values: vec![1.0, 2.0, 3.0, 4.0],
                        }),
                    ),
                    (
                        "broken".to_string(),
                        Err(FacetError::EmptyData("nope".into())),
                    ),
                ],
                "single_var_metric",
                &mut report,
                Section::SingleVariable,
            )
            .unwrap();

        let sink = report.as_ref().unwrap();
        assert!(sink.asset_file("single_var_metric").exists());
        assert!(matches!(
            sink.section(Section::SingleVariable)[0],
            crate::report::RenderBlock::Image(_)
        ));
    }

    #[test]
    fn test_chart_failure_propagates_without_isolation() {
        let dispatcher = Dispatcher::new(false, true);
        let result = dispatcher.run_chart_grid(
            vec![(
                "broken".to_string(),
                Err(FacetError::EmptyData("nope".into())),
            )],
            "x",
            &mut None,
            Section::SingleVariable,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_console_only_mode_skips_rendering() {
        let dispatcher = Dispatcher::new(true, true);
        dispatcher
            .run_chart_grid(
                vec![(
                    "box".to_string(),
                    Ok(ChartSpec::Box {
                        title: "box".into(),
                        values: vec![1.0, 2.0],
                    }),
                )],
                "x",
                &mut None,
                Section::SingleVariable,
            )
            .unwrap();
    }
}
