//! SVG chart rendering via plotters.

use std::path::{Path, PathBuf};

use plotters::prelude::*;

use super::{Bar, CategoryColor, ChartSpec};
use crate::error::{FacetError, Result};
use crate::stats;

/// Pixel size of one grid cell.
const CELL_WIDTH: u32 = 640;
const CELL_HEIGHT: u32 = 420;

/// Regular category fill.
const PLAIN: RGBColor = RGBColor(140, 140, 140);
/// Fixed highlight for the "Other" bucket.
const OTHER: RGBColor = RGBColor(31, 119, 180);
/// Fixed highlight for the "Missing" bucket.
const MISSING: RGBColor = RGBColor(214, 39, 40);

/// Hue palette for grouping-column categories (orange, purple, cyan).
const HUES: [RGBColor; 3] = [
    RGBColor(255, 127, 14),
    RGBColor(148, 103, 189),
    RGBColor(23, 190, 207),
];

/// Series palette for overlay curves.
const SERIES: [RGBColor; 6] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
];

fn category_color(color: CategoryColor) -> RGBColor {
    match color {
        CategoryColor::Plain => PLAIN,
        CategoryColor::Other => OTHER,
        CategoryColor::Missing => MISSING,
        CategoryColor::Hue(i) => HUES[i % HUES.len()],
    }
}

fn hue_color(idx: usize) -> RGBColor {
    HUES[idx % HUES.len()]
}

fn series_color(idx: usize) -> RGBColor {
    SERIES[idx % SERIES.len()]
}

fn rerr(e: impl std::fmt::Display) -> FacetError {
    FacetError::Render(e.to_string())
}

/// A grid figure backed by one SVG file.
///
/// Chart specs are assigned to cells; unused trailing cells stay blank.
/// Nothing touches the filesystem until [`Figure::save`].
pub struct Figure {
    path: PathBuf,
    rows: usize,
    cols: usize,
    cells: Vec<Option<ChartSpec>>,
}

impl Figure {
    /// Create a figure with a fixed grid layout.
    pub fn new(path: impl AsRef<Path>, rows: usize, cols: usize) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            rows: rows.max(1),
            cols: cols.max(1),
            cells: vec![None; rows.max(1) * cols.max(1)],
        }
    }

    /// Assign a chart to a grid cell (row-major index).
    pub fn set_cell(&mut self, idx: usize, spec: ChartSpec) {
        if idx < self.cells.len() {
            self.cells[idx] = Some(spec);
        }
    }

    /// Number of cells in the grid.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Render every assigned cell and write the SVG file.
    pub fn save(&self) -> Result<()> {
        let width = CELL_WIDTH * self.cols as u32;
        let height = CELL_HEIGHT * self.rows as u32;
        let path_str = self.path.to_string_lossy().into_owned();

        let root = SVGBackend::new(&path_str, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(rerr)?;

        let areas = root.split_evenly((self.rows, self.cols));
        for (area, cell) in areas.iter().zip(&self.cells) {
            if let Some(spec) = cell {
                draw_spec(area, spec)?;
            }
        }

        root.present().map_err(rerr)?;
        Ok(())
    }
}

type Area<'a> = DrawingArea<SVGBackend<'a>, plotters::coord::Shift>;

fn draw_spec(area: &Area, spec: &ChartSpec) -> Result<()> {
    match spec {
        ChartSpec::Box { title, values } => draw_box_chart(area, title, values),
        ChartSpec::Histogram {
            title,
            values,
            curve,
        } => draw_histogram(area, title, values, curve.as_deref()),
        ChartSpec::DensityOverlay { title, curves } => draw_density_overlay(area, title, curves),
        ChartSpec::BarChart {
            title,
            bars,
            horizontal,
        } => {
            if *horizontal {
                draw_bars_horizontal(area, title, bars)
            } else {
                draw_bars_vertical(area, title, bars)
            }
        }
        ChartSpec::Scatter {
            title,
            points,
            hue_labels,
        } => draw_scatter(area, title, points, hue_labels),
        ChartSpec::GroupedBox {
            title,
            groups,
            points,
            hue_labels,
        } => draw_grouped_box(area, title, groups, points, hue_labels),
        ChartSpec::Heatmap {
            title,
            row_labels,
            col_labels,
            matrix,
        } => draw_heatmap(area, title, row_labels, col_labels, matrix),
    }
}

/// Five-number geometry of one box glyph.
struct BoxGeometry {
    q1: f64,
    median: f64,
    q3: f64,
    whisker_lo: f64,
    whisker_hi: f64,
    outliers: Vec<f64>,
}

/// Whiskers extend to the furthest values within 1.5 IQR of the quartiles.
fn box_geometry(values: &[f64]) -> Option<BoxGeometry> {
    let q1 = stats::quantile(values, 0.25)?;
    let median = stats::median(values)?;
    let q3 = stats::quantile(values, 0.75)?;
    let iqr = q3 - q1;
    let fence_lo = q1 - 1.5 * iqr;
    let fence_hi = q3 + 1.5 * iqr;

    let whisker_lo = values
        .iter()
        .copied()
        .filter(|&v| v >= fence_lo)
        .fold(f64::INFINITY, f64::min);
    let whisker_hi = values
        .iter()
        .copied()
        .filter(|&v| v <= fence_hi)
        .fold(f64::NEG_INFINITY, f64::max);
    let outliers = values
        .iter()
        .copied()
        .filter(|&v| v < fence_lo || v > fence_hi)
        .collect();

    Some(BoxGeometry {
        q1,
        median,
        q3,
        whisker_lo,
        whisker_hi,
        outliers,
    })
}

type NumericChart<'a, 'b> = ChartContext<
    'a,
    SVGBackend<'b>,
    Cartesian2d<
        plotters::coord::types::RangedCoordf64,
        plotters::coord::types::RangedCoordf64,
    >,
>;

/// Draw one box glyph centered at `x` into a numeric-coordinate chart.
fn draw_box_glyph(
    chart: &mut NumericChart<'_, '_>,
    x: f64,
    half_width: f64,
    geom: &BoxGeometry,
    fill: RGBColor,
) -> Result<()> {
    let stroke = BLACK.stroke_width(1);

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(x - half_width, geom.q1), (x + half_width, geom.q3)],
            fill.mix(0.6).filled(),
        )))
        .map_err(rerr)?;
    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(x - half_width, geom.q1), (x + half_width, geom.q3)],
            stroke,
        )))
        .map_err(rerr)?;

    // Median line, whisker stems, whisker caps.
    let segments = [
        vec![(x - half_width, geom.median), (x + half_width, geom.median)],
        vec![(x, geom.q3), (x, geom.whisker_hi)],
        vec![(x, geom.q1), (x, geom.whisker_lo)],
        vec![
            (x - half_width / 2.0, geom.whisker_hi),
            (x + half_width / 2.0, geom.whisker_hi),
        ],
        vec![
            (x - half_width / 2.0, geom.whisker_lo),
            (x + half_width / 2.0, geom.whisker_lo),
        ],
    ];
    for seg in segments {
        chart
            .draw_series(std::iter::once(PathElement::new(seg, stroke)))
            .map_err(rerr)?;
    }

    chart
        .draw_series(
            geom.outliers
                .iter()
                .map(|&v| Circle::new((x, v), 2, BLACK.filled())),
        )
        .map_err(rerr)?;

    Ok(())
}

fn padded_range(lo: f64, hi: f64) -> (f64, f64) {
    let span = (hi - lo).abs();
    let pad = if span == 0.0 { 0.5 } else { span * 0.05 };
    (lo - pad, hi + pad)
}

fn draw_box_chart(area: &Area, title: &str, values: &[f64]) -> Result<()> {
    let Some(geom) = box_geometry(values) else {
        return Ok(());
    };
    let lo = stats::min(values).unwrap_or(0.0);
    let hi = stats::max(values).unwrap_or(1.0);
    let (y_lo, y_hi) = padded_range(lo, hi);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(20)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0f64..2.0, y_lo..y_hi)
        .map_err(rerr)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .draw()
        .map_err(rerr)?;

    draw_box_glyph(&mut chart, 1.0, 0.35, &geom, PLAIN)
}

fn draw_histogram(
    area: &Area,
    title: &str,
    values: &[f64],
    curve: Option<&[(f64, f64)]>,
) -> Result<()> {
    let Some(hist) = stats::histogram(values) else {
        return Ok(());
    };

    let x_lo = hist.edges[0];
    let x_hi = *hist.edges.last().unwrap_or(&1.0);
    let mut y_hi = hist.densities.iter().copied().fold(0.0f64, f64::max);
    if let Some(c) = curve {
        y_hi = c.iter().map(|&(_, d)| d).fold(y_hi, f64::max);
    }
    if y_hi == 0.0 {
        y_hi = 1.0;
    }

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi * 1.1)
        .map_err(rerr)?;

    chart.configure_mesh().draw().map_err(rerr)?;

    chart
        .draw_series((0..hist.counts.len()).map(|i| {
            Rectangle::new(
                [(hist.edges[i], 0.0), (hist.edges[i + 1], hist.densities[i])],
                OTHER.mix(0.5).filled(),
            )
        }))
        .map_err(rerr)?;

    if let Some(c) = curve {
        chart
            .draw_series(LineSeries::new(
                c.iter().copied(),
                series_color(1).stroke_width(2),
            ))
            .map_err(rerr)?;
    }

    Ok(())
}

fn draw_density_overlay(area: &Area, title: &str, curves: &[super::Curve]) -> Result<()> {
    let mut x_lo = f64::INFINITY;
    let mut x_hi = f64::NEG_INFINITY;
    let mut y_hi = 0.0f64;
    for curve in curves {
        for &(x, y) in &curve.points {
            x_lo = x_lo.min(x);
            x_hi = x_hi.max(x);
            y_hi = y_hi.max(y);
        }
    }
    if !x_lo.is_finite() || x_lo >= x_hi {
        return Ok(());
    }
    if y_hi == 0.0 {
        y_hi = 1.0;
    }

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi * 1.1)
        .map_err(rerr)?;

    chart.configure_mesh().draw().map_err(rerr)?;

    for (idx, curve) in curves.iter().enumerate() {
        let color = series_color(idx);
        chart
            .draw_series(LineSeries::new(
                curve.points.iter().copied(),
                color.stroke_width(2),
            ))
            .map_err(rerr)?
            .label(curve.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(rerr)?;

    Ok(())
}

fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        label.to_string()
    } else {
        let prefix: String = label.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", prefix)
    }
}

fn draw_bars_vertical(area: &Area, title: &str, bars: &[Bar]) -> Result<()> {
    if bars.is_empty() {
        return Ok(());
    }
    let y_hi = bars.iter().map(|b| b.value).fold(0.0f64, f64::max).max(1e-9);
    let labels: Vec<String> = bars.iter().map(|b| truncate_label(&b.label, 14)).collect();
    let n = bars.len();

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(50)
        .build_cartesian_2d((0..n).into_segmented(), 0.0..y_hi * 1.1)
        .map_err(rerr)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|seg: &SegmentValue<usize>| match seg {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                labels.get(*i).cloned().unwrap_or_default()
            }
            _ => String::new(),
        })
        .draw()
        .map_err(rerr)?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            Rectangle::new(
                [
                    (SegmentValue::Exact(i), 0.0),
                    (SegmentValue::Exact(i + 1), bar.value),
                ],
                category_color(bar.color).mix(0.8).filled(),
            )
        }))
        .map_err(rerr)?;

    Ok(())
}

fn draw_bars_horizontal(area: &Area, title: &str, bars: &[Bar]) -> Result<()> {
    if bars.is_empty() {
        return Ok(());
    }
    let x_hi = bars.iter().map(|b| b.value).fold(0.0f64, f64::max).max(1e-9);
    let labels: Vec<String> = bars.iter().map(|b| truncate_label(&b.label, 22)).collect();
    let n = bars.len();

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(140)
        .build_cartesian_2d(0.0..x_hi * 1.1, (0..n).into_segmented())
        .map_err(rerr)?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n)
        .y_label_formatter(&|seg: &SegmentValue<usize>| match seg {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                labels.get(*i).cloned().unwrap_or_default()
            }
            _ => String::new(),
        })
        .draw()
        .map_err(rerr)?;

    chart
        .draw_series(bars.iter().enumerate().map(|(i, bar)| {
            Rectangle::new(
                [
                    (0.0, SegmentValue::Exact(i)),
                    (bar.value, SegmentValue::Exact(i + 1)),
                ],
                category_color(bar.color).mix(0.8).filled(),
            )
        }))
        .map_err(rerr)?;

    Ok(())
}

fn draw_scatter(
    area: &Area,
    title: &str,
    points: &[super::ScatterPoint],
    hue_labels: &[String],
) -> Result<()> {
    if points.is_empty() {
        return Ok(());
    }
    let (mut x_lo, mut x_hi) = (f64::INFINITY, f64::NEG_INFINITY);
    let (mut y_lo, mut y_hi) = (f64::INFINITY, f64::NEG_INFINITY);
    for p in points {
        x_lo = x_lo.min(p.x);
        x_hi = x_hi.max(p.x);
        y_lo = y_lo.min(p.y);
        y_hi = y_hi.max(p.y);
    }
    let (x_lo, x_hi) = padded_range(x_lo, x_hi);
    let (y_lo, y_hi) = padded_range(y_lo, y_hi);

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(rerr)?;

    chart.configure_mesh().draw().map_err(rerr)?;

    chart
        .draw_series(points.iter().map(|p| {
            let color = match p.hue {
                Some(h) => hue_color(h),
                None => OTHER,
            };
            Circle::new((p.x, p.y), 3, color.mix(0.7).filled())
        }))
        .map_err(rerr)?;

    if !hue_labels.is_empty() {
        for (idx, label) in hue_labels.iter().enumerate() {
            let color = hue_color(idx);
            chart
                .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
                .map_err(rerr)?
                .label(label.clone())
                .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
        }
        chart
            .configure_series_labels()
            .border_style(BLACK)
            .background_style(WHITE.mix(0.8))
            .draw()
            .map_err(rerr)?;
    }

    Ok(())
}

fn draw_grouped_box(
    area: &Area,
    title: &str,
    groups: &[super::BoxGroup],
    points: &[super::OverlayPoint],
    hue_labels: &[String],
) -> Result<()> {
    if groups.is_empty() {
        return Ok(());
    }
    let mut y_lo = f64::INFINITY;
    let mut y_hi = f64::NEG_INFINITY;
    for g in groups {
        for &v in &g.values {
            y_lo = y_lo.min(v);
            y_hi = y_hi.max(v);
        }
    }
    for p in points {
        y_lo = y_lo.min(p.y);
        y_hi = y_hi.max(p.y);
    }
    if !y_lo.is_finite() {
        return Ok(());
    }
    let (y_lo, y_hi) = padded_range(y_lo, y_hi);
    let n = groups.len();

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(20)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0f64..n as f64, y_lo..y_hi)
        .map_err(rerr)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(0)
        .draw()
        .map_err(rerr)?;

    for (i, group) in groups.iter().enumerate() {
        let color = category_color(group.color);
        if let Some(geom) = box_geometry(&group.values) {
            draw_box_glyph(&mut chart, i as f64 + 0.5, 0.3, &geom, color)?;
        }
        // Legend doubles as the category axis; the x axis carries no ticks.
        chart
            .draw_series(std::iter::empty::<Rectangle<(f64, f64)>>())
            .map_err(rerr)?
            .label(truncate_label(&group.label, 18))
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.filled())
            });
    }

    // Jittered overlay sample; jitter is presentational only.
    let mut rng = fastrand::Rng::with_seed(42);
    chart
        .draw_series(points.iter().map(|p| {
            let jitter = (rng.f64() - 0.5) * 0.3;
            let color = match p.hue {
                Some(h) => hue_color(h),
                None => BLACK,
            };
            Circle::new((p.group as f64 + 0.5 + jitter, p.y), 2, color.mix(0.8).filled())
        }))
        .map_err(rerr)?;

    for (idx, label) in hue_labels.iter().enumerate() {
        let color = hue_color(idx);
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())
            .map_err(rerr)?
            .label(label.clone())
            .legend(move |(x, y)| Circle::new((x + 8, y), 4, color.filled()));
    }

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(rerr)?;

    Ok(())
}

/// Diverging blue-white-red scale over [-1, 1].
fn heat_color(v: f64) -> RGBColor {
    let v = v.clamp(-1.0, 1.0);
    if v >= 0.0 {
        let t = v;
        RGBColor(
            255,
            (255.0 * (1.0 - t * 0.85)) as u8,
            (255.0 * (1.0 - t * 0.85)) as u8,
        )
    } else {
        let t = -v;
        RGBColor(
            (255.0 * (1.0 - t * 0.85)) as u8,
            (255.0 * (1.0 - t * 0.85)) as u8,
            255,
        )
    }
}

fn draw_heatmap(
    area: &Area,
    title: &str,
    row_labels: &[String],
    col_labels: &[String],
    matrix: &[Vec<Option<f64>>],
) -> Result<()> {
    let rows = row_labels.len();
    let cols = col_labels.len();
    if rows == 0 || cols == 0 {
        return Ok(());
    }
    let xs: Vec<String> = col_labels.iter().map(|l| truncate_label(l, 10)).collect();
    let ys: Vec<String> = row_labels.iter().map(|l| truncate_label(l, 10)).collect();

    let mut chart = ChartBuilder::on(area)
        .caption(title, ("sans-serif", 16))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(80)
        .build_cartesian_2d((0..cols).into_segmented(), (0..rows).into_segmented())
        .map_err(rerr)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .disable_y_mesh()
        .x_labels(cols)
        .y_labels(rows)
        .x_label_formatter(&|seg: &SegmentValue<usize>| match seg {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                xs.get(*i).cloned().unwrap_or_default()
            }
            _ => String::new(),
        })
        .y_label_formatter(&|seg: &SegmentValue<usize>| match seg {
            SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                ys.get(*i).cloned().unwrap_or_default()
            }
            _ => String::new(),
        })
        .draw()
        .map_err(rerr)?;

    for (r, row) in matrix.iter().enumerate() {
        for (c, cell) in row.iter().enumerate() {
            let Some(v) = cell else {
                continue;
            };
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [
                        (SegmentValue::Exact(c), SegmentValue::Exact(r)),
                        (SegmentValue::Exact(c + 1), SegmentValue::Exact(r + 1)),
                    ],
                    heat_color(*v).filled(),
                )))
                .map_err(rerr)?;
            chart
                .draw_series(std::iter::once(Text::new(
                    format!("{:.2}", v),
                    (SegmentValue::CenterOf(c), SegmentValue::CenterOf(r)),
                    ("sans-serif", 12.0).into_font(),
                )))
                .map_err(rerr)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_geometry_monotonic() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        let geom = box_geometry(&values).unwrap();
        assert!(geom.q1 <= geom.median && geom.median <= geom.q3);
        assert!(geom.whisker_lo <= geom.q1);
        assert!(geom.whisker_hi >= geom.q3);
        // 100.0 sits far outside the upper fence.
        assert_eq!(geom.outliers, vec![100.0]);
    }

    #[test]
    fn test_heat_color_extremes() {
        assert_eq!(heat_color(1.0), RGBColor(255, 38, 38));
        assert_eq!(heat_color(-1.0), RGBColor(38, 38, 255));
        assert_eq!(heat_color(0.0), RGBColor(255, 255, 255));
    }

    #[test]
    fn test_truncate_label() {
        assert_eq!(truncate_label("short", 10), "short");
        let t = truncate_label("a-very-long-category-label", 10);
        assert!(t.chars().count() <= 10);
        assert!(t.ends_with('…'));
    }

    #[test]
    fn test_figure_renders_svg() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.svg");

        let mut figure = Figure::new(&path, 1, 2);
        figure.set_cell(
            0,
            ChartSpec::Box {
                title: "box".into(),
                values: vec![1.0, 2.0, 3.0, 4.0, 5.0],
            },
        );
        figure.set_cell(
            1,
            ChartSpec::BarChart {
                title: "bars".into(),
                bars: vec![
                    Bar {
                        label: "a".into(),
                        value: 3.0,
                        color: CategoryColor::Plain,
                    },
                    Bar {
                        label: "Other".into(),
                        value: 1.0,
                        color: CategoryColor::Other,
                    },
                ],
                horizontal: false,
            },
        );
        figure.save().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<svg"));
    }
}
