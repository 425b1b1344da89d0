//! Typed chart requests and the SVG rendering backend.
//!
//! The engine decides *what* to draw and hands a [`ChartSpec`] to the
//! backend; rasterization details live entirely in `backend`.

mod backend;

pub use backend::Figure;

/// Role-based color for category bars and boxes. `Other` and `Missing`
/// keep fixed highlight colors regardless of frequency rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryColor {
    /// Regular category.
    Plain,
    /// The bucketed "Other" catch-all.
    Other,
    /// The "Missing" bucket.
    Missing,
    /// Hue palette slot for grouping-column categories.
    Hue(usize),
}

/// One bar in a bar chart.
#[derive(Debug, Clone)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    pub color: CategoryColor,
}

/// A labeled curve for density overlays.
#[derive(Debug, Clone)]
pub struct Curve {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// One point of a scatter chart, with an optional hue label.
#[derive(Debug, Clone)]
pub struct ScatterPoint {
    pub x: f64,
    pub y: f64,
    pub hue: Option<usize>,
}

/// One category of a grouped box chart.
#[derive(Debug, Clone)]
pub struct BoxGroup {
    pub label: String,
    pub values: Vec<f64>,
    pub color: CategoryColor,
}

/// A jittered overlay point on a grouped box chart.
#[derive(Debug, Clone)]
pub struct OverlayPoint {
    /// Index of the group the point belongs to.
    pub group: usize,
    pub y: f64,
    pub hue: Option<usize>,
}

/// A typed request for one chart.
#[derive(Debug, Clone)]
pub enum ChartSpec {
    /// Single box plot over a numeric sample.
    Box { title: String, values: Vec<f64> },
    /// Density histogram with an optional density curve overlay.
    Histogram {
        title: String,
        values: Vec<f64>,
        curve: Option<Vec<(f64, f64)>>,
    },
    /// One or more density curves on shared axes.
    DensityOverlay { title: String, curves: Vec<Curve> },
    /// Bar chart; horizontal bars when `horizontal` is set.
    BarChart {
        title: String,
        bars: Vec<Bar>,
        horizontal: bool,
    },
    /// Scatter plot with optional hue grouping.
    Scatter {
        title: String,
        points: Vec<ScatterPoint>,
        hue_labels: Vec<String>,
    },
    /// Box plot per category with a jittered point overlay.
    GroupedBox {
        title: String,
        groups: Vec<BoxGroup>,
        points: Vec<OverlayPoint>,
        hue_labels: Vec<String>,
    },
    /// Correlation heatmap; `None` cells render blank.
    Heatmap {
        title: String,
        row_labels: Vec<String>,
        col_labels: Vec<String>,
        matrix: Vec<Vec<Option<f64>>>,
    },
}

impl ChartSpec {
    /// Chart title, for logging and error messages.
    pub fn title(&self) -> &str {
        match self {
            ChartSpec::Box { title, .. }
            | ChartSpec::Histogram { title, .. }
            | ChartSpec::DensityOverlay { title, .. }
            | ChartSpec::BarChart { title, .. }
            | ChartSpec::Scatter { title, .. }
            | ChartSpec::GroupedBox { title, .. }
            | ChartSpec::Heatmap { title, .. } => title,
        }
    }
}

/// Grid layout for a set of charts: fixed column count, rows as needed.
///
/// Returns `(rows, cols)`; a single chart gets a 1x1 layout.
pub fn grid_layout(chart_count: usize, columns: usize) -> (usize, usize) {
    if chart_count <= 1 {
        return (1, 1);
    }
    let cols = columns.max(1);
    (chart_count.div_ceil(cols), cols)
}
