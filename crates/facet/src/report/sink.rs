//! Report accumulation sink.
//!
//! The sink owns the ordered render blocks for both report sections; the
//! engine only appends. Nothing is written to disk until
//! [`HtmlReport::finalize`], and only failures there are fatal to a run.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::html::build_template;
use crate::error::{FacetError, Result};

/// Report section a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    SingleVariable,
    MultiVariable,
}

/// One `metric: value` row of a statistics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub metric: String,
    pub value: String,
}

/// An ordered render block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "render_type", content = "render_value", rename_all = "snake_case")]
pub enum RenderBlock {
    Title(String),
    Text(String),
    Table(Vec<MetricRow>),
    /// Asset file name relative to the assets directory.
    Image(String),
    Break,
}

/// Accumulates render blocks and serializes them into a static HTML
/// document.
#[derive(Debug)]
pub struct HtmlReport {
    root_path: PathBuf,
    asset_path: PathBuf,
    single_variable: Vec<RenderBlock>,
    multi_variable: Vec<RenderBlock>,
}

impl HtmlReport {
    /// Create the report directory tree under `save_path` and clear any
    /// stale chart assets from a previous run.
    pub fn create(save_path: impl AsRef<Path>) -> Result<Self> {
        let root_path = save_path.as_ref().join("html_report");
        let asset_path = root_path.join("assets");

        fs::create_dir_all(&asset_path).map_err(|e| FacetError::Io {
            path: asset_path.clone(),
            source: e,
        })?;

        remove_stale_assets(&asset_path)?;

        Ok(Self {
            root_path,
            asset_path,
            single_variable: Vec::new(),
            multi_variable: Vec::new(),
        })
    }

    /// Directory chart assets are written into.
    pub fn asset_dir(&self) -> &Path {
        &self.asset_path
    }

    /// Full path for a named chart asset.
    pub fn asset_file(&self, chart_name: &str) -> PathBuf {
        self.asset_path.join(format!("facet_{}.svg", sanitize(chart_name)))
    }

    /// Append a section title.
    pub fn append_title(&mut self, title: &str, section: Section) {
        self.section_mut(section)
            .push(RenderBlock::Title(title.replace('\n', " ")));
    }

    /// Append a text paragraph.
    pub fn append_text(&mut self, text: &str, section: Section) {
        self.section_mut(section)
            .push(RenderBlock::Text(text.replace('\n', "<br>")));
    }

    /// Append a metric/value table.
    pub fn append_table(&mut self, rows: Vec<MetricRow>, section: Section) {
        self.section_mut(section).push(RenderBlock::Table(rows));
    }

    /// Append an image reference (file name inside the assets directory),
    /// followed by a line break.
    pub fn append_image(&mut self, file_name: &str, section: Section) {
        let blocks = self.section_mut(section);
        blocks.push(RenderBlock::Image(file_name.to_string()));
        blocks.push(RenderBlock::Break);
    }

    /// Blocks accumulated for a section.
    pub fn section(&self, section: Section) -> &[RenderBlock] {
        match section {
            Section::SingleVariable => &self.single_variable,
            Section::MultiVariable => &self.multi_variable,
        }
    }

    fn section_mut(&mut self, section: Section) -> &mut Vec<RenderBlock> {
        match section {
            Section::SingleVariable => &mut self.single_variable,
            Section::MultiVariable => &mut self.multi_variable,
        }
    }

    /// Serialize all sections into `report.html` and return its path.
    pub fn finalize(&self) -> Result<PathBuf> {
        let template = build_template(&self.single_variable, &self.multi_variable);
        let write_path = self.root_path.join("report.html");
        fs::write(&write_path, template).map_err(|e| FacetError::Io {
            path: write_path.clone(),
            source: e,
        })?;
        Ok(write_path)
    }
}

/// Remove `facet_*.svg` left over from previous runs so a reused report
/// directory never shows outdated charts.
fn remove_stale_assets(asset_path: &Path) -> Result<()> {
    let entries = fs::read_dir(asset_path).map_err(|e| FacetError::Io {
        path: asset_path.to_path_buf(),
        source: e,
    })?;
    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("facet_") && name.ends_with(".svg") {
            let _ = fs::remove_file(entry.path());
        }
    }
    Ok(())
}

/// File-system-safe chart names.
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sections_accumulate_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = HtmlReport::create(dir.path()).unwrap();

        report.append_title("col", Section::SingleVariable);
        report.append_table(
            vec![MetricRow {
                metric: "Row Count".into(),
                value: "6".into(),
            }],
            Section::SingleVariable,
        );
        report.append_text("skipped", Section::MultiVariable);

        assert_eq!(report.section(Section::SingleVariable).len(), 2);
        assert!(matches!(
            report.section(Section::SingleVariable)[0],
            RenderBlock::Title(_)
        ));
        assert_eq!(report.section(Section::MultiVariable).len(), 1);
    }

    #[test]
    fn test_finalize_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = HtmlReport::create(dir.path()).unwrap();
        report.append_title("metric", Section::SingleVariable);

        let path = report.finalize().unwrap();
        assert!(path.ends_with("html_report/report.html"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("metric"));
    }

    #[test]
    fn test_stale_assets_removed() {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("html_report").join("assets");
        std::fs::create_dir_all(&assets).unwrap();
        std::fs::write(assets.join("facet_old.svg"), "stale").unwrap();
        std::fs::write(assets.join("keep.txt"), "keep").unwrap();

        let _report = HtmlReport::create(dir.path()).unwrap();
        assert!(!assets.join("facet_old.svg").exists());
        assert!(assets.join("keep.txt").exists());
    }

    #[test]
    fn test_asset_file_sanitized() {
        let dir = tempfile::tempdir().unwrap();
        let report = HtmlReport::create(dir.path()).unwrap();
        let path = report.asset_file("single_var_a/b");
        assert!(path.to_string_lossy().ends_with("facet_single_var_a_b.svg"));
    }
}
