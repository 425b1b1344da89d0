//! Pairwise relationship resolution and data shaping.
//!
//! Given two classified columns, decides the bivariate visualization
//! family and performs any shaping (top-N bucketing, down-sampling,
//! stratified point samples) before handing a typed request to the
//! renderer. Resolution works on the *unordered* pair of semantic types,
//! so swapping the columns never changes the decision.

use indexmap::IndexMap;

use crate::classify::{SemanticType, classify};
use crate::error::Result;
use crate::input::{Column, Dataset};
use crate::render::{
    Bar, BoxGroup, CategoryColor, ChartSpec, Curve, OverlayPoint, ScatterPoint,
};
use crate::stats;

/// Scatter plots sample down to this many points.
const SCATTER_CAP: usize = 1000;

/// Box-with-points overlays sample down to this many points.
const POINT_CAP: usize = 75;

/// Fixed seed so shaped samples are reproducible across runs.
const SAMPLE_SEED: u64 = 42;

/// Top-N kept verbatim when bucketing the categorical side of a
/// categorical-numeric pair.
const BOX_TOP_N: usize = 4;

/// Top-N kept verbatim on each side of a grouped count.
const COUNT_TOP_N: usize = 2;

/// Grid points for split-density curves.
const KDE_POINTS: usize = 200;

/// Bivariate visualization family for a pair of semantic types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationFamily {
    /// Numeric x numeric.
    Scatter,
    /// Continuous numeric split by a condensed numeric.
    SplitDensity,
    /// Categorical x numeric; a secondary rule picks the final shape.
    CategoricalNumeric,
    /// Two category-like columns counted jointly.
    GroupedCount,
}

/// Resolve the family for an unordered pair of types.
///
/// Returns `None` when either side cannot be visualized.
pub fn resolve(a: SemanticType, b: SemanticType) -> Option<RelationFamily> {
    use SemanticType::*;

    if a == Unsupported || b == Unsupported {
        return None;
    }

    let pair_matches = |x: SemanticType, y: SemanticType| (a == x && b == y) || (a == y && b == x);
    let sides_match = |fst: &[SemanticType], snd: &[SemanticType]| {
        (fst.contains(&a) && snd.contains(&b)) || (fst.contains(&b) && snd.contains(&a))
    };

    if pair_matches(Numeric, Numeric) {
        return Some(RelationFamily::Scatter);
    }
    if pair_matches(Numeric, NumericCondensed) {
        return Some(RelationFamily::SplitDensity);
    }
    if sides_match(&[Text, Bool], &[Numeric, NumericCondensed]) {
        return Some(RelationFamily::CategoricalNumeric);
    }
    if sides_match(
        &[Text, Bool, NumericCondensed],
        &[Text, Bool, NumericCondensed],
    ) {
        return Some(RelationFamily::GroupedCount);
    }

    None
}

// =============================================================================
// HUE MAPPING
// =============================================================================

/// A consistent category-to-color assignment for the grouping column,
/// computed once per run and reused across every pairwise chart.
#[derive(Debug, Clone)]
pub struct HueMapping {
    /// Name of the grouping column (usually the derived `_lc` column).
    pub column: String,
    /// Categories ordered by descending frequency; position = hue slot.
    pub categories: Vec<String>,
}

impl HueMapping {
    /// Build a mapping from a grouping column's value frequencies.
    pub fn for_column(column: &Column) -> Self {
        Self {
            column: column.name.clone(),
            categories: column.value_counts().into_keys().collect(),
        }
    }

    /// Hue slot for a category label.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == label)
    }
}

// =============================================================================
// RELATIONSHIP REQUESTS
// =============================================================================

/// A shaped, ready-to-render bivariate chart request. Constructed per
/// pair at analysis time and consumed once by the renderer.
#[derive(Debug, Clone)]
pub struct RelationshipRequest {
    /// First column of the pair, in input order.
    pub first: String,
    /// Second column of the pair.
    pub second: String,
    /// The resolved family.
    pub family: RelationFamily,
    /// The shaped chart.
    pub spec: ChartSpec,
}

/// Resolve and shape one pair. `Ok(None)` means the pair has no defined
/// relationship family and is skipped.
pub fn build_request(
    dataset: &Dataset,
    first: &str,
    second: &str,
    hue: Option<&HueMapping>,
) -> Result<Option<RelationshipRequest>> {
    let col_a = dataset.require_column(first)?;
    let col_b = dataset.require_column(second)?;
    let type_a = classify(col_a);
    let type_b = classify(col_b);

    let Some(family) = resolve(type_a, type_b) else {
        return Ok(None);
    };

    // The grouping column colors a pair only when it is not itself one of
    // the two columns being compared.
    let hue = hue.filter(|h| h.column != first && h.column != second);
    let hue_column = hue.map(|h| dataset.require_column(&h.column)).transpose()?;

    let title = format!("{}-{}", first, second);
    let spec = match family {
        RelationFamily::Scatter => build_scatter(col_a, col_b, hue, hue_column, title),
        RelationFamily::SplitDensity => {
            // The condensed side acts as the category.
            let (cat, num) = if type_a == SemanticType::NumericCondensed {
                (col_a, col_b)
            } else {
                (col_b, col_a)
            };
            build_split_density(cat, num, title)
        }
        RelationFamily::CategoricalNumeric => {
            let (cat, cat_type, num, num_type) = if type_a.is_categorical() {
                (col_a, type_a, col_b, type_b)
            } else {
                (col_b, type_b, col_a, type_a)
            };
            build_categorical_numeric(cat, cat_type, num, num_type, hue, hue_column, title)
        }
        RelationFamily::GroupedCount => {
            build_grouped_count(col_a, col_b, hue, hue_column, title)
        }
    };

    Ok(Some(RelationshipRequest {
        first: first.to_string(),
        second: second.to_string(),
        family,
        spec,
    }))
}

// =============================================================================
// BUCKETING
// =============================================================================

/// One bucket label per row: top-N values verbatim, `"Other"` for the
/// rest, `"Missing"` for missing entries.
fn bucket_labels(column: &Column, top_n: usize) -> Vec<String> {
    let counts = column.value_counts();
    let keep: Vec<&String> = counts.keys().take(top_n).collect();

    (0..column.row_count())
        .map(|i| match column.label_at(i) {
            None => "Missing".to_string(),
            Some(label) => {
                if keep.iter().any(|k| **k == label) {
                    label
                } else {
                    "Other".to_string()
                }
            }
        })
        .collect()
}

/// Distinct bucket labels ordered by descending frequency.
fn bucket_order(labels: &[String]) -> Vec<String> {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_insert(0) += 1;
    }
    counts.sort_by(|_, a, _, b| b.cmp(a));
    counts.into_keys().map(String::from).collect()
}

/// `Missing` and `Other` keep fixed highlight colors regardless of rank.
fn bucket_color(label: &str) -> CategoryColor {
    if label.contains("Missing") {
        CategoryColor::Missing
    } else if label.contains("Other") {
        CategoryColor::Other
    } else {
        CategoryColor::Plain
    }
}

/// Deterministic sample of `k` indices out of `0..n`.
fn sample_indices(n: usize, k: usize) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    if k >= n {
        return indices;
    }
    let mut rng = fastrand::Rng::with_seed(SAMPLE_SEED);
    rng.shuffle(&mut indices);
    indices.truncate(k);
    indices.sort_unstable();
    indices
}

fn hue_index_at(
    hue: Option<&HueMapping>,
    hue_column: Option<&Column>,
    row: usize,
) -> Option<usize> {
    let mapping = hue?;
    let column = hue_column?;
    column.label_at(row).and_then(|l| mapping.index_of(&l))
}

// =============================================================================
// FAMILY BUILDERS
// =============================================================================

fn build_scatter(
    col_a: &Column,
    col_b: &Column,
    hue: Option<&HueMapping>,
    hue_column: Option<&Column>,
    title: String,
) -> ChartSpec {
    // Rows where both sides are present.
    let rows: Vec<usize> = (0..col_a.row_count())
        .filter(|&i| col_a.numeric_at(i).is_some() && col_b.numeric_at(i).is_some())
        .collect();

    let total = rows.len();
    let (rows, title) = if total > SCATTER_CAP {
        let picked = sample_indices(total, SCATTER_CAP);
        let sampled: Vec<usize> = picked.into_iter().map(|i| rows[i]).collect();
        (sampled, format!("{}, n={} of {}", title, SCATTER_CAP, total))
    } else {
        (rows, title)
    };

    let points = rows
        .iter()
        .map(|&i| ScatterPoint {
            x: col_a.numeric_at(i).unwrap_or_default(),
            y: col_b.numeric_at(i).unwrap_or_default(),
            hue: hue_index_at(hue, hue_column, i),
        })
        .collect();

    ChartSpec::Scatter {
        title,
        points,
        hue_labels: hue.map(|h| h.categories.clone()).unwrap_or_default(),
    }
}

/// One independently normalized density curve per category.
fn build_split_density(cat: &Column, num: &Column, title: String) -> ChartSpec {
    let order = {
        let labels: Vec<String> = (0..cat.row_count()).filter_map(|i| cat.label_at(i)).collect();
        bucket_order(&labels)
    };

    let mut curves = Vec::new();
    for label in order {
        let values: Vec<f64> = (0..cat.row_count())
            .filter(|&i| cat.label_at(i).as_deref() == Some(label.as_str()))
            .filter_map(|i| num.numeric_at(i))
            .collect();
        // Degenerate categories (constant or near-empty) get no curve.
        if let Some(points) = stats::gaussian_kde(&values, KDE_POINTS) {
            curves.push(Curve { label, points });
        }
    }

    ChartSpec::DensityOverlay { title, curves }
}

/// Secondary rule for the categorical-numeric family.
///
/// The rule works on classifier output, so a numeric `{0,1}` column is
/// already `Bool` before resolution and call order cannot change the
/// outcome: a bool against a condensed numeric becomes a grouped count;
/// a two-way split against a continuous numeric reads better as overlaid
/// densities; everything else is a box per category with sampled points.
fn build_categorical_numeric(
    cat: &Column,
    cat_type: SemanticType,
    num: &Column,
    num_type: SemanticType,
    hue: Option<&HueMapping>,
    hue_column: Option<&Column>,
    title: String,
) -> ChartSpec {
    let labels = bucket_labels(cat, BOX_TOP_N);
    let order = bucket_order(&labels);
    let bucket_count = order.len();

    let either_bool = cat_type == SemanticType::Bool;

    if either_bool && num_type == SemanticType::NumericCondensed {
        // Counts of each condensed level per flag value.
        return build_joint_count(num, &labels, title);
    }

    if (either_bool || bucket_count == 2) && num_type == SemanticType::Numeric {
        return build_bucketed_density(num, &labels, &order, title);
    }

    build_box_with_points(num, &labels, &order, hue, hue_column, title)
}

/// Split density over already-bucketed labels.
fn build_bucketed_density(
    num: &Column,
    labels: &[String],
    order: &[String],
    title: String,
) -> ChartSpec {
    let mut curves = Vec::new();
    for label in order {
        let values: Vec<f64> = labels
            .iter()
            .enumerate()
            .filter(|(_, l)| *l == label)
            .filter_map(|(i, _)| num.numeric_at(i))
            .collect();
        if let Some(points) = stats::gaussian_kde(&values, KDE_POINTS) {
            curves.push(Curve {
                label: label.clone(),
                points,
            });
        }
    }
    ChartSpec::DensityOverlay { title, curves }
}

/// Horizontal count bars of joint `value / flag` labels.
fn build_joint_count(num: &Column, flag_labels: &[String], title: String) -> ChartSpec {
    let mut counts: IndexMap<String, usize> = IndexMap::new();
    for i in 0..num.row_count() {
        let value = num.label_at(i).unwrap_or_else(|| "Missing".to_string());
        let joint = format!("{} / {}", value, flag_labels[i]);
        *counts.entry(joint).or_insert(0) += 1;
    }
    counts.sort_by(|_, a, _, b| b.cmp(a));

    let bars = counts
        .into_iter()
        .map(|(label, count)| Bar {
            color: bucket_color(&label),
            value: count as f64,
            label,
        })
        .collect();

    ChartSpec::BarChart {
        title,
        bars,
        horizontal: true,
    }
}

/// Box per bucket with a jittered point overlay. The point sample is
/// capped; when a grouping column is active the sample is stratified per
/// hue group so every group stays represented.
fn build_box_with_points(
    num: &Column,
    labels: &[String],
    order: &[String],
    hue: Option<&HueMapping>,
    hue_column: Option<&Column>,
    mut title: String,
) -> ChartSpec {
    let groups: Vec<BoxGroup> = order
        .iter()
        .map(|label| BoxGroup {
            label: label.clone(),
            values: labels
                .iter()
                .enumerate()
                .filter(|(_, l)| *l == label)
                .filter_map(|(i, _)| num.numeric_at(i))
                .collect(),
            color: bucket_color(label),
        })
        .collect();

    // Candidate rows for the overlay: numeric value present.
    let candidates: Vec<usize> = (0..num.row_count())
        .filter(|&i| num.numeric_at(i).is_some())
        .collect();
    let total = candidates.len();

    let picked: Vec<usize> = if total <= POINT_CAP {
        candidates
    } else if let (Some(mapping), Some(hue_col)) = (hue, hue_column) {
        // Stratified: an equal share per hue group, resampling within the
        // group when it runs short.
        let group_count = mapping.categories.len().max(1);
        let per_group = (POINT_CAP / group_count).max(1);
        let mut rng = fastrand::Rng::with_seed(SAMPLE_SEED);
        let mut picked = Vec::new();
        for category in &mapping.categories {
            let members: Vec<usize> = candidates
                .iter()
                .copied()
                .filter(|&i| hue_col.label_at(i).as_deref() == Some(category.as_str()))
                .collect();
            if members.is_empty() {
                continue;
            }
            for _ in 0..per_group {
                picked.push(members[rng.usize(0..members.len())]);
            }
        }
        title = format!(
            "{}, swarm n={} (with resampling) of {}",
            title,
            per_group * group_count,
            total
        );
        picked
    } else {
        let idx = sample_indices(total, POINT_CAP);
        title = format!("{}, swarm n={} of {}", title, POINT_CAP, total);
        idx.into_iter().map(|i| candidates[i]).collect()
    };

    let points = picked
        .into_iter()
        .filter_map(|i| {
            let group = order.iter().position(|l| *l == labels[i])?;
            Some(OverlayPoint {
                group,
                y: num.numeric_at(i)?,
                hue: hue_index_at(hue, hue_column, i),
            })
        })
        .collect();

    ChartSpec::GroupedBox {
        title,
        groups,
        points,
        hue_labels: hue.map(|h| h.categories.clone()).unwrap_or_default(),
    }
}

/// Joint counts over two bucketed category sides.
fn build_grouped_count(
    col_a: &Column,
    col_b: &Column,
    hue: Option<&HueMapping>,
    hue_column: Option<&Column>,
    title: String,
) -> ChartSpec {
    let labels_a = bucket_labels(col_a, COUNT_TOP_N);
    let labels_b = bucket_labels(col_b, COUNT_TOP_N);
    let joint: Vec<String> = labels_a
        .iter()
        .zip(&labels_b)
        .map(|(a, b)| format!("{} / {}", a, b))
        .collect();

    let bars = match (hue, hue_column) {
        (Some(mapping), Some(hue_col)) => {
            // Share of each joint label within every hue group.
            let mut group_totals: IndexMap<usize, usize> = IndexMap::new();
            let mut joint_counts: IndexMap<(String, usize), usize> = IndexMap::new();
            for (i, label) in joint.iter().enumerate() {
                let Some(slot) = hue_index_at(Some(mapping), Some(hue_col), i) else {
                    continue;
                };
                *group_totals.entry(slot).or_insert(0) += 1;
                *joint_counts.entry((label.clone(), slot)).or_insert(0) += 1;
            }

            let mut bars: Vec<Bar> = joint_counts
                .into_iter()
                .map(|((label, slot), count)| {
                    let share =
                        100.0 * count as f64 / group_totals.get(&slot).copied().unwrap_or(1) as f64;
                    Bar {
                        label: format!("{} [{}]", label, mapping.categories[slot]),
                        value: share,
                        color: CategoryColor::Hue(slot),
                    }
                })
                .collect();
            bars.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(std::cmp::Ordering::Equal));
            bars
        }
        _ => {
            let mut counts: IndexMap<String, usize> = IndexMap::new();
            for label in &joint {
                *counts.entry(label.clone()).or_insert(0) += 1;
            }
            counts.sort_by(|_, a, _, b| b.cmp(a));
            counts
                .into_iter()
                .map(|(label, count)| Bar {
                    color: bucket_color(&label),
                    value: count as f64,
                    label,
                })
                .collect()
        }
    };

    ChartSpec::BarChart {
        title,
        bars,
        horizontal: true,
    }
}
