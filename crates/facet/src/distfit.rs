//! Theoretical distribution fitting and ranking.
//!
//! Fits a fixed family of candidate distributions to a numeric column's
//! empirical density and ranks them by root-mean-squared error. Candidate
//! densities are evaluated at the same bin midpoints as the empirical
//! curve; ranking a candidate against a differently sampled curve would
//! not be a fair comparison.

use serde::{Deserialize, Serialize};

use crate::input::Column;
use crate::stats;

/// Candidate distribution families, in fixed declaration order.
///
/// The order doubles as the tie-break for equal fit scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistKind {
    Normal,
    Exponential,
    Uniform,
    LogNormal,
    StudentT,
}

impl DistKind {
    /// All candidates in declaration order.
    pub const ALL: [DistKind; 5] = [
        DistKind::Normal,
        DistKind::Exponential,
        DistKind::Uniform,
        DistKind::LogNormal,
        DistKind::StudentT,
    ];
}

impl std::fmt::Display for DistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistKind::Normal => write!(f, "normal"),
            DistKind::Exponential => write!(f, "exponential"),
            DistKind::Uniform => write!(f, "uniform"),
            DistKind::LogNormal => write!(f, "lognormal"),
            DistKind::StudentT => write!(f, "student-t"),
        }
    }
}

/// Parameters of one fitted distribution.
#[derive(Debug, Clone, PartialEq)]
pub enum FittedParams {
    Normal { mu: f64, sigma: f64 },
    Exponential { loc: f64, scale: f64 },
    Uniform { lo: f64, hi: f64 },
    LogNormal { mu: f64, sigma: f64 },
    StudentT { df: f64, loc: f64, scale: f64 },
}

/// A fitted candidate distribution.
#[derive(Debug, Clone)]
pub struct FittedDist {
    /// Which family this is.
    pub kind: DistKind,
    /// Estimated parameters.
    pub params: FittedParams,
}

impl FittedDist {
    /// Probability density at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        match self.params {
            FittedParams::Normal { mu, sigma } => normal_pdf(x, mu, sigma),
            FittedParams::Exponential { loc, scale } => {
                if x < loc {
                    0.0
                } else {
                    (-(x - loc) / scale).exp() / scale
                }
            }
            FittedParams::Uniform { lo, hi } => {
                if x < lo || x > hi {
                    0.0
                } else {
                    1.0 / (hi - lo)
                }
            }
            FittedParams::LogNormal { mu, sigma } => {
                if x <= 0.0 {
                    0.0
                } else {
                    let z = (x.ln() - mu) / sigma;
                    (-0.5 * z * z).exp()
                        / (x * sigma * (2.0 * std::f64::consts::PI).sqrt())
                }
            }
            FittedParams::StudentT { df, loc, scale } => {
                let t = (x - loc) / scale;
                let ln_norm = ln_gamma((df + 1.0) / 2.0)
                    - ln_gamma(df / 2.0)
                    - 0.5 * (df * std::f64::consts::PI).ln()
                    - scale.ln();
                (ln_norm - (df + 1.0) / 2.0 * (1.0 + t * t / df).ln()).exp()
            }
        }
    }

    /// Short parameter summary for chart legends.
    pub fn label(&self) -> String {
        match self.params {
            FittedParams::Normal { mu, sigma } => {
                format!("normal (mu={:.2}, sigma={:.2})", mu, sigma)
            }
            FittedParams::Exponential { loc, scale } => {
                format!("exponential (loc={:.2}, scale={:.2})", loc, scale)
            }
            FittedParams::Uniform { lo, hi } => {
                format!("uniform ({:.2}..{:.2})", lo, hi)
            }
            FittedParams::LogNormal { mu, sigma } => {
                format!("lognormal (mu={:.2}, sigma={:.2})", mu, sigma)
            }
            FittedParams::StudentT { df, .. } => format!("student-t (df={:.1})", df),
        }
    }
}

fn normal_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    (-0.5 * z * z).exp() / (sigma * (2.0 * std::f64::consts::PI).sqrt())
}

/// Natural log of the gamma function (Lanczos approximation, g = 7).
fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 8] = [
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // Reflection formula keeps the approximation in its valid range.
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }

    let x = x - 1.0;
    let mut acc = 0.99999999999980993;
    for (i, &c) in COEFFS.iter().enumerate() {
        acc += c / (x + (i + 1) as f64);
    }
    let t = x + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + acc.ln()
}

// =============================================================================
// FITTING
// =============================================================================

/// Fit one candidate family to a sample. `None` when the fit cannot
/// converge (degenerate sample, domain violation).
pub fn fit(kind: DistKind, sample: &[f64]) -> Option<FittedDist> {
    if sample.len() < 3 {
        return None;
    }
    let mu = stats::mean(sample)?;
    let sigma = stats::std_dev(sample)?;
    let lo = stats::min(sample)?;
    let hi = stats::max(sample)?;

    let params = match kind {
        DistKind::Normal => {
            if sigma == 0.0 {
                return None;
            }
            FittedParams::Normal { mu, sigma }
        }
        DistKind::Exponential => {
            // Two-parameter MLE: loc at the sample minimum.
            let scale = mu - lo;
            if scale <= 0.0 {
                return None;
            }
            FittedParams::Exponential { loc: lo, scale }
        }
        DistKind::Uniform => {
            if hi == lo {
                return None;
            }
            FittedParams::Uniform { lo, hi }
        }
        DistKind::LogNormal => {
            if lo <= 0.0 {
                return None;
            }
            let logs: Vec<f64> = sample.iter().map(|x| x.ln()).collect();
            let log_mu = stats::mean(&logs)?;
            let log_sigma = stats::std_dev(&logs)?;
            if log_sigma == 0.0 {
                return None;
            }
            FittedParams::LogNormal {
                mu: log_mu,
                sigma: log_sigma,
            }
        }
        DistKind::StudentT => {
            if sigma == 0.0 {
                return None;
            }
            // Degrees of freedom by excess-kurtosis moment matching;
            // heavy tails give small df, light tails approach normal.
            let g2 = stats::excess_kurtosis(sample)?;
            let df = if g2 > 0.0 {
                (4.0 + 6.0 / g2).min(200.0)
            } else {
                30.0
            };
            let scale = sigma * ((df - 2.0) / df).sqrt();
            if !scale.is_finite() || scale <= 0.0 {
                return None;
            }
            FittedParams::StudentT {
                df,
                loc: mu,
                scale,
            }
        }
    };

    Some(FittedDist { kind, params })
}

// =============================================================================
// RANKING
// =============================================================================

/// One fitted candidate with its curve and score.
#[derive(Debug, Clone)]
pub struct FittedCurve {
    /// The fitted distribution.
    pub dist: FittedDist,
    /// Density at each shared midpoint.
    pub densities: Vec<f64>,
    /// Root-mean-squared error against the empirical density.
    pub error: f64,
}

/// Fit report for one numeric column.
#[derive(Debug, Clone)]
pub struct DistributionFitReport {
    /// Shared evaluation points (bin midpoints of the empirical histogram).
    pub midpoints: Vec<f64>,
    /// Empirical density at each midpoint.
    pub empirical: Vec<f64>,
    /// Converged candidates in declaration order.
    pub curves: Vec<FittedCurve>,
    /// `(candidate index into curves, error)` sorted ascending by error;
    /// ties keep declaration order.
    pub ranking: Vec<(usize, f64)>,
}

impl DistributionFitReport {
    /// The best-fitting candidate, if any converged.
    pub fn best(&self) -> Option<&FittedCurve> {
        self.ranking.first().map(|&(idx, _)| &self.curves[idx])
    }

    /// Ranked `(name, error)` rows for display.
    pub fn ranked_scores(&self) -> Vec<(String, f64)> {
        self.ranking
            .iter()
            .map(|&(idx, err)| (self.curves[idx].dist.kind.to_string(), err))
            .collect()
    }
}

/// Root-mean-squared error between two aligned curves.
fn rmse(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len() as f64;
    (a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        / n)
        .sqrt()
}

/// Fit every candidate to a numeric column and rank by fit error.
///
/// Returns `None` when the column is not numeric or has too few
/// non-missing values to form an empirical density.
pub fn fit_and_rank(column: &Column) -> Option<DistributionFitReport> {
    let sample = column.numeric_values()?;
    fit_and_rank_sample(&sample)
}

/// Fit and rank over a raw sample.
pub fn fit_and_rank_sample(sample: &[f64]) -> Option<DistributionFitReport> {
    if sample.len() < 3 {
        return None;
    }
    let hist = stats::histogram(sample)?;
    let midpoints = hist.midpoints.clone();
    let empirical = hist.densities.clone();

    // Candidates that fail to converge are excluded, not fatal.
    let mut curves = Vec::new();
    for kind in DistKind::ALL {
        let Some(dist) = fit(kind, sample) else {
            continue;
        };
        let densities: Vec<f64> = midpoints.iter().map(|&x| dist.pdf(x)).collect();
        if densities.iter().any(|d| !d.is_finite()) {
            continue;
        }
        let error = rmse(&densities, &empirical);
        if !error.is_finite() {
            continue;
        }
        curves.push(FittedCurve {
            dist,
            densities,
            error,
        });
    }

    // Stable sort: equal errors keep declaration order.
    let mut ranking: Vec<(usize, f64)> = curves.iter().map(|c| c.error).enumerate().collect();
    ranking.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    Some(DistributionFitReport {
        midpoints,
        empirical,
        curves,
        ranking,
    })
}
