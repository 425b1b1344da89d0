//! Summary statistics over numeric samples.
//!
//! Pure functions over `&[f64]`; callers pass non-missing values only.
//! Variance and standard deviation are population moments (ddof = 0) and
//! quantiles interpolate linearly at `q * (n - 1)`, matching the reference
//! values used by the test battery.

/// Arithmetic mean. Returns `None` on an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Minimum value.
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

/// Maximum value.
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

/// Population variance (ddof = 0).
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Linear-interpolation quantile at `q` in [0, 1].
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        return Some(sorted[lo]);
    }
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Median (50th percentile).
pub fn median(values: &[f64]) -> Option<f64> {
    quantile(values, 0.5)
}

/// Excess kurtosis (population, Fisher definition). Zero for a normal sample.
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = variance(values)?;
    if var == 0.0 {
        return None;
    }
    let n = values.len() as f64;
    let m4 = values.iter().map(|x| (x - m).powi(4)).sum::<f64>() / n;
    Some(m4 / (var * var) - 3.0)
}

/// Pearson correlation coefficient between two equal-length samples.
pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let mx = mean(x)?;
    let my = mean(y)?;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (&a, &b) in x.iter().zip(y) {
        cov += (a - mx) * (b - my);
        vx += (a - mx) * (a - mx);
        vy += (b - my) * (b - my);
    }
    if vx == 0.0 || vy == 0.0 {
        return None;
    }
    Some(cov / (vx.sqrt() * vy.sqrt()))
}

// =============================================================================
// HISTOGRAM
// =============================================================================

/// A density histogram with bin midpoints.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Bin edges (length = bin count + 1).
    pub edges: Vec<f64>,
    /// Raw counts per bin.
    pub counts: Vec<usize>,
    /// Normalized density per bin (integrates to 1).
    pub densities: Vec<f64>,
    /// Midpoint of each bin.
    pub midpoints: Vec<f64>,
}

/// Number of bins under the "auto" rule: the larger of the Sturges and
/// Freedman-Diaconis estimates, as in the reference numeric library.
pub fn auto_bin_count(values: &[f64]) -> usize {
    let n = values.len();
    if n < 2 {
        return 1;
    }

    let sturges = (n as f64).log2().ceil() as usize + 1;

    let iqr = match (quantile(values, 0.75), quantile(values, 0.25)) {
        (Some(q3), Some(q1)) => q3 - q1,
        _ => 0.0,
    };
    let span = match (max(values), min(values)) {
        (Some(hi), Some(lo)) => hi - lo,
        _ => 0.0,
    };

    let fd = if iqr > 0.0 && span > 0.0 {
        let width = 2.0 * iqr / (n as f64).cbrt();
        (span / width).ceil() as usize
    } else {
        0
    };

    sturges.max(fd).max(1)
}

/// Build a density histogram with automatically chosen bins.
pub fn histogram(values: &[f64]) -> Option<Histogram> {
    histogram_with_bins(values, auto_bin_count(values))
}

/// Build a density histogram with a fixed bin count.
pub fn histogram_with_bins(values: &[f64], bins: usize) -> Option<Histogram> {
    if values.is_empty() || bins == 0 {
        return None;
    }
    let lo = min(values)?;
    let hi = max(values)?;

    // Degenerate span: a single bin of unit width centered on the value.
    let (lo, hi, bins) = if hi == lo {
        (lo - 0.5, hi + 0.5, 1)
    } else {
        (lo, hi, bins)
    };

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let mut idx = ((v - lo) / width) as usize;
        if idx >= bins {
            idx = bins - 1; // right edge lands in the last bin
        }
        counts[idx] += 1;
    }

    let n = values.len() as f64;
    let densities: Vec<f64> = counts.iter().map(|&c| c as f64 / (n * width)).collect();
    let edges: Vec<f64> = (0..=bins).map(|i| lo + i as f64 * width).collect();
    let midpoints: Vec<f64> = (0..bins)
        .map(|i| (edges[i] + edges[i + 1]) / 2.0)
        .collect();

    Some(Histogram {
        edges,
        counts,
        densities,
        midpoints,
    })
}

// =============================================================================
// KERNEL DENSITY
// =============================================================================

/// Gaussian kernel density estimate evaluated on an even grid across the
/// sample range. Bandwidth follows Silverman's rule of thumb.
pub fn gaussian_kde(values: &[f64], grid_points: usize) -> Option<Vec<(f64, f64)>> {
    if values.len() < 2 || grid_points < 2 {
        return None;
    }
    let sigma = std_dev(values)?;
    if sigma == 0.0 {
        return None;
    }
    let n = values.len() as f64;
    let bandwidth = 1.06 * sigma * n.powf(-0.2);

    let lo = min(values)? - 3.0 * bandwidth;
    let hi = max(values)? + 3.0 * bandwidth;
    let step = (hi - lo) / (grid_points - 1) as f64;

    let norm = 1.0 / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
    let curve = (0..grid_points)
        .map(|i| {
            let x = lo + i as f64 * step;
            let density: f64 = values
                .iter()
                .map(|&v| {
                    let z = (x - v) / bandwidth;
                    (-0.5 * z * z).exp()
                })
                .sum::<f64>()
                * norm;
            (x, density)
        })
        .collect();

    Some(curve)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference sample: [5.1, 4.9, 4.7, 4.6, 5.0] with one missing dropped.
    fn sample() -> Vec<f64> {
        vec![5.1, 4.9, 4.7, 4.6, 5.0]
    }

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_mean() {
        assert!(close(mean(&sample()).unwrap(), 4.86, 0.005));
    }

    #[test]
    fn test_median() {
        assert!(close(median(&sample()).unwrap(), 4.9, 1e-9));
    }

    #[test]
    fn test_min_max() {
        assert!(close(min(&sample()).unwrap(), 4.6, 1e-9));
        assert!(close(max(&sample()).unwrap(), 5.1, 1e-9));
    }

    #[test]
    fn test_population_variance() {
        assert!(close(variance(&sample()).unwrap(), 0.0344, 0.0001));
    }

    #[test]
    fn test_population_std() {
        assert!(close(std_dev(&sample()).unwrap(), 0.1855, 0.0001));
    }

    #[test]
    fn test_quantile_75() {
        assert!(close(quantile(&sample(), 0.75).unwrap(), 5.0, 1e-9));
    }

    #[test]
    fn test_quantile_interpolates() {
        let values = vec![1.0, 2.0, 3.0, 4.0];
        assert!(close(quantile(&values, 0.5).unwrap(), 2.5, 1e-9));
    }

    #[test]
    fn test_five_number_monotonic() {
        let v = sample();
        let (mn, q1, med, q3, mx) = (
            min(&v).unwrap(),
            quantile(&v, 0.25).unwrap(),
            median(&v).unwrap(),
            quantile(&v, 0.75).unwrap(),
            max(&v).unwrap(),
        );
        assert!(mn <= q1 && q1 <= med && med <= q3 && q3 <= mx);
    }

    #[test]
    fn test_empty_sample() {
        assert!(mean(&[]).is_none());
        assert!(median(&[]).is_none());
        assert!(quantile(&[], 0.5).is_none());
    }

    #[test]
    fn test_pearson_perfect_correlation() {
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let y = vec![2.0, 4.0, 6.0, 8.0];
        assert!(close(pearson(&x, &y).unwrap(), 1.0, 1e-9));
    }

    #[test]
    fn test_pearson_constant_is_none() {
        let x = vec![1.0, 1.0, 1.0];
        let y = vec![2.0, 4.0, 6.0];
        assert!(pearson(&x, &y).is_none());
    }

    #[test]
    fn test_histogram_density_integrates_to_one() {
        let values: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
        let hist = histogram(&values).unwrap();
        let width = hist.edges[1] - hist.edges[0];
        let total: f64 = hist.densities.iter().map(|d| d * width).sum();
        assert!(close(total, 1.0, 1e-9));
        assert_eq!(hist.midpoints.len(), hist.counts.len());
    }

    #[test]
    fn test_histogram_constant_column() {
        let values = vec![3.0; 10];
        let hist = histogram(&values).unwrap();
        assert_eq!(hist.counts.len(), 1);
        assert_eq!(hist.counts[0], 10);
    }

    #[test]
    fn test_auto_bins_at_least_sturges() {
        let values: Vec<f64> = (0..64).map(|i| i as f64).collect();
        // Sturges for n=64 is ceil(log2(64)) + 1 = 7.
        assert!(auto_bin_count(&values) >= 7);
    }

    #[test]
    fn test_kde_positive_density() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let curve = gaussian_kde(&values, 50).unwrap();
        assert_eq!(curve.len(), 50);
        assert!(curve.iter().all(|&(_, d)| d >= 0.0));
    }

    #[test]
    fn test_kde_constant_is_none() {
        assert!(gaussian_kde(&[2.0, 2.0, 2.0], 50).is_none());
    }
}
