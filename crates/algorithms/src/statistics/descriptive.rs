//! Descriptive statistics over the valid cells of a grid
//!
//! - **Basic summary**: mean, median, std, percentiles, CV
//! - **Extended summary**: variance, skewness, kurtosis, IQR, MAD
//! - **Heterogeneity**: CV-based spatial heterogeneity rating

use serde::Serialize;
use verdis_core::Grid;

/// Descriptive statistics of a grid's valid cells.
///
/// `n` counts the finite cells; every other field is `None` when `n == 0`,
/// and `cv` is additionally `None` when the mean is zero (the ratio is
/// undefined, not zero). Percentiles use linear interpolation and `std` is
/// the population standard deviation.
#[derive(Debug, Clone, Serialize)]
pub struct GridSummary {
    pub n: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub range: Option<f64>,
    /// Coefficient of variation, `std / mean`
    pub cv: Option<f64>,
    pub p05: Option<f64>,
    pub p25: Option<f64>,
    pub p75: Option<f64>,
    pub p95: Option<f64>,
}

impl GridSummary {
    fn empty() -> Self {
        Self {
            n: 0,
            mean: None,
            median: None,
            std: None,
            min: None,
            max: None,
            range: None,
            cv: None,
            p05: None,
            p25: None,
            p75: None,
            p95: None,
        }
    }
}

/// Extended statistics: the basic summary plus distribution-shape measures.
///
/// Skewness and kurtosis use the biased moment estimators; `kurtosis` is
/// excess kurtosis (0 for a normal distribution). Both are `None` on a
/// constant surface (zero second moment).
#[derive(Debug, Clone, Serialize)]
pub struct ExtendedSummary {
    #[serde(flatten)]
    pub basic: GridSummary,
    pub variance: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    /// Interquartile range, `p75 - p25`
    pub iqr: Option<f64>,
    /// Median absolute deviation from the median
    pub mad: Option<f64>,
}

/// Spatial heterogeneity rating derived from the coefficient of variation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeterogeneityClass {
    /// CV below 10 %
    Homogeneous,
    /// CV in [10 %, 20 %)
    Moderate,
    /// CV in [20 %, 30 %)
    Heterogeneous,
    /// CV of 30 % or more
    VeryHeterogeneous,
}

/// Heterogeneity metrics of a surface
#[derive(Debug, Clone, Serialize)]
pub struct Heterogeneity {
    /// Coefficient of variation in percent, `std / |mean| * 100`;
    /// `None` when the mean is zero
    pub cv_percent: Option<f64>,
    /// IQR normalized by the median; `None` when the median is zero
    pub iqr_normalized: Option<f64>,
    pub rating: Option<HeterogeneityClass>,
}

/// Value at the given percentile of an ascending-sorted slice.
///
/// Linear interpolation between the two nearest ranks (numpy's default).
/// The slice must be non-empty and sorted.
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty());
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }

    let rank = (p / 100.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;

    sorted[lo] + (sorted[hi.min(n - 1)] - sorted[lo]) * frac
}

/// Summarize a set of valid cell values.
///
/// Takes ownership of the values because it sorts them for the
/// order statistics.
pub(crate) fn summarize(mut values: Vec<f64>) -> GridSummary {
    let n = values.len();
    if n == 0 {
        return GridSummary::empty();
    }

    let sum: f64 = values.iter().sum();
    let mean = sum / n as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    let std = var.sqrt();

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let min = values[0];
    let max = values[n - 1];

    GridSummary {
        n,
        mean: Some(mean),
        median: Some(percentile(&values, 50.0)),
        std: Some(std),
        min: Some(min),
        max: Some(max),
        range: Some(max - min),
        cv: if mean != 0.0 { Some(std / mean) } else { None },
        p05: Some(percentile(&values, 5.0)),
        p25: Some(percentile(&values, 25.0)),
        p75: Some(percentile(&values, 75.0)),
        p95: Some(percentile(&values, 95.0)),
    }
}

/// Compute descriptive statistics over the valid cells of a grid.
///
/// Only finite, non-nodata cells contribute. A grid with zero valid cells
/// yields `n = 0` with every other field unavailable; this never fails.
pub fn grid_statistics(grid: &Grid<f64>) -> GridSummary {
    summarize(grid.valid_values())
}

/// Compute extended statistics including distribution-shape measures
pub fn extended_statistics(grid: &Grid<f64>) -> ExtendedSummary {
    let values = grid.valid_values();
    let basic = summarize(values.clone());

    if basic.n == 0 {
        return ExtendedSummary {
            basic,
            variance: None,
            skewness: None,
            kurtosis: None,
            iqr: None,
            mad: None,
        };
    }

    let n = basic.n as f64;
    let mean = basic.mean.unwrap();
    let m2 = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let m3 = values.iter().map(|v| (v - mean).powi(3)).sum::<f64>() / n;
    let m4 = values.iter().map(|v| (v - mean).powi(4)).sum::<f64>() / n;

    let (skewness, kurtosis) = if m2 > 0.0 {
        (Some(m3 / m2.powf(1.5)), Some(m4 / (m2 * m2) - 3.0))
    } else {
        (None, None)
    };

    let median = basic.median.unwrap();
    let mut abs_dev: Vec<f64> = values.iter().map(|v| (v - median).abs()).collect();
    abs_dev.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mad = percentile(&abs_dev, 50.0);

    ExtendedSummary {
        iqr: Some(basic.p75.unwrap() - basic.p25.unwrap()),
        variance: Some(m2),
        skewness,
        kurtosis,
        mad: Some(mad),
        basic,
    }
}

/// Rate the spatial heterogeneity of a surface from its CV.
///
/// Returns `None` when the grid has no valid cells.
pub fn heterogeneity(grid: &Grid<f64>) -> Option<Heterogeneity> {
    let summary = grid_statistics(grid);
    if summary.n == 0 {
        return None;
    }

    let mean = summary.mean.unwrap();
    let std = summary.std.unwrap();
    let median = summary.median.unwrap();

    let cv_percent = if mean != 0.0 {
        Some(std / mean.abs() * 100.0)
    } else {
        None
    };

    let iqr = summary.p75.unwrap() - summary.p25.unwrap();
    let iqr_normalized = if median != 0.0 { Some(iqr / median) } else { None };

    Some(Heterogeneity {
        cv_percent,
        iqr_normalized,
        rating: cv_percent.map(classify_heterogeneity),
    })
}

fn classify_heterogeneity(cv_percent: f64) -> HeterogeneityClass {
    if cv_percent < 10.0 {
        HeterogeneityClass::Homogeneous
    } else if cv_percent < 20.0 {
        HeterogeneityClass::Moderate
    } else if cv_percent < 30.0 {
        HeterogeneityClass::Heterogeneous
    } else {
        HeterogeneityClass::VeryHeterogeneous
    }
}
