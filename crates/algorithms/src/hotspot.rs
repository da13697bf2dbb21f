//! Hotspot/coldspot classification
//!
//! Flags cells whose values are statistically unusually high or low
//! relative to the whole grid, under one of three threshold policies.

use ndarray::Array2;
use verdis_core::Grid;

use crate::statistics::percentile;

/// Threshold policy for hotspot/coldspot classification.
///
/// The meaning of the `threshold` argument depends on the policy:
/// sigmas for `ZScore`, a percentile for `Percentile`, an IQR multiple
/// for `Iqr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdMethod {
    /// Standardize by the global mean/std; hotspot where z > threshold,
    /// coldspot where z < -threshold. Zero global std flags nothing.
    ZScore,
    /// Hotspot above the (100 - threshold)-th percentile of valid cells,
    /// coldspot below the threshold-th percentile.
    Percentile,
    /// Hotspot above `Q3 + threshold * IQR`, coldspot below
    /// `Q1 - threshold * IQR`.
    Iqr,
}

/// Result of hotspot/coldspot classification.
///
/// The two masks are disjoint and entirely `false` outside the validity
/// mask, whatever the policy.
#[derive(Debug, Clone)]
pub struct HotspotResult {
    pub hotspots: Array2<bool>,
    pub coldspots: Array2<bool>,
    pub n_hotspots: usize,
    pub n_coldspots: usize,
    /// Number of valid cells in the input
    pub n_valid: usize,
    pub pct_hotspots: f64,
    pub pct_coldspots: f64,
    /// Mean value over the hotspot mask; `None` when it is empty
    pub mean_hotspots: Option<f64>,
    /// Mean value over the coldspot mask; `None` when it is empty
    pub mean_coldspots: Option<f64>,
}

/// Classify the cells of a grid into hotspots, coldspots and neutral.
///
/// Returns `None` when the grid has zero valid cells. Invalid cells are
/// never flagged regardless of how the raw threshold comparison would
/// fall: no-data propagates to no-classification.
///
/// # Arguments
/// * `grid` - Input surface
/// * `method` - Threshold policy
/// * `threshold` - Policy-dependent threshold (see [`ThresholdMethod`])
pub fn detect_hotspots(
    grid: &Grid<f64>,
    method: ThresholdMethod,
    threshold: f64,
) -> Option<HotspotResult> {
    let mut values = grid.valid_values();
    if values.is_empty() {
        return None;
    }

    let (rows, cols) = grid.shape();
    let n_valid = values.len();

    // Per-cell predicates for the chosen policy
    let (is_hot, is_cold): (Box<dyn Fn(f64) -> bool>, Box<dyn Fn(f64) -> bool>) = match method {
        ThresholdMethod::ZScore => {
            let mean = values.iter().sum::<f64>() / n_valid as f64;
            let var =
                values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n_valid as f64;
            let std = var.sqrt();

            if std > 0.0 {
                (
                    Box::new(move |v| (v - mean) / std > threshold),
                    Box::new(move |v| (v - mean) / std < -threshold),
                )
            } else {
                (Box::new(|_| false), Box::new(|_| false))
            }
        }
        ThresholdMethod::Percentile => {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let high = percentile(&values, 100.0 - threshold);
            let low = percentile(&values, threshold);

            (Box::new(move |v| v > high), Box::new(move |v| v < low))
        }
        ThresholdMethod::Iqr => {
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let q1 = percentile(&values, 25.0);
            let q3 = percentile(&values, 75.0);
            let iqr = q3 - q1;
            let upper = q3 + threshold * iqr;
            let lower = q1 - threshold * iqr;

            (Box::new(move |v| v > upper), Box::new(move |v| v < lower))
        }
    };

    let mut hotspots = Array2::from_elem((rows, cols), false);
    let mut coldspots = Array2::from_elem((rows, cols), false);
    let mut hot_sum = 0.0;
    let mut cold_sum = 0.0;
    let mut n_hotspots = 0usize;
    let mut n_coldspots = 0usize;

    for (row, col, v) in grid.valid_cells() {
        if is_hot(v) {
            hotspots[(row, col)] = true;
            hot_sum += v;
            n_hotspots += 1;
        } else if is_cold(v) {
            coldspots[(row, col)] = true;
            cold_sum += v;
            n_coldspots += 1;
        }
    }

    Some(HotspotResult {
        hotspots,
        coldspots,
        n_hotspots,
        n_coldspots,
        n_valid,
        pct_hotspots: n_hotspots as f64 / n_valid as f64 * 100.0,
        pct_coldspots: n_coldspots as f64 / n_valid as f64 * 100.0,
        mean_hotspots: (n_hotspots > 0).then(|| hot_sum / n_hotspots as f64),
        mean_coldspots: (n_coldspots > 0).then(|| cold_sum / n_coldspots as f64),
    })
}
