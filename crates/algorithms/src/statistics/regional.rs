//! Per-region statistics over a labeled zone map
//!
//! Computes descriptive statistics of a value grid for each region of an
//! integer label map — typically the output of connected-component labeling
//! or a clustering-based zoning. Label `0` means "not in any region".

use std::collections::HashMap;

use ndarray::Array2;
use serde::Serialize;
use verdis_core::{Error, Grid, Result};

use super::descriptive::{summarize, GridSummary};

/// Statistics of one labeled region
#[derive(Debug, Clone, Serialize)]
pub struct RegionSummary {
    pub label: i32,
    #[serde(flatten)]
    pub stats: GridSummary,
}

/// Compute statistics of the value grid per positive region label.
///
/// Cells with label `0` and invalid value cells are skipped. The result is
/// ordered by ascending label; a label whose cells are all invalid still
/// appears, with `n = 0`.
///
/// # Arguments
/// * `values` - Value grid to analyze
/// * `labels` - Region label map of the same shape
pub fn region_statistics(
    values: &Grid<f64>,
    labels: &Array2<i32>,
) -> Result<Vec<RegionSummary>> {
    let (rows, cols) = values.shape();
    if labels.dim() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: labels.nrows(),
            ac: labels.ncols(),
        });
    }

    // Collect values per region
    let mut region_values: HashMap<i32, Vec<f64>> = HashMap::new();

    for row in 0..rows {
        for col in 0..cols {
            let label = labels[(row, col)];
            if label <= 0 {
                continue;
            }

            let entry = region_values.entry(label).or_default();
            let v = unsafe { values.get_unchecked(row, col) };
            if v.is_finite() && !values.is_nodata(v) {
                entry.push(v);
            }
        }
    }

    let mut summaries: Vec<RegionSummary> = region_values
        .into_iter()
        .map(|(label, vals)| RegionSummary {
            label,
            stats: summarize(vals),
        })
        .collect();
    summaries.sort_by_key(|r| r.label);

    Ok(summaries)
}
