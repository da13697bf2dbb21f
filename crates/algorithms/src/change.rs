//! Temporal change analysis between two time-aligned surfaces
//!
//! Computes the cell-wise deviation of a later surface from an earlier
//! one, classifies each cell's change magnitude against a threshold
//! derived from the difference itself, and reports aggregate change
//! statistics. A velocity variant scales the difference by elapsed time.

use ndarray::Array2;
use serde::Serialize;
use verdis_core::{Error, Grid, Result};

use crate::maybe_rayon::*;
use crate::statistics::percentile;

/// Result of a temporal difference analysis.
///
/// The three category masks are disjoint, false wherever the difference is
/// invalid, and together cover exactly the cells valid in both inputs.
#[derive(Debug, Clone)]
pub struct DiffResult {
    /// Cell-wise `later - earlier`; valid only where both inputs are
    pub diff: Grid<f64>,
    /// Classification threshold, `0.5 * std` of the valid differences
    pub threshold: f64,
    /// Cells with `diff > threshold`
    pub increase_strong: Array2<bool>,
    /// Cells with `diff < -threshold`
    pub decrease_strong: Array2<bool>,
    /// Cells with `|diff| <= threshold`
    pub no_change: Array2<bool>,
    pub n_valid: usize,
    pub n_increase: usize,
    pub n_decrease: usize,
    pub n_no_change: usize,
    pub pct_increase: f64,
    pub pct_decrease: f64,
    pub pct_no_change: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Serializable view of the change report (grids and masks excluded)
#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    pub threshold: f64,
    pub n_valid: usize,
    pub n_increase: usize,
    pub n_decrease: usize,
    pub n_no_change: usize,
    pub pct_increase: f64,
    pub pct_decrease: f64,
    pub pct_no_change: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl DiffResult {
    /// Copy out the aggregate report for serialization
    pub fn report(&self) -> DiffReport {
        DiffReport {
            threshold: self.threshold,
            n_valid: self.n_valid,
            n_increase: self.n_increase,
            n_decrease: self.n_decrease,
            n_no_change: self.n_no_change,
            pct_increase: self.pct_increase,
            pct_decrease: self.pct_decrease,
            pct_no_change: self.pct_no_change,
            mean: self.mean,
            median: self.median,
            std: self.std,
            min: self.min,
            max: self.max,
        }
    }
}

/// Compute and classify the difference between two time-aligned surfaces.
///
/// `diff = later - earlier`, cell-wise; a diff cell is valid only where
/// both inputs are. The classification threshold is half the population
/// std of the valid differences, so "strong" change scales with how much
/// the surface actually moved. Identical grids give a zero threshold and
/// every valid cell lands in `no_change`.
///
/// Returns `Ok(None)` when no cell is valid in both inputs.
///
/// # Arguments
/// * `earlier` - Surface at the earlier date
/// * `later` - Surface at the later date, same shape
pub fn temporal_difference(
    earlier: &Grid<f64>,
    later: &Grid<f64>,
) -> Result<Option<DiffResult>> {
    let (rows, cols) = earlier.shape();
    if later.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: later.rows(),
            ac: later.cols(),
        });
    }

    let diff_data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let a = unsafe { earlier.get_unchecked(row, col) };
                let b = unsafe { later.get_unchecked(row, col) };
                if a.is_finite()
                    && b.is_finite()
                    && !earlier.is_nodata(a)
                    && !later.is_nodata(b)
                {
                    *out = b - a;
                }
            }
            row_data
        })
        .collect();

    let mut valid: Vec<f64> = diff_data.iter().copied().filter(|v| !v.is_nan()).collect();
    let n_valid = valid.len();
    if n_valid == 0 {
        return Ok(None);
    }

    let mean = valid.iter().sum::<f64>() / n_valid as f64;
    let var = valid.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n_valid as f64;
    let std = var.sqrt();
    let threshold = 0.5 * std;

    valid.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = percentile(&valid, 50.0);
    let min = valid[0];
    let max = valid[n_valid - 1];

    let mut increase_strong = Array2::from_elem((rows, cols), false);
    let mut decrease_strong = Array2::from_elem((rows, cols), false);
    let mut no_change = Array2::from_elem((rows, cols), false);
    let mut n_increase = 0usize;
    let mut n_decrease = 0usize;
    let mut n_no_change = 0usize;

    for row in 0..rows {
        for col in 0..cols {
            let d = diff_data[row * cols + col];
            if d.is_nan() {
                continue;
            }
            if d > threshold {
                increase_strong[(row, col)] = true;
                n_increase += 1;
            } else if d < -threshold {
                decrease_strong[(row, col)] = true;
                n_decrease += 1;
            } else {
                no_change[(row, col)] = true;
                n_no_change += 1;
            }
        }
    }

    let mut diff = earlier.with_same_meta::<f64>();
    diff.set_nodata(Some(f64::NAN));
    *diff.data_mut() = Array2::from_shape_vec((rows, cols), diff_data)
        .map_err(|e| Error::Other(e.to_string()))?;

    let pct = |n: usize| n as f64 / n_valid as f64 * 100.0;

    Ok(Some(DiffResult {
        diff,
        threshold,
        increase_strong,
        decrease_strong,
        no_change,
        n_valid,
        n_increase,
        n_decrease,
        n_no_change,
        pct_increase: pct(n_increase),
        pct_decrease: pct(n_decrease),
        pct_no_change: pct(n_no_change),
        mean,
        median,
        std,
        min,
        max,
    }))
}

/// Rate of change per day between two surfaces.
///
/// `velocity = (later - earlier) / days`, cell-wise; invalid where either
/// input is. Zero elapsed days yields an all-zero grid rather than a
/// failure, so a caller looping over image pairs need not special-case
/// same-day acquisitions.
///
/// # Arguments
/// * `earlier` - Surface at the earlier date
/// * `later` - Surface at the later date, same shape
/// * `days` - Elapsed days between the two
pub fn change_velocity(earlier: &Grid<f64>, later: &Grid<f64>, days: f64) -> Result<Grid<f64>> {
    let (rows, cols) = earlier.shape();
    if later.shape() != (rows, cols) {
        return Err(Error::SizeMismatch {
            er: rows,
            ec: cols,
            ar: later.rows(),
            ac: later.cols(),
        });
    }

    let mut velocity = earlier.with_same_meta::<f64>();
    velocity.set_nodata(Some(f64::NAN));

    if days == 0.0 {
        return Ok(velocity); // all zeros
    }

    let data = velocity.data_mut();
    for row in 0..rows {
        for col in 0..cols {
            let a = unsafe { earlier.get_unchecked(row, col) };
            let b = unsafe { later.get_unchecked(row, col) };
            data[(row, col)] = if a.is_finite()
                && b.is_finite()
                && !earlier.is_nodata(a)
                && !later.is_nodata(b)
            {
                (b - a) / days
            } else {
                f64::NAN
            };
        }
    }

    Ok(velocity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_grid(rows: usize, cols: usize, offset: f64) -> Grid<f64> {
        let values: Vec<f64> = (0..rows * cols).map(|v| v as f64 + offset).collect();
        Grid::from_vec(values, rows, cols).unwrap()
    }

    #[test]
    fn test_identical_grids_all_no_change() {
        let grid = gradient_grid(5, 5, 0.0);
        let result = temporal_difference(&grid, &grid).unwrap().unwrap();

        assert_eq!(result.n_increase, 0);
        assert_eq!(result.n_decrease, 0);
        assert_eq!(result.n_no_change, 25);
        assert!((result.pct_no_change - 100.0).abs() < 1e-12);
        for (_, _, d) in result.diff.valid_cells() {
            assert_eq!(d, 0.0);
        }
    }

    #[test]
    fn test_categories_partition_valid_cells() {
        let mut earlier = gradient_grid(6, 6, 0.0);
        let mut later = gradient_grid(6, 6, 0.0);
        // strong increase in one corner, strong decrease in another
        later.set(0, 0, 500.0).unwrap();
        later.set(5, 5, -500.0).unwrap();
        earlier.set(2, 2, f64::NAN).unwrap();
        later.set(3, 3, f64::NAN).unwrap();

        let result = temporal_difference(&earlier, &later).unwrap().unwrap();

        assert_eq!(result.n_valid, 34);
        assert_eq!(result.n_increase + result.n_decrease + result.n_no_change, 34);
        assert_eq!(result.n_increase, 1);
        assert_eq!(result.n_decrease, 1);

        // masks disjoint and false at invalid cells
        for row in 0..6 {
            for col in 0..6 {
                let flags = [
                    result.increase_strong[(row, col)],
                    result.decrease_strong[(row, col)],
                    result.no_change[(row, col)],
                ];
                assert!(flags.iter().filter(|&&f| f).count() <= 1);
            }
        }
        assert!(!result.increase_strong[(2, 2)]);
        assert!(!result.no_change[(3, 3)]);
    }

    #[test]
    fn test_diff_statistics() {
        let earlier = gradient_grid(4, 4, 0.0);
        let later = gradient_grid(4, 4, 2.0);

        let result = temporal_difference(&earlier, &later).unwrap().unwrap();
        assert!((result.mean - 2.0).abs() < 1e-12);
        assert!((result.median - 2.0).abs() < 1e-12);
        assert!(result.std.abs() < 1e-12);
        assert!((result.min - 2.0).abs() < 1e-12);
        assert!((result.max - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_shape_mismatch() {
        let a: Grid<f64> = Grid::new(3, 3);
        let b: Grid<f64> = Grid::new(4, 3);
        assert!(temporal_difference(&a, &b).is_err());
        assert!(change_velocity(&a, &b, 1.0).is_err());
    }

    #[test]
    fn test_disjoint_validity_is_no_result() {
        let mut a = Grid::filled(2, 2, f64::NAN);
        let mut b = Grid::filled(2, 2, f64::NAN);
        a.set(0, 0, 1.0).unwrap();
        b.set(1, 1, 1.0).unwrap();

        assert!(temporal_difference(&a, &b).unwrap().is_none());
    }

    #[test]
    fn test_velocity() {
        let earlier = gradient_grid(3, 3, 0.0);
        let later = gradient_grid(3, 3, 10.0);

        let velocity = change_velocity(&earlier, &later, 5.0).unwrap();
        for (_, _, v) in velocity.valid_cells() {
            assert!((v - 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_velocity_zero_days_is_zero_grid() {
        let mut earlier = gradient_grid(3, 3, 0.0);
        earlier.set(1, 1, f64::NAN).unwrap();
        let later = gradient_grid(3, 3, 10.0);

        let velocity = change_velocity(&earlier, &later, 0.0).unwrap();
        for row in 0..3 {
            for col in 0..3 {
                assert_eq!(velocity.get(row, col).unwrap(), 0.0);
            }
        }
    }

    #[test]
    fn test_velocity_nan_propagates() {
        let mut earlier = gradient_grid(3, 3, 0.0);
        earlier.set(1, 1, f64::NAN).unwrap();
        let later = gradient_grid(3, 3, 10.0);

        let velocity = change_velocity(&earlier, &later, 2.0).unwrap();
        assert!(velocity.get(1, 1).unwrap().is_nan());
        assert!((velocity.get(0, 0).unwrap() - 5.0).abs() < 1e-12);
    }
}
