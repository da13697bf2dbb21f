//! NaN-aware Gaussian smoothing
//!
//! Denoises a surface before downstream analysis without letting the
//! missing-data sentinel bleed into valid cells: invalid cells are filled
//! with the grid median for the convolution, then re-masked afterwards.

use ndarray::Array2;
use verdis_core::{Algorithm, Error, Grid, Result};

use crate::maybe_rayon::*;
use crate::statistics::percentile;

/// Parameters for Gaussian smoothing
#[derive(Debug, Clone)]
pub struct SmoothParams {
    /// Standard deviation of the Gaussian kernel, in cell units.
    /// Must be positive. The kernel radius is `4 * sigma` rounded,
    /// matching the usual truncation of scientific convolution filters.
    pub sigma: f64,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self { sigma: 1.0 }
    }
}

/// Apply Gaussian smoothing to a grid.
///
/// Three steps:
/// 1. Fill invalid cells with the grid median — a neutral placeholder that
///    keeps edge effects at the data boundary small.
/// 2. Convolve with a Gaussian kernel of the given sigma (separable
///    passes, reflect boundary).
/// 3. Re-impose NaN at the originally invalid cells.
///
/// A grid with zero valid cells is returned unchanged.
///
/// # Arguments
/// * `grid` - Input surface
/// * `params` - Kernel parameters
pub fn gaussian_smooth(grid: &Grid<f64>, params: SmoothParams) -> Result<Grid<f64>> {
    if params.sigma <= 0.0 || !params.sigma.is_finite() {
        return Err(Error::InvalidParameter {
            name: "sigma",
            value: params.sigma.to_string(),
            reason: "must be a positive finite number".into(),
        });
    }

    let (rows, cols) = grid.shape();
    let mut values = grid.valid_values();
    if values.is_empty() {
        return Ok(grid.clone());
    }

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = percentile(&values, 50.0);

    // Fill invalid cells with the median for the convolution
    let mask = grid.validity_mask();
    let mut filled = Array2::zeros((rows, cols));
    for row in 0..rows {
        for col in 0..cols {
            filled[(row, col)] = if mask[(row, col)] {
                unsafe { grid.get_unchecked(row, col) }
            } else {
                median
            };
        }
    }

    let kernel = gaussian_kernel(params.sigma);
    let horizontal = convolve_rows(&filled, &kernel);
    let transposed = convolve_rows(&horizontal.reversed_axes(), &kernel);
    let smoothed = transposed.reversed_axes();

    // Restore NaN at the originally invalid cells
    let mut output = grid.with_same_meta::<f64>();
    output.set_nodata(Some(f64::NAN));
    let out_data = output.data_mut();
    for row in 0..rows {
        for col in 0..cols {
            out_data[(row, col)] = if mask[(row, col)] {
                smoothed[(row, col)]
            } else {
                f64::NAN
            };
        }
    }

    Ok(output)
}

/// Normalized 1D Gaussian kernel, truncated at `4 * sigma`
fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = (4.0 * sigma + 0.5) as usize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let d = i as f64 - radius as f64;
            (-d * d / two_sigma_sq).exp()
        })
        .collect();

    let sum: f64 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= sum;
    }
    kernel
}

/// Convolve every row with the kernel, reflecting at the boundaries
fn convolve_rows(data: &Array2<f64>, kernel: &[f64]) -> Array2<f64> {
    let (rows, cols) = data.dim();
    let radius = kernel.len() / 2;

    let out: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0.0; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let mut acc = 0.0;
                for (k, &w) in kernel.iter().enumerate() {
                    let idx = col as isize + k as isize - radius as isize;
                    acc += w * data[(row, reflect(idx, cols as isize))];
                }
                *out = acc;
            }
            row_data
        })
        .collect();

    Array2::from_shape_vec((rows, cols), out).expect("row-major convolution output")
}

/// Reflect an index into `[0, n)` (half-sample symmetric: d c b a | a b c d)
fn reflect(mut idx: isize, n: isize) -> usize {
    if n == 1 {
        return 0;
    }
    loop {
        if idx < 0 {
            idx = -idx - 1;
        } else if idx >= n {
            idx = 2 * n - idx - 1;
        } else {
            return idx as usize;
        }
    }
}

/// Gaussian smoothing as an [`Algorithm`]
#[derive(Debug, Clone, Default)]
pub struct GaussianSmooth;

impl Algorithm for GaussianSmooth {
    type Input = Grid<f64>;
    type Output = Grid<f64>;
    type Params = SmoothParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "GaussianSmooth"
    }

    fn description(&self) -> &'static str {
        "NaN-aware Gaussian smoothing of a gridded surface"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        gaussian_smooth(&input, params)
    }
}
