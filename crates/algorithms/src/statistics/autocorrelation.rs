//! Spatial autocorrelation for gridded surfaces
//!
//! Global Moran's I: measures whether nearby cells carry similar values
//! more (positive) or less (negative) than expected under spatial
//! randomness, with an analytic significance test.

use serde::Serialize;
use verdis_core::{Connectivity, Grid};

/// Reading of a significant Moran's I result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Interpretation {
    /// Significant positive autocorrelation: similar values group together
    Clustered,
    /// Significant negative autocorrelation: dissimilar values alternate
    Dispersed,
    /// No significant autocorrelation
    None,
}

/// Result of a global Moran's I computation.
///
/// Immutable once computed; one record per grid + neighborhood choice.
#[derive(Debug, Clone, Serialize)]
pub struct MoranResult {
    /// Moran's I statistic (roughly -1 to +1)
    pub moran_i: f64,
    /// Expected I under spatial randomness, `-1/(N-1)`
    pub expected_i: f64,
    /// Z-score under the simplified variance `1/(N-1)`
    pub z_score: f64,
    /// Two-tailed p-value from the standard normal CDF
    pub p_value: f64,
    /// Number of valid cells that entered the statistic
    pub n_valid_cells: usize,
    /// Whether `p_value < 0.05`
    pub significant: bool,
    pub interpretation: Interpretation,
}

/// Compute global Moran's I for a grid.
///
/// Enumerates every valid cell's neighbors under the chosen adjacency
/// (queen = `Connectivity::Eight`, rook = `Connectivity::Four`), skipping
/// out-of-bounds and invalid neighbors, and accumulates
///
/// ```text
/// I = (N / W) * (sum_ij d_i * d_j) / (sum_i d_i^2)
/// ```
///
/// where `d` are deviations from the global mean and `W` counts the
/// neighbor pairs. The variance of the significance test is the simplified
/// `1/(N-1)`; see DESIGN.md for why the full randomization variance is
/// deliberately not used.
///
/// Returns `None` when no valid neighbor pair exists or the surface is
/// constant (zero denominator) — a degenerate surface, not a caller error.
pub fn morans_i(grid: &Grid<f64>, neighborhood: Connectivity) -> Option<MoranResult> {
    let (rows, cols) = grid.shape();
    let offsets = neighborhood.offsets();

    let values: Vec<(usize, usize, f64)> = grid.valid_cells().collect();
    let n = values.len();
    if n < 2 {
        return None;
    }

    let mean = values.iter().map(|&(_, _, v)| v).sum::<f64>() / n as f64;

    // Deviations from the global mean, grid-indexed; NaN marks invalid cells
    let mut deviations = vec![f64::NAN; rows * cols];
    for &(row, col, v) in &values {
        deviations[row * cols + col] = v - mean;
    }

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut w_sum = 0usize;

    for &(row, col, _) in &values {
        let dev_i = deviations[row * cols + col];
        denominator += dev_i * dev_i;

        for &(dr, dc) in offsets {
            let nr = row as isize + dr;
            let nc = col as isize + dc;
            if nr < 0 || nc < 0 || nr as usize >= rows || nc as usize >= cols {
                continue;
            }

            let dev_j = deviations[nr as usize * cols + nc as usize];
            if dev_j.is_nan() {
                continue;
            }

            numerator += dev_i * dev_j;
            w_sum += 1;
        }
    }

    if w_sum == 0 || denominator == 0.0 {
        return None;
    }

    let n_f = n as f64;
    let moran_i = (n_f / w_sum as f64) * (numerator / denominator);
    let expected_i = -1.0 / (n_f - 1.0);

    // Simplified variance; kept from the source so p-values stay comparable
    let variance = 1.0 / (n_f - 1.0);
    let z_score = (moran_i - expected_i) / variance.sqrt();
    let p_value = 2.0 * (1.0 - normal_cdf(z_score.abs()));

    let significant = p_value < 0.05;
    let interpretation = if !significant {
        Interpretation::None
    } else if moran_i > expected_i {
        Interpretation::Clustered
    } else {
        Interpretation::Dispersed
    };

    Some(MoranResult {
        moran_i,
        expected_i,
        z_score,
        p_value,
        n_valid_cells: n,
        significant,
        interpretation,
    })
}

/// Approximate CDF of the standard normal distribution.
/// Abramowitz & Stegun 26.2.17 (error < 7.5e-8).
pub(crate) fn normal_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let t = 1.0 / (1.0 + 0.2316419 * x.abs());
    let d = 0.3989422804014327; // 1/sqrt(2*pi)
    let p = d * (-x * x / 2.0).exp()
        * (t * (0.3193815
            + t * (-0.3565638 + t * (1.781478 + t * (-1.821256 + t * 1.330274)))));

    if x > 0.0 {
        1.0 - p
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_surface_has_no_result() {
        let grid = Grid::filled(10, 10, 5.0);
        assert!(morans_i(&grid, Connectivity::Eight).is_none());
    }

    #[test]
    fn test_clustered_surface_positive_i() {
        // Left half low, right half high: strong spatial clustering
        let mut grid = Grid::new(10, 10);
        for row in 0..10 {
            for col in 0..10 {
                let v = if col < 5 { 0.0 } else { 100.0 };
                grid.set(row, col, v).unwrap();
            }
        }

        let result = morans_i(&grid, Connectivity::Eight).unwrap();
        assert!(
            result.moran_i > 0.5,
            "clustered data should give high I, got {}",
            result.moran_i
        );
        assert_eq!(result.n_valid_cells, 100);
        assert_eq!(result.interpretation, Interpretation::Clustered);
    }

    #[test]
    fn test_checkerboard_rook_negative_i() {
        // 3x3 checkerboard of two alternating values: dispersion under rook
        let mut grid = Grid::new(3, 3);
        for row in 0..3 {
            for col in 0..3 {
                let v = if (row + col) % 2 == 0 { 1.0 } else { 0.0 };
                grid.set(row, col, v).unwrap();
            }
        }

        let result = morans_i(&grid, Connectivity::Four).unwrap();
        assert!(
            result.moran_i < 0.0,
            "checkerboard should disperse, got {}",
            result.moran_i
        );
        assert!(result.moran_i < result.expected_i);
    }

    #[test]
    fn test_isolated_cells_have_no_pairs() {
        // Two valid cells that are not adjacent: W == 0, no result
        let mut grid = Grid::filled(3, 3, f64::NAN);
        grid.set(0, 0, 1.0).unwrap();
        grid.set(2, 2, 2.0).unwrap();

        assert!(morans_i(&grid, Connectivity::Four).is_none());
    }

    #[test]
    fn test_queen_counts_more_pairs_than_rook() {
        let mut grid = Grid::new(4, 4);
        for row in 0..4 {
            for col in 0..4 {
                grid.set(row, col, (row * 4 + col) as f64).unwrap();
            }
        }

        let queen = morans_i(&grid, Connectivity::Eight).unwrap();
        let rook = morans_i(&grid, Connectivity::Four).unwrap();

        // Row-major gradient clusters under both adjacencies
        assert!(queen.moran_i > 0.0);
        assert!(rook.moran_i > 0.0);
    }

    #[test]
    fn test_normal_cdf() {
        assert!((normal_cdf(0.0) - 0.5).abs() < 1e-6);
        assert!((normal_cdf(1.96) - 0.975).abs() < 0.002);
        assert!((normal_cdf(-1.96) - 0.025).abs() < 0.002);
    }
}
