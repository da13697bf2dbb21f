//! Feature construction shared by the clustering algorithms
//!
//! Each valid cell becomes a sample: `[value]` alone, or
//! `[value, col / cols, row / rows]` when spatial coordinates are
//! requested. Features are then standardized to zero mean / unit variance
//! per feature — raw pixel coordinates and index-scale value magnitudes
//! are not comparable without it, so standardization is not optional.

use serde::Serialize;
use verdis_core::Grid;

/// Samples extracted from the valid cells of a grid
#[derive(Debug, Clone)]
pub(crate) struct FeatureSet {
    /// (row, col) of each sample, aligned with `raw_values` and `data`
    pub cells: Vec<(usize, usize)>,
    /// Raw cell value of each sample
    pub raw_values: Vec<f64>,
    /// Standardized feature matrix, row-major with `n_features` stride
    pub data: Vec<f64>,
    pub n_features: usize,
}

impl FeatureSet {
    /// Number of samples
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Feature vector of sample `i`
    pub fn sample(&self, i: usize) -> &[f64] {
        &self.data[i * self.n_features..(i + 1) * self.n_features]
    }

    /// Squared euclidean distance between sample `i` and a point
    pub fn distance_sq(&self, i: usize, point: &[f64]) -> f64 {
        self.sample(i)
            .iter()
            .zip(point)
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

/// Build the standardized feature set of a grid's valid cells
pub(crate) fn build_features(grid: &Grid<f64>, include_coords: bool) -> FeatureSet {
    let (rows, cols) = grid.shape();
    let n_features = if include_coords { 3 } else { 1 };

    let mut cells = Vec::new();
    let mut raw_values = Vec::new();
    let mut data = Vec::new();

    for (row, col, value) in grid.valid_cells() {
        cells.push((row, col));
        raw_values.push(value);

        data.push(value);
        if include_coords {
            data.push(col as f64 / cols as f64);
            data.push(row as f64 / rows as f64);
        }
    }

    standardize(&mut data, n_features);

    FeatureSet {
        cells,
        raw_values,
        data,
        n_features,
    }
}

/// Standardize each feature column to zero mean and unit variance.
///
/// A zero-variance column is left centered (divisor 1), the scaler
/// convention of the source system.
fn standardize(data: &mut [f64], n_features: usize) {
    let n = data.len() / n_features.max(1);
    if n == 0 {
        return;
    }

    for feature in 0..n_features {
        let mut sum = 0.0;
        for i in 0..n {
            sum += data[i * n_features + feature];
        }
        let mean = sum / n as f64;

        let mut var = 0.0;
        for i in 0..n {
            let d = data[i * n_features + feature] - mean;
            var += d * d;
        }
        let std = (var / n as f64).sqrt();
        let divisor = if std > 0.0 { std } else { 1.0 };

        for i in 0..n {
            let v = &mut data[i * n_features + feature];
            *v = (*v - mean) / divisor;
        }
    }
}

/// Per-cluster statistics over the raw cell values
#[derive(Debug, Clone, Serialize)]
pub struct ClusterStats {
    /// Cluster id as written into the assignment grid
    pub cluster: i32,
    pub n_pixels: usize,
    /// Share of the grid's valid cells, in percent
    pub pct: f64,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Compute [`ClusterStats`] for one cluster id from its member values
pub(crate) fn cluster_stats(cluster: i32, members: &[f64], n_total: usize) -> ClusterStats {
    let n = members.len();
    if n == 0 {
        return ClusterStats {
            cluster,
            n_pixels: 0,
            pct: 0.0,
            mean: None,
            std: None,
            min: None,
            max: None,
        };
    }

    let mean = members.iter().sum::<f64>() / n as f64;
    let var = members.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;
    let min = members.iter().copied().fold(f64::INFINITY, f64::min);
    let max = members.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    ClusterStats {
        cluster,
        n_pixels: n,
        pct: n as f64 / n_total as f64 * 100.0,
        mean: Some(mean),
        std: Some(var.sqrt()),
        min: Some(min),
        max: Some(max),
    }
}

/// Scatter 1-D labels back to the (row, col) positions of the samples.
///
/// Cells that produced no sample stay NaN.
pub(crate) fn scatter_labels(grid: &Grid<f64>, features: &FeatureSet, labels: &[i32]) -> Grid<f64> {
    let mut assignment = grid.with_same_meta::<f64>();
    assignment.set_nodata(Some(f64::NAN));
    assignment.data_mut().fill(f64::NAN);

    for (&(row, col), &label) in features.cells.iter().zip(labels) {
        assignment.data_mut()[(row, col)] = label as f64;
    }

    assignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_features_standardized() {
        let grid = Grid::from_vec(vec![1.0, 2.0, 3.0, 4.0], 2, 2).unwrap();
        let features = build_features(&grid, true);

        assert_eq!(features.len(), 4);
        assert_eq!(features.n_features, 3);

        // Every feature column has zero mean and unit variance
        for feature in 0..3 {
            let column: Vec<f64> = (0..4).map(|i| features.sample(i)[feature]).collect();
            let mean = column.iter().sum::<f64>() / 4.0;
            let var = column.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / 4.0;
            assert!(mean.abs() < 1e-12, "feature {feature} mean {mean}");
            assert!((var - 1.0).abs() < 1e-12, "feature {feature} var {var}");
        }
    }

    #[test]
    fn test_constant_feature_left_centered() {
        let grid = Grid::filled(2, 2, 7.0);
        let features = build_features(&grid, false);

        for i in 0..4 {
            assert!(features.sample(i)[0].abs() < 1e-12);
        }
    }

    #[test]
    fn test_nan_cells_excluded() {
        let mut grid = Grid::filled(2, 2, 1.0);
        grid.set(0, 1, f64::NAN).unwrap();

        let features = build_features(&grid, true);
        assert_eq!(features.len(), 3);
        assert!(!features.cells.contains(&(0, 1)));
    }

    #[test]
    fn test_scatter_labels() {
        let mut grid = Grid::filled(2, 2, 1.0);
        grid.set(1, 1, f64::NAN).unwrap();

        let features = build_features(&grid, false);
        let assignment = scatter_labels(&grid, &features, &[0, 1, 2]);

        assert_eq!(assignment.get(0, 0).unwrap(), 0.0);
        assert_eq!(assignment.get(0, 1).unwrap(), 1.0);
        assert_eq!(assignment.get(1, 0).unwrap(), 2.0);
        assert!(assignment.get(1, 1).unwrap().is_nan());
    }
}
