//! DBSCAN clustering of grid cells
//!
//! Density-based zoning: grows clusters from core samples whose
//! eps-neighborhood holds at least `min_samples` points, and labels the
//! rest noise. Unlike the centroid variant, cluster ids are not rankable
//! by value and keep their discovery order.

use serde::Serialize;
use verdis_core::{Error, Grid, Result};

use super::features::{build_features, cluster_stats, scatter_labels, ClusterStats, FeatureSet};

/// Noise label in the assignment grid and 1-D labels
pub const NOISE: i32 = -1;

/// Sentinel for samples not yet visited during the scan
const UNLABELED: i32 = -2;

/// Parameters for DBSCAN clustering
#[derive(Debug, Clone)]
pub struct DbscanParams {
    /// Neighborhood radius in the standardized feature space (must be > 0)
    pub eps: f64,
    /// Minimum samples in a neighborhood to form a core point (must be ≥ 1)
    pub min_samples: usize,
    /// Whether to fuse normalized spatial position into the features
    pub include_coords: bool,
}

impl Default for DbscanParams {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 10,
            include_coords: true,
        }
    }
}

/// Result of DBSCAN clustering
#[derive(Debug, Clone)]
pub struct DbscanResult {
    /// Cluster id per cell: `0..n_clusters`, `-1` for noise,
    /// NaN where the source cell was invalid
    pub assignment: Grid<f64>,
    /// Number of clusters found, noise excluded
    pub n_clusters: usize,
    pub n_noise: usize,
    /// Share of valid cells labeled noise, in percent
    pub pct_noise: f64,
    /// Per-cluster statistics in discovery order (noise not included)
    pub clusters: Vec<ClusterStats>,
}

/// Serializable view of the cluster report (assignment grid excluded)
#[derive(Debug, Clone, Serialize)]
pub struct DbscanReport<'a> {
    pub n_clusters: usize,
    pub n_noise: usize,
    pub pct_noise: f64,
    pub clusters: &'a [ClusterStats],
}

impl DbscanResult {
    /// Borrow the per-cluster report for serialization
    pub fn report(&self) -> DbscanReport<'_> {
        DbscanReport {
            n_clusters: self.n_clusters,
            n_noise: self.n_noise,
            pct_noise: self.pct_noise,
            clusters: &self.clusters,
        }
    }
}

/// DBSCAN clustering over the valid cells of a grid.
///
/// Returns `Ok(None)` when the grid holds fewer valid cells than
/// `min_samples`. Noise cells keep the reserved label `-1`; it is not a
/// real cluster and is excluded from `n_clusters` and the per-cluster
/// statistics.
///
/// # Arguments
/// * `grid` - Input surface
/// * `params` - Clustering parameters
pub fn dbscan(grid: &Grid<f64>, params: DbscanParams) -> Result<Option<DbscanResult>> {
    if params.eps <= 0.0 || !params.eps.is_finite() {
        return Err(Error::InvalidParameter {
            name: "eps",
            value: params.eps.to_string(),
            reason: "must be a positive finite number".into(),
        });
    }
    if params.min_samples == 0 {
        return Err(Error::InvalidParameter {
            name: "min_samples",
            value: "0".into(),
            reason: "a core point needs at least one sample".into(),
        });
    }

    let features = build_features(grid, params.include_coords);
    let n = features.len();
    if n < params.min_samples {
        return Ok(None);
    }

    let eps_sq = params.eps * params.eps;
    let mut labels = vec![UNLABELED; n];
    let mut cluster_id: i32 = 0;

    for i in 0..n {
        if labels[i] != UNLABELED {
            continue;
        }

        let mut neighbors = region_query(&features, i, eps_sq);
        if neighbors.len() < params.min_samples {
            labels[i] = NOISE; // may still join a cluster later as a border point
            continue;
        }

        expand_cluster(
            &features,
            &mut labels,
            i,
            &mut neighbors,
            cluster_id,
            eps_sq,
            params.min_samples,
        );
        cluster_id += 1;
    }

    let n_clusters = cluster_id as usize;
    let n_noise = labels.iter().filter(|&&l| l == NOISE).count();

    let mut member_values: Vec<Vec<f64>> = vec![Vec::new(); n_clusters];
    for (i, &label) in labels.iter().enumerate() {
        if label >= 0 {
            member_values[label as usize].push(features.raw_values[i]);
        }
    }

    let clusters: Vec<ClusterStats> = member_values
        .iter()
        .enumerate()
        .map(|(id, values)| cluster_stats(id as i32, values, n))
        .collect();

    Ok(Some(DbscanResult {
        assignment: scatter_labels(grid, &features, &labels),
        n_clusters,
        n_noise,
        pct_noise: n_noise as f64 / n as f64 * 100.0,
        clusters,
    }))
}

/// Indices of all samples within eps of sample `i` (including `i` itself)
fn region_query(features: &FeatureSet, i: usize, eps_sq: f64) -> Vec<usize> {
    let point = features.sample(i);
    (0..features.len())
        .filter(|&j| features.distance_sq(j, point) <= eps_sq)
        .collect()
}

/// Grow a cluster outward from core sample `point`
fn expand_cluster(
    features: &FeatureSet,
    labels: &mut [i32],
    point: usize,
    neighbors: &mut Vec<usize>,
    cluster_id: i32,
    eps_sq: f64,
    min_samples: usize,
) {
    labels[point] = cluster_id;

    let mut i = 0;
    while i < neighbors.len() {
        let neighbor = neighbors[i];

        if labels[neighbor] == NOISE {
            // Border point: previously noise, reachable from a core point
            labels[neighbor] = cluster_id;
        } else if labels[neighbor] == UNLABELED {
            labels[neighbor] = cluster_id;

            let reachable = region_query(features, neighbor, eps_sq);
            if reachable.len() >= min_samples {
                for j in reachable {
                    if labels[j] == UNLABELED || labels[j] == NOISE {
                        if !neighbors.contains(&j) {
                            neighbors.push(j);
                        }
                    }
                }
            }
        }

        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two dense value groups far apart, plus one extreme outlier
    fn grouped_grid() -> Grid<f64> {
        let mut grid = Grid::new(6, 6);
        for row in 0..6 {
            for col in 0..6 {
                let v = if row < 3 { 1.0 } else { 50.0 };
                grid.set(row, col, v + (row * 6 + col) as f64 * 1e-4).unwrap();
            }
        }
        grid.set(0, 5, 1000.0).unwrap(); // isolated outlier
        grid
    }

    #[test]
    fn test_dbscan_finds_groups_and_noise() {
        let grid = grouped_grid();
        let result = dbscan(
            &grid,
            DbscanParams {
                eps: 0.1,
                min_samples: 4,
                include_coords: false,
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(result.n_clusters, 2);
        assert_eq!(result.n_noise, 1);
        assert_eq!(result.assignment.get(0, 5).unwrap(), -1.0);

        let total: usize = result.clusters.iter().map(|c| c.n_pixels).sum();
        assert_eq!(total + result.n_noise, 36);
    }

    #[test]
    fn test_cluster_ids_keep_discovery_order() {
        let grid = grouped_grid();
        let result = dbscan(
            &grid,
            DbscanParams {
                eps: 0.1,
                min_samples: 4,
                include_coords: false,
            },
        )
        .unwrap()
        .unwrap();

        // Row-major scan meets the low group first: no reordering by value
        assert_eq!(result.assignment.get(0, 0).unwrap(), 0.0);
        assert_eq!(result.assignment.get(5, 5).unwrap(), 1.0);
    }

    #[test]
    fn test_too_few_samples_is_no_result() {
        let mut grid = Grid::filled(3, 3, f64::NAN);
        grid.set(0, 0, 1.0).unwrap();
        grid.set(1, 1, 2.0).unwrap();

        let result = dbscan(
            &grid,
            DbscanParams {
                min_samples: 5,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_parameter_validation() {
        let grid = Grid::filled(3, 3, 1.0);
        assert!(dbscan(
            &grid,
            DbscanParams {
                eps: 0.0,
                ..Default::default()
            }
        )
        .is_err());
        assert!(dbscan(
            &grid,
            DbscanParams {
                min_samples: 0,
                ..Default::default()
            }
        )
        .is_err());
    }

    #[test]
    fn test_single_dense_blob_no_noise() {
        let grid = Grid::filled(4, 4, 3.0);
        let result = dbscan(
            &grid,
            DbscanParams {
                eps: 0.5,
                min_samples: 3,
                include_coords: false,
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(result.n_clusters, 1);
        assert_eq!(result.n_noise, 0);
        assert_eq!(result.clusters[0].n_pixels, 16);
    }
}
