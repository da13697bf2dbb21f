//! K-means clustering of grid cells
//!
//! Centroid-based zoning by iteratively partitioning valid cells into k
//! groups over the standardized feature space. Cluster ids in the result
//! are ordered by ascending mean raw value — a contract callers may rely
//! on, implemented as a deterministic relabeling step after the fit.

use serde::Serialize;
use verdis_core::{Error, Grid, Result};

use crate::maybe_rayon::*;

use super::features::{build_features, cluster_stats, scatter_labels, ClusterStats, FeatureSet};

/// Parameters for K-means clustering
#[derive(Debug, Clone)]
pub struct KmeansParams {
    /// Number of clusters (must be at least 1)
    pub k: usize,
    /// Whether to fuse normalized spatial position into the features
    pub include_coords: bool,
    /// Maximum Lloyd iterations (default: 100)
    pub max_iterations: usize,
    /// Stop when no centroid moves further than this (default: 0.001)
    pub convergence: f64,
}

impl Default for KmeansParams {
    fn default() -> Self {
        Self {
            k: 5,
            include_coords: true,
            max_iterations: 100,
            convergence: 0.001,
        }
    }
}

/// Result of K-means clustering
#[derive(Debug, Clone)]
pub struct KmeansResult {
    /// Cluster id per cell (NaN where the source cell was invalid).
    /// Ids are contiguous `0..k`, ordered by ascending mean raw value.
    pub assignment: Grid<f64>,
    /// Per-cluster statistics, indexed by final cluster id
    pub clusters: Vec<ClusterStats>,
    /// Sum of squared sample-to-centroid distances in feature space
    pub inertia: f64,
    /// Final centroids in the standardized feature space, in final id order
    pub centroids: Vec<Vec<f64>>,
}

/// Serializable view of the cluster report (assignment grid excluded)
#[derive(Debug, Clone, Serialize)]
pub struct KmeansReport<'a> {
    pub clusters: &'a [ClusterStats],
    pub inertia: f64,
}

impl KmeansResult {
    /// Borrow the per-cluster report for serialization
    pub fn report(&self) -> KmeansReport<'_> {
        KmeansReport {
            clusters: &self.clusters,
            inertia: self.inertia,
        }
    }
}

/// K-means clustering over the valid cells of a grid.
///
/// Returns `Ok(None)` when the grid holds fewer valid cells than `k`.
/// Initialization is deterministic: samples sorted by raw value, evenly
/// spaced picks — repeated runs on the same grid give the same zoning.
///
/// # Arguments
/// * `grid` - Input surface
/// * `params` - Clustering parameters
pub fn kmeans(grid: &Grid<f64>, params: KmeansParams) -> Result<Option<KmeansResult>> {
    if params.k == 0 {
        return Err(Error::InvalidParameter {
            name: "k",
            value: "0".into(),
            reason: "k-means requires at least one cluster".into(),
        });
    }

    let features = build_features(grid, params.include_coords);
    let n = features.len();
    if n < params.k {
        return Ok(None);
    }

    let k = params.k;
    let mut centroids = initialize_centroids(&features, k);
    let mut labels = vec![0usize; n];

    for _iter in 0..params.max_iterations {
        // Assignment step: nearest centroid per sample
        labels = (0..n)
            .into_par_iter()
            .map(|i| nearest_centroid(&features, i, &centroids))
            .collect();

        // Update step: recompute centroids
        let mut sums = vec![vec![0.0; features.n_features]; k];
        let mut counts = vec![0usize; k];
        for (i, &label) in labels.iter().enumerate() {
            counts[label] += 1;
            for (s, v) in sums[label].iter_mut().zip(features.sample(i)) {
                *s += v;
            }
        }

        let mut max_shift = 0.0_f64;
        for cluster in 0..k {
            if counts[cluster] == 0 {
                continue; // keep the empty cluster's centroid in place
            }
            let count = counts[cluster] as f64;
            let mut shift_sq = 0.0;
            for (c, s) in centroids[cluster].iter_mut().zip(&sums[cluster]) {
                let updated = s / count;
                shift_sq += (updated - *c) * (updated - *c);
                *c = updated;
            }
            max_shift = max_shift.max(shift_sq.sqrt());
        }

        if max_shift < params.convergence {
            break;
        }
    }

    let inertia: f64 = (0..n)
        .map(|i| features.distance_sq(i, &centroids[labels[i]]))
        .sum();

    // Relabel by ascending mean raw value
    let mut member_values: Vec<Vec<f64>> = vec![Vec::new(); k];
    for (i, &label) in labels.iter().enumerate() {
        member_values[label].push(features.raw_values[i]);
    }

    let mut order: Vec<usize> = (0..k).collect();
    order.sort_by(|&a, &b| {
        let mean = |vals: &[f64]| {
            if vals.is_empty() {
                f64::INFINITY // empty clusters sort last
            } else {
                vals.iter().sum::<f64>() / vals.len() as f64
            }
        };
        mean(&member_values[a])
            .partial_cmp(&mean(&member_values[b]))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut remap = vec![0usize; k];
    for (new_id, &old_id) in order.iter().enumerate() {
        remap[old_id] = new_id;
    }

    let final_labels: Vec<i32> = labels.iter().map(|&l| remap[l] as i32).collect();
    let clusters: Vec<ClusterStats> = order
        .iter()
        .enumerate()
        .map(|(new_id, &old_id)| cluster_stats(new_id as i32, &member_values[old_id], n))
        .collect();
    let centroids: Vec<Vec<f64>> = order.iter().map(|&old_id| centroids[old_id].clone()).collect();

    Ok(Some(KmeansResult {
        assignment: scatter_labels(grid, &features, &final_labels),
        clusters,
        inertia,
        centroids,
    }))
}

/// Deterministic initialization: samples sorted by raw value, evenly spaced picks
fn initialize_centroids(features: &FeatureSet, k: usize) -> Vec<Vec<f64>> {
    let n = features.len();
    let mut by_value: Vec<usize> = (0..n).collect();
    by_value.sort_by(|&a, &b| {
        features.raw_values[a]
            .partial_cmp(&features.raw_values[b])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    (0..k)
        .map(|i| {
            let idx = (i * n / k) + n / (2 * k);
            features.sample(by_value[idx.min(n - 1)]).to_vec()
        })
        .collect()
}

fn nearest_centroid(features: &FeatureSet, i: usize, centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (cluster, centroid) in centroids.iter().enumerate() {
        let dist = features.distance_sq(i, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = cluster;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated value groups, top and bottom half
    fn bimodal_grid() -> Grid<f64> {
        let mut grid = Grid::new(10, 10);
        for row in 0..10 {
            for col in 0..10 {
                let v = if row < 5 { 10.0 } else { 100.0 };
                // small within-group spread
                grid.set(row, col, v + (col as f64) * 0.01).unwrap();
            }
        }
        grid
    }

    #[test]
    fn test_kmeans_separates_groups() {
        let grid = bimodal_grid();
        let result = kmeans(
            &grid,
            KmeansParams {
                k: 2,
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        let top = result.assignment.get(0, 0).unwrap();
        let bottom = result.assignment.get(9, 0).unwrap();
        assert_ne!(top, bottom);

        // Ids ordered by ascending mean: cluster 0 is the low group
        assert_eq!(top, 0.0);
        assert_eq!(bottom, 1.0);
        assert!(result.clusters[0].mean.unwrap() < result.clusters[1].mean.unwrap());
    }

    #[test]
    fn test_cluster_ids_ordered_by_mean() {
        let values: Vec<f64> = (0..64).map(|v| v as f64).collect();
        let grid = Grid::from_vec(values, 8, 8).unwrap();

        let result = kmeans(
            &grid,
            KmeansParams {
                k: 4,
                include_coords: false,
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        for pair in result.clusters.windows(2) {
            assert!(pair[0].mean.unwrap() <= pair[1].mean.unwrap());
        }
        assert_eq!(result.clusters.len(), 4);
    }

    #[test]
    fn test_counts_cover_all_valid_cells() {
        let mut grid = bimodal_grid();
        grid.set(0, 0, f64::NAN).unwrap();
        grid.set(7, 7, f64::NAN).unwrap();

        let result = kmeans(
            &grid,
            KmeansParams {
                k: 3,
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        let total: usize = result.clusters.iter().map(|c| c.n_pixels).sum();
        assert_eq!(total, 98);

        // Every valid cell carries an id in [0, k)
        for (_, _, label) in result.assignment.valid_cells() {
            assert!((0.0..3.0).contains(&label));
        }
        assert!(result.assignment.get(0, 0).unwrap().is_nan());
    }

    #[test]
    fn test_too_few_cells_is_no_result() {
        let mut grid = Grid::filled(2, 2, f64::NAN);
        grid.set(0, 0, 1.0).unwrap();
        grid.set(1, 1, 2.0).unwrap();

        let result = kmeans(
            &grid,
            KmeansParams {
                k: 5,
                ..Default::default()
            },
        )
        .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_k_zero_is_error() {
        let grid = Grid::filled(3, 3, 1.0);
        assert!(kmeans(
            &grid,
            KmeansParams {
                k: 0,
                ..Default::default()
            }
        )
        .is_err());
    }

    #[test]
    fn test_k_one_accepted() {
        let grid = Grid::filled(3, 3, 2.0);
        let result = kmeans(
            &grid,
            KmeansParams {
                k: 1,
                ..Default::default()
            },
        )
        .unwrap()
        .unwrap();

        assert_eq!(result.clusters.len(), 1);
        assert_eq!(result.clusters[0].n_pixels, 9);
        assert!((result.clusters[0].pct - 100.0).abs() < 1e-12);
    }
}
