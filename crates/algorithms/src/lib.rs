//! # Verdis Algorithms
//!
//! Spatial statistics for gridded vegetation-index surfaces.
//!
//! ## Available Analysis Categories
//!
//! - **statistics**: Descriptive, regional and autocorrelation statistics
//! - **smoothing**: NaN-aware Gaussian denoising
//! - **hotspot**: Hotspot/coldspot classification under threshold policies
//! - **regions**: Connected-component labeling of boolean masks
//! - **clustering**: K-means and DBSCAN zoning with spatial features
//! - **partition**: Quadrant tiling with per-tile statistics
//! - **change**: Temporal differences between two time-aligned surfaces
//!
//! Every analysis is a pure, synchronous function: inputs are read-only,
//! outputs are freshly allocated, and empty or degenerate data is reported
//! as `Ok(None)` rather than an error.

pub mod change;
pub mod clustering;
pub mod hotspot;
pub mod partition;
pub mod regions;
pub mod smoothing;
pub mod statistics;

pub(crate) mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::change::{change_velocity, temporal_difference, DiffResult};
    pub use crate::clustering::{
        dbscan, kmeans, ClusterStats, DbscanParams, DbscanResult, KmeansParams, KmeansResult,
    };
    pub use crate::hotspot::{detect_hotspots, HotspotResult, ThresholdMethod};
    pub use crate::partition::{quadrant_statistics, QuadrantPartition, QuadrantStats};
    pub use crate::regions::{label_regions, RegionInfo, RegionLabeling};
    pub use crate::smoothing::{gaussian_smooth, GaussianSmooth, SmoothParams};
    pub use crate::statistics::{
        extended_statistics, grid_statistics, heterogeneity, morans_i, region_statistics,
        ExtendedSummary, GridSummary, Heterogeneity, HeterogeneityClass, Interpretation,
        MoranResult, RegionSummary,
    };
    pub use verdis_core::prelude::*;
}
