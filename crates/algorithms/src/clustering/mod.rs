//! Spatial clustering of grid cells
//!
//! Two zoning strategies over a shared feature pipeline:
//! - **kmeans**: Centroid-based partition into k groups, ids ordered by
//!   ascending mean value
//! - **dbscan**: Density-based clusters with a reserved noise label
//!
//! Both can fuse the cell value with its normalized spatial position, so
//! zones are coherent in space as well as in value.

mod dbscan;
mod features;
mod kmeans;

pub use dbscan::{dbscan, DbscanParams, DbscanReport, DbscanResult, NOISE};
pub use features::ClusterStats;
pub use kmeans::{kmeans, KmeansParams, KmeansReport, KmeansResult};
