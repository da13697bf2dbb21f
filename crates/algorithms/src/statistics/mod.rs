//! Statistical analysis for gridded surfaces
//!
//! - **descriptive**: Summary statistics and heterogeneity rating
//! - **regional**: Statistics per labeled region
//! - **autocorrelation**: Global spatial autocorrelation (Moran's I)

pub mod autocorrelation;
pub mod descriptive;
pub mod regional;

pub use autocorrelation::{morans_i, Interpretation, MoranResult};
pub use descriptive::{
    extended_statistics, grid_statistics, heterogeneity, percentile, ExtendedSummary,
    GridSummary, Heterogeneity, HeterogeneityClass,
};
pub use regional::{region_statistics, RegionSummary};
