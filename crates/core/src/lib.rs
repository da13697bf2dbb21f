//! # Verdis Core
//!
//! Core types for the Verdis spatial statistics engine.
//!
//! This crate provides:
//! - `Grid<T>`: Generic rectangular grid with a NaN/nodata convention
//! - `GeoTransform`: Affine transformation for georeferencing
//! - `Connectivity`: Queen/rook neighborhood definitions
//! - The `Algorithm` trait for a consistent analysis API
//!
//! Callers are expected to hand this engine already-masked grids:
//! rectangular arrays of finite doubles where cells outside the area of
//! interest carry NaN (or the configured nodata value). Raster I/O,
//! polygon masking and CRS handling live with collaborators.

pub mod error;
pub mod grid;

pub use error::{Error, Result};
pub use grid::{Connectivity, GeoTransform, Grid, GridElement};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::grid::{Connectivity, GeoTransform, Grid, GridElement};
    pub use crate::Algorithm;
}

/// Core trait for analyses in Verdis.
///
/// Analyses are pure functions that transform input data according to
/// parameters; nothing is cached or mutated across calls.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
