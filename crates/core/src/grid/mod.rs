//! Grid data structures and operations

mod element;
mod geotransform;
#[allow(clippy::module_inception)]
mod grid;
mod neighborhood;

pub use element::GridElement;
pub use geotransform::GeoTransform;
pub use grid::Grid;
pub use neighborhood::Connectivity;
