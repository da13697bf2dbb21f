//! Main Grid type

use crate::error::{Error, Result};
use crate::grid::{GeoTransform, GridElement};
use ndarray::{Array2, ArrayView2, ArrayViewMut2};

/// A rectangular grid of cell values with optional geographic metadata.
///
/// `Grid<T>` stores values of type `T` in row-major (row, col) order. For
/// floating point grids, NaN cells mark "no data" (outside the area of
/// interest, a sensor gap, or a filtered value); every analysis excludes
/// them. The shape is fixed for the lifetime of the grid.
///
/// # Example
///
/// ```
/// use verdis_core::Grid;
///
/// let mut grid: Grid<f64> = Grid::new(100, 100);
/// grid.set(10, 20, 0.42).unwrap();
/// assert_eq!(grid.get(10, 20).unwrap(), 0.42);
/// ```
#[derive(Debug, Clone)]
pub struct Grid<T: GridElement> {
    /// Cell data stored in row-major order (row, col)
    data: Array2<T>,
    /// Affine transformation
    transform: GeoTransform,
    /// No-data value
    nodata: Option<T>,
}

impl<T: GridElement> Grid<T> {
    /// Create a new grid filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a new grid filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self {
            data: Array2::from_elem((rows, cols), value),
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a grid from existing row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self {
            data: array,
            transform: GeoTransform::default(),
            nodata: None,
        })
    }

    /// Create a grid from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Create a grid with the same metadata but a different element type
    pub fn with_same_meta<U: GridElement>(&self) -> Grid<U> {
        Grid {
            data: Array2::zeros(self.data.dim()),
            transform: self.transform,
            nodata: None,
        }
    }

    /// Create a grid with the same dimensions and metadata, filled with a value
    pub fn like(&self, fill_value: T) -> Self {
        Self {
            data: Array2::from_elem(self.data.dim(), fill_value),
            transform: self.transform,
            nodata: self.nodata,
        }
    }

    // Dimensions

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the grid is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // Data access

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Get value at (row, col) without bounds checking
    ///
    /// # Safety
    /// Caller must ensure row < self.rows() and col < self.cols()
    pub unsafe fn get_unchecked(&self, row: usize, col: usize) -> T {
        unsafe { *self.data.uget((row, col)) }
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        if row >= self.rows() || col >= self.cols() {
            return Err(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            });
        }
        self.data[(row, col)] = value;
        Ok(())
    }

    /// Get a view of the underlying data
    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    /// Get a mutable view of the underlying data
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        self.data.view_mut()
    }

    /// Get a reference to the underlying array
    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    /// Get a mutable reference to the underlying array
    pub fn data_mut(&mut self) -> &mut Array2<T> {
        &mut self.data
    }

    /// Consume the grid and return the underlying array
    pub fn into_array(self) -> Array2<T> {
        self.data
    }

    // Metadata

    /// Get the geotransform
    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    /// Set the geotransform
    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    /// Get the no-data value
    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    /// Set the no-data value
    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    // Value checks

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }

    /// Check if cell at (row, col) contains no-data
    pub fn is_nodata_at(&self, row: usize, col: usize) -> Result<bool> {
        let value = self.get(row, col)?;
        Ok(self.is_nodata(value))
    }

    /// Count of cells carrying real data
    pub fn valid_count(&self) -> usize {
        self.data
            .iter()
            .filter(|&&value| !self.is_nodata(value))
            .count()
    }

    /// Derive the validity mask: `true` where the cell carries real data.
    ///
    /// The mask is always recomputed from the grid; it is never stored or
    /// mutated separately.
    pub fn validity_mask(&self) -> Array2<bool> {
        self.data.map(|&value| !value.is_nodata(self.nodata))
    }
}

impl Grid<f64> {
    /// Iterate over valid cells as (row, col, value).
    ///
    /// A cell is valid when it is finite and not the nodata value.
    pub fn valid_cells(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.data
            .indexed_iter()
            .filter(|&(_, &value)| value.is_finite() && !self.is_nodata(value))
            .map(|((row, col), &value)| (row, col, value))
    }

    /// Collect the values of all valid cells in row-major order
    pub fn valid_values(&self) -> Vec<f64> {
        self.data
            .iter()
            .filter(|&&value| !self.is_nodata(value) && value.is_finite())
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let grid: Grid<f64> = Grid::new(100, 200);
        assert_eq!(grid.rows(), 100);
        assert_eq!(grid.cols(), 200);
        assert_eq!(grid.shape(), (100, 200));
    }

    #[test]
    fn test_grid_access() {
        let mut grid: Grid<f64> = Grid::new(10, 10);
        grid.set(5, 5, 42.0).unwrap();
        assert_eq!(grid.get(5, 5).unwrap(), 42.0);
        assert!(grid.get(10, 0).is_err());
    }

    #[test]
    fn test_validity_mask_recomputed() {
        let mut grid: Grid<f64> = Grid::filled(3, 3, 1.0);
        grid.set(1, 1, f64::NAN).unwrap();

        let mask = grid.validity_mask();
        assert!(!mask[(1, 1)]);
        assert!(mask[(0, 0)]);
        assert_eq!(grid.valid_count(), 8);

        grid.set(1, 1, 2.0).unwrap();
        assert!(grid.validity_mask()[(1, 1)]);
    }

    #[test]
    fn test_valid_values_skips_nan() {
        let mut grid: Grid<f64> = Grid::new(2, 2);
        grid.set(0, 0, 1.0).unwrap();
        grid.set(0, 1, f64::NAN).unwrap();
        grid.set(1, 0, 3.0).unwrap();
        grid.set(1, 1, f64::INFINITY).unwrap();

        let values = grid.valid_values();
        assert_eq!(values, vec![1.0, 3.0]); // (0,1) NaN and (1,1) infinite dropped
    }
}
