//! Quadrant partitioning with per-tile statistics
//!
//! Deterministic rectangular tiling of the grid: `n_rows x n_cols` tiles of
//! near-equal extent, the last row/column of tiles absorbing any remainder,
//! so every cell belongs to exactly one tile.

use serde::Serialize;
use verdis_core::{Error, Grid, Result};

use crate::statistics::percentile;

/// Cell-index bounds of one tile (half-open ranges)
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TileBounds {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

/// Statistics of one tile.
///
/// A tile whose cells are all invalid reports `n_pixels = 0` and no
/// further statistics — an expected data condition, not a failure.
#[derive(Debug, Clone, Serialize)]
pub struct QuadrantStats {
    /// 0-based tile position (tile row, tile column)
    pub tile_row: usize,
    pub tile_col: usize,
    pub bounds: TileBounds,
    /// Valid cells inside the tile
    pub n_pixels: usize,
    pub mean: Option<f64>,
    pub median: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Result of quadrant partitioning, tiles in row-major tile order
#[derive(Debug, Clone, Serialize)]
pub struct QuadrantPartition {
    pub n_rows: usize,
    pub n_cols: usize,
    pub tiles: Vec<QuadrantStats>,
}

/// Divide a grid into `n_rows x n_cols` tiles and summarize each.
///
/// The partition is exhaustive and disjoint: tile extents are
/// `rows / n_rows` by `cols / n_cols` cells, with the last tile row and
/// column taking whatever remains.
///
/// # Arguments
/// * `grid` - Input surface
/// * `n_rows` - Number of tile rows (≥ 1)
/// * `n_cols` - Number of tile columns (≥ 1)
pub fn quadrant_statistics(
    grid: &Grid<f64>,
    n_rows: usize,
    n_cols: usize,
) -> Result<QuadrantPartition> {
    if n_rows == 0 || n_cols == 0 {
        return Err(Error::InvalidParameter {
            name: "n_rows/n_cols",
            value: format!("{n_rows}x{n_cols}"),
            reason: "tile counts must be at least 1".into(),
        });
    }

    let (rows, cols) = grid.shape();
    let tile_height = rows / n_rows;
    let tile_width = cols / n_cols;

    let mut tiles = Vec::with_capacity(n_rows * n_cols);

    for tile_row in 0..n_rows {
        for tile_col in 0..n_cols {
            let row_start = tile_row * tile_height;
            let row_end = if tile_row < n_rows - 1 {
                (tile_row + 1) * tile_height
            } else {
                rows
            };
            let col_start = tile_col * tile_width;
            let col_end = if tile_col < n_cols - 1 {
                (tile_col + 1) * tile_width
            } else {
                cols
            };

            let mut values = Vec::new();
            for row in row_start..row_end {
                for col in col_start..col_end {
                    let v = unsafe { grid.get_unchecked(row, col) };
                    if v.is_finite() && !grid.is_nodata(v) {
                        values.push(v);
                    }
                }
            }

            tiles.push(summarize_tile(
                tile_row,
                tile_col,
                TileBounds {
                    row_start,
                    row_end,
                    col_start,
                    col_end,
                },
                values,
            ));
        }
    }

    Ok(QuadrantPartition {
        n_rows,
        n_cols,
        tiles,
    })
}

fn summarize_tile(
    tile_row: usize,
    tile_col: usize,
    bounds: TileBounds,
    mut values: Vec<f64>,
) -> QuadrantStats {
    let n = values.len();
    if n == 0 {
        return QuadrantStats {
            tile_row,
            tile_col,
            bounds,
            n_pixels: 0,
            mean: None,
            median: None,
            std: None,
            min: None,
            max: None,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n as f64;

    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    QuadrantStats {
        tile_row,
        tile_col,
        bounds,
        n_pixels: n,
        mean: Some(mean),
        median: Some(percentile(&values, 50.0)),
        std: Some(var.sqrt()),
        min: Some(values[0]),
        max: Some(values[n - 1]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_2x2_counts_sum_to_valid_count() {
        let mut grid = Grid::new(5, 7);
        for row in 0..5 {
            for col in 0..7 {
                grid.set(row, col, (row * 7 + col) as f64).unwrap();
            }
        }
        grid.set(1, 1, f64::NAN).unwrap();
        grid.set(4, 6, f64::NAN).unwrap();

        let partition = quadrant_statistics(&grid, 2, 2).unwrap();
        assert_eq!(partition.tiles.len(), 4);

        let total: usize = partition.tiles.iter().map(|t| t.n_pixels).sum();
        assert_eq!(total, grid.valid_count());
    }

    #[test]
    fn test_remainder_absorbed_by_last_tiles() {
        let grid = Grid::filled(5, 5, 1.0);
        let partition = quadrant_statistics(&grid, 2, 2).unwrap();

        // 5/2 = 2, so the last tile row/column takes 3 cells
        let t00 = &partition.tiles[0];
        assert_eq!((t00.bounds.row_end, t00.bounds.col_end), (2, 2));
        assert_eq!(t00.n_pixels, 4);

        let t11 = &partition.tiles[3];
        assert_eq!((t11.bounds.row_start, t11.bounds.col_start), (2, 2));
        assert_eq!((t11.bounds.row_end, t11.bounds.col_end), (5, 5));
        assert_eq!(t11.n_pixels, 9);
    }

    #[test]
    fn test_partition_disjoint_and_exhaustive() {
        let grid: Grid<f64> = Grid::new(11, 13);
        let partition = quadrant_statistics(&grid, 3, 4).unwrap();

        let mut covered = vec![vec![0u8; 13]; 11];
        for tile in &partition.tiles {
            for row in tile.bounds.row_start..tile.bounds.row_end {
                for col in tile.bounds.col_start..tile.bounds.col_end {
                    covered[row][col] += 1;
                }
            }
        }
        assert!(covered.iter().flatten().all(|&c| c == 1));
    }

    #[test]
    fn test_empty_tile_reports_zero() {
        // Left half NaN: the two left tiles have no valid pixels
        let mut grid = Grid::filled(4, 4, 2.0);
        for row in 0..4 {
            for col in 0..2 {
                grid.set(row, col, f64::NAN).unwrap();
            }
        }

        let partition = quadrant_statistics(&grid, 2, 2).unwrap();
        let left_top = &partition.tiles[0];
        assert_eq!(left_top.n_pixels, 0);
        assert!(left_top.mean.is_none());

        let right_top = &partition.tiles[1];
        assert_eq!(right_top.n_pixels, 4);
        assert!((right_top.mean.unwrap() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_tile_count_is_error() {
        let grid: Grid<f64> = Grid::new(4, 4);
        assert!(quadrant_statistics(&grid, 0, 2).is_err());
        assert!(quadrant_statistics(&grid, 2, 0).is_err());
    }
}
