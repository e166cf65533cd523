//! Nearest-neighbour downsampling by an integer stride.

use crate::model::{RasterGrid, ResampledGrid};

/// Keeps every `factor`-th cell in both directions.
///
/// `factor` must already be coerced to at least one. Rows and columns past
/// the last full stride are dropped; a factor larger than a dimension yields
/// an empty grid. Pixel sizes are scaled by the factor with their sign kept.
pub fn resample(
    grid: &RasterGrid,
    factor: usize,
    pixel_size_x: f64,
    pixel_size_y: f64,
) -> ResampledGrid {
    debug_assert!(factor >= 1);
    let factor = factor.max(1);

    let new_width = grid.width / factor;
    let new_height = grid.height / factor;

    let cells = if factor == 1 {
        grid.cells.clone()
    } else {
        let mut cells = Vec::with_capacity(new_width * new_height);
        for y in 0..new_height {
            let row = y * factor * grid.width;
            cells.extend((0..new_width).map(|x| grid.cells[row + x * factor]));
        }
        cells
    };

    ResampledGrid {
        width: new_width,
        height: new_height,
        pixel_size_x: pixel_size_x * factor as f64,
        pixel_size_y: pixel_size_y * factor as f64,
        cells,
    }
}
