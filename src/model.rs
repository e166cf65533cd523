use crate::coordinate_system::CoordinateSystem;

/// The six coefficients of a world file, in file order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineWorldParams {
    pub pixel_size_x: f64,
    pub rotation_y: f64,
    pub rotation_x: f64,
    /// Negative for north-up rasters.
    pub pixel_size_y: f64,
    /// X of the center of the upper-left pixel.
    pub center_x: f64,
    /// Y of the center of the upper-left pixel.
    pub center_y: f64,
}

/// Decoded elevation raster, row-major, north row first.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    pub width: usize,
    pub height: usize,
    pub cells: Vec<f64>,
}

impl RasterGrid {
    pub fn new(width: usize, height: usize, cells: Vec<f64>) -> Self {
        debug_assert_eq!(cells.len(), width * height);
        Self {
            width,
            height,
            cells,
        }
    }

    /// (min, max) over all cells. An empty grid yields (+inf, -inf).
    pub fn elevation_range(&self) -> (f64, f64) {
        let mut min_elevation = f64::INFINITY;
        let mut max_elevation = f64::NEG_INFINITY;

        for &value in &self.cells {
            min_elevation = min_elevation.min(value);
            max_elevation = max_elevation.max(value);
        }

        (min_elevation, max_elevation)
    }
}

/// Geographic coordinate of the grid corner expected by the `grid` command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridOrigin {
    pub x: f64,
    pub y: f64,
}

/// Output of the resampler: the reduced grid and its pixel sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledGrid {
    pub width: usize,
    pub height: usize,
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
    pub cells: Vec<f64>,
}

impl ResampledGrid {
    pub fn row(&self, y: usize) -> &[f64] {
        &self.cells[y * self.width..(y + 1) * self.width]
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// The emitted Therion surface: `.th` document plus the matrix text it references.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceDocument {
    pub grid_command_line: String,
    pub matrix_text: String,
    pub format_header: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionSettings {
    pub resample_factor: usize,
    pub coordinate_system: CoordinateSystem,
}

impl ConversionSettings {
    /// Factors below one are coerced to one.
    pub fn new(resample_factor: i64, coordinate_system: CoordinateSystem) -> Self {
        Self {
            resample_factor: resample_factor.max(1) as usize,
            coordinate_system,
        }
    }
}

impl Default for ConversionSettings {
    fn default() -> Self {
        Self::new(1, CoordinateSystem::default())
    }
}
