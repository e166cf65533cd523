//! Therion surface text: the `grid` command, the elevation matrix and the
//! `.th` document that ties them together.

use crate::coordinate_system::CoordinateSystem;
use crate::model::{GridOrigin, ResampledGrid, SurfaceDocument};

const ORIGIN_DECIMALS: usize = 8;
const PIXEL_SIZE_DECIMALS: usize = 12;
const ELEVATION_DECIMALS: usize = 3;

/// `grid <X> <Y> <PX> <PY> <W> <H>`, with PY always non-negative.
pub fn format_grid_line(origin: GridOrigin, resampled: &ResampledGrid) -> String {
    format!(
        "grid {} {} {} {} {} {}",
        fixed(origin.x, ORIGIN_DECIMALS),
        fixed(origin.y, ORIGIN_DECIMALS),
        fixed(resampled.pixel_size_x, PIXEL_SIZE_DECIMALS),
        fixed(resampled.pixel_size_y.abs(), PIXEL_SIZE_DECIMALS),
        resampled.width,
        resampled.height
    )
}

/// One line per row, northernmost row first.
pub fn format_matrix(resampled: &ResampledGrid) -> String {
    if resampled.is_empty() {
        return String::new();
    }

    (0..resampled.height)
        .map(|y| {
            resampled
                .row(y)
                .iter()
                .map(|&value| fixed(value, ELEVATION_DECIMALS))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_surface_document(
    system: CoordinateSystem,
    grid_line: &str,
    matrix_filename: &str,
) -> String {
    format!(
        "encoding utf-8\nsurface\n  cs {}\n  {}\n  input {}\nendsurface\n",
        system, grid_line, matrix_filename
    )
}

/// Input filename without its `.tif`/`.tiff` extension.
pub fn base_filename(input_name: &str) -> &str {
    let lower = input_name.to_ascii_lowercase();
    for ext in [".tiff", ".tif"] {
        if lower.ends_with(ext) {
            return &input_name[..input_name.len() - ext.len()];
        }
    }
    input_name
}

pub fn matrix_filename(input_name: &str) -> String {
    format!("{}.txt", base_filename(input_name))
}

/// Renders the full surface for an already transformed origin.
pub fn format_surface(
    origin: GridOrigin,
    resampled: &ResampledGrid,
    system: CoordinateSystem,
    input_name: &str,
) -> SurfaceDocument {
    let grid_command_line = format_grid_line(origin, resampled);
    let matrix_text = format_matrix(resampled);
    let format_header =
        format_surface_document(system, &grid_command_line, &matrix_filename(input_name));

    SurfaceDocument {
        grid_command_line,
        matrix_text,
        format_header,
    }
}

/// Fixed-point text with halfway values rounded away from zero.
///
/// `{:.N}` alone rounds an exact tie to even, so a value sitting exactly on
/// a tie is nudged to the next float away from zero first. Negative zero
/// prints as `0`, infinities as `Infinity` / `-Infinity`.
pub fn fixed(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }

    // -0.0 + 0.0 == +0.0
    let value = value + 0.0;
    let magnitude = value.abs();
    let magnitude = if is_decimal_tie(magnitude, decimals) {
        f64::from_bits(magnitude.to_bits() + 1)
    } else {
        magnitude
    };

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{:.*}", sign, decimals, magnitude)
}

/// True when `magnitude` lies exactly halfway between two multiples of
/// `10^-decimals`, i.e. `2 * 10^decimals * magnitude` is an odd integer.
fn is_decimal_tie(magnitude: f64, decimals: usize) -> bool {
    let bits = magnitude.to_bits();
    let exponent_bits = ((bits >> 52) & 0x7ff) as i64;
    let fraction = bits & ((1u64 << 52) - 1);

    let (mantissa, exponent) = if exponent_bits == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), exponent_bits - 1075)
    };
    if mantissa == 0 {
        return false;
    }

    // magnitude = mantissa * 2^exponent and 10^d = 5^d * 2^d with 5^d odd
    mantissa.trailing_zeros() as i64 + exponent + decimals as i64 + 1 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resampled(width: usize, height: usize, cells: Vec<f64>) -> ResampledGrid {
        ResampledGrid {
            width,
            height,
            pixel_size_x: 1.0,
            pixel_size_y: -1.0,
            cells,
        }
    }

    #[test]
    fn test_grid_line() {
        let grid = resampled(100, 50, vec![0.0; 5000]);
        let line = format_grid_line(GridOrigin { x: 999.5, y: 1900.5 }, &grid);
        assert_eq!(
            line,
            "grid 999.50000000 1900.50000000 1.000000000000 1.000000000000 100 50"
        );
    }

    #[test]
    fn test_grid_line_negative_origin() {
        let mut grid = resampled(2, 3, vec![0.0; 6]);
        grid.pixel_size_x = 0.25;
        grid.pixel_size_y = -0.25;
        let line = format_grid_line(GridOrigin { x: -377168.125, y: -1200776.5 }, &grid);
        assert_eq!(
            line,
            "grid -377168.12500000 -1200776.50000000 0.250000000000 0.250000000000 2 3"
        );
    }

    #[test]
    fn test_matrix_rows() {
        let grid = resampled(3, 2, vec![1.0, 2.5, -3.25, 400.0, 0.0001, 12.3456]);
        assert_eq!(
            format_matrix(&grid),
            "1.000 2.500 -3.250\n400.000 0.000 12.346"
        );
    }

    #[test]
    fn test_matrix_negative_zero() {
        let grid = resampled(1, 1, vec![-0.0]);
        assert_eq!(format_matrix(&grid), "0.000");
    }

    #[test]
    fn test_empty_matrix() {
        assert_eq!(format_matrix(&resampled(0, 3, Vec::new())), "");
        assert_eq!(format_matrix(&resampled(4, 0, Vec::new())), "");

        let line = format_grid_line(GridOrigin { x: 1.0, y: 2.0 }, &resampled(0, 0, Vec::new()));
        assert!(line.ends_with(" 0 0"));
    }

    #[test]
    fn test_fixed_rounds_ties_away_from_zero() {
        assert_eq!(fixed(250.0625, 3), "250.063");
        assert_eq!(fixed(0.0625, 3), "0.063");
        assert_eq!(fixed(-0.0625, 3), "-0.063");
        assert_eq!(fixed(0.125, 2), "0.13");
        assert_eq!(fixed(2.5, 0), "3");
        // 1.0005 is stored slightly below the tie
        assert_eq!(fixed(1.0005, 3), "1.000");
        assert_eq!(fixed(250.0, 3), "250.000");
        assert_eq!(fixed(-0.0001, 3), "-0.000");
    }

    #[test]
    fn test_fixed_non_finite() {
        assert_eq!(fixed(f64::INFINITY, 3), "Infinity");
        assert_eq!(fixed(f64::NEG_INFINITY, 2), "-Infinity");
        assert_eq!(fixed(f64::NAN, 3), "NaN");
    }

    #[test]
    fn test_matrix_quantized_elevations() {
        let grid = resampled(3, 1, vec![250.0625, 250.1875, -3.0625]);
        assert_eq!(format_matrix(&grid), "250.063 250.188 -3.063");
    }

    #[test]
    fn test_matrix_filename() {
        assert_eq!(matrix_filename("dmr_5m.tif"), "dmr_5m.txt");
        assert_eq!(matrix_filename("DMR.TIFF"), "DMR.txt");
        assert_eq!(matrix_filename("archive.tif.tif"), "archive.tif.txt");
        assert_eq!(matrix_filename("raster"), "raster.txt");
        assert_eq!(base_filename("a.tiff"), "a");
    }

    #[test]
    fn test_surface_document() {
        let grid = resampled(2, 1, vec![10.0, 11.0]);
        let doc = format_surface(
            GridOrigin { x: 999.5, y: 1900.5 },
            &grid,
            CoordinateSystem::Utm34n,
            "karst.tif",
        );

        assert_eq!(doc.matrix_text, "10.000 11.000");
        assert_eq!(
            doc.format_header,
            "encoding utf-8\n\
             surface\n  \
             cs utm34n\n  \
             grid 999.50000000 1900.50000000 1.000000000000 1.000000000000 2 1\n  \
             input karst.txt\n\
             endsurface\n"
        );
    }
}
