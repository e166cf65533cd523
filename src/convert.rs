//! End-to-end conversion: parsed inputs in, Therion surface out.

use std::fmt;
use std::fs;
use tracing::{info, warn};

use crate::coordinate_system::CoordinateSystem;
use crate::error::{ConvertError, Result};
use crate::inputs::InputPair;
use crate::model::{AffineWorldParams, ConversionSettings, RasterGrid, SurfaceDocument};
use crate::origin::{derive_origin, OriginDerivation};
use crate::parser::parse_world_file;
use crate::raster::RasterSource;
use crate::resample::resample;
use crate::surface::{base_filename, fixed, format_surface};

/// Everything read from a raster / world file pair, held until conversion.
#[derive(Debug, Clone)]
pub struct ParsedInputs {
    pub params: AffineWorldParams,
    pub grid: RasterGrid,
    pub derivation: OriginDerivation,
    pub min_elevation: f64,
    pub max_elevation: f64,
    /// Selected raster file name, extension included.
    pub raster_name: String,
    log: String,
}

impl ParsedInputs {
    /// Builds the parsed state from a world file's text and a decoded raster.
    pub fn from_parts(
        raster_name: &str,
        world_file_name: &str,
        world_file_text: &str,
        grid: RasterGrid,
    ) -> Result<Self> {
        let params = parse_world_file(world_file_text)?;
        check_grid(raster_name, &grid)?;
        Ok(Self::assemble(
            raster_name,
            world_file_name,
            world_file_text,
            params,
            grid,
        ))
    }

    fn assemble(
        raster_name: &str,
        world_file_name: &str,
        world_file_text: &str,
        params: AffineWorldParams,
        grid: RasterGrid,
    ) -> Self {
        if params.rotation_x != 0.0 || params.rotation_y != 0.0 {
            warn!(
                "Ignoring world file rotation terms ({}, {})",
                params.rotation_x, params.rotation_y
            );
        }

        let (min_elevation, max_elevation) = grid.elevation_range();
        let derivation = derive_origin(&params, grid.height);

        let mut log = String::new();
        push(&mut log, "--- GeoTIFF to Therion Conversion Log ---\n\n");

        push(&mut log, "--- 1. INPUT FILES ---\n");
        push(&mut log, format!("TIFF File: {}\n", raster_name));
        push(&mut log, format!("TFW File: {}\n\n", world_file_name));

        push(&mut log, "--- 2. TFW (World File) PARSING ---\n");
        push(&mut log, format!("Raw Content:\n{}\n\nParsed Values:\n", world_file_text.trim()));
        push(&mut log, format!("  A (pixelSizeX): {}\n", params.pixel_size_x));
        push(&mut log, format!("  D (rotationY): {}\n", params.rotation_y));
        push(&mut log, format!("  B (rotationX): {}\n", params.rotation_x));
        push(&mut log, format!("  E (pixelSizeY): {}\n", params.pixel_size_y));
        push(&mut log, format!("  C (centerX_ull): {}\n", params.center_x));
        push(&mut log, format!("  F (centerY_ull): {}\n\n", params.center_y));

        push(&mut log, "--- 3. TIFF METADATA ---\n");
        push(&mut log, format!("Width: {} px\n", grid.width));
        push(&mut log, format!("Height: {} px\n", grid.height));
        push(&mut log, format!("Min Elevation: {} m\n", fixed(min_elevation, 3)));
        push(&mut log, format!("Max Elevation: {} m\n\n", fixed(max_elevation, 3)));

        push(&mut log, "--- 4. ORIGIN CALCULATION for Therion `grid` ---\n");
        push(&mut log, "Note: the `grid` command takes the X coordinate of the upper-left raster corner\n");
        push(&mut log, "      and the Y coordinate of the lower-left raster corner.\n\n");
        push(
            &mut log,
            format!(
                "[a] Center of Upper-Left Pixel (from TFW):\n    X: {}\n    Y: {}\n\n",
                derivation.center_x, derivation.center_y
            ),
        );
        push(
            &mut log,
            format!(
                "[b] Upper-Left Corner:\n    X = [a].X - (pixelSizeX / 2) = {}\n    Y = [a].Y - (pixelSizeY / 2) = {}\n\n",
                derivation.upper_left_x, derivation.upper_left_y
            ),
        );
        push(
            &mut log,
            format!(
                "[c] Lower-Left Corner Y:\n    Y = [b].Y + (height * pixelSizeY) = {}\n\n",
                derivation.lower_left_y
            ),
        );
        push(
            &mut log,
            format!(
                "[d] Final Grid Origin:\n    X: {}\n    Y: {}\n\n",
                derivation.origin.x, derivation.origin.y
            ),
        );

        Self {
            params,
            grid,
            derivation,
            min_elevation,
            max_elevation,
            raster_name: raster_name.to_string(),
            log,
        }
    }

    /// Raster file name without the `.tif`/`.tiff` extension.
    pub fn base_filename(&self) -> &str {
        base_filename(&self.raster_name)
    }

    /// Log accumulated while parsing.
    pub fn log(&self) -> &str {
        &self.log
    }

    pub fn preview(&self, settings: &ConversionSettings) -> Preview {
        let factor = settings.resample_factor.max(1);
        Preview {
            filename: self.base_filename().to_string(),
            width: self.grid.width,
            height: self.grid.height,
            pixel_size_x: self.params.pixel_size_x,
            pixel_size_y: self.params.pixel_size_y.abs(),
            min_elevation: self.min_elevation,
            max_elevation: self.max_elevation,
            new_width: self.grid.width / factor,
            new_height: self.grid.height / factor,
            new_pixel_size_x: self.params.pixel_size_x * factor as f64,
            new_pixel_size_y: (self.params.pixel_size_y * factor as f64).abs(),
            coordinate_system: settings.coordinate_system,
        }
    }
}

fn check_grid(raster_name: &str, grid: &RasterGrid) -> Result<()> {
    let expected = grid.width.checked_mul(grid.height);
    if expected != Some(grid.cells.len()) {
        return Err(ConvertError::RasterUnavailable(format!(
            "{}: {} cells decoded for a {}x{} raster",
            raster_name,
            grid.cells.len(),
            grid.width,
            grid.height
        )));
    }
    Ok(())
}

fn push(log: &mut String, text: impl AsRef<str>) {
    log.push_str(text.as_ref());
}

/// Reads the world file and decodes the raster of a pair.
pub fn parse_inputs(pair: &InputPair, source: &dyn RasterSource) -> Result<ParsedInputs> {
    info!("Parsing {:?} with {:?}", pair.raster, pair.world_file);

    let world_file_text = fs::read_to_string(&pair.world_file)?;
    let params = parse_world_file(&world_file_text)?;
    let grid = source.read_raster(&pair.raster)?;
    check_grid(&pair.raster_name(), &grid)?;

    info!(
        "Parsed successfully: {} ({}x{})",
        pair.raster_name(),
        grid.width,
        grid.height
    );

    Ok(ParsedInputs::assemble(
        &pair.raster_name(),
        &pair.world_file_name(),
        &world_file_text,
        params,
        grid,
    ))
}

/// A finished conversion, ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    pub document: SurfaceDocument,
    pub base_filename: String,
    pub width: usize,
    pub height: usize,
    pub log: String,
}

impl ConversionOutput {
    pub fn th_filename(&self) -> String {
        format!("{}.th", self.base_filename)
    }

    pub fn txt_filename(&self) -> String {
        format!("{}.txt", self.base_filename)
    }

    pub fn th_content(&self) -> &str {
        &self.document.format_header
    }

    pub fn txt_content(&self) -> &str {
        &self.document.matrix_text
    }
}

/// Resamples, applies the coordinate system and formats the surface.
pub fn convert(parsed: &ParsedInputs, settings: &ConversionSettings) -> ConversionOutput {
    let factor = settings.resample_factor.max(1);
    let cs = settings.coordinate_system;
    let grid = &parsed.grid;
    let mut log = parsed.log.clone();

    push(&mut log, "--- 5. CONVERSION SETTINGS ---\n");
    push(&mut log, format!("Coordinate System: {}\n", cs));
    push(&mut log, format!("Resample Factor: {}\n", factor));
    push(&mut log, format!("  - Original Dimensions: {} x {}\n", grid.width, grid.height));

    let resampled = resample(
        grid,
        factor,
        parsed.params.pixel_size_x,
        parsed.params.pixel_size_y,
    );

    push(&mut log, format!("  - New Dimensions: {} x {}\n", resampled.width, resampled.height));
    push(
        &mut log,
        format!(
            "  - Original Resolution: {} x {}\n",
            fixed(parsed.params.pixel_size_x, 2),
            fixed(parsed.params.pixel_size_y.abs(), 2)
        ),
    );
    push(
        &mut log,
        format!(
            "  - New Resolution: {} x {}\n\n",
            fixed(resampled.pixel_size_x, 2),
            fixed(resampled.pixel_size_y.abs(), 2)
        ),
    );

    let origin = cs.apply(parsed.derivation.origin, &resampled);
    let document = format_surface(origin, &resampled, cs, &parsed.raster_name);

    push(&mut log, "--- 6. FINAL OUTPUT ---\n");
    push(
        &mut log,
        format!("Generated .th `grid` line:\n{}\n", document.grid_command_line),
    );

    info!(
        "Converted {} to {}x{} grid ({})",
        parsed.raster_name, resampled.width, resampled.height, cs
    );

    ConversionOutput {
        document,
        base_filename: parsed.base_filename().to_string(),
        width: resampled.width,
        height: resampled.height,
        log,
    }
}

/// Summary of the parsed data and the grid a given setting would produce.
#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub filename: String,
    pub width: usize,
    pub height: usize,
    pub pixel_size_x: f64,
    pub pixel_size_y: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub new_width: usize,
    pub new_height: usize,
    pub new_pixel_size_x: f64,
    pub new_pixel_size_y: f64,
    pub coordinate_system: CoordinateSystem,
}

impl fmt::Display for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filename:       {}", self.filename)?;
        writeln!(f, "Dimensions:     {} x {} px", self.width, self.height)?;
        writeln!(
            f,
            "Resolution:     {} x {} m",
            fixed(self.pixel_size_x, 2),
            fixed(self.pixel_size_y, 2)
        )?;
        writeln!(f, "Min Elevation:  {} m", fixed(self.min_elevation, 2))?;
        writeln!(f, "Max Elevation:  {} m", fixed(self.max_elevation, 2))?;
        writeln!(f, "New Dimensions: {} x {} px", self.new_width, self.new_height)?;
        writeln!(
            f,
            "New Resolution: {} x {} m",
            fixed(self.new_pixel_size_x, 2),
            fixed(self.new_pixel_size_y, 2)
        )?;
        let cs = self.coordinate_system;
        write!(
            f,
            "Coord. System:  {} [{}], e.g. {}",
            cs.display_name(),
            cs.id(),
            cs.example()
        )
    }
}
