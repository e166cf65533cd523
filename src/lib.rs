pub mod convert;
pub mod coordinate_system;
pub mod error;
pub mod inputs;
pub mod model;
pub mod origin;
pub mod parser;
pub mod raster;
pub mod resample;
pub mod session;
pub mod surface;
pub mod writer;

pub use convert::{convert, parse_inputs, ConversionOutput, ParsedInputs, Preview};
pub use coordinate_system::{apply_coordinate_system, CoordinateSystem};
pub use error::{ConvertError, Result};
pub use inputs::{collect_input_pairs, pair_inputs, world_file_for, InputPair};
pub use model::{
    AffineWorldParams, ConversionSettings, GridOrigin, RasterGrid, ResampledGrid, SurfaceDocument,
};
pub use origin::compute_origin;
pub use parser::parse_world_file;
pub use raster::{GdalRasterSource, RasterDecoder, RasterSource};
pub use resample::resample;
pub use session::Session;
pub use surface::format_surface;
pub use writer::SurfaceWriter;
