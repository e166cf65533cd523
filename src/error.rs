use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while turning a raster and its world file into a surface.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("invalid world file: expected 6 lines, found {found}")]
    InvalidLineCount { found: usize },

    #[error("invalid world file: line {line} is not a finite number: {value:?}")]
    NonNumericValue { line: usize, value: String },

    #[error("raster unavailable: {0}")]
    RasterUnavailable(String),

    #[error("unsupported coordinate system: {0}")]
    UnsupportedCoordinateSystem(String),

    #[error("please select one .tif and one .tfw file")]
    MissingInputs,

    #[error("{found} files were selected, expected one .tif and one .tfw")]
    TooManyInputs { found: usize },

    #[error("missing .tif file")]
    MissingRaster,

    #[error("missing .tfw file")]
    MissingWorldFile,

    #[error("the .tif and .tfw filenames do not match: {raster} vs {world_file}")]
    MismatchedNames { raster: PathBuf, world_file: PathBuf },

    #[error("no parsed inputs available to convert")]
    NotParsed,

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
