//! Conversion workflow state: select inputs, parse once, convert on demand.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::error;

use crate::convert::{convert, parse_inputs, ConversionOutput, ParsedInputs};
use crate::error::{ConvertError, Result};
use crate::inputs::{pair_inputs, InputPair};
use crate::model::ConversionSettings;
use crate::raster::{GdalRasterSource, RasterDecoder, RasterSource};

/// Holds the parsed state of one input pair and the latest conversion result.
///
/// Any parse failure drops all state, leaving the session as if no files had
/// been selected.
#[derive(Debug)]
pub struct Session<S: RasterSource = GdalRasterSource> {
    source: S,
    parsed: Option<ParsedInputs>,
    output: Option<ConversionOutput>,
}

impl Session<GdalRasterSource> {
    pub fn with_decoder(decoder: Arc<RasterDecoder>) -> Self {
        Self::new(GdalRasterSource::new(decoder))
    }
}

impl<S: RasterSource> Session<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            parsed: None,
            output: None,
        }
    }

    /// Pairs the selected files and parses them.
    pub fn select(&mut self, paths: &[PathBuf]) -> Result<&ParsedInputs> {
        match pair_inputs(paths) {
            Ok(pair) => self.parse(&pair),
            Err(e) => {
                self.reset();
                Err(e)
            }
        }
    }

    /// Parses a new input pair, replacing whatever the session held.
    pub fn parse(&mut self, pair: &InputPair) -> Result<&ParsedInputs> {
        self.reset();

        match parse_inputs(pair, &self.source) {
            Ok(parsed) => Ok(&*self.parsed.insert(parsed)),
            Err(e) => {
                error!("Failed to parse {:?}: {}", pair.raster, e);
                Err(e)
            }
        }
    }

    /// Converts the parsed inputs; the result replaces any earlier one.
    pub fn convert(&mut self, settings: &ConversionSettings) -> Result<&ConversionOutput> {
        let parsed = self.parsed.as_ref().ok_or(ConvertError::NotParsed)?;
        let output = convert(parsed, settings);
        Ok(&*self.output.insert(output))
    }

    pub fn parsed(&self) -> Option<&ParsedInputs> {
        self.parsed.as_ref()
    }

    pub fn output(&self) -> Option<&ConversionOutput> {
        self.output.as_ref()
    }

    pub fn reset(&mut self) {
        self.parsed = None;
        self.output = None;
    }
}
