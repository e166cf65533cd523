//! World file (`.tfw`) parsing.

use crate::error::{ConvertError, Result};
use crate::model::AffineWorldParams;

const WORLD_FILE_LINES: usize = 6;

/// Parses the six affine coefficients of a world file.
///
/// Lines are taken positionally: pixel size X, rotation Y, rotation X,
/// pixel size Y, and the X/Y center of the upper-left pixel. Both LF and
/// CRLF line breaks are accepted; surrounding whitespace of the whole text
/// and of each line is ignored.
pub fn parse_world_file(text: &str) -> Result<AffineWorldParams> {
    let lines: Vec<&str> = text
        .trim()
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if text.trim().is_empty() || lines.len() != WORLD_FILE_LINES {
        let found = if text.trim().is_empty() { 0 } else { lines.len() };
        return Err(ConvertError::InvalidLineCount { found });
    }

    let mut values = [0.0f64; WORLD_FILE_LINES];
    for (i, line) in lines.iter().enumerate() {
        values[i] = parse_value(line, i + 1)?;
    }

    let [pixel_size_x, rotation_y, rotation_x, pixel_size_y, center_x, center_y] = values;

    Ok(AffineWorldParams {
        pixel_size_x,
        rotation_y,
        rotation_x,
        pixel_size_y,
        center_x,
        center_y,
    })
}

fn parse_value(line: &str, line_number: usize) -> Result<f64> {
    let trimmed = line.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ConvertError::NonNumericValue {
            line: line_number,
            value: trimmed.to_string(),
        }),
    }
}
