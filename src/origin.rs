//! Grid origin for Therion's `grid` command.
//!
//! Therion wants the X of the upper-left raster corner and the Y of the
//! lower-left raster corner. World files give the center of the upper-left
//! pixel, so both need a half-pixel shift, and Y additionally moves south
//! by the full raster height.

use tracing::debug;

use crate::model::{AffineWorldParams, GridOrigin};

/// Every intermediate value of the origin derivation, kept for the conversion log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginDerivation {
    pub center_x: f64,
    pub center_y: f64,
    pub upper_left_x: f64,
    pub upper_left_y: f64,
    pub lower_left_y: f64,
    pub origin: GridOrigin,
}

pub fn derive_origin(params: &AffineWorldParams, raster_height: usize) -> OriginDerivation {
    let center_x = params.center_x;
    let center_y = params.center_y;

    // pixel_size_y is negative, so this moves north of the center row
    let upper_left_x = center_x - (params.pixel_size_x / 2.0);
    let upper_left_y = center_y - (params.pixel_size_y / 2.0);

    let lower_left_y = upper_left_y + (raster_height as f64 * params.pixel_size_y);

    let origin = GridOrigin {
        x: upper_left_x,
        y: lower_left_y,
    };

    debug!(
        "Origin: upper-left corner ({}, {}), lower-left Y {}",
        upper_left_x, upper_left_y, lower_left_y
    );

    OriginDerivation {
        center_x,
        center_y,
        upper_left_x,
        upper_left_y,
        lower_left_y,
        origin,
    }
}

/// Upper-left X and lower-left Y of the raster.
pub fn compute_origin(params: &AffineWorldParams, raster_height: usize) -> GridOrigin {
    derive_origin(params, raster_height).origin
}
