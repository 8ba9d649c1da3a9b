//! Region extraction: cut a displayed-space selection out of the raster.

use image::DynamicImage;
use log::debug;

use crate::geometry::{DisplayGeometry, PixelCrop};
use crate::raster::RasterImage;
use crate::CropError;

/// Copy the selected displayed-space rectangle out of the raster, 1:1.
///
/// The rectangle is mapped into natural space with scale factors derived
/// from the raster and displayed dimensions (`sx = natural / displayed`),
/// then clamped to the raster bounds. The output holds exactly
/// `round(width * sx) x round(height * sy)` pixels copied without
/// resampling, so the result is independent of the zoom level at which the
/// selection was made.
pub fn extract_region(
    image: &RasterImage,
    display: &DisplayGeometry,
    rect: &PixelCrop,
) -> Result<DynamicImage, CropError> {
    if display.displayed_width <= 0.0 || display.displayed_height <= 0.0 {
        return Err(CropError::DegenerateCrop);
    }

    let natural_width = image.natural_width();
    let natural_height = image.natural_height();

    let natural = rect
        .to_natural(natural_width, natural_height, display)
        .clamp_to(natural_width, natural_height)
        .ok_or(CropError::DegenerateCrop)?;

    let out_width = (natural.width.round() as u32).min(natural_width);
    let out_height = (natural.height.round() as u32).min(natural_height);
    if out_width == 0 || out_height == 0 {
        return Err(CropError::DegenerateCrop);
    }

    // Rounding may push the copy window one pixel past the raster edge;
    // shift the origin back instead of shrinking the output.
    let src_x = (natural.x.round() as u32).min(natural_width - out_width);
    let src_y = (natural.y.round() as u32).min(natural_height - out_height);

    debug!(
        "extracting {}x{} at ({}, {}) from {}x{} raster",
        out_width, out_height, src_x, src_y, natural_width, natural_height
    );

    Ok(image.image().crop_imm(src_x, src_y, out_width, out_height))
}
