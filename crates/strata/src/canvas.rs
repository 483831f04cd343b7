//! RGB framebuffer that tiles are painted into.

use image::RgbImage;
use strata_procedural::{Chunk, ColorBanding, Rgb};

use crate::CliError;

/// Bytes per RGB pixel.
const CHANNELS: usize = 3;

/// Allocates a black canvas covering the whole world.
///
/// # Errors
///
/// Returns [`CliError::CanvasTooLarge`] if the pixel buffer cannot be
/// sized or allocated.
pub fn blank(width: u32, height: u32) -> Result<RgbImage, CliError> {
    let too_large = || CliError::CanvasTooLarge { width, height };

    let len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|pixels| pixels.checked_mul(CHANNELS))
        .ok_or_else(too_large)?;

    let mut buffer = Vec::new();
    buffer.try_reserve_exact(len).map_err(|_| too_large())?;
    buffer.resize(len, 0);

    RgbImage::from_raw(width, height, buffer).ok_or_else(too_large)
}

/// Paints every populated cell of `chunk` through `palette`.
///
/// Cells past the canvas edge are skipped.
pub fn draw_chunk(canvas: &mut RgbImage, chunk: &Chunk, palette: &ColorBanding) {
    let (width, height) = canvas.dimensions();
    for (x, y, value) in chunk.populated() {
        if x < width && y < height {
            let Rgb(rgb) = palette.color_for(value);
            canvas.put_pixel(x, y, image::Rgb(rgb));
        }
    }
}
