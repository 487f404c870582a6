//! Image loading and mask/wall reconciliation.
//!
//! Decoding and resizing stay out of `holdtrace-core`; this module turns
//! files into the in-memory [`RgbImage`] the core consumes.

use std::path::Path;

use holdtrace_core::RgbImage;
use image::ImageError;
use image::imageops::{self, FilterType};

/// Decode an image file (PNG, JPEG, BMP, WebP) to 8-bit RGB.
///
/// # Errors
///
/// Returns an [`ImageError`] if the file cannot be read or decoded.
pub fn load_rgb(path: &Path) -> Result<RgbImage, ImageError> {
    Ok(image::open(path)?.to_rgb8())
}

/// Read an image's dimensions from its header without decoding pixels.
///
/// # Errors
///
/// Returns an [`ImageError`] if the file cannot be read or its format is
/// not recognised.
pub fn dimensions(path: &Path) -> Result<(u32, u32), ImageError> {
    image::image_dimensions(path)
}

/// Resize `mask` to `width` x `height` if it differs.
///
/// Nearest-neighbour sampling keeps every output pixel one of the input
/// colours, so the foreground/background split survives the resize.
#[must_use]
pub fn fit_mask(mask: RgbImage, width: u32, height: u32) -> RgbImage {
    if mask.dimensions() == (width, height) || width == 0 || height == 0 {
        return mask;
    }
    log::info!(
        "resizing mask from {}x{} to {width}x{height}",
        mask.width(),
        mask.height()
    );
    imageops::resize(&mask, width, height, FilterType::Nearest)
}
