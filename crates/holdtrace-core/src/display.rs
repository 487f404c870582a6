//! Fit an image into a display viewport, preserving aspect ratio.
//!
//! The image is scaled as large as it can be without overflowing either
//! viewport axis, then centred on the other axis (letterbox or pillarbox).
//! The resulting [`DisplayParameters`] map image pixels to viewport
//! coordinates: `display = image * scale + offset`.

use serde::{Deserialize, Serialize};

/// Affine image-to-viewport mapping for one viewport/image size pair.
///
/// Never persisted; recompute whenever either size changes. A mapping with
/// zero scale is the invalid sentinel produced for an empty viewport or
/// image. Check [`is_valid`](Self::is_valid) before using it for geometry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DisplayParameters {
    /// Horizontal scale, display units per image pixel.
    pub scale_x: f64,
    /// Vertical scale, display units per image pixel.
    pub scale_y: f64,
    /// Left margin of the displayed image within the viewport.
    pub offset_x: f64,
    /// Top margin of the displayed image within the viewport.
    pub offset_y: f64,
    /// Width the image occupies in the viewport.
    pub displayed_width: f64,
    /// Height the image occupies in the viewport.
    pub displayed_height: f64,
}

impl DisplayParameters {
    /// The invalid sentinel: all scales, offsets and sizes zero.
    pub const INVALID: Self = Self {
        scale_x: 0.0,
        scale_y: 0.0,
        offset_x: 0.0,
        offset_y: 0.0,
        displayed_width: 0.0,
        displayed_height: 0.0,
    };

    /// Whether the mapping can be used for rendering or hit-testing.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.scale_x > 0.0 && self.scale_y > 0.0
    }

    /// Map an image-pixel coordinate to viewport coordinates.
    #[must_use]
    pub fn to_display(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x.mul_add(self.scale_x, self.offset_x),
            y.mul_add(self.scale_y, self.offset_y),
        )
    }

    /// Map a viewport coordinate back to image pixels, or `None` if the
    /// mapping is invalid.
    #[must_use]
    pub fn to_image(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        if !self.is_valid() {
            return None;
        }
        Some((
            (x - self.offset_x) / self.scale_x,
            (y - self.offset_y) / self.scale_y,
        ))
    }
}

/// Compute the fit of an `image_width` x `image_height` image into a
/// `viewport_width` x `viewport_height` viewport.
///
/// Returns [`DisplayParameters::INVALID`] when either viewport dimension is
/// not a positive finite number or either image dimension is zero.
#[must_use]
pub fn compute_parameters(
    viewport_width: f64,
    viewport_height: f64,
    image_width: u32,
    image_height: u32,
) -> DisplayParameters {
    let usable = |v: f64| v.is_finite() && v > 0.0;
    if !usable(viewport_width) || !usable(viewport_height) || image_width == 0 || image_height == 0
    {
        return DisplayParameters::INVALID;
    }

    let image_width = f64::from(image_width);
    let image_height = f64::from(image_height);
    let viewport_aspect = viewport_width / viewport_height;
    let image_aspect = image_width / image_height;

    let (displayed_width, displayed_height, offset_x, offset_y) = if viewport_aspect > image_aspect
    {
        // Height-constrained: pillarbox.
        let displayed_height = viewport_height;
        let displayed_width = displayed_height * image_aspect;
        (
            displayed_width,
            displayed_height,
            (viewport_width - displayed_width) / 2.0,
            0.0,
        )
    } else {
        // Width-constrained: letterbox.
        let displayed_width = viewport_width;
        let displayed_height = displayed_width / image_aspect;
        (
            displayed_width,
            displayed_height,
            0.0,
            (viewport_height - displayed_height) / 2.0,
        )
    };

    DisplayParameters {
        scale_x: displayed_width / image_width,
        scale_y: displayed_height / image_height,
        offset_x,
        offset_y,
        displayed_width,
        displayed_height,
    }
}
