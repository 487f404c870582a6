//! holdtrace-core: Climbing-hold outline detection and hit-testing (sans-IO).
//!
//! Converts a binary mask (white hold blobs on black) into hold polygons:
//! pixel classification -> 4-connected region extraction ->
//! Moore-neighbourhood boundary tracing -> Douglas-Peucker simplification.
//! The resulting [`HoldConfiguration`] can then be hit-tested after the
//! image is fitted into an arbitrary viewport.
//!
//! This crate has **no I/O dependencies** -- it operates on an in-memory
//! [`RgbImage`] and returns structured data. Decoding, resizing and file
//! output live in the `holdtrace` CLI.

pub mod assemble;
pub mod classify;
pub mod contour;
pub mod diagnostics;
pub mod display;
pub mod hit;
pub mod region;
pub mod simplify;
pub mod types;

pub use assemble::{AssemblyReport, HoldAssembler};
pub use classify::PixelClassifier;
pub use contour::{Boundary, BoundaryTracer, TraceOutcome};
pub use diagnostics::{Clock, DetectDiagnostics, NullClock, detect_with_diagnostics};
pub use display::{DisplayParameters, compute_parameters};
pub use hit::{DisplayPoint, HoldIndex, find_hit};
pub use region::{Region, RegionExtractor};
pub use simplify::{Simplifier, simplify};
pub use types::{
    Bounds, DetectConfig, DetectError, Hold, HoldConfiguration, Point, Polygon, Rgb, RgbImage,
};

/// Detect every hold in `grid`.
///
/// Holds are numbered from 0 in the order their top-left pixel is met by a
/// row-major scan. `wall_image` is recorded verbatim in the result.
///
/// # Errors
///
/// Returns [`DetectError::InvalidConfig`] if `config` fails validation and
/// [`DetectError::ImageTooLarge`] if either dimension exceeds `i32::MAX`.
pub fn detect(
    grid: &RgbImage,
    wall_image: impl Into<String>,
    config: &DetectConfig,
) -> Result<HoldConfiguration, DetectError> {
    detect_with_diagnostics(grid, wall_image, config, &NullClock).map(|(holds, _)| holds)
}
