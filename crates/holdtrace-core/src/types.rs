//! Shared types for hold detection and hit-testing.

use serde::{Deserialize, Serialize};

/// Re-export `RgbImage` so downstream crates can hand pixel grids to the
/// detector without depending on `image` directly.
pub use image::{Rgb, RgbImage};

/// An integer point in image pixel space (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Column (pixels from left edge).
    pub x: i32,
    /// Row (pixels from top edge).
    pub y: i32,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The point displaced by `(dx, dy)`, or `None` if either coordinate
    /// leaves the `i32` range.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Option<Self> {
        let Some(x) = self.x.checked_add(dx) else {
            return None;
        };
        let Some(y) = self.y.checked_add(dy) else {
            return None;
        };
        Some(Self { x, y })
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        let dx = f64::from(self.x) - f64::from(other.x);
        let dy = f64::from(self.y) - f64::from(other.y);
        dx.hypot(dy)
    }
}

/// Inclusive axis-aligned pixel extent of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    /// Leftmost column.
    pub min_x: u32,
    /// Topmost row.
    pub min_y: u32,
    /// Rightmost column.
    pub max_x: u32,
    /// Bottom row.
    pub max_y: u32,
}

impl Bounds {
    /// Bounds covering the single pixel `(x, y)`.
    #[must_use]
    pub const fn from_pixel(x: u32, y: u32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    /// Grow the bounds to include pixel `(x, y)`.
    pub fn include(&mut self, x: u32, y: u32) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
    }

    /// `max_x - min_x + 1`.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    /// `max_y - min_y + 1`.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Whether `p` lies inside the bounds.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        let (x, y) = (i64::from(p.x), i64::from(p.y));
        x >= i64::from(self.min_x)
            && x <= i64::from(self.max_x)
            && y >= i64::from(self.min_y)
            && y <= i64::from(self.max_y)
    }
}

/// An ordered, implicitly closed sequence of vertices.
///
/// The last vertex connects back to the first. An empty polygon means no
/// contour was found; fewer than three vertices means the hold is tested
/// and drawn as its bounding rectangle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon(Vec<Point>);

impl Polygon {
    /// Create a polygon from its vertices.
    #[must_use]
    pub const fn new(points: Vec<Point>) -> Self {
        Self(points)
    }

    /// Returns `true` if the polygon has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the polygon has fewer than three vertices and
    /// therefore encloses no area.
    #[must_use]
    pub const fn is_degenerate(&self) -> bool {
        self.0.len() < 3
    }

    /// Vertices in order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Consumes the polygon and returns its vertices.
    #[must_use]
    pub fn into_points(self) -> Vec<Point> {
        self.0
    }

    /// Mean of the vertices, or `None` for an empty polygon.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.0.is_empty() {
            return None;
        }
        let (sx, sy) = self.0.iter().fold((0.0, 0.0), |(sx, sy), p| {
            (sx + f64::from(p.x), sy + f64::from(p.y))
        });
        let n = self.0.len() as f64;
        Some((sx / n, sy / n))
    }
}

/// One detected hold: its bounding box and simplified outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    /// Position in discovery order (row-major scan of seed pixels).
    pub id: usize,
    /// Left edge of the bounding box.
    pub x: u32,
    /// Top edge of the bounding box.
    pub y: u32,
    /// `maxX - minX + 1`.
    pub width: u32,
    /// `maxY - minY + 1`.
    pub height: u32,
    /// Simplified outline in image pixels.
    pub polygon: Polygon,
}

impl Hold {
    /// Centre of the bounding box in image pixels.
    #[must_use]
    pub fn centre(&self) -> (f64, f64) {
        (
            f64::from(self.x) + f64::from(self.width) / 2.0,
            f64::from(self.y) + f64::from(self.height) / 2.0,
        )
    }

    /// Whether the hold falls back to its bounding rectangle for
    /// containment and drawing.
    #[must_use]
    pub const fn is_rectangle_fallback(&self) -> bool {
        self.polygon.is_degenerate()
    }
}

/// The output of one detection run.
///
/// Serializes to the interchange document consumed by renderers,
/// hit-testers and persistence:
/// `{ wallImage, imageWidth, imageHeight, version, holds: [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldConfiguration {
    /// Reference to the wall photograph the holds were traced from.
    pub wall_image: String,
    /// Width of the traced image in pixels.
    pub image_width: u32,
    /// Height of the traced image in pixels.
    pub image_height: u32,
    /// Document format version.
    pub version: String,
    /// Holds in id order.
    pub holds: Vec<Hold>,
}

impl HoldConfiguration {
    /// Version string written by detection.
    pub const VERSION: &'static str = "1.0";

    /// Look up a hold by id.
    #[must_use]
    pub fn hold(&self, id: usize) -> Option<&Hold> {
        self.holds.iter().find(|h| h.id == id)
    }
}

/// Tunables for a detection pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectConfig {
    /// A pixel is foreground when every channel is strictly greater than
    /// this value.
    pub threshold: u8,

    /// Douglas-Peucker tolerance in pixels. Must be finite and positive.
    pub simplify_tolerance: f64,

    /// Upper bound on the number of points a single boundary trace may
    /// emit. Must be non-zero.
    pub max_boundary_points: usize,
}

impl DetectConfig {
    /// Default foreground threshold.
    pub const DEFAULT_THRESHOLD: u8 = 200;
    /// Default simplification tolerance in pixels.
    pub const DEFAULT_SIMPLIFY_TOLERANCE: f64 = 8.0;
    /// Default boundary trace cap.
    pub const DEFAULT_MAX_BOUNDARY_POINTS: usize = 10_000;

    /// Check the invariants documented on each field.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError::InvalidConfig`] naming the offending field.
    pub fn validate(&self) -> Result<(), DetectError> {
        if !self.simplify_tolerance.is_finite() || self.simplify_tolerance <= 0.0 {
            return Err(DetectError::InvalidConfig(format!(
                "simplify_tolerance must be finite and positive, got {}",
                self.simplify_tolerance
            )));
        }
        if self.max_boundary_points == 0 {
            return Err(DetectError::InvalidConfig(
                "max_boundary_points must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            simplify_tolerance: Self::DEFAULT_SIMPLIFY_TOLERANCE,
            max_boundary_points: Self::DEFAULT_MAX_BOUNDARY_POINTS,
        }
    }
}

/// Errors that can occur before detection starts.
///
/// Detection itself is total over valid input: empty images, empty regions
/// and runaway traces are reported through diagnostics, not errors.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Detection configuration is invalid.
    #[error("invalid detection configuration: {0}")]
    InvalidConfig(String),

    /// Image dimensions exceed the signed 32-bit pixel coordinate space.
    #[error("image of {width}x{height} pixels is too large to trace")]
    ImageTooLarge {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
    },
}
