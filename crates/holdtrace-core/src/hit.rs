//! Hit-testing display-space points against detected holds.
//!
//! A click in viewport coordinates is shifted by the letterbox offset and
//! tested against each hold's polygon scaled into display units, using the
//! even-odd ray-casting rule. Holds whose polygon has fewer than three
//! vertices are tested against their scaled bounding box instead.
//!
//! [`find_hit`] scans holds linearly. [`HoldIndex`] returns the same answer
//! from an R-tree over hold bounding boxes, for walls with many holds.

use rstar::RTree;
use rstar::primitives::{GeomWithData, Rectangle};
use serde::{Deserialize, Serialize};

use crate::display::{DisplayParameters, compute_parameters};
use crate::types::{Hold, HoldConfiguration, Point};

/// A point in viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayPoint {
    /// Horizontal position from the viewport's left edge.
    pub x: f64,
    /// Vertical position from the viewport's top edge.
    pub y: f64,
}

impl DisplayPoint {
    /// Create a new display point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The first hold, in list order, containing `point`.
///
/// Returns `None` when no hold contains the point or `params` is the
/// invalid sentinel.
#[must_use]
pub fn find_hit<'a>(
    point: DisplayPoint,
    holds: &'a [Hold],
    params: &DisplayParameters,
) -> Option<&'a Hold> {
    if !params.is_valid() {
        return None;
    }
    let px = point.x - params.offset_x;
    let py = point.y - params.offset_y;
    holds.iter().find(|h| hold_contains(h, px, py, params))
}

/// Whether `hold` contains `(px, py)`, given in display units relative to
/// the displayed image's top-left corner (offsets already removed).
#[must_use]
pub fn hold_contains(hold: &Hold, px: f64, py: f64, params: &DisplayParameters) -> bool {
    if hold.is_rectangle_fallback() {
        let left = f64::from(hold.x) * params.scale_x;
        let top = f64::from(hold.y) * params.scale_y;
        let right = (f64::from(hold.x) + f64::from(hold.width)) * params.scale_x;
        let bottom = (f64::from(hold.y) + f64::from(hold.height)) * params.scale_y;
        px >= left && px <= right && py >= top && py <= bottom
    } else {
        polygon_contains(
            hold.polygon.points(),
            px,
            py,
            params.scale_x,
            params.scale_y,
        )
    }
}

/// Even-odd point-in-polygon test with vertices scaled by
/// `(scale_x, scale_y)`.
///
/// Fewer than three vertices never contain anything.
#[must_use]
pub fn polygon_contains(vertices: &[Point], px: f64, py: f64, scale_x: f64, scale_y: f64) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }

    let scaled = |p: Point| (f64::from(p.x) * scale_x, f64::from(p.y) * scale_y);
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = scaled(vertices[i]);
        let (xj, yj) = scaled(vertices[j]);
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl HoldConfiguration {
    /// Id of the hold under a click at `point` in a viewport of the given
    /// size, with the image fitted and centred.
    #[must_use]
    pub fn hold_at(
        &self,
        point: DisplayPoint,
        viewport_width: f64,
        viewport_height: f64,
    ) -> Option<usize> {
        let params = compute_parameters(
            viewport_width,
            viewport_height,
            self.image_width,
            self.image_height,
        );
        find_hit(point, &self.holds, &params).map(|h| h.id)
    }
}

/// Image-space slack added around every indexed box, so rounding in the
/// display-to-image conversion never drops a true candidate.
const ENVELOPE_MARGIN: f64 = 0.5;

/// A hold's bounding box, tagged with its position in the hold list.
type IndexedBox = GeomWithData<Rectangle<[f64; 2]>, usize>;

/// Spatial index over a hold list's bounding boxes.
///
/// Built once per [`HoldConfiguration`]; valid for any display mapping.
pub struct HoldIndex<'a> {
    holds: &'a [Hold],
    tree: RTree<IndexedBox>,
}

impl<'a> HoldIndex<'a> {
    /// Index `holds`.
    #[must_use]
    pub fn new(holds: &'a [Hold]) -> Self {
        let boxes = holds
            .iter()
            .enumerate()
            .map(|(position, h)| {
                let rect = Rectangle::from_corners(
                    [
                        f64::from(h.x) - ENVELOPE_MARGIN,
                        f64::from(h.y) - ENVELOPE_MARGIN,
                    ],
                    [
                        f64::from(h.x) + f64::from(h.width) + ENVELOPE_MARGIN,
                        f64::from(h.y) + f64::from(h.height) + ENVELOPE_MARGIN,
                    ],
                );
                IndexedBox::new(rect, position)
            })
            .collect();
        Self {
            holds,
            tree: RTree::bulk_load(boxes),
        }
    }

    /// Number of indexed holds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Returns `true` if no holds are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// Same result as [`find_hit`] over the indexed holds.
    #[must_use]
    pub fn find_hit(&self, point: DisplayPoint, params: &DisplayParameters) -> Option<&'a Hold> {
        let (ix, iy) = params.to_image(point.x, point.y)?;
        let px = point.x - params.offset_x;
        let py = point.y - params.offset_y;

        let mut candidates: Vec<usize> = self
            .tree
            .locate_all_at_point(&[ix, iy])
            .map(|b| b.data)
            .collect();
        candidates.sort_unstable();

        let holds = self.holds;
        candidates
            .into_iter()
            .map(|i| &holds[i])
            .find(|h| hold_contains(h, px, py, params))
    }
}
