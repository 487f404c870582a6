//! Connected-component extraction from a binary mask.
//!
//! Foreground pixels are grouped into maximal 4-connected regions with an
//! explicit-stack flood fill, so arbitrarily large holds never touch the
//! call stack. Regions come out in the row-major order of their seed pixel,
//! which fixes the hold ids for a given mask.

use crate::classify::PixelClassifier;
use crate::types::{Bounds, Point, RgbImage};

/// One 4-connected component of foreground pixels.
///
/// Pixels are stored in flood-fill order alongside a membership mask over
/// the bounding box, so [`contains`](Self::contains) is a constant-time
/// lookup for the boundary tracer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Region {
    pixels: Vec<Point>,
    bounds: Option<Bounds>,
    mask: Vec<bool>,
}

impl Region {
    /// Build a region from an arbitrary point set.
    ///
    /// Points with negative coordinates are dropped (they cannot belong to
    /// an image). Duplicate points are kept once in the membership mask
    /// but remain in [`pixels`](Self::pixels).
    #[must_use]
    pub fn from_points(points: Vec<Point>) -> Self {
        let pixels: Vec<Point> = points
            .into_iter()
            .filter(|p| p.x >= 0 && p.y >= 0)
            .collect();
        let bounds = pixels.iter().fold(None, |acc: Option<Bounds>, p| {
            let (x, y) = (p.x.unsigned_abs(), p.y.unsigned_abs());
            Some(acc.map_or_else(
                || Bounds::from_pixel(x, y),
                |mut b| {
                    b.include(x, y);
                    b
                },
            ))
        });
        Self::from_parts(pixels, bounds)
    }

    fn from_parts(pixels: Vec<Point>, bounds: Option<Bounds>) -> Self {
        let mask = bounds.map_or_else(Vec::new, |b| {
            let mut mask = vec![false; b.width() as usize * b.height() as usize];
            for &p in &pixels {
                if let Some(i) = mask_index(&b, p) {
                    mask[i] = true;
                }
            }
            mask
        });
        Self {
            pixels,
            bounds,
            mask,
        }
    }

    /// Pixels in the order the flood fill reached them.
    #[must_use]
    pub fn pixels(&self) -> &[Point] {
        &self.pixels
    }

    /// Number of pixels.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pixels.len()
    }

    /// Returns `true` if the region has no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Extremal pixel coordinates, or `None` for an empty region.
    #[must_use]
    pub const fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Whether `p` is one of the region's pixels.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        self.bounds
            .and_then(|b| mask_index(&b, p))
            .is_some_and(|i| self.mask[i])
    }

    /// The topmost pixel, leftmost among ties.
    #[must_use]
    pub fn top_left(&self) -> Option<Point> {
        let b = self.bounds?;
        let width = b.width() as usize;
        let i = self.mask.iter().position(|&m| m)?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let p = Point::new(
            (b.min_x as usize + i % width) as i32,
            (b.min_y as usize + i / width) as i32,
        );
        Some(p)
    }
}

/// Offset of `p` in a row-major mask over `b`, if `p` lies inside `b`.
fn mask_index(b: &Bounds, p: Point) -> Option<usize> {
    if !b.contains(p) {
        return None;
    }
    let dx = p.x.unsigned_abs() - b.min_x;
    let dy = p.y.unsigned_abs() - b.min_y;
    Some(dy as usize * b.width() as usize + dx as usize)
}

/// Convert scan coordinates to a [`Point`].
///
/// Callers guarantee both coordinates fit in `i32`
/// (see [`crate::detect`], which rejects larger images).
#[allow(clippy::cast_possible_wrap)]
const fn to_point(x: u32, y: u32) -> Point {
    Point::new(x as i32, y as i32)
}

/// Partitions a mask into connected foreground regions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionExtractor {
    classifier: PixelClassifier,
}

impl RegionExtractor {
    /// Extractor using the given foreground classifier.
    #[must_use]
    pub const fn new(classifier: PixelClassifier) -> Self {
        Self { classifier }
    }

    /// Scan `grid` row-major and flood-fill every unvisited foreground
    /// pixel into a region.
    ///
    /// Every foreground pixel ends up in exactly one region. An image with
    /// no foreground (including a zero-sized image) yields no regions.
    #[must_use = "returns the extracted regions"]
    pub fn extract(&self, grid: &RgbImage) -> Vec<Region> {
        let (width, height) = grid.dimensions();
        let mut visited = vec![false; width as usize * height as usize];
        let mut stack: Vec<(u32, u32)> = Vec::new();
        let mut regions = Vec::new();

        let index = |x: u32, y: u32| y as usize * width as usize + x as usize;
        let is_foreground = |x: u32, y: u32| self.classifier.is_foreground(*grid.get_pixel(x, y));

        for y in 0..height {
            for x in 0..width {
                if visited[index(x, y)] || !is_foreground(x, y) {
                    continue;
                }

                visited[index(x, y)] = true;
                stack.push((x, y));
                let mut pixels = Vec::new();
                let mut bounds = Bounds::from_pixel(x, y);

                while let Some((cx, cy)) = stack.pop() {
                    pixels.push(to_point(cx, cy));
                    bounds.include(cx, cy);

                    let neighbours = [
                        (cy > 0).then(|| (cx, cy - 1)),
                        (cy + 1 < height).then(|| (cx, cy + 1)),
                        (cx > 0).then(|| (cx - 1, cy)),
                        (cx + 1 < width).then(|| (cx + 1, cy)),
                    ];
                    for (nx, ny) in neighbours.into_iter().flatten() {
                        let i = index(nx, ny);
                        if !visited[i] && is_foreground(nx, ny) {
                            visited[i] = true;
                            stack.push((nx, ny));
                        }
                    }
                }

                if !pixels.is_empty() {
                    regions.push(Region::from_parts(pixels, Some(bounds)));
                }
            }
        }

        regions
    }
}
