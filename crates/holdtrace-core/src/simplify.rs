//! Polygon simplification using the Ramer-Douglas-Peucker algorithm.
//!
//! Reduces a full-resolution boundary to the few vertices that stay within
//! a perpendicular tolerance of it. Recursion is replaced by an explicit
//! stack of index ranges, so jagged contours of any length are safe.
//!
//! [`simplify`] treats its input as an open polyline (first and last points
//! are always kept). [`simplify_ring`] treats it as a closed boundary and
//! is what hold detection uses.

use crate::types::Point;

/// Simplify an open polyline.
///
/// Points whose perpendicular distance from the chord between the current
/// endpoints is at most `epsilon` are dropped. Inputs of fewer than three
/// points are returned unchanged.
#[must_use = "returns the simplified points"]
pub fn simplify(points: &[Point], epsilon: f64) -> Vec<Point> {
    let mut out = Vec::new();
    Simplifier::default().simplify_into(points, epsilon, &mut out);
    out
}

/// Simplify a closed boundary.
///
/// The ring is split at two anchors, its first point and the point
/// farthest from it, and each half (the second one including the closing
/// edge back to the start) is simplified as an open polyline. The closing
/// point is not repeated in the output.
#[must_use = "returns the simplified points"]
pub fn simplify_ring(points: &[Point], epsilon: f64) -> Vec<Point> {
    let mut out = Vec::new();
    Simplifier::default().simplify_ring_into(points, epsilon, &mut out);
    out
}

/// Reusable scratch space for repeated simplification.
#[derive(Debug, Clone, Default)]
pub struct Simplifier {
    keep: Vec<bool>,
    stack: Vec<(usize, usize)>,
    ring: Vec<Point>,
}

impl Simplifier {
    /// Create a simplifier with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// [`simplify`] into `out`, reusing internal buffers. `out` is cleared.
    pub fn simplify_into(&mut self, points: &[Point], epsilon: f64, out: &mut Vec<Point>) {
        out.clear();
        if points.len() < 3 {
            out.extend_from_slice(points);
            return;
        }

        let last = points.len() - 1;
        self.reset(points.len());
        self.keep[0] = true;
        self.keep[last] = true;
        self.stack.push((0, last));
        mark_kept(points, epsilon, &mut self.keep, &mut self.stack);

        collect_kept(points, &self.keep, out);
    }

    /// [`simplify_ring`] into `out`, reusing internal buffers. `out` is
    /// cleared.
    pub fn simplify_ring_into(&mut self, points: &[Point], epsilon: f64, out: &mut Vec<Point>) {
        out.clear();
        if points.len() < 3 {
            out.extend_from_slice(points);
            return;
        }

        let start = points[0];
        let mut anchor = 0;
        let mut anchor_dist = 0.0;
        for (i, &p) in points.iter().enumerate().skip(1) {
            let d = p.distance(start);
            if d > anchor_dist {
                anchor_dist = d;
                anchor = i;
            }
        }
        if anchor == 0 {
            // Every point coincides with the start.
            out.push(start);
            return;
        }

        let n = points.len();
        self.ring.clear();
        self.ring.extend_from_slice(points);
        self.ring.push(start);

        self.reset(n + 1);
        self.keep[0] = true;
        self.keep[anchor] = true;
        self.keep[n] = true;
        self.stack.push((0, anchor));
        self.stack.push((anchor, n));
        mark_kept(&self.ring, epsilon, &mut self.keep, &mut self.stack);

        collect_kept(&self.ring[..n], &self.keep[..n], out);
    }

    fn reset(&mut self, len: usize) {
        self.keep.clear();
        self.keep.resize(len, false);
        self.stack.clear();
    }
}

/// Drain `stack`, flagging in `keep` every point the algorithm retains.
///
/// Each entry is an inclusive index range whose endpoints are already kept.
fn mark_kept(points: &[Point], epsilon: f64, keep: &mut [bool], stack: &mut Vec<(usize, usize)>) {
    while let Some((start, end)) = stack.pop() {
        if end <= start + 1 {
            continue;
        }

        let mut max_dist = 0.0;
        let mut max_idx = start;
        for i in (start + 1)..end {
            let d = perpendicular_distance(points[i], points[start], points[end]);
            if d > max_dist {
                max_dist = d;
                max_idx = i;
            }
        }

        if max_dist > epsilon {
            keep[max_idx] = true;
            stack.push((max_idx, end));
            stack.push((start, max_idx));
        }
    }
}

fn collect_kept(points: &[Point], keep: &[bool], out: &mut Vec<Point>) {
    out.extend(
        points
            .iter()
            .zip(keep)
            .filter(|&(_, k)| *k)
            .map(|(&p, _)| p),
    );
}

/// Perpendicular distance from `point` to the line through `line_start`
/// and `line_end`.
///
/// When the two line points coincide, returns the distance from `point`
/// to `line_start`.
#[must_use]
pub fn perpendicular_distance(point: Point, line_start: Point, line_end: Point) -> f64 {
    let (px, py) = (f64::from(point.x), f64::from(point.y));
    let (sx, sy) = (f64::from(line_start.x), f64::from(line_start.y));
    let (ex, ey) = (f64::from(line_end.x), f64::from(line_end.y));
    let dx = ex - sx;
    let dy = ey - sy;

    if dx == 0.0 && dy == 0.0 {
        return point.distance(line_start);
    }

    let numerator = dy.mul_add(px, -(dx * py)) + ex.mul_add(sy, -(ey * sx));
    numerator.abs() / dx.hypot(dy)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pts(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    /// A jagged open curve with strictly increasing x.
    fn wobbly_curve() -> Vec<Point> {
        (0..60)
            .map(|x| {
                let y = (x * 7) % 11 + (x / 10) * 3 - if x % 4 == 0 { 5 } else { 0 };
                Point::new(x, y)
            })
            .collect()
    }

    /// Positions of `sub` within `full`, checking it is a subsequence.
    fn subsequence_indices(full: &[Point], sub: &[Point]) -> Option<Vec<usize>> {
        let mut indices = Vec::with_capacity(sub.len());
        let mut from = 0;
        for p in sub {
            let offset = full[from..].iter().position(|q| q == p)?;
            indices.push(from + offset);
            from += offset + 1;
        }
        Some(indices)
    }

    #[test]
    fn empty_input_unchanged() {
        assert!(simplify(&[], 1.0).is_empty());
        assert!(simplify_ring(&[], 1.0).is_empty());
    }

    #[test]
    fn short_input_unchanged() {
        let two = pts(&[(0, 0), (10, 0)]);
        assert_eq!(simplify(&two, 1.0), two);
        assert_eq!(simplify_ring(&two, 1.0), two);
        let one = pts(&[(1, 2)]);
        assert_eq!(simplify(&one, 1.0), one);
    }

    #[test]
    fn collinear_points_collapse_to_endpoints() {
        let line = pts(&[(0, 0), (1, 1), (2, 2), (3, 3), (4, 4)]);
        assert_eq!(simplify(&line, 0.1), pts(&[(0, 0), (4, 4)]));
    }

    #[test]
    fn zigzag_retains_peaks() {
        let zigzag = pts(&[(0, 0), (2, 5), (4, 0), (6, 5), (8, 0)]);
        assert_eq!(simplify(&zigzag, 1.0).len(), 5);
    }

    #[test]
    fn large_tolerance_collapses_zigzag() {
        let zigzag = pts(&[(0, 0), (2, 5), (4, 0), (6, 5), (8, 0)]);
        assert_eq!(simplify(&zigzag, 10.0), pts(&[(0, 0), (8, 0)]));
    }

    #[test]
    fn tie_with_epsilon_is_dropped() {
        // The middle point is exactly 3.0 from the chord.
        let bump = pts(&[(0, 0), (2, 3), (4, 0)]);
        assert_eq!(simplify(&bump, 3.0).len(), 2);
        assert_eq!(simplify(&bump, 2.999).len(), 3);
    }

    #[test]
    fn output_is_a_subsequence_within_tolerance() {
        let curve = wobbly_curve();
        for epsilon in [0.5, 1.0, 2.5, 4.0, 8.0] {
            let simplified = simplify(&curve, epsilon);
            assert_eq!(simplified.first(), curve.first());
            assert_eq!(simplified.last(), curve.last());
            assert!(simplified.len() <= curve.len());

            let kept = subsequence_indices(&curve, &simplified);
            assert!(kept.is_some(), "not a subsequence at epsilon {epsilon}");
            let kept = kept.unwrap();
            for pair in kept.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                for p in &curve[a + 1..b] {
                    let d = perpendicular_distance(*p, curve[a], curve[b]);
                    assert!(d <= epsilon, "{p:?} is {d} from its chord at epsilon {epsilon}");
                }
            }
        }
    }

    #[test]
    fn simplify_is_idempotent() {
        let curve = wobbly_curve();
        for epsilon in [0.5, 2.0, 8.0] {
            let once = simplify(&curve, epsilon);
            let twice = simplify(&once, epsilon);
            assert_eq!(once, twice, "not idempotent at epsilon {epsilon}");
        }
    }

    #[test]
    fn ring_of_square_perimeter_keeps_corners() {
        let perimeter = pts(&[
            (3, 3),
            (4, 3),
            (5, 3),
            (6, 3),
            (6, 4),
            (6, 5),
            (6, 6),
            (5, 6),
            (4, 6),
            (3, 6),
            (3, 5),
            (3, 4),
        ]);
        assert_eq!(
            simplify_ring(&perimeter, 1.0),
            pts(&[(3, 3), (6, 3), (6, 6), (3, 6)])
        );
        // Corner deviation is ~2.12 px, under the default tolerance.
        assert_eq!(simplify_ring(&perimeter, 8.0), pts(&[(3, 3), (6, 6)]));
    }

    #[test]
    fn ring_keeps_start_and_farthest_point() {
        let ring = pts(&[(0, 0), (5, 1), (10, 0), (9, 5), (10, 10), (5, 9), (0, 10), (1, 5)]);
        let simplified = simplify_ring(&ring, 100.0);
        assert_eq!(simplified, pts(&[(0, 0), (10, 10)]));
    }

    #[test]
    fn ring_of_coincident_points_collapses_to_one() {
        let ring = pts(&[(2, 2), (2, 2), (2, 2)]);
        assert_eq!(simplify_ring(&ring, 1.0), pts(&[(2, 2)]));
    }

    /// Traced boundaries of every region in a seeded random 24x24 mask.
    fn traced_rings(seed: u32) -> Vec<Vec<Point>> {
        use crate::classify::PixelClassifier;
        use crate::contour::BoundaryTracer;
        use crate::region::RegionExtractor;
        use crate::types::{Rgb, RgbImage};

        let mut state = seed;
        let grid = RgbImage::from_fn(24, 24, |_, _| {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            if (state >> 16) % 100 < 55 {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        });
        let tracer = BoundaryTracer::default();
        RegionExtractor::new(PixelClassifier::default())
            .extract(&grid)
            .iter()
            .map(|region| tracer.trace(region).points)
            .collect()
    }

    /// Check a ring simplification against the ring it came from: the
    /// output is the ring at increasing kept indices starting from 0, and
    /// every ring point, including those on the closing edge back to the
    /// start, lies within `epsilon` of its chord.
    fn check_ring(ring: &[Point], epsilon: f64) -> Vec<Point> {
        let mut simplifier = Simplifier::new();
        let mut out = Vec::new();
        simplifier.simplify_ring_into(ring, epsilon, &mut out);

        if ring.len() < 3 {
            assert_eq!(out, ring);
            return out;
        }
        if out.len() == 1 {
            assert!(ring.iter().all(|&p| p == out[0]));
            return out;
        }

        let n = ring.len();
        let mut kept: Vec<usize> = (0..n).filter(|&i| simplifier.keep[i]).collect();
        assert_eq!(kept.first(), Some(&0));
        let from_ring: Vec<Point> = kept.iter().map(|&i| ring[i]).collect();
        assert_eq!(from_ring, out, "output is not the ring at its kept indices");

        let mut closed = ring.to_vec();
        closed.push(ring[0]);
        kept.push(n);
        for pair in kept.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            for p in &closed[a + 1..b] {
                let d = perpendicular_distance(*p, closed[a], closed[b]);
                assert!(d <= epsilon, "{p:?} is {d} from chord {a}..{b} at epsilon {epsilon}");
            }
        }
        out
    }

    #[test]
    fn ring_simplification_of_traced_masks_stays_within_tolerance() {
        let mut rings = 0;
        for seed in 1..=40 {
            for ring in traced_rings(seed) {
                for epsilon in [0.7, 2.0, 8.0] {
                    let once = check_ring(&ring, epsilon);
                    assert!(once.len() <= ring.len());
                    assert_eq!(once.first(), ring.first());
                }
                rings += 1;
            }
        }
        assert!(rings >= 40, "only {rings} rings traced");
    }

    #[test]
    fn ring_simplification_of_traced_masks_is_idempotent() {
        for seed in 1..=40 {
            for ring in traced_rings(seed) {
                for epsilon in [0.7, 2.0, 8.0] {
                    let once = simplify_ring(&ring, epsilon);
                    let twice = simplify_ring(&once, epsilon);
                    assert_eq!(once, twice, "seed {seed} not idempotent at epsilon {epsilon}");
                }
            }
        }
    }

    #[test]
    fn simplifier_reuses_buffers_across_calls() {
        let mut simplifier = Simplifier::new();
        let mut out = Vec::new();
        simplifier.simplify_into(&pts(&[(0, 0), (2, 5), (4, 0)]), 1.0, &mut out);
        assert_eq!(out.len(), 3);
        simplifier.simplify_into(&pts(&[(0, 0), (1, 0), (2, 0)]), 1.0, &mut out);
        assert_eq!(out, pts(&[(0, 0), (2, 0)]));
    }

    #[test]
    fn perpendicular_distance_on_axis() {
        let d = perpendicular_distance(Point::new(1, 3), Point::new(0, 0), Point::new(2, 0));
        assert!((d - 3.0).abs() < 1e-10);
    }

    #[test]
    fn perpendicular_distance_diagonal_segment() {
        let d = perpendicular_distance(Point::new(2, -1), Point::new(0, 0), Point::new(4, 2));
        let expected = 8.0 / 20.0_f64.sqrt();
        assert!((d - expected).abs() < 1e-10, "got {d}, expected {expected}");
    }

    #[test]
    fn perpendicular_distance_is_to_the_line_not_the_segment() {
        // Beyond the end of the segment but on its line.
        let d = perpendicular_distance(Point::new(10, 0), Point::new(0, 0), Point::new(2, 0));
        assert!(d.abs() < 1e-10);
    }

    #[test]
    fn perpendicular_distance_coincident_endpoints() {
        let d = perpendicular_distance(Point::new(3, 4), Point::new(0, 0), Point::new(0, 0));
        assert!((d - 5.0).abs() < 1e-10);
    }
}
