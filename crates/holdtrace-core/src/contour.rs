//! Boundary tracing: walk the outer edge of a region in order.
//!
//! Moore-neighbourhood tracing over the 8 compass directions. The walk
//! starts at the region's topmost-leftmost pixel and at each step sweeps
//! the neighbours clockwise, beginning slightly behind the direction it
//! last moved in, so it hugs the outside of the region.
//!
//! The output is at full pixel resolution and may touch itself: one-pixel
//! wide protrusions are walked out and back, so those pixels appear twice.

use crate::region::Region;
use crate::types::Point;

/// Neighbour offsets, clockwise from north.
const DIRECTIONS: [(i32, i32); 8] = [
    (0, -1),  // N
    (1, -1),  // NE
    (1, 0),   // E
    (1, 1),   // SE
    (0, 1),   // S
    (-1, 1),  // SW
    (-1, 0),  // W
    (-1, -1), // NW
];

/// How a trace ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceOutcome {
    /// The region was empty; nothing was traced.
    Empty,
    /// The walk returned to the start pixel.
    Closed,
    /// A pixel with no region neighbours was reached (an isolated pixel).
    DeadEnd,
    /// The point cap was reached before the walk closed.
    Truncated,
}

/// A traced boundary and how the trace ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boundary {
    /// Boundary pixels in walk order, start first. The start pixel is not
    /// repeated at the end; closure is implicit.
    pub points: Vec<Point>,
    /// Why the walk stopped.
    pub outcome: TraceOutcome,
}

/// Moore-neighbourhood boundary tracer with a hard output cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundaryTracer {
    max_points: usize,
}

impl BoundaryTracer {
    /// Tracer that emits at most `max_points` points per region.
    #[must_use]
    pub const fn new(max_points: usize) -> Self {
        Self { max_points }
    }

    /// The output cap.
    #[must_use]
    pub const fn max_points(&self) -> usize {
        self.max_points
    }

    /// Trace the outer boundary of `region`.
    #[must_use = "returns the traced boundary"]
    pub fn trace(&self, region: &Region) -> Boundary {
        let mut points = Vec::new();
        let outcome = self.trace_into(region, &mut points);
        Boundary { points, outcome }
    }

    /// Trace the outer boundary of `region` into `out`.
    ///
    /// `out` is cleared first, so one buffer can be reused across regions.
    pub fn trace_into(&self, region: &Region, out: &mut Vec<Point>) -> TraceOutcome {
        out.clear();
        let Some(start) = region.top_left() else {
            return TraceOutcome::Empty;
        };
        if self.max_points == 0 {
            return TraceOutcome::Truncated;
        }

        out.push(start);
        let mut current = start;
        let mut search_from = 0;

        loop {
            let next = (0..DIRECTIONS.len())
                .map(|k| (search_from + k) % DIRECTIONS.len())
                .filter_map(|d| {
                    let (dx, dy) = DIRECTIONS[d];
                    current.offset(dx, dy).map(|p| (p, d))
                })
                .find(|&(p, _)| region.contains(p));

            let Some((p, d)) = next else {
                return TraceOutcome::DeadEnd;
            };
            if p == start {
                return TraceOutcome::Closed;
            }
            if out.len() >= self.max_points {
                return TraceOutcome::Truncated;
            }

            out.push(p);
            current = p;
            search_from = (d + 5) % DIRECTIONS.len();
        }
    }
}

impl Default for BoundaryTracer {
    fn default() -> Self {
        Self::new(crate::DetectConfig::DEFAULT_MAX_BOUNDARY_POINTS)
    }
}
