//! Turn extracted regions into [`Hold`] records.
//!
//! Each region contributes its bounding box and a simplified outline:
//! boundary trace, then closed-ring Douglas-Peucker. Trace and
//! simplification buffers are reused across all regions of a pass.

use std::time::Duration;

use crate::DetectConfig;
use crate::contour::{BoundaryTracer, TraceOutcome};
use crate::diagnostics::{Clock, NullClock};
use crate::region::Region;
use crate::simplify::Simplifier;
use crate::types::{Hold, Point, Polygon};

/// Per-pass record of what the assembler did, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssemblyReport {
    /// Time spent tracing boundaries.
    pub trace_duration: Duration,
    /// Time spent simplifying boundaries.
    pub simplify_duration: Duration,
    /// Boundary length of each hold, in id order.
    pub boundary_points: Vec<usize>,
    /// Ids of holds whose trace hit the point cap.
    pub truncated: Vec<usize>,
    /// Ids of holds whose trace stopped at an isolated pixel.
    pub dead_ends: Vec<usize>,
    /// Ids of holds left with fewer than three polygon vertices.
    pub degenerate: Vec<usize>,
}

/// Builds holds from regions with a fixed tracer and tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldAssembler {
    tracer: BoundaryTracer,
    tolerance: f64,
}

impl HoldAssembler {
    /// Assembler tracing with `tracer` and simplifying with `tolerance`.
    #[must_use]
    pub const fn new(tracer: BoundaryTracer, tolerance: f64) -> Self {
        Self { tracer, tolerance }
    }

    /// Assembler configured from a [`DetectConfig`].
    #[must_use]
    pub const fn from_config(config: &DetectConfig) -> Self {
        Self::new(
            BoundaryTracer::new(config.max_boundary_points),
            config.simplify_tolerance,
        )
    }

    /// Build one hold per non-empty region, in order.
    ///
    /// Ids count up from 0 in region order. Empty regions are skipped.
    #[must_use = "returns the assembled holds"]
    pub fn assemble(&self, regions: &[Region]) -> Vec<Hold> {
        self.assemble_timed(regions, &NullClock).0
    }

    /// [`assemble`](Self::assemble), also reporting per-step timings and
    /// anomalies.
    pub fn assemble_timed<C: Clock>(
        &self,
        regions: &[Region],
        clock: &C,
    ) -> (Vec<Hold>, AssemblyReport) {
        let mut holds = Vec::with_capacity(regions.len());
        let mut report = AssemblyReport::default();
        let mut boundary: Vec<Point> = Vec::new();
        let mut simplified: Vec<Point> = Vec::new();
        let mut simplifier = Simplifier::new();

        for region in regions {
            let Some(bounds) = region.bounds() else {
                continue;
            };
            let id = holds.len();

            let started = clock.now();
            let outcome = self.tracer.trace_into(region, &mut boundary);
            report.trace_duration += clock.elapsed(&started);

            match outcome {
                TraceOutcome::Truncated => {
                    log::warn!(
                        "boundary of hold {id} exceeded {} points; outline is incomplete",
                        self.tracer.max_points()
                    );
                    report.truncated.push(id);
                }
                TraceOutcome::DeadEnd => report.dead_ends.push(id),
                TraceOutcome::Closed | TraceOutcome::Empty => {}
            }

            let started = clock.now();
            simplifier.simplify_ring_into(&boundary, self.tolerance, &mut simplified);
            report.simplify_duration += clock.elapsed(&started);

            report.boundary_points.push(boundary.len());
            if simplified.len() < 3 {
                report.degenerate.push(id);
            }

            holds.push(Hold {
                id,
                x: bounds.min_x,
                y: bounds.min_y,
                width: bounds.width(),
                height: bounds.height(),
                polygon: Polygon::new(simplified.clone()),
            });
        }

        (holds, report)
    }
}

impl Default for HoldAssembler {
    fn default() -> Self {
        Self::from_config(&DetectConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x0: i32, y0: i32, size: i32) -> Region {
        let mut points = Vec::new();
        for y in y0..y0 + size {
            for x in x0..x0 + size {
                points.push(Point::new(x, y));
            }
        }
        Region::from_points(points)
    }

    #[test]
    fn square_region_becomes_corner_polygon() {
        let assembler = HoldAssembler::new(BoundaryTracer::default(), 1.0);
        let holds = assembler.assemble(&[square(3, 3, 4)]);
        assert_eq!(holds.len(), 1);
        let hold = &holds[0];
        assert_eq!((hold.id, hold.x, hold.y, hold.width, hold.height), (0, 3, 3, 4, 4));
        assert_eq!(
            hold.polygon.points(),
            &[
                Point::new(3, 3),
                Point::new(6, 3),
                Point::new(6, 6),
                Point::new(3, 6)
            ]
        );
    }

    #[test]
    fn ids_follow_region_order_and_skip_empty_regions() {
        let regions = [square(0, 0, 2), Region::default(), square(5, 5, 3)];
        let holds = HoldAssembler::default().assemble(&regions);
        assert_eq!(holds.len(), 2);
        assert_eq!(holds[0].id, 0);
        assert_eq!(holds[1].id, 1);
        assert_eq!((holds[1].x, holds[1].y), (5, 5));
    }

    #[test]
    fn bounding_box_matches_pixel_extrema() {
        let region = Region::from_points(vec![
            Point::new(4, 9),
            Point::new(5, 9),
            Point::new(5, 10),
            Point::new(5, 11),
            Point::new(6, 11),
        ]);
        let holds = HoldAssembler::default().assemble(&[region]);
        assert_eq!((holds[0].x, holds[0].y), (4, 9));
        assert_eq!((holds[0].width, holds[0].height), (3, 3));
    }

    #[test]
    fn single_pixel_hold_keeps_its_box() {
        let region = Region::from_points(vec![Point::new(7, 2)]);
        let (holds, report) = HoldAssembler::default().assemble_timed(&[region], &NullClock);
        assert_eq!((holds[0].width, holds[0].height), (1, 1));
        assert_eq!(holds[0].polygon.points(), &[Point::new(7, 2)]);
        assert!(holds[0].is_rectangle_fallback());
        assert_eq!(report.dead_ends, vec![0]);
        assert_eq!(report.degenerate, vec![0]);
    }

    #[test]
    fn truncated_traces_are_reported() {
        let assembler = HoldAssembler::new(BoundaryTracer::new(4), 1.0);
        let (holds, report) = assembler.assemble_timed(&[square(0, 0, 6)], &NullClock);
        assert_eq!(holds.len(), 1);
        assert_eq!(report.truncated, vec![0]);
        assert_eq!(report.boundary_points, vec![4]);
    }

    #[test]
    fn default_tolerance_collapses_small_square() {
        let (holds, report) =
            HoldAssembler::default().assemble_timed(&[square(3, 3, 4)], &NullClock);
        assert_eq!(holds[0].polygon.len(), 2);
        assert_eq!(report.degenerate, vec![0]);
        assert_eq!(report.boundary_points, vec![12]);
    }
}
