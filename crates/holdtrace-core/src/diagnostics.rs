//! Detection diagnostics: timing, counts and anomalies for each stage.
//!
//! Timestamps come from a caller-supplied [`Clock`], so the core never
//! reads the system time itself and tests can run with [`NullClock`].
//!
//! Durations are serialized as fractional seconds (`f64`) for JSON
//! compatibility, since `std::time::Duration` does not implement serde
//! traits.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::assemble::HoldAssembler;
use crate::classify::PixelClassifier;
use crate::region::RegionExtractor;
use crate::types::{DetectConfig, DetectError, HoldConfiguration, RgbImage};

/// Source of timestamps for stage timing.
pub trait Clock {
    /// Opaque timestamp.
    type Instant;

    /// Current timestamp.
    fn now(&self) -> Self::Instant;

    /// Time elapsed since `since`.
    fn elapsed(&self, since: &Self::Instant) -> Duration;
}

/// A [`Clock`] that measures nothing; every duration is zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullClock;

impl Clock for NullClock {
    type Instant = ();

    fn now(&self) {}

    fn elapsed(&self, _since: &()) -> Duration {
        Duration::ZERO
    }
}

/// Serde support for `std::time::Duration` as fractional seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs_f64().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(|_| {
            serde::de::Error::custom(
                "duration seconds must be finite, non-negative, and representable as a Duration",
            )
        })
    }
}

/// Diagnostics collected from a single detection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectDiagnostics {
    /// Connected-component extraction.
    pub extraction: StageDiagnostics,
    /// Boundary tracing, summed over all regions.
    pub tracing: StageDiagnostics,
    /// Polygon simplification, summed over all regions.
    pub simplification: StageDiagnostics,
    /// Total wall-clock duration of the pass (seconds).
    #[serde(with = "duration_serde")]
    pub total_duration: Duration,
    /// Summary counts across all stages.
    pub summary: DetectSummary,
}

/// Diagnostics for a single stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageDiagnostics {
    /// Wall-clock duration of this stage (seconds).
    #[serde(with = "duration_serde")]
    pub duration: Duration,
    /// Stage-specific metrics.
    pub metrics: StageMetrics,
}

/// Stage-specific metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StageMetrics {
    /// Region extraction metrics.
    Extraction {
        /// Foreground threshold used.
        threshold: u8,
        /// Number of foreground pixels.
        foreground_pixels: u64,
        /// Number of regions found.
        region_count: usize,
        /// Pixel count of the largest region.
        largest_region: usize,
    },
    /// Boundary tracing metrics.
    Tracing {
        /// Total boundary points across all holds.
        total_point_count: usize,
        /// Shortest boundary.
        min_boundary_points: usize,
        /// Longest boundary.
        max_boundary_points: usize,
        /// Ids of holds whose trace hit the point cap.
        truncated: Vec<usize>,
        /// Ids of holds whose trace ended at an isolated pixel.
        dead_ends: Vec<usize>,
    },
    /// Simplification metrics.
    Simplification {
        /// Douglas-Peucker tolerance in pixels.
        tolerance: f64,
        /// Boundary points before simplification.
        points_before: usize,
        /// Polygon vertices after simplification.
        points_after: usize,
        /// `1.0 - (after / before)`.
        reduction_ratio: f64,
        /// Ids of holds left with fewer than three vertices.
        degenerate: Vec<usize>,
    },
}

/// High-level summary counts for a detection pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectSummary {
    /// Mask width in pixels.
    pub image_width: u32,
    /// Mask height in pixels.
    pub image_height: u32,
    /// Total pixel count.
    pub pixel_count: u64,
    /// Number of holds produced.
    pub hold_count: usize,
    /// Total vertices across all hold polygons.
    pub polygon_point_count: usize,
}

/// Run detection over `grid`, collecting [`DetectDiagnostics`].
///
/// # Errors
///
/// Returns [`DetectError::InvalidConfig`] if `config` fails validation and
/// [`DetectError::ImageTooLarge`] if either dimension exceeds `i32::MAX`.
pub fn detect_with_diagnostics<C: Clock>(
    grid: &RgbImage,
    wall_image: impl Into<String>,
    config: &DetectConfig,
    clock: &C,
) -> Result<(HoldConfiguration, DetectDiagnostics), DetectError> {
    config.validate()?;
    let (width, height) = grid.dimensions();
    if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
        return Err(DetectError::ImageTooLarge { width, height });
    }

    let total_start = clock.now();

    let start = clock.now();
    let regions = RegionExtractor::new(PixelClassifier::new(config.threshold)).extract(grid);
    let extraction_duration = clock.elapsed(&start);

    let (holds, report) = HoldAssembler::from_config(config).assemble_timed(&regions, clock);

    let total_duration = clock.elapsed(&total_start);

    let foreground_pixels: u64 = regions.iter().map(|r| r.len() as u64).sum();
    let largest_region = regions.iter().map(crate::Region::len).max().unwrap_or(0);
    let points_before: usize = report.boundary_points.iter().sum();
    let points_after: usize = holds.iter().map(|h| h.polygon.len()).sum();
    #[allow(clippy::cast_precision_loss)]
    let reduction_ratio = if points_before > 0 {
        1.0 - points_after as f64 / points_before as f64
    } else {
        0.0
    };

    log::debug!(
        "detected {} holds in {width}x{height} mask: {foreground_pixels} foreground pixels, \
         {points_before} boundary points simplified to {points_after}",
        holds.len(),
    );

    let diagnostics = DetectDiagnostics {
        extraction: StageDiagnostics {
            duration: extraction_duration,
            metrics: StageMetrics::Extraction {
                threshold: config.threshold,
                foreground_pixels,
                region_count: regions.len(),
                largest_region,
            },
        },
        tracing: StageDiagnostics {
            duration: report.trace_duration,
            metrics: StageMetrics::Tracing {
                total_point_count: points_before,
                min_boundary_points: report.boundary_points.iter().copied().min().unwrap_or(0),
                max_boundary_points: report.boundary_points.iter().copied().max().unwrap_or(0),
                truncated: report.truncated,
                dead_ends: report.dead_ends,
            },
        },
        simplification: StageDiagnostics {
            duration: report.simplify_duration,
            metrics: StageMetrics::Simplification {
                tolerance: config.simplify_tolerance,
                points_before,
                points_after,
                reduction_ratio,
                degenerate: report.degenerate,
            },
        },
        total_duration,
        summary: DetectSummary {
            image_width: width,
            image_height: height,
            pixel_count: u64::from(width) * u64::from(height),
            hold_count: holds.len(),
            polygon_point_count: points_after,
        },
    };

    let configuration = HoldConfiguration {
        wall_image: wall_image.into(),
        image_width: width,
        image_height: height,
        version: HoldConfiguration::VERSION.to_string(),
        holds,
    };

    Ok((configuration, diagnostics))
}

impl DetectDiagnostics {
    /// Ids of holds whose boundary trace hit the point cap.
    #[must_use]
    pub fn truncated_holds(&self) -> &[usize] {
        match &self.tracing.metrics {
            StageMetrics::Tracing { truncated, .. } => truncated,
            _ => &[],
        }
    }

    /// Format diagnostics as a human-readable report.
    #[must_use]
    pub fn report(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Detection Diagnostics Report\n{}", "=".repeat(60)));
        lines.push(format!(
            "Mask: {}x{} ({} pixels)",
            self.summary.image_width, self.summary.image_height, self.summary.pixel_count,
        ));
        lines.push(format!(
            "Total duration: {:.3}ms",
            duration_ms(self.total_duration),
        ));
        lines.push(String::new());

        lines.push(format!(
            "{:<16} {:>10} {:>10}  {}",
            "Stage", "Duration", "% Total", "Details"
        ));
        lines.push("-".repeat(80));

        let total_ms = duration_ms(self.total_duration);
        for (name, diag) in [
            ("Extraction", &self.extraction),
            ("Tracing", &self.tracing),
            ("Simplification", &self.simplification),
        ] {
            let ms = duration_ms(diag.duration);
            let pct = if total_ms > 0.0 {
                ms / total_ms * 100.0
            } else {
                0.0
            };
            let details = format_metrics(&diag.metrics);
            lines.push(format!("{name:<16} {ms:>8.3}ms {pct:>9.1}%  {details}"));
        }

        lines.push(String::new());
        lines.push(format!(
            "Holds: {}  |  Polygon vertices: {}",
            self.summary.hold_count, self.summary.polygon_point_count,
        ));

        lines.join("\n")
    }
}

fn duration_ms(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

fn format_ids(ids: &[usize]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn format_metrics(metrics: &StageMetrics) -> String {
    match metrics {
        StageMetrics::Extraction {
            threshold,
            foreground_pixels,
            region_count,
            largest_region,
        } => format!(
            "threshold>{threshold} {foreground_pixels} px -> {region_count} regions (largest {largest_region} px)"
        ),
        StageMetrics::Tracing {
            total_point_count,
            min_boundary_points,
            max_boundary_points,
            truncated,
            dead_ends,
        } => {
            let mut s = format!(
                "{total_point_count} pts (min={min_boundary_points} max={max_boundary_points})"
            );
            if !truncated.is_empty() {
                s.push_str(&format!(" truncated=[{}]", format_ids(truncated)));
            }
            if !dead_ends.is_empty() {
                s.push_str(&format!(" dead_ends=[{}]", format_ids(dead_ends)));
            }
            s
        }
        StageMetrics::Simplification {
            tolerance,
            points_before,
            points_after,
            reduction_ratio,
            degenerate,
        } => {
            let mut s = format!(
                "tol={tolerance:.2} {points_before}->{points_after} pts ({:.1}% reduction)",
                reduction_ratio * 100.0,
            );
            if !degenerate.is_empty() {
                s.push_str(&format!(" rect_fallback=[{}]", format_ids(degenerate)));
            }
            s
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::types::Rgb;

    /// Advances one millisecond per reading.
    struct TickClock(Cell<u64>);

    impl Clock for TickClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            let t = self.0.get();
            self.0.set(t + 1);
            t
        }

        fn elapsed(&self, since: &u64) -> Duration {
            Duration::from_millis(self.now() - since)
        }
    }

    fn two_blob_mask() -> RgbImage {
        RgbImage::from_fn(20, 10, |x, y| {
            let in_a = (2..6).contains(&x) && (2..6).contains(&y);
            let in_b = x == 15 && y == 7;
            if in_a || in_b {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }

    #[test]
    fn duration_ms_converts_correctly() {
        let ms = duration_ms(Duration::from_millis(1234));
        assert!((ms - 1234.0).abs() < 0.01);
    }

    #[test]
    fn null_clock_reports_zero() {
        let clock = NullClock;
        let start = clock.now();
        assert_eq!(clock.elapsed(&start), Duration::ZERO);
    }

    #[test]
    fn diagnostics_count_regions_and_points() {
        let (config, diag) = detect_with_diagnostics(
            &two_blob_mask(),
            "wall.png",
            &DetectConfig::default(),
            &NullClock,
        )
        .unwrap();
        assert_eq!(config.holds.len(), 2);
        assert_eq!(diag.summary.hold_count, 2);
        assert_eq!(diag.summary.pixel_count, 200);

        let StageMetrics::Extraction {
            foreground_pixels,
            region_count,
            largest_region,
            ..
        } = &diag.extraction.metrics
        else {
            unreachable!("extraction stage carries extraction metrics")
        };
        assert_eq!(*foreground_pixels, 17);
        assert_eq!(*region_count, 2);
        assert_eq!(*largest_region, 16);

        let StageMetrics::Tracing {
            total_point_count,
            dead_ends,
            truncated,
            ..
        } = &diag.tracing.metrics
        else {
            unreachable!("tracing stage carries tracing metrics")
        };
        assert_eq!(*total_point_count, 13);
        assert_eq!(dead_ends, &vec![1]);
        assert!(truncated.is_empty());
        assert!(diag.truncated_holds().is_empty());
    }

    #[test]
    fn truncation_is_surfaced() {
        let config = DetectConfig {
            max_boundary_points: 3,
            ..DetectConfig::default()
        };
        let (_, diag) =
            detect_with_diagnostics(&two_blob_mask(), "", &config, &NullClock).unwrap();
        assert_eq!(diag.truncated_holds(), &[0]);
        assert!(diag.report().contains("truncated=[0]"));
    }

    #[test]
    fn stage_durations_come_from_the_clock() {
        let clock = TickClock(Cell::new(0));
        let (_, diag) =
            detect_with_diagnostics(&two_blob_mask(), "", &DetectConfig::default(), &clock)
                .unwrap();
        assert!(diag.extraction.duration > Duration::ZERO);
        assert!(diag.tracing.duration > Duration::ZERO);
        assert!(diag.total_duration >= diag.extraction.duration);
    }

    #[test]
    fn invalid_config_is_rejected_before_detection() {
        let config = DetectConfig {
            simplify_tolerance: -1.0,
            ..DetectConfig::default()
        };
        let result = detect_with_diagnostics(&two_blob_mask(), "", &config, &NullClock);
        assert!(matches!(result, Err(DetectError::InvalidConfig(_))));
    }

    #[test]
    fn report_mentions_every_stage() {
        let (_, diag) = detect_with_diagnostics(
            &two_blob_mask(),
            "",
            &DetectConfig::default(),
            &NullClock,
        )
        .unwrap();
        let report = diag.report();
        assert!(report.contains("Detection Diagnostics Report"));
        assert!(report.contains("Extraction"));
        assert!(report.contains("Tracing"));
        assert!(report.contains("Simplification"));
        assert!(report.contains("Holds: 2"));
    }

    #[test]
    fn diagnostics_serialize_durations_as_seconds() {
        let clock = TickClock(Cell::new(0));
        let (_, diag) =
            detect_with_diagnostics(&two_blob_mask(), "", &DetectConfig::default(), &clock)
                .unwrap();
        let value = serde_json::to_value(&diag).unwrap();
        assert!(value["total_duration"].as_f64().unwrap() > 0.0);
        let back: DetectDiagnostics = serde_json::from_value(value).unwrap();
        assert_eq!(back.summary.hold_count, 2);
    }
}
