//! holdtrace: detect climbing holds in a binary mask and hit-test them.
//!
//! `detect` turns a mask image (white holds on black) into a hold
//! configuration JSON document, optionally with an SVG overlay and
//! per-stage diagnostics. `hit` loads such a document and reports which
//! hold a viewport click lands on.
//!
//! # Usage
//!
//! ```text
//! holdtrace detect mask.png --wall-image wall.jpg -o holds.json --svg holds.svg
//! holdtrace hit holds.json --viewport 800x600 --at 412.5,230
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod raster;

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use flexi_logger::Logger;
use holdtrace_core::diagnostics::Clock;
use holdtrace_core::{DetectConfig, DisplayPoint, HoldIndex, compute_parameters};

/// Climbing-hold outline detection and hit-testing.
#[derive(Parser)]
#[command(name = "holdtrace", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect holds in a binary mask and write a hold configuration.
    Detect(DetectArgs),
    /// Report which hold a viewport click lands on.
    Hit(HitArgs),
}

#[derive(Args)]
struct DetectArgs {
    /// Path to the binary mask image (PNG, JPEG, BMP, WebP).
    mask: PathBuf,

    /// Wall photograph the mask was drawn over.
    ///
    /// Recorded in the output document. When its dimensions differ from
    /// the mask's, the mask is resized to match before detection.
    #[arg(long)]
    wall_image: Option<PathBuf>,

    /// Write the hold configuration JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write an SVG outline overlay to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Foreground threshold: a pixel is a hold when every channel exceeds it.
    #[arg(long, default_value_t = DetectConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Douglas-Peucker simplification tolerance in pixels.
    #[arg(long, default_value_t = DetectConfig::DEFAULT_SIMPLIFY_TOLERANCE)]
    tolerance: f64,

    /// Safety cap on points per traced boundary.
    #[arg(long, default_value_t = DetectConfig::DEFAULT_MAX_BOUNDARY_POINTS, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    max_boundary_points: usize,

    /// Full detection config as a JSON string.
    ///
    /// When provided, the individual parameter flags are ignored.
    #[arg(long)]
    config_json: Option<String>,

    /// Print a per-stage diagnostics report to stderr.
    #[arg(long)]
    diagnostics: bool,

    /// Print per-stage diagnostics as JSON to stderr.
    #[arg(long, conflicts_with = "diagnostics")]
    json_diagnostics: bool,
}

#[derive(Args)]
struct HitArgs {
    /// Hold configuration JSON produced by `detect`.
    holds: PathBuf,

    /// Viewport size as `WIDTHxHEIGHT`.
    #[arg(long, value_parser = parse_viewport)]
    viewport: (f64, f64),

    /// Click position in viewport coordinates as `X,Y`.
    #[arg(long, value_parser = parse_point)]
    at: DisplayPoint,
}

/// Parse `WIDTHxHEIGHT`, e.g. `800x600`.
fn parse_viewport(s: &str) -> Result<(f64, f64), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: f64 = w
        .trim()
        .parse()
        .map_err(|e| format!("invalid viewport width {w:?}: {e}"))?;
    let height: f64 = h
        .trim()
        .parse()
        .map_err(|e| format!("invalid viewport height {h:?}: {e}"))?;
    Ok((width, height))
}

/// Parse `X,Y`, e.g. `412.5,230`.
fn parse_point(s: &str) -> Result<DisplayPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got {s:?}"))?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|e| format!("invalid x coordinate {x:?}: {e}"))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|e| format!("invalid y coordinate {y:?}: {e}"))?;
    Ok(DisplayPoint::new(x, y))
}

/// Build a [`DetectConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.
fn config_from_args(args: &DetectArgs) -> Result<DetectConfig, String> {
    let config = if let Some(ref json) = args.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        DetectConfig {
            threshold: args.threshold,
            simplify_tolerance: args.tolerance,
            max_boundary_points: args.max_boundary_points,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let _logger = Logger::try_with_env_or_str("info")?.start()?;
    let cli = Cli::parse();

    match cli.command {
        Command::Detect(args) => detect(&args),
        Command::Hit(args) => hit(&args),
    }
}

fn detect(args: &DetectArgs) -> Result<(), Box<dyn Error>> {
    let config = config_from_args(args)?;

    let mut mask = raster::load_rgb(&args.mask)
        .map_err(|e| format!("Error reading mask {}: {e}", args.mask.display()))?;
    eprintln!(
        "Mask: {} ({}x{})",
        args.mask.display(),
        mask.width(),
        mask.height()
    );

    if let Some(ref wall) = args.wall_image {
        match raster::dimensions(wall) {
            Ok((width, height)) => mask = raster::fit_mask(mask, width, height),
            Err(e) => log::warn!(
                "cannot read wall image {}: {e}; keeping mask dimensions",
                wall.display()
            ),
        }
    }

    let wall_ref = args.wall_image.as_deref().unwrap_or(&args.mask);
    let (holds, diagnostics) = holdtrace_core::detect_with_diagnostics(
        &mask,
        path_string(wall_ref),
        &config,
        &StdClock,
    )?;
    eprintln!("Detected {} holds", holds.holds.len());

    if args.json_diagnostics {
        eprintln!("{}", serde_json::to_string_pretty(&diagnostics)?);
    } else if args.diagnostics {
        eprintln!("{}", diagnostics.report());
    }

    let json = holdtrace_export::to_json(&holds)?;
    if let Some(ref path) = args.output {
        std::fs::write(path, &json)
            .map_err(|e| format!("Error writing {}: {e}", path.display()))?;
        eprintln!("Holds written to {} ({} bytes)", path.display(), json.len());
    } else {
        println!("{json}");
    }

    if let Some(ref svg_path) = args.svg {
        let title = args
            .mask
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("holdtrace");
        let desc = serde_json::to_string(&config)?;
        let background = args.wall_image.as_deref().map(path_string);
        let metadata = holdtrace_export::SvgMetadata {
            title: Some(title),
            description: Some(&desc),
            background: background.as_deref(),
        };
        let svg = holdtrace_export::to_svg(&holds, &metadata);
        std::fs::write(svg_path, &svg)
            .map_err(|e| format!("Error writing SVG to {}: {e}", svg_path.display()))?;
        eprintln!("SVG written to {} ({} bytes)", svg_path.display(), svg.len());
    }

    Ok(())
}

fn hit(args: &HitArgs) -> Result<(), Box<dyn Error>> {
    let input = std::fs::read_to_string(&args.holds)
        .map_err(|e| format!("Error reading {}: {e}", args.holds.display()))?;
    let config = holdtrace_export::from_json(&input)?;

    let (viewport_width, viewport_height) = args.viewport;
    let params = compute_parameters(
        viewport_width,
        viewport_height,
        config.image_width,
        config.image_height,
    );
    if !params.is_valid() {
        log::warn!("viewport {viewport_width}x{viewport_height} cannot display the image");
    }

    let index = HoldIndex::new(&config.holds);
    match index.find_hit(args.at, &params) {
        Some(hold) => println!("{}", hold.id),
        None => println!("none"),
    }
    Ok(())
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
