//! holdtrace-export: Pure serializers for hold configurations (sans-IO)
//!
//! Converts a [`HoldConfiguration`](holdtrace_core::HoldConfiguration) into
//! the JSON interchange document (and back), or into an SVG outline
//! overlay for inspecting detection results.

pub mod json;
pub mod svg;

pub use json::{ExportError, from_json, to_json};
pub use svg::{SvgMetadata, build_outline_data, to_svg};
