//! SVG outline overlay.
//!
//! Renders every hold of a [`HoldConfiguration`] in image-pixel
//! coordinates, so the document can be laid over the wall photograph.
//! Holds with a usable polygon become a closed `<path>`; rectangle-fallback
//! holds become a `<rect>` of their bounding box. Every shape carries a
//! `data-hold-id` attribute and a numbered label at the hold's centre.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Group, Path, Rectangle, Title};
use svg::node::{Node, Text, Value};

use holdtrace_core::{Hold, HoldConfiguration, Point};

/// Outline colour for every hold.
const STROKE: &str = "#ff3b30";
/// Label font size in image pixels.
const LABEL_SIZE: u32 = 12;

/// Metadata to embed in the SVG document.
///
/// Text values are XML-escaped automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgMetadata<'a> {
    /// Document title, emitted as `<title>`.
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Href of a background image drawn under the outlines, sized to the
    /// configuration's image dimensions. Typically the wall photograph.
    pub background: Option<&'a str>,
}

/// Build a closed SVG path `d` attribute from polygon vertices.
///
/// Returns an empty string for fewer than 3 vertices, which cannot
/// enclose an area.
///
/// # Examples
///
/// ```
/// use holdtrace_core::Point;
/// use holdtrace_export::build_outline_data;
///
/// let d = build_outline_data(&[Point::new(0, 0), Point::new(4, 0), Point::new(2, 3)]);
/// assert!(d.starts_with("M0,0 L4,0 L2,3"));
/// ```
#[must_use]
pub fn build_outline_data(vertices: &[Point]) -> String {
    let [first, rest @ ..] = vertices else {
        return String::new();
    };
    if vertices.len() < 3 {
        return String::new();
    }

    let mut data = Data::new().move_to((f64::from(first.x), f64::from(first.y)));
    for p in rest {
        data = data.line_to((f64::from(p.x), f64::from(p.y)));
    }
    String::from(Value::from(data.close()))
}

fn hold_shape(hold: &Hold) -> Box<dyn Node> {
    let d = build_outline_data(hold.polygon.points());
    if d.is_empty() {
        Box::new(
            Rectangle::new()
                .set("x", hold.x)
                .set("y", hold.y)
                .set("width", hold.width)
                .set("height", hold.height)
                .set("data-hold-id", hold.id.to_string()),
        )
    } else {
        Box::new(Path::new().set("d", d).set("data-hold-id", hold.id.to_string()))
    }
}

fn hold_label(hold: &Hold) -> Element {
    let (cx, cy) = hold.centre();
    let mut label = Element::new("text");
    label.assign("x", cx);
    label.assign("y", cy);
    label.assign("data-hold-id", hold.id.to_string());
    label.append(Text::new(hold.id.to_string()));
    label
}

/// Serialize `config` into an SVG overlay string.
#[must_use]
pub fn to_svg(config: &HoldConfiguration, metadata: &SvgMetadata<'_>) -> String {
    let (w, h) = (config.image_width, config.image_height);
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = metadata.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = metadata.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }
    if let Some(href) = metadata.background {
        let mut image = Element::new("image");
        image.assign("href", href);
        image.assign("width", w);
        image.assign("height", h);
        doc = doc.add(image);
    }

    let mut outlines = Group::new()
        .set("id", "holds")
        .set("fill", "none")
        .set("stroke", STROKE)
        .set("stroke-width", 2);
    let mut labels = Group::new()
        .set("id", "labels")
        .set("fill", STROKE)
        .set("font-size", LABEL_SIZE)
        .set("text-anchor", "middle");
    for hold in &config.holds {
        outlines = outlines.add(hold_shape(hold));
        labels = labels.add(hold_label(hold));
    }
    doc = doc.add(outlines).add(labels);

    // The svg crate omits the XML declaration, so we prepend it.
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n")
}
