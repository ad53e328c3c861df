//! Bounding boxes of SVG elements in their own user space.
//!
//! Works like `getBBox()`: the element's own `transform` is ignored, the
//! transforms of its descendants are applied. Strokes are never included,
//! which is why node glyphs are drawn as nested filled shapes instead.
//! Text extents come from a [`TextMeasure`].

use crate::dom::{Document, DomNode, Element, Namespace};
use crate::matrix::parse_matrix;
use kurbo::Rect;
use petgraph::graph::NodeIndex;

/// Extents of a single line of text.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f64,
    /// Distance from the baseline up to the top of the line box.
    pub ascent: f64,
    /// Distance from the baseline down to the bottom of the line box.
    pub descent: f64,
}

pub trait TextMeasure {
    fn measure(&self, text: &str) -> TextMetrics;
}

/// Monospace-style estimate used when no real font metrics are available.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvance {
    pub font_size: f64,
}

impl Default for FixedAdvance {
    fn default() -> Self {
        Self { font_size: 12.0 }
    }
}

impl TextMeasure for FixedAdvance {
    fn measure(&self, text: &str) -> TextMetrics {
        TextMetrics {
            width: text.chars().count() as f64 * self.font_size * 0.6,
            ascent: self.font_size * 0.8,
            descent: self.font_size * 0.2,
        }
    }
}

/// Numeric attribute; missing or malformed values count as 0 like SVG
/// lengths do.
pub fn length_attr(el: &Element, name: &str) -> f64 {
    el.attr(name)
        .and_then(|v| v.trim().trim_end_matches("px").parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Bounding box of `idx`, or `None` for non-SVG nodes and empty groups.
pub fn bbox(doc: &Document, idx: NodeIndex, measure: &dyn TextMeasure) -> Option<Rect> {
    let el = doc.element(idx)?;
    if el.namespace != Namespace::Svg {
        return None;
    }
    match el.name.as_str() {
        "circle" => {
            let (cx, cy, r) = (
                length_attr(el, "cx"),
                length_attr(el, "cy"),
                length_attr(el, "r"),
            );
            Some(Rect::new(cx - r, cy - r, cx + r, cy + r))
        }
        "ellipse" => {
            let (cx, cy) = (length_attr(el, "cx"), length_attr(el, "cy"));
            let (rx, ry) = (length_attr(el, "rx"), length_attr(el, "ry"));
            Some(Rect::new(cx - rx, cy - ry, cx + rx, cy + ry))
        }
        "rect" => {
            let (x, y) = (length_attr(el, "x"), length_attr(el, "y"));
            let (w, h) = (length_attr(el, "width"), length_attr(el, "height"));
            Some(Rect::new(x, y, x + w, y + h))
        }
        "text" => Some(text_bbox(doc, idx, el, measure)),
        "g" | "svg" => group_bbox(doc, idx, measure),
        _ => None,
    }
}

fn text_bbox(doc: &Document, idx: NodeIndex, el: &Element, measure: &dyn TextMeasure) -> Rect {
    let content = doc.text_content(idx);
    let m = measure.measure(&content);
    let (x, baseline) = (length_attr(el, "x"), length_attr(el, "y"));
    let left = match el.attr("text-anchor") {
        Some("middle") => x - m.width / 2.0,
        Some("end") => x - m.width,
        _ => x,
    };
    Rect::new(left, baseline - m.ascent, left + m.width, baseline + m.descent)
}

fn group_bbox(doc: &Document, idx: NodeIndex, measure: &dyn TextMeasure) -> Option<Rect> {
    doc.children(idx)
        .iter()
        .filter(|&&c| matches!(doc.node(c), Some(DomNode::Element(_))))
        .filter_map(|&c| {
            let child = bbox(doc, c, measure)?;
            let transform = parse_matrix(doc.attr(c, "transform")).ok()?;
            Some(transform.to_affine().transform_rect_bbox(child))
        })
        .reduce(|acc, r| acc.union(r))
}
