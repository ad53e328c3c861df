//! Hit testing: client point → element lookup.
//!
//! Reverse-walks a canvas's svg subtree (last painted = topmost) to find
//! which shape is under a client position. Each element's `transform` is
//! accumulated on top of the canvas's screen transform and the point is
//! mapped back into the element's own user space before testing.

use crate::graph::GraphCanvas;
use wf_core::bbox::length_attr;
use wf_core::{Document, Matrix, NodeIndex, Point, Rect, TextMeasure, bbox, parse_matrix};

/// Find the topmost shape of `canvas` under `client`. Falls back to the
/// canvas's svg when the point is inside its viewport, `None` otherwise.
pub fn hit_test(
    doc: &Document,
    canvas: &GraphCanvas,
    client: Point,
    measure: &dyn TextMeasure,
) -> Option<NodeIndex> {
    let svg = canvas.svg();
    let ctm = canvas.screen_transform();
    if let Some(hit) = hit_children(doc, svg, ctm, client, measure) {
        return Some(hit);
    }
    let local = ctm.inverse()?.apply(client);
    let inside = (0.0..=canvas.width()).contains(&local.x)
        && (0.0..=canvas.height()).contains(&local.y);
    inside.then_some(svg)
}

fn hit_children(
    doc: &Document,
    idx: NodeIndex,
    ctm: Matrix,
    client: Point,
    measure: &dyn TextMeasure,
) -> Option<NodeIndex> {
    // Check children in reverse (topmost first)
    for &child in doc.children(idx).iter().rev() {
        if let Some(hit) = hit_node(doc, child, ctm, client, measure) {
            return Some(hit);
        }
    }
    None
}

fn hit_node(
    doc: &Document,
    idx: NodeIndex,
    parent_ctm: Matrix,
    client: Point,
    measure: &dyn TextMeasure,
) -> Option<NodeIndex> {
    let el = doc.element(idx)?;
    let own = parse_matrix(el.attr("transform")).ok()?;
    let ctm = parent_ctm.multiply(own);

    if el.is_svg("g") {
        return hit_children(doc, idx, ctm, client, measure);
    }

    let local = ctm.inverse()?.apply(client);
    let contains = if el.is_svg("circle") {
        let center = Point::new(length_attr(el, "cx"), length_attr(el, "cy"));
        local.distance(center) <= length_attr(el, "r")
    } else {
        bbox(doc, idx, measure).is_some_and(|b| contains_closed(b, local))
    };
    contains.then_some(idx)
}

/// `Rect::contains` is half-open; shapes include their right/bottom edge.
fn contains_closed(b: Rect, p: Point) -> bool {
    (b.x0..=b.x1).contains(&p.x) && (b.y0..=b.y1).contains(&p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;
    use crate::listeners::Listeners;
    use wf_core::{FixedAdvance, html, svg};

    fn canvas() -> (Document, GraphCanvas) {
        let mut doc = Document::new();
        let host = doc.append(doc.root, html("wf-graph", [("id", "g")], vec![]));
        let mut listeners = Listeners::new();
        let canvas =
            GraphCanvas::new(&mut doc, host, &GraphConfig::default(), &mut listeners).unwrap();
        (doc, canvas)
    }

    #[test]
    fn topmost_shape_wins() {
        let (mut doc, canvas) = canvas();
        let back = doc.append(canvas.group(), svg("circle", [("r", "14")], vec![]));
        let front = doc.append(canvas.group(), svg("circle", [("r", "8")], vec![]));
        let m = FixedAdvance::default();

        // Root group sits at (200, 150).
        assert_eq!(hit_test(&doc, &canvas, Point::new(200.0, 150.0), &m), Some(front));
        assert_eq!(hit_test(&doc, &canvas, Point::new(211.0, 150.0), &m), Some(back));
        assert_eq!(
            hit_test(&doc, &canvas, Point::new(10.0, 10.0), &m),
            Some(canvas.svg())
        );
        assert_eq!(hit_test(&doc, &canvas, Point::new(500.0, 10.0), &m), None);
    }

    #[test]
    fn transforms_and_screen_offset_apply() {
        let (mut doc, mut canvas) = canvas();
        let g = doc.append(
            canvas.group(),
            svg("g", [("transform", "translate(50,0) scale(2)")], vec![]),
        );
        let rect = doc.append(
            g,
            svg(
                "rect",
                [("x", "0"), ("y", "0"), ("width", "10"), ("height", "10")],
                vec![],
            ),
        );
        canvas.set_screen_transform(Matrix::translate(100.0, 100.0));
        let m = FixedAdvance::default();

        // rect spans (350..370, 250..270) on screen.
        assert_eq!(hit_test(&doc, &canvas, Point::new(355.0, 255.0), &m), Some(rect));
        assert_eq!(hit_test(&doc, &canvas, Point::new(370.0, 270.0), &m), Some(rect));
        assert_eq!(
            hit_test(&doc, &canvas, Point::new(375.0, 255.0), &m),
            Some(canvas.svg())
        );
    }
}
