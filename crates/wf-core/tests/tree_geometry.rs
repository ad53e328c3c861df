//! Integration tests: markup → element tree → geometry.
//!
//! Parses SVG fragments the way a page embeds them and checks transform
//! consolidation and bounding boxes across nested groups.

use pretty_assertions::assert_eq;
use wf_core::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn parse(input: &str) -> (Document, Vec<NodeIndex>) {
    init_logging();
    let mut doc = Document::new();
    let root = doc.root;
    let top = parse_markup(&mut doc, root, input).unwrap();
    (doc, top)
}

// ─── Transforms ─────────────────────────────────────────────────────────

#[test]
fn rotation_about_a_center() {
    let list = parse_transform_list("translate(5) rotate(90, 10, 0)").unwrap();
    assert_eq!(list.len(), 2);
    let p = consolidate(&list).apply(Point::new(20.0, 0.0));
    assert!((p.x - 15.0).abs() < 1e-9 && (p.y - 10.0).abs() < 1e-9, "{p:?}");
}

#[test]
fn parsed_group_transform_feeds_bbox() {
    let (doc, top) = parse(
        r#"<svg width="400" height="300">
             <g transform="translate(200,150)">
               <g transform="matrix(2 0 0 2 10 0)"><rect x="0" y="0" width="5" height="5"/></g>
               <circle cx="0" cy="0" r="14"/>
             </g>
           </svg>"#,
    );
    let svg_idx = top[0];
    let outer = doc.first_child(svg_idx).unwrap();

    // Inner rect spans (10..20, 0..10) in outer space, circle (-14..14).
    let b = bbox(&doc, outer, &FixedAdvance::default()).unwrap();
    assert_eq!(b, Rect::new(-14.0, -14.0, 20.0, 14.0));

    // The svg sees the outer group through its translation.
    let b = bbox(&doc, svg_idx, &FixedAdvance::default()).unwrap();
    assert_eq!(b, Rect::new(186.0, 136.0, 220.0, 164.0));
}

#[test]
fn malformed_transform_is_an_error() {
    let err = parse_matrix(Some("translate(1,")).unwrap_err();
    assert!(matches!(err, WfError::Transform(_)));
    assert_eq!(err.kind(), ErrorKind::Error);
}

// ─── Tree ───────────────────────────────────────────────────────────────

#[test]
fn svg_children_get_svg_namespace() {
    let (doc, top) = parse(r#"<div id="host"><svg><g class="a b"></g></svg><p>hi</p></div>"#);
    let host = top[0];
    let g = doc.query_class(host, "b").unwrap();
    assert!(doc.element(g).unwrap().is_svg("g"));
    let p = doc.query_tag(host, "p").unwrap();
    assert_eq!(doc.element(p).unwrap().namespace, Namespace::Html);
    assert_eq!(doc.closest(g, "div"), Some(host));
}

#[test]
fn writer_output_reparses_to_same_shape() {
    let (doc, top) = parse(
        r#"<wf-graph data-width="10"><wf-state id="s1">A &lt; B</wf-state></wf-graph>"#,
    );
    let markup = to_markup(&doc, top[0]);
    assert_eq!(
        markup,
        r#"<wf-graph data-width="10"><wf-state id="s1">A &lt; B</wf-state></wf-graph>"#
    );

    let (again, top) = parse(&markup);
    let state = again.get_element_by_id(top[0], "s1").unwrap();
    assert_eq!(again.text_content(state), "A < B");
}

#[test]
fn shadow_tree_is_separate_from_light_tree() {
    init_logging();
    let mut doc = Document::new();
    let host = doc.append(doc.root, html("wf-graph", dom::NO_ATTRS, vec![]));
    let shadow = doc.attach_shadow(host).unwrap();
    let svg_idx = doc.append(shadow, svg("svg", dom::NO_ATTRS, vec![]));

    assert!(doc.is_connected(svg_idx));
    assert_eq!(doc.parent(shadow), None);
    assert_eq!(doc.composed_parent(shadow), Some(host));
    assert_eq!(doc.query_tag(host, "svg"), None);
    assert_eq!(to_markup(&doc, host), "<wf-graph></wf-graph>");
    assert_eq!(
        to_markup(&doc, shadow),
        r#"<svg xmlns="http://www.w3.org/2000/svg"/>"#
    );
}
