//! The `wf-graph` canvas component.
//!
//! Renders into a shadow root: a button bar (zoom in/out/reset, center, a
//! pointer readout) above an `svg` viewport whose first `g` is the root
//! group. Panning drags the root group through [`Movability`]; zooming
//! writes the scale components of its matrix. Node components append their
//! own groups into the root group.

use crate::config::{GraphConfig, Stylesheet};
use crate::input::EventKind;
use crate::listeners::{Action, Listeners};
use crate::movability::Movability;
use std::collections::HashMap;
use wf_core::dom::NO_ATTRS;
use wf_core::{
    Document, ElementId, Matrix, NodeIndex, NodeSpec, Point, Result, WfError, camel_to_hyphen,
    html, parse_matrix, svg, text,
};

/// Built-in rules for the classes emitted by the canvas and its nodes.
pub const STYLESHEET: &str = "\
.buttons { display: flex; gap: 4px; margin-bottom: 4px; }
svg.wf-graph { border: 1px solid #999; background: #fcfcfc; }
.margin { fill: transparent; }
.border { fill: #333; }
.fill { fill: #fff; }
.handle { cursor: move; }
.handle.selected { fill: #6ab0de; }
.text { fill: #fff; opacity: 0.85; }
.box { fill: #eee; opacity: 0.6; }
text { font: 12px sans-serif; text-anchor: middle; user-select: none; }
";

#[derive(Debug, Clone, Copy)]
pub struct Buttons {
    pub zoom_in: NodeIndex,
    pub zoom_out: NodeIndex,
    pub zoom_reset: NodeIndex,
    pub center: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct GraphCanvas {
    host: NodeIndex,
    shadow: NodeIndex,
    svg: NodeIndex,
    group: NodeIndex,
    mouse_log: NodeIndex,
    buttons: Buttons,
    config: GraphConfig,
    pub movability: Movability,
    /// Attached nodes by id.
    nodes: HashMap<ElementId, NodeIndex>,
}

impl GraphCanvas {
    pub const TYPE_NAME: &'static str = "WfGraph";

    /// Construct the canvas for `host`: resolve its size, build the shadow
    /// tree, and wire the controls.
    pub fn new(
        doc: &mut Document,
        host: NodeIndex,
        config: &GraphConfig,
        listeners: &mut Listeners,
    ) -> Result<Self> {
        let host_el = doc.element(host).ok_or(WfError::UnknownElement)?;
        let config = config.with_dataset(host_el);
        config.validate()?;
        let (width, height) = (config.width, config.height);
        if doc.attr(host, "data-width").is_none() {
            doc.set_attr(host, "data-width", width.to_string())?;
        }
        if doc.attr(host, "data-height").is_none() {
            doc.set_attr(host, "data-height", height.to_string())?;
        }

        let shadow = doc.attach_shadow(host)?;
        doc.append(shadow, stylesheet_spec(&config.stylesheet));
        doc.append(
            shadow,
            html(
                "div",
                [("style", "display: grid")],
                vec![
                    html(
                        "div",
                        [("class", "buttons")],
                        vec![
                            button("zoom-in", "Zoom In"),
                            button("zoom-out", "Zoom Out"),
                            button("zoom-reset", "Zoom Reset"),
                            button("center", "Center"),
                            html("span", [("id", "mouse-log")], vec![]),
                        ],
                    ),
                    svg(
                        "svg",
                        [
                            ("class", camel_to_hyphen(Self::TYPE_NAME)),
                            ("width", width.to_string()),
                            ("height", height.to_string()),
                        ],
                        vec![svg(
                            "g",
                            [(
                                "transform",
                                Matrix::translate(width / 2.0, height / 2.0).to_string(),
                            )],
                            vec![],
                        )],
                    ),
                ],
            ),
        );

        let buttons = Buttons {
            zoom_in: by_id(doc, shadow, "zoom-in")?,
            zoom_out: by_id(doc, shadow, "zoom-out")?,
            zoom_reset: by_id(doc, shadow, "zoom-reset")?,
            center: by_id(doc, shadow, "center")?,
        };
        let mouse_log = by_id(doc, shadow, "mouse-log")?;
        let svg_idx = doc.query_tag(shadow, "svg").ok_or(WfError::UnknownElement)?;
        let group = doc.first_child(svg_idx).ok_or(WfError::UnknownElement)?;

        listeners.add(svg_idx, EventKind::PointerMove, Action::MouseLog { canvas: host });

        let mut movability = Movability::new(doc, svg_idx, listeners)?;
        movability.add(doc, group, Some(svg_idx), listeners)?;

        listeners.add(buttons.center, EventKind::Click, Action::Center { canvas: host });
        listeners.add(svg_idx, EventKind::Wheel, Action::WheelZoom { canvas: host });
        listeners.add(
            buttons.zoom_in,
            EventKind::Click,
            Action::Zoom {
                canvas: host,
                direction: 1.0,
            },
        );
        listeners.add(
            buttons.zoom_out,
            EventKind::Click,
            Action::Zoom {
                canvas: host,
                direction: -1.0,
            },
        );
        listeners.add(buttons.zoom_reset, EventKind::Click, Action::ZoomReset { canvas: host });

        log::debug!("wf-graph {host:?} constructed at {width}x{height}");
        Ok(Self {
            host,
            shadow,
            svg: svg_idx,
            group,
            mouse_log,
            buttons,
            config,
            movability,
            nodes: HashMap::new(),
        })
    }

    pub fn host(&self) -> NodeIndex {
        self.host
    }

    pub fn shadow_root(&self) -> NodeIndex {
        self.shadow
    }

    pub fn svg(&self) -> NodeIndex {
        self.svg
    }

    /// The pannable/zoomable root group.
    pub fn group(&self) -> NodeIndex {
        self.group
    }

    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    pub fn mouse_log(&self) -> NodeIndex {
        self.mouse_log
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn width(&self) -> f64 {
        self.config.width
    }

    pub fn height(&self) -> f64 {
        self.config.height
    }

    /// Placement of the svg on screen, used to map client coordinates.
    pub fn set_screen_transform(&mut self, ctm: Matrix) {
        self.movability.set_screen_ctm(ctm);
    }

    pub fn screen_transform(&self) -> Matrix {
        self.movability.screen_ctm()
    }

    /// Current matrix of the root group.
    pub fn matrix(&self, doc: &Document) -> Result<Matrix> {
        parse_matrix(doc.attr(self.group, "transform"))
    }

    pub fn current_scale(&self, doc: &Document) -> Result<f64> {
        Ok(self.matrix(doc)?.a)
    }

    /// Put the origin of the root group at the middle of the viewport.
    pub fn center(&self, doc: &mut Document) -> Result<()> {
        self.movability
            .move_element(doc, self.group, self.width() / 2.0, self.height() / 2.0, false)
    }

    /// Set the zoom factor, either by adding `factor` to the current one
    /// (`relative`) or by replacing it. Clamped to `min_scale`; the
    /// translation is left alone.
    pub fn scale(&self, doc: &mut Document, factor: f64, relative: bool) -> Result<()> {
        let mut m = self.matrix(doc)?;
        let scale = if relative { m.a + factor } else { factor };
        let scale = scale.max(self.config.min_scale);
        m.a = scale;
        m.d = scale;
        log::trace!("scale {scale}");
        doc.set_attr(self.group, "transform", m.to_attr()?)
    }

    /// Zoom one step in (`direction > 0`) or out (`< 0`). Only the sign
    /// matters; zero does nothing.
    pub fn zoom(&self, doc: &mut Document, direction: f64) -> Result<()> {
        if direction > 0.0 {
            self.scale(doc, self.config.zoom_step, true)
        } else if direction < 0.0 {
            self.scale(doc, -self.config.zoom_step, true)
        } else {
            Ok(())
        }
    }

    pub fn zoom_reset(&self, doc: &mut Document) -> Result<()> {
        self.scale(doc, 1.0, false)
    }

    /// Update the pointer readout.
    pub fn log_pointer(&self, doc: &mut Document, client: Point, screen: Point) -> Result<()> {
        let line = format!(
            "Screen: ({}, {}) Client: ({}, {})",
            screen.x, screen.y, client.x, client.y
        );
        log::debug!("{line}");
        doc.set_text_content(self.mouse_log, line)
    }

    // ─── Attached nodes ──────────────────────────────────────────────────

    /// Claim `id` for `node`. Ids are unique per canvas.
    pub fn register_node(&mut self, id: ElementId, node: NodeIndex) -> Result<()> {
        match self.nodes.get(&id) {
            Some(&existing) if existing != node => Err(WfError::DuplicateId(id.to_string())),
            _ => {
                self.nodes.insert(id, node);
                Ok(())
            }
        }
    }

    pub fn unregister_node(&mut self, id: ElementId) {
        self.nodes.remove(&id);
    }

    pub fn node_by_id(&self, id: &str) -> Option<NodeIndex> {
        ElementId::get(id).and_then(|id| self.nodes.get(&id).copied())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

fn by_id(doc: &Document, scope: NodeIndex, id: &str) -> Result<NodeIndex> {
    doc.get_element_by_id(scope, id)
        .ok_or(WfError::UnknownElement)
}

fn button(id: &str, label: &str) -> NodeSpec {
    html("button", [("id", id), ("type", "button")], vec![text(label)])
}

fn stylesheet_spec(stylesheet: &Stylesheet) -> NodeSpec {
    match stylesheet {
        Stylesheet::Embedded => html("style", NO_ATTRS, vec![text(STYLESHEET)]),
        Stylesheet::Linked { href } => html(
            "link",
            [("rel", "stylesheet".to_string()), ("href", href.clone())],
            vec![],
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canvas_with(attrs: &[(&str, &str)], config: GraphConfig) -> (Document, GraphCanvas) {
        let mut doc = Document::new();
        let host = doc.append(doc.root, html("wf-graph", attrs.iter().copied(), vec![]));
        let mut listeners = Listeners::new();
        let canvas = GraphCanvas::new(&mut doc, host, &config, &mut listeners).unwrap();
        (doc, canvas)
    }

    fn canvas() -> (Document, GraphCanvas) {
        canvas_with(&[], GraphConfig::default())
    }

    #[test]
    fn default_size_and_centered_group() {
        let (doc, c) = canvas();
        assert_eq!(doc.attr(c.host(), "data-width"), Some("400"));
        assert_eq!(doc.attr(c.host(), "data-height"), Some("300"));
        assert_eq!(doc.attr(c.svg(), "width"), Some("400"));
        assert_eq!(doc.attr(c.svg(), "class"), Some("wf-graph"));
        assert_eq!(
            doc.attr(c.group(), "transform"),
            Some("matrix(1,0,0,1,200,150)")
        );
    }

    #[test]
    fn dataset_size_is_used() {
        let (doc, c) = canvas_with(
            &[("data-width", "800"), ("data-height", "600")],
            GraphConfig::default(),
        );
        assert_eq!((c.width(), c.height()), (800.0, 600.0));
        assert_eq!(doc.attr(c.svg(), "height"), Some("600"));
    }

    #[test]
    fn shadow_tree_has_controls() {
        let (doc, c) = canvas();
        let shadow = c.shadow_root();
        for id in ["zoom-in", "zoom-out", "zoom-reset", "center", "mouse-log"] {
            assert!(doc.get_element_by_id(shadow, id).is_some(), "missing #{id}");
        }
        let style = doc.first_child(shadow).unwrap();
        assert_eq!(doc.tag(style), Some("style"));
        assert!(doc.text_content(style).contains(".handle.selected"));
        assert!(doc.query_class(shadow, "buttons").is_some());
    }

    #[test]
    fn linked_stylesheet() {
        let config = GraphConfig {
            stylesheet: Stylesheet::Linked {
                href: "wf-graph.css".into(),
            },
            ..Default::default()
        };
        let (doc, c) = canvas_with(&[], config);
        let link = doc.first_child(c.shadow_root()).unwrap();
        assert_eq!(doc.tag(link), Some("link"));
        assert_eq!(doc.attr(link, "href"), Some("wf-graph.css"));
    }

    #[test]
    fn relative_scale_clamps_at_minimum() {
        let (mut doc, c) = canvas();
        let mut expected: f64 = 1.0;
        for f in [-0.3, -0.3, -0.3, -0.3, 0.5, -2.0, 0.1] {
            c.scale(&mut doc, f, true).unwrap();
            expected = (expected + f).max(0.2);
            let got = c.current_scale(&doc).unwrap();
            assert!((got - expected).abs() < 1e-9, "expected {expected}, got {got}");
        }
    }

    #[test]
    fn absolute_scale_overwrites_and_keeps_translation() {
        let (mut doc, c) = canvas();
        c.scale(&mut doc, 3.0, false).unwrap();
        c.scale(&mut doc, 0.05, false).unwrap();
        let m = c.matrix(&doc).unwrap();
        assert_eq!((m.a, m.d), (0.2, 0.2));
        assert_eq!((m.e, m.f), (200.0, 150.0));
    }

    #[test]
    fn zoom_depends_on_sign_only() {
        let (mut doc, c) = canvas();
        c.zoom(&mut doc, 0.0).unwrap();
        assert_eq!(c.current_scale(&doc).unwrap(), 1.0);
        c.zoom(&mut doc, 120.0).unwrap();
        assert!((c.current_scale(&doc).unwrap() - 1.2).abs() < 1e-9);
        c.zoom(&mut doc, -0.001).unwrap();
        assert!((c.current_scale(&doc).unwrap() - 1.0).abs() < 1e-9);
        c.zoom_reset(&mut doc).unwrap();
        assert_eq!(c.current_scale(&doc).unwrap(), 1.0);
    }

    #[test]
    fn center_restores_translation() {
        let (mut doc, c) = canvas();
        c.movability
            .move_element(&mut doc, c.group(), 5.0, 5.0, false)
            .unwrap();
        c.scale(&mut doc, 2.0, false).unwrap();
        c.center(&mut doc).unwrap();
        let m = c.matrix(&doc).unwrap();
        assert_eq!((m.e, m.f), (200.0, 150.0));
        assert_eq!(m.a, 2.0);
    }

    #[test]
    fn pointer_readout() {
        let (mut doc, c) = canvas();
        c.log_pointer(&mut doc, Point::new(10.0, 20.0), Point::new(110.0, 220.0))
            .unwrap();
        assert_eq!(
            doc.text_content(c.mouse_log()),
            "Screen: (110, 220) Client: (10, 20)"
        );
    }

    #[test]
    fn node_ids_are_unique() {
        let (_, mut c) = canvas();
        let id = ElementId::intern("s1");
        c.register_node(id, NodeIndex::new(10)).unwrap();
        c.register_node(id, NodeIndex::new(10)).unwrap();
        assert_eq!(
            c.register_node(id, NodeIndex::new(11)),
            Err(WfError::DuplicateId("s1".into()))
        );
        assert_eq!(c.node_by_id("s1"), Some(NodeIndex::new(10)));
        c.unregister_node(id);
        assert_eq!(c.node_count(), 0);
    }
}
