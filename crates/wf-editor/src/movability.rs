//! Movability makes SVG group elements draggable within an SVG canvas.
//!
//! Moving is implemented by setting `e` and `f` of the group's transform
//! matrix. The controller keeps an explicit map from each movable group to
//! its drag handle; the page routes pointer events to [`Movability::start`],
//! [`Movability::drag`] and [`Movability::reset`] through the listeners
//! registered here.
//!
//! Leaving the canvas ends a drag instead of continuing it once the pointer
//! comes back.

use crate::input::{EventKind, EventState};
use crate::listeners::{Action, Listeners};
use std::collections::HashMap;
use wf_core::{Document, Matrix, NodeIndex, Point, Result, WfError, parse_matrix};

/// Capability record for a registered group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Movable {
    pub handle: NodeIndex,
}

#[derive(Debug, Clone)]
pub struct Movability {
    svg: NodeIndex,
    /// Placement of the svg on screen (`getScreenCTM`).
    screen_ctm: Matrix,
    /// The element currently being dragged.
    moving: Option<NodeIndex>,
    /// Last pointer position of the drag, in svg coordinates.
    last: Option<Point>,
    movables: HashMap<NodeIndex, Movable>,
}

impl Movability {
    /// Create a controller bound to `svg` and install its pointer-up,
    /// pointer-leave and pointer-move listeners on it.
    pub fn new(doc: &Document, svg: NodeIndex, listeners: &mut Listeners) -> Result<Self> {
        if !doc.element(svg).is_some_and(|el| el.is_svg("svg")) {
            return Err(WfError::NotSvg);
        }
        listeners.add(svg, EventKind::PointerUp, Action::EndDrag { svg });
        listeners.add(svg, EventKind::PointerLeave, Action::EndDrag { svg });
        listeners.add(svg, EventKind::PointerMove, Action::Drag { svg });
        Ok(Self {
            svg,
            screen_ctm: Matrix::IDENTITY,
            moving: None,
            last: None,
            movables: HashMap::new(),
        })
    }

    pub fn svg(&self) -> NodeIndex {
        self.svg
    }

    pub fn screen_ctm(&self) -> Matrix {
        self.screen_ctm
    }

    pub fn set_screen_ctm(&mut self, ctm: Matrix) {
        self.screen_ctm = ctm;
    }

    pub fn moving(&self) -> Option<NodeIndex> {
        self.moving
    }

    pub fn anchor(&self) -> Option<Point> {
        self.last
    }

    pub fn is_movable(&self, idx: NodeIndex) -> bool {
        self.movables.contains_key(&idx)
    }

    pub fn handle_of(&self, movable: NodeIndex) -> Option<NodeIndex> {
        self.movables.get(&movable).map(|m| m.handle)
    }

    /// Make `movable` draggable. A pointer-down on `handle` (the movable
    /// itself when `None`) starts the drag. Returns the handle.
    pub fn add(
        &mut self,
        doc: &Document,
        movable: NodeIndex,
        handle: Option<NodeIndex>,
        listeners: &mut Listeners,
    ) -> Result<NodeIndex> {
        if !doc.element(movable).is_some_and(|el| el.is_svg("g")) {
            return Err(WfError::NotAGroup);
        }
        if self.movables.contains_key(&movable) {
            return Err(WfError::AlreadyMovable);
        }
        let handle = handle.unwrap_or(movable);
        self.movables.insert(movable, Movable { handle });
        listeners.add(
            handle,
            EventKind::PointerDown,
            Action::StartDrag {
                svg: self.svg,
                movable,
            },
        );
        log::debug!("movable {movable:?} with handle {handle:?}");
        Ok(handle)
    }

    /// Unregister `movable`, cancelling its drag if one is in progress.
    pub fn remove(&mut self, movable: NodeIndex, listeners: &mut Listeners) -> bool {
        let Some(entry) = self.movables.remove(&movable) else {
            return false;
        };
        listeners.remove_where(|l| {
            l.target == entry.handle
                && matches!(l.action, Action::StartDrag { movable: m, .. } if m == movable)
        });
        if self.moving == Some(movable) {
            self.reset(None);
        }
        true
    }

    /// Convert a client position into svg coordinates.
    pub fn position(&self, client: Point) -> Point {
        let ctm = self.screen_ctm;
        Point::new((client.x - ctm.e) / ctm.a, (client.y - ctm.f) / ctm.d)
    }

    /// Pointer-down on a handle: remember the element and the anchor.
    pub fn start(&mut self, movable: NodeIndex, client: Point, state: &mut EventState) {
        self.moving = Some(movable);
        self.last = Some(self.position(client));
        log::trace!("drag start {movable:?} at {:?}", self.last);
        state.stop_propagation();
        state.prevent_default();
    }

    /// Pointer-move: translate the moving element by the delta since the
    /// last position. No-op when no drag is active.
    pub fn drag(&mut self, doc: &mut Document, client: Point, state: &mut EventState) -> Result<()> {
        let (Some(moving), Some(last)) = (self.moving, self.last) else {
            return Ok(());
        };
        let p = self.position(client);
        let (dx, dy) = (p.x - last.x, p.y - last.y);
        self.move_element(doc, moving, dx, dy, true)?;
        self.last = Some(p);
        state.stop_propagation();
        state.prevent_default();
        Ok(())
    }

    /// Pointer-up or pointer-leave: forget the drag.
    pub fn reset(&mut self, state: Option<&mut EventState>) {
        if let Some(moving) = self.moving {
            log::trace!("drag end {moving:?}");
        }
        self.moving = None;
        self.last = None;
        if let Some(state) = state {
            state.stop_propagation();
            state.prevent_default();
        }
    }

    /// Set the translation of a registered element, either by adding to
    /// the current `e`/`f` (`relative`) or by replacing them. The element's
    /// transform list is consolidated into one `matrix(...)`.
    pub fn move_element(
        &self,
        doc: &mut Document,
        movable: NodeIndex,
        x: f64,
        y: f64,
        relative: bool,
    ) -> Result<()> {
        if !self.movables.contains_key(&movable) {
            return Err(WfError::NotMovable);
        }
        let mut m = parse_matrix(doc.attr(movable, "transform"))?;
        if relative {
            m.e += x;
            m.f += y;
        } else {
            m.e = x;
            m.f = y;
        }
        doc.set_attr(movable, "transform", m.to_attr()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wf_core::dom::NO_ATTRS;
    use wf_core::{html, svg};

    struct Fixture {
        doc: Document,
        listeners: Listeners,
        svg: NodeIndex,
        group: NodeIndex,
        circle: NodeIndex,
    }

    fn fixture() -> Fixture {
        let mut doc = Document::new();
        let svg_idx = doc.append(doc.root, svg("svg", NO_ATTRS, vec![]));
        let group = doc.append(svg_idx, svg("g", [("transform", "translate(0,0)")], vec![]));
        let circle = doc.append(group, svg("circle", [("r", "8")], vec![]));
        Fixture {
            doc,
            listeners: Listeners::new(),
            svg: svg_idx,
            group,
            circle,
        }
    }

    fn translation(doc: &Document, idx: NodeIndex) -> (f64, f64) {
        parse_matrix(doc.attr(idx, "transform")).unwrap().translation()
    }

    #[test]
    fn requires_svg_element() {
        let mut f = fixture();
        let div = f.doc.append(f.doc.root, html("div", NO_ATTRS, vec![]));
        assert_eq!(
            Movability::new(&f.doc, div, &mut f.listeners).unwrap_err(),
            WfError::NotSvg
        );
        assert_eq!(
            Movability::new(&f.doc, f.group, &mut f.listeners).unwrap_err(),
            WfError::NotSvg
        );
    }

    #[test]
    fn add_rejects_non_groups_and_duplicates() {
        let mut f = fixture();
        let mut m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        assert_eq!(
            m.add(&f.doc, f.circle, None, &mut f.listeners).unwrap_err(),
            WfError::NotAGroup
        );
        assert_eq!(m.add(&f.doc, f.group, Some(f.circle), &mut f.listeners), Ok(f.circle));
        assert_eq!(
            m.add(&f.doc, f.group, None, &mut f.listeners).unwrap_err(),
            WfError::AlreadyMovable
        );
        assert_eq!(
            f.listeners.actions_for(f.circle, EventKind::PointerDown),
            vec![Action::StartDrag {
                svg: f.svg,
                movable: f.group
            }]
        );
    }

    #[test]
    fn handle_defaults_to_movable() {
        let mut f = fixture();
        let mut m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        assert_eq!(m.add(&f.doc, f.group, None, &mut f.listeners), Ok(f.group));
        assert_eq!(m.handle_of(f.group), Some(f.group));
    }

    #[test]
    fn drag_deltas_accumulate() {
        let mut f = fixture();
        let mut m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        m.add(&f.doc, f.group, None, &mut f.listeners).unwrap();

        let mut state = EventState::default();
        m.start(f.group, Point::new(100.0, 100.0), &mut state);
        assert!(state.propagation_stopped && state.default_prevented);

        m.drag(&mut f.doc, Point::new(110.0, 95.0), &mut EventState::default())
            .unwrap();
        m.drag(&mut f.doc, Point::new(113.0, 105.0), &mut EventState::default())
            .unwrap();
        assert_eq!(translation(&f.doc, f.group), (13.0, 5.0));
        assert_eq!(f.doc.attr(f.group, "transform"), Some("matrix(1,0,0,1,13,5)"));
    }

    #[test]
    fn reset_clears_anchor_between_drags() {
        let mut f = fixture();
        let mut m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        m.add(&f.doc, f.group, None, &mut f.listeners).unwrap();

        m.start(f.group, Point::new(0.0, 0.0), &mut EventState::default());
        m.drag(&mut f.doc, Point::new(10.0, 0.0), &mut EventState::default())
            .unwrap();
        m.reset(Some(&mut EventState::default()));
        assert_eq!(m.moving(), None);
        assert_eq!(m.anchor(), None);

        // Moves without a drag are ignored.
        m.drag(&mut f.doc, Point::new(500.0, 500.0), &mut EventState::default())
            .unwrap();
        assert_eq!(translation(&f.doc, f.group), (10.0, 0.0));

        // A new drag anchors at its own start point.
        m.start(f.group, Point::new(300.0, 300.0), &mut EventState::default());
        m.drag(&mut f.doc, Point::new(301.0, 302.0), &mut EventState::default())
            .unwrap();
        assert_eq!(translation(&f.doc, f.group), (11.0, 2.0));
    }

    #[test]
    fn degenerate_screen_ctm_leaves_transform_alone() {
        let mut f = fixture();
        let mut m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        m.add(&f.doc, f.group, None, &mut f.listeners).unwrap();
        m.set_screen_ctm(Matrix::scale(0.0, 1.0));

        m.start(f.group, Point::new(10.0, 0.0), &mut EventState::default());
        let err = m
            .drag(&mut f.doc, Point::new(20.0, 0.0), &mut EventState::default())
            .unwrap_err();
        assert!(matches!(err, WfError::Transform(_)));
        assert_eq!(f.doc.attr(f.group, "transform"), Some("translate(0,0)"));
    }

    #[test]
    fn position_uses_screen_ctm() {
        let mut f = fixture();
        let mut m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        m.set_screen_ctm(Matrix::new(2.0, 0.0, 0.0, 2.0, 50.0, 20.0));
        assert_eq!(m.position(Point::new(150.0, 120.0)), Point::new(50.0, 50.0));
    }

    #[test]
    fn absolute_move_replaces_translation_and_keeps_scale() {
        let mut f = fixture();
        f.doc
            .set_attr(f.group, "transform", "scale(2) translate(5,5)")
            .unwrap();
        let mut m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        m.add(&f.doc, f.group, None, &mut f.listeners).unwrap();
        m.move_element(&mut f.doc, f.group, 200.0, 150.0, false)
            .unwrap();
        assert_eq!(
            parse_matrix(f.doc.attr(f.group, "transform")).unwrap(),
            Matrix::new(2.0, 0.0, 0.0, 2.0, 200.0, 150.0)
        );
    }

    #[test]
    fn move_requires_registration() {
        let mut f = fixture();
        let m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        assert_eq!(
            m.move_element(&mut f.doc, f.group, 1.0, 1.0, true),
            Err(WfError::NotMovable)
        );
    }

    #[test]
    fn remove_cancels_drag_and_listener() {
        let mut f = fixture();
        let mut m = Movability::new(&f.doc, f.svg, &mut f.listeners).unwrap();
        m.add(&f.doc, f.group, Some(f.circle), &mut f.listeners).unwrap();
        m.start(f.group, Point::ZERO, &mut EventState::default());
        assert!(m.remove(f.group, &mut f.listeners));
        assert_eq!(m.moving(), None);
        assert!(f.listeners.actions_for(f.circle, EventKind::PointerDown).is_empty());
        assert!(!m.remove(f.group, &mut f.listeners));
    }
}
