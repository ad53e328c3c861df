//! The page: document, custom element lifecycle, and event dispatch.
//!
//! Elements whose tag is defined in the [`ElementRegistry`] are upgraded
//! when they become connected, in document order, so a canvas always
//! exists before the nodes inside it attach. Events are dispatched along
//! the composed path (target, ancestors, shadow hosts) and run the
//! [`Action`]s registered in the listener table.

use crate::config::GraphConfig;
use crate::graph::GraphCanvas;
use crate::hit::hit_test;
use crate::input::{EventState, InputEvent, PointerData};
use crate::listeners::{Action, Listeners};
use crate::node::WfNode;
use crate::registry::{ComponentFactory, ElementRegistry};
use std::collections::{HashMap, HashSet};
use wf_core::{
    Document, FixedAdvance, Matrix, NodeIndex, NodeSpec, Point, Result, TextMeasure, WfError,
    parse_markup, to_markup,
};

pub struct Page {
    doc: Document,
    registry: ElementRegistry,
    config: GraphConfig,
    measure: Box<dyn TextMeasure>,
    /// Upgraded `wf-graph` hosts.
    canvases: HashMap<NodeIndex, GraphCanvas>,
    /// Upgraded node hosts, attached or not.
    nodes: HashMap<NodeIndex, WfNode>,
    listeners: Listeners,
    /// svg the pointer was last over, for synthesizing pointer-leave.
    hovered_svg: Option<NodeIndex>,
}

impl Page {
    pub fn new(registry: ElementRegistry, config: GraphConfig) -> Self {
        Self {
            doc: Document::new(),
            registry,
            config,
            measure: Box::new(FixedAdvance::default()),
            canvases: HashMap::new(),
            nodes: HashMap::new(),
            listeners: Listeners::new(),
            hovered_svg: None,
        }
    }

    /// Replace the text measurer used for label layout.
    #[must_use]
    pub fn with_measure(mut self, measure: impl TextMeasure + 'static) -> Self {
        self.measure = Box::new(measure);
        self
    }

    /// Parse `markup` into a fresh page and upgrade its custom elements.
    pub fn from_markup(markup: &str, registry: ElementRegistry, config: GraphConfig) -> Result<Self> {
        let mut page = Self::new(registry, config);
        page.load(markup)?;
        Ok(page)
    }

    /// Append `markup` to the document body. Every custom element is
    /// upgraded even if an earlier one fails; the first error is returned.
    pub fn load(&mut self, markup: &str) -> Result<Vec<NodeIndex>> {
        let root = self.doc.root;
        self.insert_markup(root, markup)
    }

    pub fn insert_markup(&mut self, parent: NodeIndex, markup: &str) -> Result<Vec<NodeIndex>> {
        let created = parse_markup(&mut self.doc, parent, markup)?;
        let mut first_error = None;
        for &idx in &created {
            if let Err(e) = self.upgrade(idx) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(created), Err)
    }

    /// Append `spec` under `parent` and run the connect lifecycle for it.
    pub fn insert(&mut self, parent: NodeIndex, spec: NodeSpec) -> Result<NodeIndex> {
        if self.doc.node(parent).is_none() {
            return Err(WfError::UnknownElement);
        }
        let idx = self.doc.append(parent, spec);
        self.upgrade(idx)?;
        Ok(idx)
    }

    /// Construct and connect the custom elements in the subtree of `root`.
    fn upgrade(&mut self, root: NodeIndex) -> Result<()> {
        if !self.doc.is_connected(root) {
            return Ok(());
        }
        let mut first_error = None;
        for idx in self.doc.descendants(root) {
            if let Err(e) = self.upgrade_one(idx) {
                log::warn!("upgrading {idx:?} failed: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn upgrade_one(&mut self, idx: NodeIndex) -> Result<()> {
        let Some(factory) = self.doc.tag(idx).and_then(|tag| self.registry.get(tag)) else {
            return Ok(());
        };
        match factory {
            ComponentFactory::Graph => {
                if !self.canvases.contains_key(&idx) {
                    let canvas =
                        GraphCanvas::new(&mut self.doc, idx, &self.config, &mut self.listeners)?;
                    self.canvases.insert(idx, canvas);
                }
                Ok(())
            }
            ComponentFactory::Node(symbol) => {
                if !self.nodes.contains_key(&idx) {
                    let node = WfNode::new(&mut self.doc, idx, symbol())?;
                    self.nodes.insert(idx, node);
                }
                let canvas_host = self.enclosing_canvas(idx);
                let canvas = canvas_host.and_then(|host| self.canvases.get_mut(&host));
                match self.nodes.get_mut(&idx) {
                    Some(node) => node.connect(
                        &mut self.doc,
                        canvas,
                        self.measure.as_ref(),
                        &mut self.listeners,
                    ),
                    None => Ok(()),
                }
            }
        }
    }

    /// Nearest ancestor that is an upgraded canvas.
    fn enclosing_canvas(&self, idx: NodeIndex) -> Option<NodeIndex> {
        let mut current = self.doc.parent(idx);
        while let Some(n) = current {
            if self.canvases.contains_key(&n) {
                return Some(n);
            }
            current = self.doc.parent(n);
        }
        None
    }

    /// Remove `idx` and its subtree. Nodes inside are detached from their
    /// canvases first; canvases inside take their shadow trees with them.
    pub fn remove(&mut self, idx: NodeIndex) -> Result<()> {
        if idx == self.doc.root || self.doc.node(idx).is_none() {
            return Err(WfError::UnknownElement);
        }
        let subtree = self.doc.descendants(idx);

        for n in &subtree {
            if let Some(mut node) = self.nodes.remove(n) {
                let canvas = node
                    .attachment()
                    .map(|a| a.canvas)
                    .and_then(|host| self.canvases.get_mut(&host));
                node.disconnect(&mut self.doc, canvas, &mut self.listeners);
                self.doc.destroy(node.group());
            }
        }

        let mut dead: HashSet<NodeIndex> = subtree.iter().copied().collect();
        for n in &subtree {
            if let Some(canvas) = self.canvases.remove(n) {
                dead.extend(self.doc.descendants(canvas.shadow_root()));
                if self.hovered_svg == Some(canvas.svg()) {
                    self.hovered_svg = None;
                }
                log::debug!("wf-graph {n:?} removed");
            }
        }
        self.listeners.remove_where(|l| dead.contains(&l.target));
        self.doc.destroy(idx);
        Ok(())
    }

    // ─── Events ──────────────────────────────────────────────────────────

    /// Dispatch `event` at `target` and bubble it along the composed path
    /// until a listener stops propagation.
    pub fn dispatch(&mut self, target: NodeIndex, event: &InputEvent) -> Result<EventState> {
        let kind = event.kind();
        let mut state = EventState::default();
        let mut current = Some(target);
        while let Some(n) = current {
            for action in self.listeners.actions_for(n, kind) {
                self.run(action, event, &mut state)?;
            }
            if state.propagation_stopped || !event.bubbles() {
                break;
            }
            current = self.doc.composed_parent(n);
        }
        Ok(state)
    }

    fn run(&mut self, action: Action, event: &InputEvent, state: &mut EventState) -> Result<()> {
        log::trace!("{:?} → {action:?}", event.kind());
        let pointer = event.pointer();
        let doc = &mut self.doc;
        match action {
            Action::StartDrag { svg, movable } => {
                if let Some(c) = canvas_by_svg(&mut self.canvases, svg) {
                    c.movability.start(movable, pointer.client, state);
                }
            }
            Action::Drag { svg } => {
                if let Some(c) = canvas_by_svg(&mut self.canvases, svg) {
                    c.movability.drag(doc, pointer.client, state)?;
                }
            }
            Action::EndDrag { svg } => {
                if let Some(c) = canvas_by_svg(&mut self.canvases, svg) {
                    c.movability.reset(Some(&mut *state));
                }
            }
            Action::MouseLog { canvas } => {
                if let Some(c) = self.canvases.get(&canvas) {
                    c.log_pointer(doc, pointer.client, pointer.screen)?;
                }
            }
            Action::Zoom { canvas, direction } => {
                if let Some(c) = self.canvases.get(&canvas) {
                    c.zoom(doc, direction)?;
                }
            }
            Action::WheelZoom { canvas } => {
                if let (Some(c), InputEvent::Wheel { delta_y, .. }) =
                    (self.canvases.get(&canvas), event)
                {
                    c.zoom(doc, -delta_y)?;
                }
            }
            Action::ZoomReset { canvas } => {
                if let Some(c) = self.canvases.get(&canvas) {
                    c.zoom_reset(doc)?;
                }
            }
            Action::Center { canvas } => {
                if let Some(c) = self.canvases.get(&canvas) {
                    c.center(doc)?;
                }
            }
            Action::ToggleSelected { node } => {
                if let Some(n) = self.nodes.get_mut(&node) {
                    n.toggle_selected(doc)?;
                }
            }
        }
        Ok(())
    }

    /// Topmost element under `client` across all canvases, with the svg of
    /// the canvas it belongs to. Later canvases paint over earlier ones.
    pub fn hit(&self, client: Point) -> Option<(NodeIndex, NodeIndex)> {
        let mut hosts: Vec<_> = self.canvases.keys().copied().collect();
        hosts.sort_unstable();
        hosts.iter().rev().find_map(|host| {
            let canvas = &self.canvases[host];
            hit_test(&self.doc, canvas, client, self.measure.as_ref())
                .map(|target| (canvas.svg(), target))
        })
    }

    /// Hit-test and dispatch. Moving off an svg first sends it a
    /// pointer-leave.
    fn dispatch_at(&mut self, event: InputEvent) -> Result<EventState> {
        let hit = self.hit(event.pointer().client);
        let svg = hit.map(|(svg, _)| svg);
        if let Some(previous) = self.hovered_svg
            && svg != Some(previous)
        {
            self.hovered_svg = None;
            self.dispatch(previous, &InputEvent::PointerLeave(event.pointer()))?;
        }
        self.hovered_svg = svg;
        match hit {
            Some((_, target)) => self.dispatch(target, &event),
            None => Ok(EventState::default()),
        }
    }

    pub fn pointer_down(&mut self, pointer: PointerData) -> Result<EventState> {
        self.dispatch_at(InputEvent::PointerDown(pointer))
    }

    pub fn pointer_move(&mut self, pointer: PointerData) -> Result<EventState> {
        self.dispatch_at(InputEvent::PointerMove(pointer))
    }

    pub fn pointer_up(&mut self, pointer: PointerData) -> Result<EventState> {
        self.dispatch_at(InputEvent::PointerUp(pointer))
    }

    /// The pointer left the svg of `canvas`.
    pub fn pointer_leave(&mut self, canvas: NodeIndex, pointer: PointerData) -> Result<EventState> {
        let svg = self.canvas(canvas).ok_or(WfError::UnknownElement)?.svg();
        if self.hovered_svg == Some(svg) {
            self.hovered_svg = None;
        }
        self.dispatch(svg, &InputEvent::PointerLeave(pointer))
    }

    pub fn wheel(&mut self, pointer: PointerData, delta_y: f64) -> Result<EventState> {
        self.dispatch_at(InputEvent::Wheel { delta_y, pointer })
    }

    pub fn click(&mut self, pointer: PointerData) -> Result<EventState> {
        self.dispatch_at(InputEvent::Click(pointer))
    }

    pub fn double_click(&mut self, pointer: PointerData) -> Result<EventState> {
        self.dispatch_at(InputEvent::DoubleClick(pointer))
    }

    /// Click the control with `id` (`zoom-in`, `zoom-out`, `zoom-reset`,
    /// `center`) in the shadow tree of `canvas`.
    pub fn click_button(&mut self, canvas: NodeIndex, id: &str) -> Result<EventState> {
        let shadow = self
            .canvas(canvas)
            .ok_or(WfError::UnknownElement)?
            .shadow_root();
        let button = self
            .doc
            .get_element_by_id(shadow, id)
            .ok_or(WfError::UnknownElement)?;
        self.dispatch(button, &InputEvent::Click(PointerData::default()))
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn listeners(&self) -> &Listeners {
        &self.listeners
    }

    pub fn canvas(&self, host: NodeIndex) -> Option<&GraphCanvas> {
        self.canvases.get(&host)
    }

    /// Canvas hosts in document creation order.
    pub fn canvas_hosts(&self) -> Vec<NodeIndex> {
        let mut hosts: Vec<_> = self.canvases.keys().copied().collect();
        hosts.sort_unstable();
        hosts
    }

    /// Placement of a canvas's svg on screen.
    pub fn set_screen_transform(&mut self, canvas: NodeIndex, ctm: Matrix) -> Result<()> {
        self.canvases
            .get_mut(&canvas)
            .ok_or(WfError::UnknownElement)?
            .set_screen_transform(ctm);
        Ok(())
    }

    pub fn node(&self, host: NodeIndex) -> Option<&WfNode> {
        self.nodes.get(&host)
    }

    /// Attached node with `id` in any canvas.
    pub fn node_by_id(&self, id: &str) -> Option<&WfNode> {
        self.canvases
            .values()
            .find_map(|c| c.node_by_id(id))
            .and_then(|host| self.nodes.get(&host))
    }

    pub fn nodes(&self) -> impl Iterator<Item = &WfNode> {
        self.nodes.values()
    }

    /// Markup of a canvas's shadow tree.
    pub fn render(&self, canvas: NodeIndex) -> Option<String> {
        let c = self.canvases.get(&canvas)?;
        Some(to_markup(&self.doc, c.shadow_root()))
    }
}

fn canvas_by_svg(
    canvases: &mut HashMap<NodeIndex, GraphCanvas>,
    svg: NodeIndex,
) -> Option<&mut GraphCanvas> {
    canvases.values_mut().find(|c| c.svg() == svg)
}
