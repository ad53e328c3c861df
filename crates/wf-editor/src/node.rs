//! Workflow node component (`wf-state`, `wf-task`).
//!
//! A node owns an SVG group that lives inside its canvas's root group, not
//! inside its own host element. The group is created with the node and
//! filled on attach:
//!
//! ```text
//! g.element.wf-state
//!   rect.box          background, sized by the configured BoxSizing
//!   <glyph>.margin
//!   <glyph>.border
//!   <glyph>.fill.handle
//!   rect.text         label background
//!   text              label
//! ```

use crate::config::BoxSizing;
use crate::graph::GraphCanvas;
use crate::input::EventKind;
use crate::listeners::{Action, Listeners};
use crate::symbol::{SymbolDrawer, SymbolShape};
use wf_core::{
    Document, ElementId, NodeIndex, Rect, Result, TextMeasure, WfError, bbox, camel_to_hyphen,
    svg, text,
};

/// Baseline of the label below the glyph center.
const LABEL_Y: f64 = 30.0;
const BOX_RADIUS: f64 = 5.0;

/// Where an attached node lives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attachment {
    /// Host element of the canvas.
    pub canvas: NodeIndex,
    pub id: ElementId,
    pub handle: NodeIndex,
    pub label: NodeIndex,
}

#[derive(Debug)]
pub struct WfNode {
    host: NodeIndex,
    group: NodeIndex,
    symbol: Box<dyn SymbolDrawer>,
    attachment: Option<Attachment>,
    selected: bool,
}

impl WfNode {
    /// Create the (detached) visual group for `host`.
    pub fn new(doc: &mut Document, host: NodeIndex, symbol: Box<dyn SymbolDrawer>) -> Result<Self> {
        doc.set_attr(host, "data-selected", "false")?;
        let class = format!("element {}", camel_to_hyphen(symbol.type_name()));
        let group = doc.create(svg(
            "g",
            [("class", class.as_str()), ("transform", "translate(0,0)")],
            vec![],
        ));
        Ok(Self {
            host,
            group,
            symbol,
            attachment: None,
            selected: false,
        })
    }

    pub fn host(&self) -> NodeIndex {
        self.host
    }

    pub fn group(&self) -> NodeIndex {
        self.group
    }

    pub fn type_name(&self) -> &'static str {
        self.symbol.type_name()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn id(&self) -> Option<ElementId> {
        self.attachment.map(|a| a.id)
    }

    pub fn handle(&self) -> Option<NodeIndex> {
        self.attachment.map(|a| a.handle)
    }

    /// Attach to `canvas`: draw the node into the canvas's root group and
    /// make it draggable by its handle. Does nothing when already attached.
    pub fn connect(
        &mut self,
        doc: &mut Document,
        canvas: Option<&mut GraphCanvas>,
        measure: &dyn TextMeasure,
        listeners: &mut Listeners,
    ) -> Result<()> {
        if self.attachment.is_some() {
            return Ok(());
        }
        let canvas = canvas.ok_or(WfError::MissingGraph)?;
        let id = doc
            .attr(self.host, "id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ElementId::intern)
            .ok_or(WfError::MissingId)?;
        let shape = self.symbol.shape()?;
        canvas.register_node(id, self.host)?;

        match self.draw(doc, canvas, shape, measure, listeners) {
            Ok((handle, label)) => {
                self.attachment = Some(Attachment {
                    canvas: canvas.host(),
                    id,
                    handle,
                    label,
                });
                log::debug!("{} #{id} attached", self.type_name());
                Ok(())
            }
            Err(e) => {
                canvas.unregister_node(id);
                self.clear_group(doc);
                Err(e)
            }
        }
    }

    fn draw(
        &self,
        doc: &mut Document,
        canvas: &mut GraphCanvas,
        shape: SymbolShape,
        measure: &dyn TextMeasure,
        listeners: &mut Listeners,
    ) -> Result<(NodeIndex, NodeIndex)> {
        let group = self.group;
        doc.append_child(canvas.group(), group)?;

        for layer in shape.layers() {
            doc.append(group, layer);
        }

        let content = doc.text_content(self.host).trim().to_string();
        let label = doc.append(
            group,
            svg(
                "text",
                [
                    ("x", "0".to_string()),
                    ("y", LABEL_Y.to_string()),
                    ("text-anchor", "middle".to_string()),
                    ("editable", "simple".to_string()),
                ],
                vec![text(content)],
            ),
        );

        let label_box = bbox(doc, label, measure).unwrap_or_default();
        let text_rect = Rect::new(
            label_box.x0 - 1.0,
            label_box.y0 - 1.0,
            label_box.x1 + 1.0,
            label_box.y1 + 1.0,
        );
        let text_rect_idx = doc.create(rect_spec("text", text_rect, None));
        doc.insert_before(group, text_rect_idx, Some(label))?;

        let box_rect = match canvas.config().box_sizing {
            BoxSizing::FixedOffset => {
                let extent = shape.margin_extent();
                Rect::from_origin_size(
                    (text_rect.x0 - 1.0, -(extent + 1.0)),
                    (
                        text_rect.width() + 2.0,
                        text_rect.height() + 2.0 * extent + 2.0,
                    ),
                )
            }
            BoxSizing::Measured => bbox(doc, group, measure)
                .unwrap_or_default()
                .inflate(1.0, 1.0),
        };
        let box_idx = doc.create(rect_spec("box", box_rect, Some(BOX_RADIUS)));
        let first = doc.first_child(group);
        doc.insert_before(group, box_idx, first)?;

        let handle = doc
            .query_class(group, "handle")
            .ok_or(WfError::UnknownElement)?;
        canvas.movability.add(doc, group, Some(handle), listeners)?;
        listeners.add(
            handle,
            EventKind::DoubleClick,
            Action::ToggleSelected { node: self.host },
        );
        Ok((handle, label))
    }

    /// Flip the selection flag. Returns the new state.
    pub fn toggle_selected(&mut self, doc: &mut Document) -> Result<bool> {
        let attachment = self.attachment.ok_or(WfError::UnknownElement)?;
        self.selected = doc.toggle_class(attachment.handle, "selected")?;
        doc.set_attr(self.host, "data-selected", self.selected.to_string())?;
        log::trace!("#{} selected={}", attachment.id, self.selected);
        Ok(self.selected)
    }

    /// Undo [`connect`](Self::connect): unregister from the canvas and
    /// empty the group. The node can be attached again afterwards.
    pub fn disconnect(
        &mut self,
        doc: &mut Document,
        canvas: Option<&mut GraphCanvas>,
        listeners: &mut Listeners,
    ) {
        let Some(attachment) = self.attachment.take() else {
            return;
        };
        if let Some(canvas) = canvas {
            canvas.movability.remove(self.group, listeners);
            canvas.unregister_node(attachment.id);
        }
        listeners.remove_target(attachment.handle);
        self.clear_group(doc);
        self.selected = false;
        if let Some(host) = doc.element_mut(self.host) {
            host.set_attr("data-selected", "false");
        }
        log::debug!("#{} detached", attachment.id);
    }

    fn clear_group(&self, doc: &mut Document) {
        for child in doc.children(self.group).to_vec() {
            doc.destroy(child);
        }
        doc.detach(self.group);
    }
}

fn rect_spec(class: &str, r: Rect, radius: Option<f64>) -> wf_core::NodeSpec {
    let mut attrs = vec![
        ("class", class.to_string()),
        ("x", length(r.x0)),
        ("y", length(r.y0)),
        ("width", length(r.width())),
        ("height", length(r.height())),
    ];
    if let Some(radius) = radius {
        attrs.push(("rx", length(radius)));
        attrs.push(("ry", length(radius)));
    }
    svg("rect", attrs, vec![])
}

/// Attribute value for a length, rounded to hundredths.
fn length(v: f64) -> String {
    let v = (v * 100.0).round() / 100.0;
    if v == 0.0 { "0".into() } else { v.to_string() }
}
