//! Retained element tree.
//!
//! The document is a tree of HTML/SVG elements and text nodes stored in a
//! `StableDiGraph`. Edges go parent → child; the child order of every
//! parent is tracked separately so `insert_before` can place a node
//! anywhere among its siblings. Shadow roots hang off their host element
//! without a tree edge, so tree queries (`closest`, `descendants`) never
//! cross into them.
//!
//! Trees are built declaratively with [`element`], [`html`], [`svg`] and
//! [`text`], then materialized with [`Document::create`] or
//! [`Document::append`].

use crate::error::{Result, WfError};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

pub const HTML_NS: &str = "http://www.w3.org/1999/xhtml";
pub const SVG_NS: &str = "http://www.w3.org/2000/svg";

// ─── Elements ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

impl Namespace {
    pub fn uri(self) -> &'static str {
        match self {
            Namespace::Html => HTML_NS,
            Namespace::Svg => SVG_NS,
        }
    }

    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            HTML_NS => Some(Namespace::Html),
            SVG_NS => Some(Namespace::Svg),
            _ => None,
        }
    }
}

/// A namespace-qualified element with ordered attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub namespace: Namespace,
    pub name: String,
    pub attributes: SmallVec<[(String, String); 4]>,
}

impl Element {
    pub fn new(namespace: Namespace, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
            attributes: SmallVec::new(),
        }
    }

    /// True for an element with the given local name in the SVG namespace.
    pub fn is_svg(&self, name: &str) -> bool {
        self.namespace == Namespace::Svg && self.name == name
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, keeping its position if it already exists.
    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_ascii_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// Add the class if absent, remove it if present. Returns whether the
    /// class is present afterwards.
    pub fn toggle_class(&mut self, class: &str) -> bool {
        let mut classes: Vec<String> = self.classes().map(str::to_string).collect();
        let present = match classes.iter().position(|c| c == class) {
            Some(pos) => {
                classes.remove(pos);
                false
            }
            None => {
                classes.push(class.to_string());
                true
            }
        };
        if classes.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", classes.join(" "));
        }
        present
    }
}

/// One node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Document,
    /// Shadow root attached to `host`. Has no tree parent.
    ShadowRoot { host: NodeIndex },
    Element(Element),
    Text(String),
}

// ─── Declarative construction ────────────────────────────────────────────

/// An element tree that has not been inserted into a document yet.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeSpec {
    Element {
        element: Element,
        children: Vec<NodeSpec>,
    },
    Text(String),
}

/// A text node.
pub fn text(content: impl Into<String>) -> NodeSpec {
    NodeSpec::Text(content.into())
}

/// An element tree with a given namespace.
pub fn element<I, K, V>(
    namespace: Namespace,
    name: &str,
    attributes: I,
    children: Vec<NodeSpec>,
) -> NodeSpec
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    let mut el = Element::new(namespace, name);
    for (k, v) in attributes {
        let k: String = k.into();
        el.set_attr(&k, v);
    }
    NodeSpec::Element {
        element: el,
        children,
    }
}

/// An element tree in the HTML namespace.
pub fn html<I, K, V>(name: &str, attributes: I, children: Vec<NodeSpec>) -> NodeSpec
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    element(Namespace::Html, name, attributes, children)
}

/// An element tree in the SVG namespace.
pub fn svg<I, K, V>(name: &str, attributes: I, children: Vec<NodeSpec>) -> NodeSpec
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    element(Namespace::Svg, name, attributes, children)
}

/// Empty attribute list, for elements without attributes.
pub const NO_ATTRS: [(&str, &str); 0] = [];

// ─── Document ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Document {
    pub graph: StableDiGraph<DomNode, ()>,
    pub root: NodeIndex,
    /// Ordered children per parent; the tree edges only answer `parent`.
    child_order: HashMap<NodeIndex, Vec<NodeIndex>>,
    /// Host element → its shadow root.
    shadow_roots: HashMap<NodeIndex, NodeIndex>,
}

impl Document {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root = graph.add_node(DomNode::Document);
        Self {
            graph,
            root,
            child_order: HashMap::new(),
            shadow_roots: HashMap::new(),
        }
    }

    pub fn node(&self, idx: NodeIndex) -> Option<&DomNode> {
        self.graph.node_weight(idx)
    }

    pub fn element(&self, idx: NodeIndex) -> Option<&Element> {
        match self.graph.node_weight(idx) {
            Some(DomNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, idx: NodeIndex) -> Option<&mut Element> {
        match self.graph.node_weight_mut(idx) {
            Some(DomNode::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_or_err(&mut self, idx: NodeIndex) -> Result<&mut Element> {
        self.element_mut(idx).ok_or(WfError::UnknownElement)
    }

    /// Tag name of an element, `None` for any other node.
    pub fn tag(&self, idx: NodeIndex) -> Option<&str> {
        self.element(idx).map(|el| el.name.as_str())
    }

    // ─── Construction ────────────────────────────────────────────────────

    /// Materialize a spec as a detached subtree. Returns its top node.
    pub fn create(&mut self, spec: NodeSpec) -> NodeIndex {
        match spec {
            NodeSpec::Text(content) => self.graph.add_node(DomNode::Text(content)),
            NodeSpec::Element { element, children } => {
                let idx = self.graph.add_node(DomNode::Element(element));
                for child in children {
                    let child_idx = self.create(child);
                    self.link(idx, child_idx, None);
                }
                idx
            }
        }
    }

    /// Materialize a spec and append it as the last child of `parent`.
    pub fn append(&mut self, parent: NodeIndex, spec: NodeSpec) -> NodeIndex {
        let idx = self.create(spec);
        self.link(parent, idx, None);
        idx
    }

    /// Append an existing node as the last child of `parent`, moving it
    /// out of its current parent first.
    pub fn append_child(&mut self, parent: NodeIndex, child: NodeIndex) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert an existing node before `reference` (or last when `None`).
    /// `reference` must be a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeIndex,
        child: NodeIndex,
        reference: Option<NodeIndex>,
    ) -> Result<()> {
        if !self.graph.contains_node(parent) || !self.graph.contains_node(child) {
            return Err(WfError::UnknownElement);
        }
        if let Some(r) = reference
            && self.parent(r) != Some(parent)
        {
            return Err(WfError::UnknownElement);
        }
        if reference == Some(child) {
            return Ok(());
        }
        self.detach(child);
        self.link(parent, child, reference);
        Ok(())
    }

    fn link(&mut self, parent: NodeIndex, child: NodeIndex, reference: Option<NodeIndex>) {
        self.graph.add_edge(parent, child, ());
        let order = self.child_order.entry(parent).or_default();
        let pos = reference
            .and_then(|r| order.iter().position(|&c| c == r))
            .unwrap_or(order.len());
        order.insert(pos, child);
    }

    /// Detach a node from its parent. The subtree stays alive and can be
    /// re-inserted.
    pub fn detach(&mut self, child: NodeIndex) {
        if let Some(parent) = self.parent(child) {
            if let Some(edge) = self.graph.find_edge(parent, child) {
                self.graph.remove_edge(edge);
            }
            if let Some(order) = self.child_order.get_mut(&parent) {
                order.retain(|&c| c != child);
            }
        }
    }

    /// Remove a node and its whole subtree (shadow trees included).
    pub fn destroy(&mut self, idx: NodeIndex) {
        self.detach(idx);
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            if let Some(children) = self.child_order.remove(&n) {
                stack.extend(children);
            }
            if let Some(shadow) = self.shadow_roots.remove(&n) {
                stack.push(shadow);
            }
            self.graph.remove_node(n);
        }
    }

    // ─── Shadow roots ────────────────────────────────────────────────────

    /// Attach a shadow root to `host`, or return the existing one.
    pub fn attach_shadow(&mut self, host: NodeIndex) -> Result<NodeIndex> {
        if self.element(host).is_none() {
            return Err(WfError::UnknownElement);
        }
        if let Some(&existing) = self.shadow_roots.get(&host) {
            return Ok(existing);
        }
        let shadow = self.graph.add_node(DomNode::ShadowRoot { host });
        self.shadow_roots.insert(host, shadow);
        Ok(shadow)
    }

    pub fn shadow_root(&self, host: NodeIndex) -> Option<NodeIndex> {
        self.shadow_roots.get(&host).copied()
    }

    // ─── Traversal ───────────────────────────────────────────────────────

    /// Tree parent. Shadow roots and detached nodes have none.
    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Parent for event propagation: crosses from a shadow root to its host.
    pub fn composed_parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        match self.graph.node_weight(idx) {
            Some(DomNode::ShadowRoot { host }) => Some(*host),
            _ => self.parent(idx),
        }
    }

    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        self.child_order.get(&idx).map_or(&[], Vec::as_slice)
    }

    pub fn first_child(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.children(idx).first().copied()
    }

    /// Element children only (text nodes skipped).
    pub fn child_elements(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.children(idx)
            .iter()
            .copied()
            .filter(|&c| self.element(c).is_some())
            .collect()
    }

    /// Whether the node is reachable from the document root (through
    /// shadow hosts).
    pub fn is_connected(&self, idx: NodeIndex) -> bool {
        let mut current = Some(idx);
        while let Some(n) = current {
            if n == self.root {
                return true;
            }
            current = self.composed_parent(n);
        }
        false
    }

    /// Pre-order list of `idx` and its tree descendants.
    pub fn descendants(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out = Vec::new();
        let mut stack = vec![idx];
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.children(n).iter().rev().copied());
        }
        out
    }

    /// Nearest inclusive ancestor with the given tag name.
    pub fn closest(&self, idx: NodeIndex, tag: &str) -> Option<NodeIndex> {
        let mut current = Some(idx);
        while let Some(n) = current {
            if self.tag(n) == Some(tag) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }

    /// First descendant of `scope` whose `id` attribute matches.
    pub fn get_element_by_id(&self, scope: NodeIndex, id: &str) -> Option<NodeIndex> {
        self.descendants(scope)
            .into_iter()
            .find(|&n| self.element(n).and_then(Element::id) == Some(id))
    }

    /// First descendant of `scope` (excluding `scope`) carrying `class`.
    pub fn query_class(&self, scope: NodeIndex, class: &str) -> Option<NodeIndex> {
        self.descendants(scope)
            .into_iter()
            .skip(1)
            .find(|&n| self.element(n).is_some_and(|el| el.has_class(class)))
    }

    /// First descendant of `scope` (excluding `scope`) with the tag name.
    pub fn query_tag(&self, scope: NodeIndex, tag: &str) -> Option<NodeIndex> {
        self.descendants(scope)
            .into_iter()
            .skip(1)
            .find(|&n| self.tag(n) == Some(tag))
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, idx: NodeIndex) -> String {
        self.descendants(idx)
            .into_iter()
            .filter_map(|n| match self.graph.node_weight(n) {
                Some(DomNode::Text(t)) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children of `idx` with a single text node.
    pub fn set_text_content(&mut self, idx: NodeIndex, content: impl Into<String>) -> Result<()> {
        if self.element(idx).is_none() {
            return Err(WfError::UnknownElement);
        }
        for child in self.children(idx).to_vec() {
            self.destroy(child);
        }
        self.append(idx, NodeSpec::Text(content.into()));
        Ok(())
    }

    // ─── Attributes ──────────────────────────────────────────────────────

    pub fn attr(&self, idx: NodeIndex, name: &str) -> Option<&str> {
        self.element(idx).and_then(|el| el.attr(name))
    }

    pub fn set_attr(&mut self, idx: NodeIndex, name: &str, value: impl Into<String>) -> Result<()> {
        self.element_or_err(idx)?.set_attr(name, value);
        Ok(())
    }

    pub fn remove_attr(&mut self, idx: NodeIndex, name: &str) -> Result<Option<String>> {
        Ok(self.element_or_err(idx)?.remove_attr(name))
    }

    pub fn toggle_class(&mut self, idx: NodeIndex, class: &str) -> Result<bool> {
        Ok(self.element_or_err(idx)?.toggle_class(class))
    }

    pub fn has_class(&self, idx: NodeIndex, class: &str) -> bool {
        self.element(idx).is_some_and(|el| el.has_class(class))
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
