//! Markup reader and writer for the element tree.
//!
//! The reader is built on `winnow` and understands the subset of HTML that
//! pages embedding the editor use: nested elements, quoted/unquoted/boolean
//! attributes, text, comments, doctype, self-closing and void tags, and raw
//! text inside `<style>`. Elements inside `<svg>` land in the SVG
//! namespace. Whitespace-only text between tags is dropped.
//!
//! The writer serializes a subtree back to markup; it is how a canvas's
//! shadow tree reaches the browser.

use crate::dom::{Document, DomNode, Element, Namespace, NodeSpec};
use crate::error::{Result, WfError};
use petgraph::graph::NodeIndex;
use winnow::combinator::delimited;
use winnow::error::{ContextError, ErrMode};
use winnow::prelude::*;
use winnow::token::{take_till, take_while};

const VOID_ELEMENTS: &[&str] = &["br", "hr", "img", "input", "link", "meta"];
const RAW_TEXT_ELEMENTS: &[&str] = &["style", "script"];

// ─── Reader ──────────────────────────────────────────────────────────────

struct Open {
    idx: NodeIndex,
    name: String,
    namespace: Namespace,
}

#[derive(Debug)]
struct StartTag<'a> {
    name: &'a str,
    attributes: Vec<(&'a str, String)>,
    self_closing: bool,
}

/// Parse `input` and append the resulting nodes under `parent`.
/// Returns the top-level nodes created, in order.
pub fn parse_markup(doc: &mut Document, parent: NodeIndex, input: &str) -> Result<Vec<NodeIndex>> {
    let mut rest = input;
    let mut stack: Vec<Open> = Vec::new();
    let mut top_level = Vec::new();

    while !rest.is_empty() {
        let current = stack.last().map_or(parent, |o| o.idx);

        if rest.starts_with("<!--") {
            let end = rest
                .find("-->")
                .ok_or_else(|| WfError::Markup("unterminated comment".into()))?;
            rest = &rest[end + 3..];
        } else if rest.starts_with("<!") || rest.starts_with("<?") {
            let end = rest
                .find('>')
                .ok_or_else(|| WfError::Markup("unterminated declaration".into()))?;
            rest = &rest[end + 1..];
        } else if rest.starts_with("</") {
            let name = parse_end_tag
                .parse_next(&mut rest)
                .map_err(|e| WfError::Markup(format!("bad end tag: {e}")))?;
            match stack.pop() {
                Some(open) if open.name.eq_ignore_ascii_case(name) => {}
                Some(open) => {
                    return Err(WfError::Markup(format!(
                        "expected </{}>, found </{name}>",
                        open.name
                    )));
                }
                None => return Err(WfError::Markup(format!("unexpected </{name}>"))),
            }
        } else if rest.starts_with('<') {
            let tag = parse_start_tag
                .parse_next(&mut rest)
                .map_err(|e| WfError::Markup(format!("bad start tag: {e}")))?;
            let namespace = if tag.name.eq_ignore_ascii_case("svg") {
                Namespace::Svg
            } else {
                stack.last().map_or(Namespace::Html, |o| o.namespace)
            };
            let mut element = Element::new(namespace, tag.name);
            for (k, v) in tag.attributes {
                element.set_attr(k, v);
            }
            let idx = doc.append(
                current,
                NodeSpec::Element {
                    element,
                    children: Vec::new(),
                },
            );
            if current == parent {
                top_level.push(idx);
            }

            let is_void = namespace == Namespace::Html && VOID_ELEMENTS.contains(&tag.name);
            if tag.self_closing || is_void {
                continue;
            }
            if RAW_TEXT_ELEMENTS.contains(&tag.name) {
                let close = format!("</{}", tag.name);
                let end = rest
                    .find(&close)
                    .ok_or_else(|| WfError::Markup(format!("unclosed <{}>", tag.name)))?;
                if end > 0 {
                    doc.append(idx, NodeSpec::Text(rest[..end].to_string()));
                }
                rest = &rest[end..];
            }
            stack.push(Open {
                idx,
                name: tag.name.to_string(),
                namespace,
            });
        } else {
            let raw = parse_text
                .parse_next(&mut rest)
                .map_err(|e| WfError::Markup(format!("bad text: {e}")))?;
            if !raw.trim().is_empty() {
                let idx = doc.append(current, NodeSpec::Text(decode_entities(raw)));
                if current == parent {
                    top_level.push(idx);
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(WfError::Markup(format!("unclosed <{}>", open.name)));
    }
    log::trace!("parsed {} top-level nodes", top_level.len());
    Ok(top_level)
}

fn parse_name<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.'
    })
    .parse_next(input)
}

fn parse_text<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., '<').parse_next(input)
}

fn parse_double_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited('"', take_till(0.., '"'), '"').parse_next(input)
}

fn parse_single_quoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    delimited('\'', take_till(0.., '\''), '\'').parse_next(input)
}

fn parse_unquoted<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    take_till(1.., |c: char| c.is_ascii_whitespace() || c == '>').parse_next(input)
}

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

fn parse_end_tag<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let Some(after) = input.strip_prefix("</") else {
        return backtrack();
    };
    *input = after;
    let name = parse_name(input)?;
    *input = input.trim_start();
    let Some(after) = input.strip_prefix('>') else {
        return backtrack();
    };
    *input = after;
    Ok(name)
}

fn parse_start_tag<'a>(input: &mut &'a str) -> ModalResult<StartTag<'a>> {
    let Some(after) = input.strip_prefix('<') else {
        return backtrack();
    };
    *input = after;
    let name = parse_name(input)?;
    let mut attributes = Vec::new();
    loop {
        *input = input.trim_start();
        if let Some(after) = input.strip_prefix("/>") {
            *input = after;
            return Ok(StartTag {
                name,
                attributes,
                self_closing: true,
            });
        }
        if let Some(after) = input.strip_prefix('>') {
            *input = after;
            return Ok(StartTag {
                name,
                attributes,
                self_closing: false,
            });
        }
        let attr = parse_name(input)?;
        *input = input.trim_start();
        let value = match input.strip_prefix('=') {
            Some(after) => {
                *input = after.trim_start();
                let raw = if input.starts_with('"') {
                    parse_double_quoted(input)?
                } else if input.starts_with('\'') {
                    parse_single_quoted(input)?
                } else {
                    parse_unquoted(input)?
                };
                decode_entities(raw)
            }
            None => String::new(),
        };
        attributes.push((attr, value));
    }
}

fn decode_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

// ─── Writer ──────────────────────────────────────────────────────────────

/// Serialize `idx` and its tree descendants. Documents and shadow roots
/// serialize their children only; shadow trees of hosts are not included.
pub fn to_markup(doc: &Document, idx: NodeIndex) -> String {
    let mut out = String::new();
    write_node(doc, idx, &mut out, false);
    out
}

fn write_node(doc: &Document, idx: NodeIndex, out: &mut String, raw_text: bool) {
    match doc.node(idx) {
        Some(DomNode::Document | DomNode::ShadowRoot { .. }) => {
            for &child in doc.children(idx) {
                write_node(doc, child, out, false);
            }
        }
        Some(DomNode::Text(t)) => {
            if raw_text {
                out.push_str(t);
            } else {
                out.push_str(&escape_text(t));
            }
        }
        Some(DomNode::Element(el)) => write_element(doc, idx, el, out),
        None => {}
    }
}

fn write_element(doc: &Document, idx: NodeIndex, el: &Element, out: &mut String) {
    out.push('<');
    out.push_str(&el.name);
    let is_svg_root = el.is_svg("svg") && el.attr("xmlns").is_none();
    if is_svg_root {
        out.push_str(&format!(" xmlns=\"{}\"", Namespace::Svg.uri()));
    }
    for (k, v) in &el.attributes {
        out.push_str(&format!(" {k}=\"{}\"", escape_attr(v)));
    }

    let children = doc.children(idx);
    if el.namespace == Namespace::Html && VOID_ELEMENTS.contains(&el.name.as_str()) {
        out.push('>');
        return;
    }
    if children.is_empty() && el.namespace == Namespace::Svg {
        out.push_str("/>");
        return;
    }
    out.push('>');
    let raw_text = RAW_TEXT_ELEMENTS.contains(&el.name.as_str());
    for &child in children {
        write_node(doc, child, out, raw_text);
    }
    out.push_str("</");
    out.push_str(&el.name);
    out.push('>');
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(s: &str) -> String {
    escape_text(s).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_custom_element_markup() {
        let mut doc = Document::new();
        let root = doc.root;
        let top = parse_markup(
            &mut doc,
            root,
            r#"<!doctype html>
            <wf-graph data-width="500">
              <wf-state id="s1">Start</wf-state>
              <wf-task id=t1 hidden>Review &amp; sign</wf-task>
            </wf-graph>"#,
        )
        .unwrap();
        assert_eq!(top.len(), 1);
        let graph = top[0];
        assert_eq!(doc.attr(graph, "data-width"), Some("500"));
        let children = doc.child_elements(graph);
        assert_eq!(children.len(), 2);
        assert_eq!(doc.text_content(children[0]), "Start");
        assert_eq!(doc.attr(children[1], "id"), Some("t1"));
        assert_eq!(doc.attr(children[1], "hidden"), Some(""));
        assert_eq!(doc.text_content(children[1]), "Review & sign");
    }

    #[test]
    fn svg_subtree_gets_svg_namespace() {
        let mut doc = Document::new();
        let root = doc.root;
        let top = parse_markup(&mut doc, root, r#"<div><svg><g><circle r="8"/></g></svg></div>"#)
            .unwrap();
        let div = top[0];
        let svg = doc.first_child(div).unwrap();
        let circle = doc.query_tag(svg, "circle").unwrap();
        assert_eq!(doc.element(div).unwrap().namespace, Namespace::Html);
        assert_eq!(doc.element(svg).unwrap().namespace, Namespace::Svg);
        assert!(doc.element(circle).unwrap().is_svg("circle"));
    }

    #[test]
    fn style_content_is_raw() {
        let mut doc = Document::new();
        let root = doc.root;
        let top = parse_markup(&mut doc, root, "<style>.a > .b { x: 1 }</style>").unwrap();
        assert_eq!(doc.text_content(top[0]), ".a > .b { x: 1 }");
        assert_eq!(to_markup(&doc, top[0]), "<style>.a > .b { x: 1 }</style>");
    }

    #[test]
    fn rejects_mismatched_and_unclosed_tags() {
        let mut doc = Document::new();
        let root = doc.root;
        assert!(parse_markup(&mut doc, root, "<a><b></a>").is_err());
        assert!(parse_markup(&mut doc, root, "<wf-graph>").is_err());
        assert!(parse_markup(&mut doc, root, "</wf-graph>").is_err());
    }

    #[test]
    fn writes_svg_with_namespace_and_escaping() {
        let mut doc = Document::new();
        let root = doc.root;
        let top = parse_markup(
            &mut doc,
            root,
            r#"<svg width="10"><text x="0">a &lt; b</text><rect class="box"/></svg>"#,
        )
        .unwrap();
        assert_eq!(
            to_markup(&doc, top[0]),
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="10"><text x="0">a &lt; b</text><rect class="box"/></svg>"#
        );
    }

    #[test]
    fn void_html_elements_do_not_nest() {
        let mut doc = Document::new();
        let root = doc.root;
        let top = parse_markup(&mut doc, root, r#"<link rel="stylesheet" href="wf-graph.css"><span></span>"#)
            .unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(
            to_markup(&doc, root),
            r#"<link rel="stylesheet" href="wf-graph.css"><span></span>"#
        );
    }
}
