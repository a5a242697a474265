//! Arena-backed HTML document.
//!
//! Markup is parsed with `scraper` (html5ever), then copied into an arena of
//! slots so the tree can be mutated in place. Nodes refer to each other by
//! [`NodeId`]. Removing a subtree frees its slots for reuse and bumps their
//! generation, so handles to removed nodes resolve to nothing.

use std::fmt;
use std::sync::Arc;

use scraper::Html;
use thiserror::Error;
use tracing::debug;

use crate::dom::events::{ClickEvent, ClickListener};
use crate::dom::node::{Attribute, Element, NodeData, NodeId, NodeKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("node {0:?} does not belong to this document")]
    UnknownNode(NodeId),

    #[error("node {0:?} cannot have children")]
    NotAContainer(NodeId),
}

struct Slot {
    generation: u32,
    data: Option<NodeData>,
}

pub struct Document {
    slots: Vec<Slot>,
    free: Vec<usize>,
    listeners: Vec<Arc<dyn ClickListener>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field(
                "listeners",
                &self.listeners.iter().map(|l| l.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document holding only the root node.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                generation: 0,
                data: Some(NodeData::new(NodeKind::Document)),
            }],
            free: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Parses a complete document. Missing `html`, `head` and `body`
    /// elements are implied, as a browser would.
    pub fn parse(html: &str) -> Self {
        let mut document = Self::new();
        let root = document.root();
        document.import(root, &Html::parse_document(html), false);
        document
    }

    pub fn root(&self) -> NodeId {
        NodeId {
            index: 0,
            generation: 0,
        }
    }

    fn data(&self, node: NodeId) -> Option<&NodeData> {
        self.slots
            .get(node.index)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.data.as_ref())
    }

    fn data_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        self.slots
            .get_mut(node.index)
            .filter(|s| s.generation == node.generation)
            .and_then(|s| s.data.as_mut())
    }

    /// Whether `node` is live in this document.
    pub fn contains(&self, node: NodeId) -> bool {
        self.data(node).is_some()
    }

    pub fn kind(&self, node: NodeId) -> Option<&NodeKind> {
        self.data(node).map(|n| &n.kind)
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.data(node).and_then(NodeData::element)
    }

    pub fn element_mut(&mut self, node: NodeId) -> Option<&mut Element> {
        match self.data_mut(node).map(|n| &mut n.kind) {
            Some(NodeKind::Element(e)) => Some(e),
            _ => None,
        }
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.data(node)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Every node below `node` in document order, `node` excluded.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .find(|n| self.element(*n).and_then(Element::id) == Some(id))
    }

    pub fn get_elements_by_class_name(&self, class: &str) -> Vec<NodeId> {
        self.descendants(self.root())
            .into_iter()
            .filter(|n| self.element(*n).is_some_and(|e| e.has_class(class)))
            .collect()
    }

    /// Nearest element carrying `class`, starting at `node` itself.
    pub fn closest_with_class(&self, node: NodeId, class: &str) -> Option<NodeId> {
        let mut current = Some(node);
        while let Some(id) = current {
            if self.class_list_contains(id, class) {
                return Some(id);
            }
            current = self.parent(id);
        }
        None
    }

    pub fn class_list_contains(&self, node: NodeId, class: &str) -> bool {
        self.element(node).is_some_and(|e| e.has_class(class))
    }

    /// Returns the new state of `class`, or `None` when `node` is not a live
    /// element.
    pub fn class_list_toggle(&mut self, node: NodeId, class: &str) -> Option<bool> {
        self.element_mut(node).map(|e| e.toggle_class(class))
    }

    fn alloc(&mut self, data: NodeData) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.data = Some(data);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    data: Some(data),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        }
    }

    fn push_node(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let mut data = NodeData::new(kind);
        data.parent = Some(parent);
        let id = self.alloc(data);
        if let Some(parent) = self.data_mut(parent) {
            parent.children.push(id);
        }
        id
    }

    /// Frees `node` and everything below it.
    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index)
                .filter(|s| s.generation == id.generation)
            else {
                continue;
            };
            if let Some(data) = slot.data.take() {
                stack.extend(data.children);
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index);
            }
        }
    }

    /// Copies the parsed tree under `parent`. For fragments the parser wraps
    /// everything in an `html` element; its children are imported in its
    /// place.
    fn import(&mut self, parent: NodeId, parsed: &Html, fragment: bool) {
        if !parsed.errors.is_empty() {
            debug!("Parsed markup with {} recoverable errors", parsed.errors.len());
        }

        let mut stack: Vec<_> = parsed.tree.root().children().map(|c| (c, parent)).collect();
        stack.reverse();

        while let Some((node, target)) = stack.pop() {
            let kind = match node.value() {
                scraper::Node::Element(e) if fragment && target == parent && e.name() == "html" => {
                    let children: Vec<_> = node.children().collect();
                    stack.extend(children.into_iter().rev().map(|c| (c, target)));
                    continue;
                }
                scraper::Node::Element(e) => NodeKind::Element(Element::new(
                    e.name(),
                    e.attrs().map(|(name, value)| Attribute::new(name, value)).collect(),
                )),
                scraper::Node::Text(text) => NodeKind::Text((**text).to_owned()),
                scraper::Node::Comment(comment) => NodeKind::Comment((**comment).to_owned()),
                scraper::Node::Doctype(doctype) => NodeKind::Doctype(doctype.name().to_string()),
                _ => continue,
            };

            let id = self.push_node(target, kind);
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|c| (c, id)));
        }
    }

    /// Replaces every child of `node` with the nodes parsed from `html`.
    /// The removed nodes are freed.
    pub fn set_inner_html(&mut self, node: NodeId, html: &str) -> Result<(), DomError> {
        let data = self.data_mut(node).ok_or(DomError::UnknownNode(node))?;
        if !data.can_have_children() {
            return Err(DomError::NotAContainer(node));
        }
        let old = std::mem::take(&mut data.children);
        for child in old {
            self.free_subtree(child);
        }
        self.import(node, &Html::parse_fragment(html), true);
        Ok(())
    }

    pub fn inner_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        for child in self.children(node) {
            self.serialize_into(*child, &mut out);
        }
        out
    }

    /// Serializes the whole document.
    pub fn to_html(&self) -> String {
        self.inner_html(self.root())
    }

    fn serialize_into(&self, node: NodeId, out: &mut String) {
        let Some(data) = self.data(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Document => {
                for child in &data.children {
                    self.serialize_into(*child, out);
                }
            }
            NodeKind::Doctype(name) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(name);
                out.push('>');
            }
            NodeKind::Text(text) => {
                let raw = data
                    .parent
                    .and_then(|p| self.element(p))
                    .is_some_and(Element::is_raw_text);
                if raw {
                    out.push_str(text);
                } else {
                    escape_into(text, false, out);
                }
            }
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element(element) => {
                out.push('<');
                out.push_str(element.tag());
                for attr in element.attributes() {
                    out.push(' ');
                    out.push_str(&attr.name);
                    out.push_str("=\"");
                    escape_into(&attr.value, true, out);
                    out.push('"');
                }
                out.push('>');
                if element.is_void() {
                    return;
                }
                for child in &data.children {
                    self.serialize_into(*child, out);
                }
                out.push_str("</");
                out.push_str(element.tag());
                out.push('>');
            }
        }
    }

    pub fn add_click_listener(&mut self, listener: Arc<dyn ClickListener>) {
        debug!("Attaching click listener '{}'", listener.name());
        self.listeners.push(listener);
    }

    pub fn has_click_listener(&self, name: &str) -> bool {
        self.listeners.iter().any(|l| l.name() == name)
    }

    /// Dispatches a click on `target` to every document-level listener, in
    /// the order they were attached. Clicks on removed nodes are dropped.
    pub fn click(&mut self, target: NodeId) {
        if !self.contains(target) {
            debug!("Ignoring click on removed node {target:?}");
            return;
        }
        let event = ClickEvent { target };
        let listeners = self.listeners.clone();
        for listener in listeners {
            listener.handle(self, &event);
        }
    }
}

/// HTML serialization escaping: `&`, no-break space and `<`/`>` in text;
/// `&`, no-break space and `"` in attribute values.
fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SHELL: &str = r#"<!DOCTYPE html><html><head><meta charset="utf-8"><title>T</title></head><body><div id="pages-container"></div></body></html>"#;

    fn inner(doc: &Document, id: &str) -> String {
        doc.inner_html(doc.get_element_by_id(id).unwrap())
    }

    #[test]
    fn test_parse_and_serialize_preserves_markup() {
        let doc = Document::parse(SHELL);
        assert_eq!(doc.to_html(), SHELL);
    }

    #[test]
    fn test_parse_implies_document_structure() {
        let doc = Document::parse(r#"<p id="x">hi</p>"#);
        assert_eq!(
            doc.to_html(),
            r#"<html><head></head><body><p id="x">hi</p></body></html>"#
        );
    }

    #[test]
    fn test_get_element_by_id() {
        let doc = Document::parse(SHELL);
        let container = doc.get_element_by_id("pages-container").unwrap();
        assert_eq!(doc.element(container).unwrap().tag(), "div");
        assert!(doc.get_element_by_id("missing").is_none());
    }

    #[test]
    fn test_set_inner_html_replaces_children() {
        let mut doc = Document::parse(SHELL);
        let container = doc.get_element_by_id("pages-container").unwrap();
        doc.set_inner_html(container, "<p>old</p>").unwrap();
        doc.set_inner_html(container, "<p>A</p>\n<p>B</p>").unwrap();
        assert_eq!(doc.inner_html(container), "<p>A</p>\n<p>B</p>");
        assert_eq!(doc.children(container).len(), 3);
    }

    #[test]
    fn test_replaced_nodes_are_unreachable() {
        let mut doc = Document::parse(r#"<div id="c"><span id="old"></span></div>"#);
        let container = doc.get_element_by_id("c").unwrap();
        doc.set_inner_html(container, "").unwrap();
        assert!(doc.get_element_by_id("old").is_none());
    }

    #[test]
    fn test_stale_handles_do_not_resolve() {
        let mut doc = Document::parse(r#"<div id="c"><span class="spoiler" id="old">x</span></div>"#);
        let container = doc.get_element_by_id("c").unwrap();
        let old = doc.get_element_by_id("old").unwrap();

        doc.set_inner_html(container, r#"<span class="spoiler" id="new">y</span>"#)
            .unwrap();

        assert!(!doc.contains(old));
        assert_eq!(doc.class_list_toggle(old, "revealed"), None);
        assert_eq!(
            doc.set_inner_html(old, "<p></p>"),
            Err(DomError::UnknownNode(old))
        );
        let new = doc.get_element_by_id("new").unwrap();
        assert!(!doc.class_list_contains(new, "revealed"));
    }

    #[test]
    fn test_repeated_replacement_reuses_slots() {
        let mut doc = Document::parse(SHELL);
        let container = doc.get_element_by_id("pages-container").unwrap();
        let mut sizes = Vec::new();

        for _ in 0..3 {
            doc.set_inner_html(container, r#"<div class="loading">...</div>"#)
                .unwrap();
            doc.set_inner_html(container, "<p>A</p>\n<p>B</p>").unwrap();
            sizes.push(doc.slots.len());
        }

        assert_eq!(sizes[1], sizes[0]);
        assert_eq!(sizes[2], sizes[0]);
        assert_eq!(inner(&doc, "pages-container"), "<p>A</p>\n<p>B</p>");
    }

    #[test]
    fn test_set_inner_html_on_text_node_fails() {
        let mut doc = Document::parse(r#"<p id="t">text</p>"#);
        let p = doc.get_element_by_id("t").unwrap();
        let text = doc.children(p)[0];
        assert_eq!(
            doc.set_inner_html(text, "<p></p>"),
            Err(DomError::NotAContainer(text))
        );
    }

    #[test]
    fn test_implied_end_tags_make_siblings() {
        let doc = Document::parse(r#"<ul id="l"><li id="a">x<li id="b">y</ul>"#);
        let list = doc.get_element_by_id("l").unwrap();
        let b = doc.get_element_by_id("b").unwrap();
        assert_eq!(doc.parent(b), Some(list));
        assert_eq!(inner(&doc, "l"), r#"<li id="a">x</li><li id="b">y</li>"#);
    }

    #[test]
    fn test_unclosed_cell_does_not_nest_next_cell() {
        let doc = Document::parse(
            r#"<table><tr><td class="spoiler" id="q">x<td id="other">y</table>"#,
        );
        let other = doc.get_element_by_id("other").unwrap();
        assert_eq!(doc.closest_with_class(other, "spoiler"), None);
    }

    #[test]
    fn test_fragment_cannot_close_its_container() {
        let mut doc = Document::parse(r#"<div id="c"></div><p id="after"></p>"#);
        let container = doc.get_element_by_id("c").unwrap();
        doc.set_inner_html(container, "<b>x</div></b>").unwrap();

        let after = doc.get_element_by_id("after").unwrap();
        assert_eq!(doc.inner_html(container), "<b>x</b>");
        assert_eq!(doc.parent(after), doc.parent(container));
    }

    #[test]
    fn test_void_elements_take_no_children() {
        let doc = Document::parse(r#"<div id="t"><p>a<br>b</p></div>"#);
        assert_eq!(inner(&doc, "t"), "<p>a<br>b</p>");
    }

    #[test]
    fn test_entities_survive_round_trip() {
        let doc = Document::parse(
            r#"<div id="t"><p title="say &quot;hi&quot;">a &amp; b&nbsp;&lt;c&gt;</p></div>"#,
        );
        assert_eq!(
            inner(&doc, "t"),
            r#"<p title="say &quot;hi&quot;">a &amp; b&nbsp;&lt;c&gt;</p>"#
        );
    }

    #[test]
    fn test_script_text_is_not_escaped() {
        let doc = Document::parse(r#"<div id="t"><script>if (a<b && c) {}</script></div>"#);
        assert_eq!(inner(&doc, "t"), "<script>if (a<b && c) {}</script>");
    }

    #[test]
    fn test_closest_with_class_is_inclusive() {
        let doc = Document::parse(
            r#"<div class="spoiler" id="outer"><span id="inner"><b id="deep">x</b></span></div>"#,
        );
        let outer = doc.get_element_by_id("outer").unwrap();
        let deep = doc.get_element_by_id("deep").unwrap();
        assert_eq!(doc.closest_with_class(deep, "spoiler"), Some(outer));
        assert_eq!(doc.closest_with_class(outer, "spoiler"), Some(outer));
        assert_eq!(doc.closest_with_class(deep, "missing"), None);
    }

    #[test]
    fn test_closest_from_text_node_walks_to_parent() {
        let doc = Document::parse(r#"<div class="spoiler">x</div>"#);
        let div = doc.get_elements_by_class_name("spoiler")[0];
        let text = doc.children(div)[0];
        assert_eq!(doc.closest_with_class(text, "spoiler"), Some(div));
    }

    struct Counter {
        hits: AtomicUsize,
    }

    impl ClickListener for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn handle(&self, _document: &mut Document, _event: &ClickEvent) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_click_reaches_every_listener() {
        let mut doc = Document::parse(r#"<div id="c"><p id="x">x</p></div>"#);
        let counter = Arc::new(Counter {
            hits: AtomicUsize::new(0),
        });
        doc.add_click_listener(counter.clone());
        assert!(doc.has_click_listener("counter"));
        let p = doc.get_element_by_id("x").unwrap();
        doc.click(p);
        doc.click(doc.root());

        let container = doc.get_element_by_id("c").unwrap();
        doc.set_inner_html(container, "").unwrap();
        doc.click(p);
        assert_eq!(counter.hits.load(Ordering::SeqCst), 2);
    }
}
