//! HTML trees for rendered cell output
//!
//! Rendered and edited cell HTML is parsed with html5ever into a
//! `markup5ever_rcdom` tree. Highlighting mutates that tree in place and
//! index paths address its elements. The helpers here are the small set of
//! queries and edits the cell code needs on top of the raw node types.
//!
//! # Example
//! ```ignore
//! use notecell::dom::{inner_html, parse_fragment, text_content};
//!
//! let root = parse_fragment("<p>Hello <em>world</em></p>");
//! assert_eq!(text_content(&root), "Hello world");
//! assert_eq!(inner_html(&root), "<p>Hello <em>world</em></p>");
//! ```

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, Namespace, ParseOpts, QualName};
use log::warn;
use markup5ever_rcdom::{RcDom, SerializableHandle};
use std::cell::RefCell;
use std::rc::Rc;

pub use markup5ever_rcdom::{Handle, Node, NodeData};

/// Tag of the element a parsed fragment hangs under.
pub const FRAGMENT_ROOT_TAG: &str = "html";

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

fn html_name(tag: &str) -> QualName {
    QualName::new(
        None,
        Namespace::from(HTML_NAMESPACE),
        LocalName::from(tag.to_ascii_lowercase()),
    )
}

fn attribute_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name.to_ascii_lowercase()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing / Serialization
// ─────────────────────────────────────────────────────────────────────────────

/// Parse an HTML fragment the way a `<body>` would hold it.
///
/// Returns the fragment root; its children are the parsed nodes.
pub fn parse_fragment(html: &str) -> Handle {
    let dom = html5ever::parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        html_name("body"),
        Vec::new(),
    )
    .one(html);

    // Dropping a node empties its whole subtree, so take the root out first
    let children = std::mem::take(&mut *dom.document.children.borrow_mut());
    let root = children
        .into_iter()
        .find(|node| is_element(node, FRAGMENT_ROOT_TAG))
        .unwrap_or_else(|| create_element(FRAGMENT_ROOT_TAG));
    root.parent.set(None);
    root
}

/// HTML of the children of `node`.
pub fn inner_html(node: &Handle) -> String {
    serialize_node(node, TraversalScope::ChildrenOnly(None))
}

/// HTML of `node` itself, including its tag.
pub fn outer_html(node: &Handle) -> String {
    serialize_node(node, TraversalScope::IncludeNode)
}

fn serialize_node(node: &Handle, traversal_scope: TraversalScope) -> String {
    let mut bytes = Vec::new();
    let handle = SerializableHandle::from(Rc::clone(node));
    let opts = SerializeOpts {
        traversal_scope,
        ..SerializeOpts::default()
    };
    if let Err(e) = serialize(&mut bytes, &handle, opts) {
        warn!("Failed to serialize HTML: {}", e);
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

// ─────────────────────────────────────────────────────────────────────────────
// Construction
// ─────────────────────────────────────────────────────────────────────────────

pub fn create_element(tag: &str) -> Handle {
    Node::new(NodeData::Element {
        name: html_name(tag),
        attrs: RefCell::new(Vec::new()),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// Append `child` as the last child of `parent`.
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Replace the children of `parent`.
pub fn set_children(parent: &Handle, children: Vec<Handle>) {
    for child in &children {
        child.parent.set(Some(Rc::downgrade(parent)));
    }
    *parent.children.borrow_mut() = children;
}

// ─────────────────────────────────────────────────────────────────────────────
// Queries
// ─────────────────────────────────────────────────────────────────────────────

/// Lowercase tag name, `None` for anything but elements.
pub fn tag_name(node: &Node) -> Option<&str> {
    match &node.data {
        NodeData::Element { name, .. } => Some(&*name.local),
        _ => None,
    }
}

pub fn is_element(node: &Node, tag: &str) -> bool {
    tag_name(node) == Some(tag)
}

pub fn text_of(node: &Node) -> Option<String> {
    match &node.data {
        NodeData::Text { contents } => Some(contents.borrow().to_string()),
        _ => None,
    }
}

pub fn attr(node: &Node, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    let attrs = attrs.borrow();
    attrs
        .iter()
        .find(|a| &*a.name.local == name)
        .map(|a| a.value.to_string())
}

pub fn set_attr(node: &Node, name: &str, value: &str) {
    let NodeData::Element { attrs, .. } = &node.data else {
        return;
    };
    let mut attrs = attrs.borrow_mut();
    match attrs.iter_mut().find(|a| &*a.name.local == name) {
        Some(existing) => existing.value = StrTendril::from(value),
        None => attrs.push(Attribute {
            name: attribute_name(name),
            value: StrTendril::from(value),
        }),
    }
}

pub fn remove_attr(node: &Node, name: &str) -> Option<String> {
    let NodeData::Element { attrs, .. } = &node.data else {
        return None;
    };
    let mut attrs = attrs.borrow_mut();
    let index = attrs.iter().position(|a| &*a.name.local == name)?;
    Some(attrs.remove(index).value.to_string())
}

pub fn has_class(node: &Node, class: &str) -> bool {
    attr(node, "class")
        .map(|classes| classes.split_ascii_whitespace().any(|c| c == class))
        .unwrap_or(false)
}

/// Child elements paired with their index among all children.
pub fn indexed_element_children(node: &Node) -> Vec<(usize, Handle)> {
    node.children
        .borrow()
        .iter()
        .enumerate()
        .filter(|(_, child)| tag_name(child).is_some())
        .map(|(i, child)| (i, Rc::clone(child)))
        .collect()
}

/// Child elements, skipping text and comments.
pub fn element_children(node: &Node) -> Vec<Handle> {
    indexed_element_children(node)
        .into_iter()
        .map(|(_, child)| child)
        .collect()
}

pub fn first_element_child(node: &Node) -> Option<Handle> {
    node.children
        .borrow()
        .iter()
        .find(|child| tag_name(child).is_some())
        .cloned()
}

/// Follow a path of child indices down from `node`.
///
/// An empty path addresses `node`; every step must land on an element.
pub fn descendant(node: &Handle, path: &[usize]) -> Option<Handle> {
    let mut current = Rc::clone(node);
    for &index in path {
        let next = current.children.borrow().get(index).cloned()?;
        tag_name(&next)?;
        current = next;
    }
    Some(current)
}

/// Concatenated text of all descendant text nodes.
pub fn text_content(node: &Node) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Node, out: &mut String) {
    for child in node.children.borrow().iter() {
        match &child.data {
            NodeData::Text { contents } => out.push_str(&contents.borrow()),
            NodeData::Element { .. } => collect_text(child, out),
            _ => {}
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Edits
// ─────────────────────────────────────────────────────────────────────────────

/// Merge adjacent text nodes and drop empty ones, recursively.
pub fn normalize(node: &Handle) {
    let children = std::mem::take(&mut *node.children.borrow_mut());
    let mut merged: Vec<Handle> = Vec::with_capacity(children.len());
    for child in children {
        if let NodeData::Text { contents } = &child.data {
            if contents.borrow().is_empty() {
                continue;
            }
            if let Some(NodeData::Text { contents: previous }) = merged.last().map(|n| &n.data) {
                previous.borrow_mut().push_slice(&contents.borrow());
                continue;
            }
        } else {
            normalize(&child);
        }
        merged.push(child);
    }
    *node.children.borrow_mut() = merged;
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
