//! Mapping logical lines onto rendered output
//!
//! The find feature counts lines of a cell's stored source; the rendered
//! output is a tree. Flattening the tree into an ordered list of "leaf"
//! elements gives every line a concrete element: leaf `i` is line `i + 1`.
//!
//! Flattening, applied to each child element of the output root:
//!
//! - a table contributes each of its rows, header row first
//! - list items and paragraphs are leaves
//! - an element with at most one child element is a leaf
//! - any other element is flattened recursively
//!
//! Highlight markers are not counted as children, so highlighting a leaf
//! never changes how the output flattens.

use super::decorations::is_highlight_marker;
use crate::dom::{
    create_element, descendant, indexed_element_children, inner_html, is_element, parse_fragment,
    tag_name, text_content, Handle, Node,
};
use std::fmt;

/// Child-index path from the output root to a leaf.
pub type LeafPath = Vec<usize>;

// ─────────────────────────────────────────────────────────────────────────────
// Node Classification
// ─────────────────────────────────────────────────────────────────────────────

/// How an element takes part in flattening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Expands to its rows
    Table,
    /// Always a leaf
    ListItem,
    /// Always a leaf
    Paragraph,
    /// Injected by highlighting; never counted
    HighlightMarker,
    /// Leaf with at most one child element, flattened otherwise
    Container,
}

pub fn classify(element: &Node) -> NodeKind {
    if is_highlight_marker(element) {
        return NodeKind::HighlightMarker;
    }
    match tag_name(element) {
        Some("table") => NodeKind::Table,
        Some("li") => NodeKind::ListItem,
        Some("p") => NodeKind::Paragraph,
        _ => NodeKind::Container,
    }
}

/// Child elements that count for flattening, with their child indices.
fn counted_children(element: &Node) -> Vec<(usize, Handle)> {
    indexed_element_children(element)
        .into_iter()
        .filter(|(_, child)| classify(child) != NodeKind::HighlightMarker)
        .collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Flattening
// ─────────────────────────────────────────────────────────────────────────────

/// Paths of all leaves below `root`, in document order.
pub fn leaf_paths(root: &Node) -> Vec<LeafPath> {
    let mut leaves = Vec::new();
    let mut path = Vec::new();
    flatten_children(root, &mut path, &mut leaves);
    leaves
}

fn flatten_children(parent: &Node, path: &mut Vec<usize>, leaves: &mut Vec<LeafPath>) {
    for (index, child) in counted_children(parent) {
        path.push(index);
        flatten(&child, path, leaves);
        path.pop();
    }
}

/// Recursion stops at list items, paragraphs and elements with at most one
/// counted child; tables stop at their rows.
fn flatten(element: &Node, path: &mut Vec<usize>, leaves: &mut Vec<LeafPath>) {
    match classify(element) {
        NodeKind::Table => table_rows(element, path, leaves),
        NodeKind::ListItem | NodeKind::Paragraph => leaves.push(path.clone()),
        NodeKind::HighlightMarker => {}
        NodeKind::Container => {
            if counted_children(element).len() > 1 {
                flatten_children(element, path, leaves);
            } else {
                leaves.push(path.clone());
            }
        }
    }
}

/// Header row first, then every body row.
fn table_rows(table: &Node, path: &mut Vec<usize>, leaves: &mut Vec<LeafPath>) {
    for (index, section) in indexed_element_children(table) {
        path.push(index);
        match tag_name(&section) {
            Some("tr") => leaves.push(path.clone()),
            Some("thead" | "tbody" | "tfoot") => {
                for (row_index, row) in indexed_element_children(&section) {
                    if is_element(&row, "tr") {
                        path.push(row_index);
                        leaves.push(path.clone());
                        path.pop();
                    }
                }
            }
            _ => {}
        }
        path.pop();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Render Target
// ─────────────────────────────────────────────────────────────────────────────

/// The output element of a cell view.
///
/// The view is the only writer. Other features query it through the
/// leaf accessors. Leaves are recomputed on every query since the output
/// may have changed in between.
#[derive(Default)]
pub struct RenderTarget {
    root: Option<Handle>,
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderTarget")
            .field("html", &self.root.as_ref().map(inner_html))
            .finish()
    }
}

impl RenderTarget {
    /// A target with no output element attached.
    pub fn detached() -> Self {
        Self::default()
    }

    /// A target with an empty output element.
    pub fn attached() -> Self {
        Self {
            root: Some(create_element(crate::dom::FRAGMENT_ROOT_TAG)),
        }
    }

    pub fn is_attached(&self) -> bool {
        self.root.is_some()
    }

    pub fn attach(&mut self, root: Handle) {
        self.root = Some(root);
    }

    pub fn detach(&mut self) -> Option<Handle> {
        self.root.take()
    }

    /// Replace the output's content; attaches an output element if needed.
    pub fn set_html(&mut self, html: &str) {
        self.root = Some(parse_fragment(html));
    }

    pub fn inner_html(&self) -> String {
        self.root.as_ref().map(inner_html).unwrap_or_default()
    }

    pub fn root(&self) -> Option<&Handle> {
        self.root.as_ref()
    }

    pub fn leaf_paths(&self) -> Vec<LeafPath> {
        self.root.as_deref().map(leaf_paths).unwrap_or_default()
    }

    pub fn leaf_count(&self) -> usize {
        self.leaf_paths().len()
    }

    /// Leaf `index`. The handle shares the output tree, so edits through it
    /// change the output.
    pub fn leaf_at(&self, index: usize) -> Option<Handle> {
        let path = self.leaf_paths().into_iter().nth(index)?;
        descendant(self.root.as_ref()?, &path)
    }

    /// Visible text of leaf `index`.
    pub fn leaf_text(&self, index: usize) -> Option<String> {
        self.leaf_at(index).map(|leaf| text_content(&leaf))
    }

    /// Text of every leaf, in order; empty strings for leaves without text.
    pub fn rendered_text_output(&self) -> Vec<String> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        leaf_paths(root)
            .iter()
            .map(|path| {
                descendant(root, path)
                    .map(|leaf| text_content(&leaf))
                    .unwrap_or_default()
            })
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
