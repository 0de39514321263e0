//! Render collaborators for markdown cells
//!
//! A cell turns its source into displayed HTML in two steps: a
//! [`MarkdownRenderer`] produces an HTML tree, and when the notebook is not
//! trusted a [`Sanitizer`] strips anything unsafe from its serialization.
//! Both are traits so hosts can plug in their own engines; the defaults are
//! [`ComrakRenderer`] and [`AmmoniaSanitizer`].

mod markdown;
mod sanitize;

pub use markdown::ComrakRenderer;
pub use sanitize::AmmoniaSanitizer;

use crate::dom::{inner_html, Handle};
use log::trace;
use std::fmt;
use url::Url;

/// Attribute on `a` keeping a target that is not a web link.
///
/// Sanitizing strips such `href`s; this attribute survives it so the link
/// can be converted back to markdown.
pub const LINK_TARGET_ATTR: &str = "data-href";

/// Attribute on `img` keeping a source that is not a web link.
pub const IMAGE_TARGET_ATTR: &str = "data-src";

// ─────────────────────────────────────────────────────────────────────────────
// Input / Output
// ─────────────────────────────────────────────────────────────────────────────

/// Markdown text handed to a renderer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MarkdownString {
    /// Raw HTML in the source may be passed through
    pub is_trusted: bool,
    pub value: String,
}

impl MarkdownString {
    pub fn new(value: impl Into<String>, is_trusted: bool) -> Self {
        Self {
            is_trusted,
            value: value.into(),
        }
    }

    pub fn trusted(value: impl Into<String>) -> Self {
        Self::new(value, true)
    }
}

/// Owned result of one render: the root element of the rendered fragment.
///
/// A result is created fresh for every render and must be disposed (or
/// dropped) when it is replaced.
pub struct RenderResult {
    element: Handle,
}

impl RenderResult {
    pub fn new(element: Handle) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Handle {
        &self.element
    }

    pub fn into_element(self) -> Handle {
        self.element
    }

    pub fn html(&self) -> String {
        inner_html(&self.element)
    }

    /// Release the rendered tree.
    pub fn dispose(self) {
        trace!(
            "Disposing render result with {} top-level nodes",
            self.element.children.borrow().len()
        );
    }
}

impl fmt::Debug for RenderResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderResult")
            .field("html", &self.html())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Traits
// ─────────────────────────────────────────────────────────────────────────────

/// Converts markdown into an HTML tree.
pub trait MarkdownRenderer {
    /// Location relative references in rendered links and images resolve against.
    fn set_base_location(&mut self, uri: Option<Url>);

    fn render(&self, content: &MarkdownString) -> RenderResult;
}

/// Removes unsafe markup from an HTML fragment.
pub trait Sanitizer {
    fn sanitize(&self, html: &str) -> String;
}
