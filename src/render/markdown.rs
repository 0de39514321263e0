//! Markdown rendering with comrak
//!
//! Renders GitHub-flavored markdown, then rewrites link and image targets:
//! relative references resolve against the base location, and targets that
//! do not point at the web are also kept in [`LINK_TARGET_ATTR`] or
//! [`IMAGE_TARGET_ATTR`] so they survive sanitizers that strip non-web
//! URLs. Links without a title also get the target as their tooltip.

use super::{MarkdownRenderer, MarkdownString, RenderResult, IMAGE_TARGET_ATTR, LINK_TARGET_ATTR};
use crate::dom::{attr, element_children, parse_fragment, set_attr, tag_name, Handle};
use comrak::{markdown_to_html, Options};
use log::debug;
use url::Url;

/// URL schemes that count as web links.
const WEB_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Default [`MarkdownRenderer`] backed by comrak.
#[derive(Debug, Clone, Default)]
pub struct ComrakRenderer {
    base_location: Option<Url>,
}

impl ComrakRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_location(&self) -> Option<&Url> {
        self.base_location.as_ref()
    }

    fn comrak_options(is_trusted: bool) -> Options {
        let mut options = Options::default();

        // GitHub Flavored Markdown extensions
        options.extension.strikethrough = true;
        options.extension.table = true;
        options.extension.autolink = true;
        options.extension.tasklist = true;

        // Untrusted content gets raw HTML replaced by a comment
        options.render.unsafe_ = is_trusted;
        options
    }

    /// Resolve and annotate `href`/`src` attributes throughout the tree.
    fn rewrite_targets(&self, element: &Handle) {
        let names = match tag_name(element) {
            Some("a") => Some(("href", LINK_TARGET_ATTR)),
            Some("img") => Some(("src", IMAGE_TARGET_ATTR)),
            _ => None,
        };

        if let Some((attr_name, kept_name)) = names {
            if let Some(target) = attr(element, attr_name) {
                let resolved = self.resolve(&target);
                if resolved != target {
                    set_attr(element, attr_name, &resolved);
                }
                if !is_web_link(&resolved) {
                    set_attr(element, kept_name, &resolved);
                    if attr_name == "href" && attr(element, "title").is_none() {
                        set_attr(element, "title", &resolved);
                    }
                }
            }
        }

        for child in element_children(element) {
            self.rewrite_targets(&child);
        }
    }

    /// Resolve a relative reference against the base location.
    ///
    /// Fragment-only references, absolute URLs and everything when no base
    /// is set are returned unchanged.
    fn resolve(&self, target: &str) -> String {
        let Some(base) = &self.base_location else {
            return target.to_string();
        };
        if target.is_empty() || target.starts_with('#') || Url::parse(target).is_ok() {
            return target.to_string();
        }
        match base.join(target) {
            Ok(url) => url.to_string(),
            Err(e) => {
                debug!("Could not resolve '{}' against {}: {}", target, base, e);
                target.to_string()
            }
        }
    }
}

impl MarkdownRenderer for ComrakRenderer {
    fn set_base_location(&mut self, uri: Option<Url>) {
        self.base_location = uri;
    }

    fn render(&self, content: &MarkdownString) -> RenderResult {
        let options = Self::comrak_options(content.is_trusted);
        let html = markdown_to_html(&content.value, &options);
        let root = parse_fragment(&html);
        self.rewrite_targets(&root);
        RenderResult::new(root)
    }
}

fn is_web_link(target: &str) -> bool {
    match Url::parse(target) {
        Ok(url) => WEB_SCHEMES.contains(&url.scheme()),
        // Relative or fragment-only references stay within the document
        Err(_) => true,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
