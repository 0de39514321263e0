//! HTML sanitization with ammonia

use super::{Sanitizer, IMAGE_TARGET_ATTR, LINK_TARGET_ATTR};
use ammonia::Builder;

/// Default [`Sanitizer`] backed by ammonia.
///
/// Uses ammonia's allow-list plus the attributes rendered cells rely on:
/// `style` on `span` (highlight spans), alignment on table cells, the
/// language class on `code`, task-list checkboxes and the attributes
/// keeping non-web link and image targets. Links get no forced `rel`.
pub struct AmmoniaSanitizer {
    builder: Builder<'static>,
}

impl AmmoniaSanitizer {
    pub fn new() -> Self {
        let mut builder = Builder::default();
        builder
            .add_tags(&["input"])
            .add_tag_attributes("input", &["type", "checked", "disabled"])
            .add_tag_attributes("span", &["style"])
            .add_tag_attributes("code", &["class"])
            .add_tag_attributes("th", &["align"])
            .add_tag_attributes("td", &["align"])
            .add_tag_attributes("a", &[LINK_TARGET_ATTR])
            .add_tag_attributes("img", &[IMAGE_TARGET_ATTR])
            .link_rel(None);
        Self { builder }
    }
}

impl Default for AmmoniaSanitizer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AmmoniaSanitizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AmmoniaSanitizer").finish_non_exhaustive()
    }
}

impl Sanitizer for AmmoniaSanitizer {
    fn sanitize(&self, html: &str) -> String {
        self.builder.clean(html).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_script() {
        let clean = AmmoniaSanitizer::new().sanitize("<p>hi</p><script>alert(1)</script>");
        assert_eq!(clean, "<p>hi</p>");
    }

    #[test]
    fn test_keeps_highlight_span_style() {
        let html = r#"<span style="background-color: yellow;">x</span>"#;
        assert_eq!(AmmoniaSanitizer::new().sanitize(html), html);
    }

    #[test]
    fn test_strips_file_links_but_keeps_title() {
        let clean = AmmoniaSanitizer::new()
            .sanitize(r#"<a href="file:///docs/a.md" title="file:///docs/a.md">a</a>"#);
        assert!(!clean.contains("href"));
        assert!(clean.contains(r#"title="file:///docs/a.md""#));
    }

    #[test]
    fn test_strips_file_sources_but_keeps_kept_targets() {
        let clean = AmmoniaSanitizer::new().sanitize(
            r#"<a href="file:///docs/a.md" title="tip" data-href="file:///docs/a.md">a</a><img src="file:///docs/p.png" data-src="file:///docs/p.png" alt="p">"#,
        );
        assert!(!clean.contains(" href="));
        assert!(!clean.contains(" src="));
        assert!(clean.contains(r#"data-href="file:///docs/a.md""#));
        assert!(clean.contains(r#"data-src="file:///docs/p.png""#));
        assert!(clean.contains(r#"title="tip""#));
    }

    #[test]
    fn test_web_links_have_no_rel() {
        let clean = AmmoniaSanitizer::new().sanitize(r#"<a href="https://example.com">e</a>"#);
        assert_eq!(clean, r#"<a href="https://example.com">e</a>"#);
    }
}
