//! HTML to Markdown conversion
//!
//! Turns the HTML of an edited cell back into markdown source with htmd.
//! htmd's options select the markdown flavor. Custom element handlers cover
//! the constructs that must survive an edit → convert → render cycle:
//!
//! - `pre` becomes a fenced code block of the element's raw text
//! - `caption` is kept as raw HTML
//! - `<mark>` and yellow-background spans become `<mark>…</mark>`
//! - `img` and `a` targets become paths relative to the notebook folder
//! - tables become pipe tables, task-list checkboxes become `[x]`/`[ ]`

use super::paths::relative_path_to;
use crate::dom::{
    attr, element_children, inner_html, is_element, outer_html, text_content, Handle, Node,
};
use crate::render::{IMAGE_TARGET_ATTR, LINK_TARGET_ATTR};
use htmd::options::{BulletListMarker, CodeBlockStyle, Options};
use htmd::{Element, HtmlToMarkdown};
use log::warn;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Inline style that marks a span as highlighted text.
pub const HIGHLIGHT_SPAN_STYLE: &str = "background-color: yellow;";

/// Brackets one converted table cell inside its row.
const CELL_MARK: char = '\u{1f}';

// ─────────────────────────────────────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────────────────────────────────────

/// Heading syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeadingStyle {
    /// `# Title`
    #[default]
    Atx,
    /// `Title` underlined with `===` or `---` (levels 1 and 2 only)
    Setext,
}

/// Markdown flavor produced by the converter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConverterOptions {
    pub em_delimiter: &'static str,
    pub strong_delimiter: &'static str,
    /// `-` or `*`
    pub bullet_list_marker: char,
    pub heading_style: HeadingStyle,
    /// Inline tags emitted as raw HTML
    pub keep_tags: Vec<&'static str>,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            em_delimiter: "_",
            strong_delimiter: "**",
            bullet_list_marker: '-',
            heading_style: HeadingStyle::Atx,
            keep_tags: vec!["u", "mark"],
        }
    }
}

impl ConverterOptions {
    fn htmd_options(&self) -> Options {
        Options {
            heading_style: match self.heading_style {
                HeadingStyle::Atx => htmd::options::HeadingStyle::Atx,
                HeadingStyle::Setext => htmd::options::HeadingStyle::Setex,
            },
            bullet_list_marker: match self.bullet_list_marker {
                '*' => BulletListMarker::Asterisk,
                _ => BulletListMarker::Dash,
            },
            code_block_style: CodeBlockStyle::Fenced,
            ..Options::default()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Converter
// ─────────────────────────────────────────────────────────────────────────────

/// Converts rendered or edited cell HTML back into markdown.
pub struct HtmlMarkdownConverter {
    options: ConverterOptions,
    notebook_folder: Option<PathBuf>,
    inner: HtmlToMarkdown,
}

impl HtmlMarkdownConverter {
    /// Create a converter that resolves local targets relative to `notebook_folder`.
    pub fn new(notebook_folder: Option<PathBuf>) -> Self {
        let options = ConverterOptions::default();
        let inner = build(&options, notebook_folder.as_deref());
        Self {
            options,
            notebook_folder,
            inner,
        }
    }

    pub fn with_options(mut self, options: ConverterOptions) -> Self {
        self.inner = build(&options, self.notebook_folder.as_deref());
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    pub fn notebook_folder(&self) -> Option<&Path> {
        self.notebook_folder.as_deref()
    }

    /// Convert an HTML fragment to markdown.
    pub fn convert(&self, html: &str) -> String {
        match self.inner.convert(html) {
            Ok(markdown) => markdown
                .trim_start_matches(['\n', '\r', '\t'])
                .trim_end_matches(is_ascii_space)
                .to_string(),
            Err(e) => {
                warn!("Failed to convert HTML to markdown: {}", e);
                String::new()
            }
        }
    }

    /// Convert the children of `root` to markdown.
    pub fn convert_element(&self, root: &Handle) -> String {
        self.convert(&inner_html(root))
    }
}

impl Default for HtmlMarkdownConverter {
    fn default() -> Self {
        Self::new(None)
    }
}

impl fmt::Debug for HtmlMarkdownConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HtmlMarkdownConverter")
            .field("options", &self.options)
            .field("notebook_folder", &self.notebook_folder)
            .finish_non_exhaustive()
    }
}

/// htmd converter with the cell handlers registered.
fn build(options: &ConverterOptions, notebook_folder: Option<&Path>) -> HtmlToMarkdown {
    let em = options.em_delimiter;
    let strong = options.strong_delimiter;
    let image_folder = notebook_folder.map(Path::to_path_buf);
    let link_folder = image_folder.clone();

    let mut builder = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "head", "template"])
        .options(options.htmd_options());

    for &tag in &options.keep_tags {
        builder = builder.add_handler(vec![tag], move |element: Element| {
            Some(raw_inline(tag, element.content))
        });
    }

    builder
        .add_handler(vec!["pre"], |element: Element| Some(code_block(element.node)))
        .add_handler(vec!["caption"], |element: Element| {
            Some(format!("{}\n", outer_html(element.node)))
        })
        .add_handler(vec!["mark"], |element: Element| {
            Some(raw_inline("mark", element.content))
        })
        .add_handler(vec!["span"], |element: Element| {
            if attr(element.node, "style").as_deref() == Some(HIGHLIGHT_SPAN_STYLE) {
                Some(raw_inline("mark", element.content))
            } else {
                Some(element.content.to_string())
            }
        })
        .add_handler(vec!["em", "i"], move |element: Element| {
            Some(delimited(element.content, em))
        })
        .add_handler(vec!["strong", "b"], move |element: Element| {
            Some(delimited(element.content, strong))
        })
        .add_handler(vec!["del", "s", "strike"], |element: Element| {
            Some(delimited(element.content, "~~"))
        })
        .add_handler(vec!["input"], |element: Element| Some(checkbox(element.node)))
        .add_handler(vec!["th", "td"], |element: Element| Some(table_cell(element.content)))
        .add_handler(vec!["tr"], |element: Element| {
            Some(table_row(element.node, element.content))
        })
        .add_handler(vec!["thead", "tbody", "tfoot"], |element: Element| {
            Some(element.content.to_string())
        })
        .add_handler(vec!["table"], |element: Element| Some(table(element.content)))
        .add_handler(vec!["img"], move |element: Element| {
            Some(image(element.node, image_folder.as_deref()))
        })
        .add_handler(vec!["a"], move |element: Element| {
            Some(link(element.node, element.content, link_folder.as_deref()))
        })
        .build()
}

// ─────────────────────────────────────────────────────────────────────────────
// Block Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Fenced code block of the element's raw text.
fn code_block(pre: &Node) -> String {
    let language = element_children(pre)
        .iter()
        .find(|child| is_element(child, "code"))
        .and_then(|code| attr(code, "class"))
        .and_then(|classes| {
            classes
                .split_ascii_whitespace()
                .find_map(|c| c.strip_prefix("language-"))
                .map(str::to_string)
        })
        .unwrap_or_default();

    let text = text_content(pre);
    let code = text.strip_suffix('\n').unwrap_or(&text);
    let fence = "`".repeat(longest_run(code, '`').max(2) + 1);
    block(&format!("{}{}\n{}\n{}", fence, language, code, fence))
}

fn table_cell(content: &str) -> String {
    let single_line = content
        .split('\n')
        .map(|line| line.trim_matches(is_ascii_space))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    format!("{}{}{}", CELL_MARK, escape_pipes(&single_line), CELL_MARK)
}

/// One pipe-table line; a row of `th` cells is followed by the separator.
fn table_row(row: &Node, content: &str) -> String {
    let cells: Vec<&str> = content.split(CELL_MARK).skip(1).step_by(2).collect();
    let line = format!("| {} |", cells.join(" | "));

    let header_cells: Vec<Handle> = element_children(row)
        .into_iter()
        .filter(|cell| is_element(cell, "th") || is_element(cell, "td"))
        .collect();
    let is_header = !header_cells.is_empty() && header_cells.iter().all(|cell| is_element(cell, "th"));
    if !is_header {
        return format!("\n{}\n", line);
    }

    let separators: Vec<&str> = header_cells.iter().map(|cell| separator_for(cell)).collect();
    format!("\n{}\n| {} |\n", line, separators.join(" | "))
}

/// Collect caption and row lines; the first row becomes the header when no
/// row was one.
fn table(content: &str) -> String {
    let mut caption = Vec::new();
    let mut rows = Vec::new();
    for line in content.lines().map(str::trim) {
        if line.starts_with("<caption") {
            caption.push(line);
        } else if line.starts_with('|') {
            rows.push(line.to_string());
        }
    }

    if !rows.is_empty() && !rows.iter().any(|row| is_separator_row(row)) {
        let columns = rows[0].matches(" | ").count() + 1;
        rows.insert(1, format!("| {} |", vec!["---"; columns].join(" | ")));
    }

    let lines: Vec<String> = caption
        .into_iter()
        .map(str::to_string)
        .chain(rows)
        .collect();
    block(&lines.join("\n"))
}

fn is_separator_row(line: &str) -> bool {
    static SEPARATOR: OnceLock<Option<Regex>> = OnceLock::new();
    SEPARATOR
        .get_or_init(|| Regex::new(r"^\|(\s*:?-{3,}:?\s*\|)+$").ok())
        .as_ref()
        .map(|re| re.is_match(line))
        .unwrap_or(false)
}

fn separator_for(cell: &Node) -> &'static str {
    let align = attr(cell, "align").map(|a| a.to_ascii_lowercase()).or_else(|| {
        attr(cell, "style").and_then(|style| {
            style.split(';').find_map(|decl| {
                let (name, value) = decl.split_once(':')?;
                (name.trim() == "text-align").then(|| value.trim().to_ascii_lowercase())
            })
        })
    });
    match align.as_deref() {
        Some("left") => ":---",
        Some("center") => ":---:",
        Some("right") => "---:",
        _ => "---",
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline Rules
// ─────────────────────────────────────────────────────────────────────────────

/// Wrap `content` in `delimiter`, moving flanking whitespace outside.
fn delimited(content: &str, delimiter: &str) -> String {
    let trimmed = content.trim_matches(is_ascii_space);
    if trimmed.is_empty() {
        return String::new();
    }
    let leading = &content[..content.len() - content.trim_start_matches(is_ascii_space).len()];
    let trailing = &content[content.trim_end_matches(is_ascii_space).len()..];
    format!("{}{}{}{}{}", leading, delimiter, trimmed, delimiter, trailing)
}

fn raw_inline(tag: &str, content: &str) -> String {
    format!("<{}>{}</{}>", tag, content, tag)
}

fn checkbox(input: &Node) -> String {
    let is_checkbox = attr(input, "type")
        .map(|t| t.eq_ignore_ascii_case("checkbox"))
        .unwrap_or(false);
    match (is_checkbox, attr(input, "checked").is_some()) {
        (false, _) => String::new(),
        (true, true) => "[x]".to_string(),
        (true, false) => "[ ]".to_string(),
    }
}

/// The first non-empty attribute of `names`.
fn target_of(element: &Node, names: &[&str]) -> Option<String> {
    names
        .iter()
        .find_map(|name| attr(element, name).filter(|value| !value.is_empty()))
}

/// Optional ` "title"` suffix, skipped when the title only repeats the target.
fn title_suffix(element: &Node, target: &str) -> String {
    match attr(element, "title").filter(|t| !t.is_empty() && t != target) {
        Some(title) => format!(" \"{}\"", title.replace('"', "\\\"")),
        None => String::new(),
    }
}

fn image(img: &Node, notebook_folder: Option<&Path>) -> String {
    // Sanitizing strips non-web sources; the renderer keeps them in IMAGE_TARGET_ATTR
    let Some(src) = target_of(img, &["src", IMAGE_TARGET_ATTR]) else {
        return String::new();
    };
    let alt = escape_link_text(&attr(img, "alt").unwrap_or_default());
    let target = relative_path_to(notebook_folder, &src).unwrap_or_else(|| src.clone());
    format!("![{}]({}{})", alt, target, title_suffix(img, &src))
}

fn link(anchor: &Node, content: &str, notebook_folder: Option<&Path>) -> String {
    // Sanitizing strips non-web hrefs; the renderer keeps them in LINK_TARGET_ATTR
    let Some(href) = target_of(anchor, &["href", LINK_TARGET_ATTR, "title"]) else {
        return content.to_string();
    };
    let target = relative_path_to(notebook_folder, &href).unwrap_or_else(|| href.clone());
    let text = collapse_whitespace(&text_content(anchor));
    let text = escape_link_text(text.trim_matches(is_ascii_space));
    format!("[{}]({}{})", text, target, title_suffix(anchor, &href))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn is_ascii_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r' | '\x0c')
}

fn block(content: &str) -> String {
    format!("\n\n{}\n\n", content)
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if is_ascii_space(c) {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

fn longest_run(text: &str, ch: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for c in text.chars() {
        if c == ch {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Escape what would end or nest the `[...]` of a link or image.
fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '[' | ']') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn escape_pipes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut escaped = false;
    for c in text.chars() {
        if c == '|' && !escaped {
            out.push('\\');
        }
        escaped = c == '\\' && !escaped;
        out.push(c);
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
