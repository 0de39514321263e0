//! Find-match highlighting in rendered output
//!
//! A decoration range names the line(s) the find feature is pointing at.
//! Adding a decoration wraps the matches of the active search inside that
//! line's leaf element in highlight markers; removing it unwraps every
//! marker in the leaf again.

use super::range_mapper::RenderTarget;
use crate::dom::{
    append_child, create_element, create_text, has_class, is_element, normalize, set_attr,
    set_children, text_of, Handle, Node,
};
use crate::find::FindProvider;
use log::{debug, trace};

/// Class carried by highlight markers.
pub const FIND_HIGHLIGHT_CLASS: &str = "rangeSpecificHighlight";

/// A 1-based, inclusive range of display lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecorationRange {
    pub start_line: usize,
    pub end_line: usize,
}

impl DecorationRange {
    pub fn new(start_line: usize, end_line: usize) -> Self {
        Self {
            start_line,
            end_line,
        }
    }

    /// Index of the leaf the range starts at.
    fn leaf_index(&self) -> Option<usize> {
        self.start_line.checked_sub(1)
    }
}

/// Request for the host to bring a leaf into view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollRequest {
    pub leaf_index: usize,
    pub smooth: bool,
}

pub fn is_highlight_marker(element: &Node) -> bool {
    is_element(element, "span") && has_class(element, FIND_HIGHLIGHT_CLASS)
}

// ─────────────────────────────────────────────────────────────────────────────
// Apply / Add / Remove
// ─────────────────────────────────────────────────────────────────────────────

/// Remove the highlight of `old`, then add the highlight of `new`.
pub fn apply_decoration(
    target: &mut RenderTarget,
    old: Option<&DecorationRange>,
    new: Option<&DecorationRange>,
    find: Option<&dyn FindProvider>,
) -> Option<ScrollRequest> {
    if old.is_some() {
        remove_decoration(target, old);
    }
    if new.is_some() {
        return add_decoration(target, new, find);
    }
    None
}

/// Highlight the active search's matches in the leaf at `range.start_line`.
///
/// Does nothing when there is no range, no output, the line is past the
/// last leaf, or the search currently has no matches.
pub fn add_decoration(
    target: &mut RenderTarget,
    range: Option<&DecorationRange>,
    find: Option<&dyn FindProvider>,
) -> Option<ScrollRequest> {
    let range = range?;
    if !target.is_attached() {
        debug!("No output element, skipping highlight");
        return None;
    }
    let index = range.leaf_index()?;
    if index >= target.leaf_count() {
        debug!(
            "Highlight line {} is past the last of {} lines",
            range.start_line,
            target.leaf_count()
        );
        return None;
    }

    let find = find?;
    if find.find_matches() == 0 {
        return None;
    }
    let expression = find.find_expression()?;

    let leaf = target.leaf_at(index)?;
    let marked = mark_matches(&leaf, find);
    trace!(
        "Highlighted {} occurrence(s) of '{}' on line {}",
        marked,
        expression,
        range.start_line
    );

    Some(ScrollRequest {
        leaf_index: index,
        smooth: true,
    })
}

/// Strip all highlight markers from the leaf at `range.start_line`.
///
/// Returns whether a leaf was found. Out-of-range lines are ignored.
pub fn remove_decoration(target: &mut RenderTarget, range: Option<&DecorationRange>) -> bool {
    let Some(range) = range else {
        return false;
    };
    if !target.is_attached() {
        return false;
    }
    let Some(leaf) = range.leaf_index().and_then(|i| target.leaf_at(i)) else {
        debug!("No line {} to remove highlights from", range.start_line);
        return false;
    };
    let removed = unwrap_highlights(&leaf);
    trace!("Removed {} highlight marker(s) from line {}", removed, range.start_line);
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Marking
// ─────────────────────────────────────────────────────────────────────────────

/// Wrap every match inside the text nodes below `element`. Returns the number
/// of markers inserted.
fn mark_matches(element: &Handle, find: &dyn FindProvider) -> usize {
    if is_highlight_marker(element) {
        return 0;
    }

    let mut marked = 0;
    let old_children = std::mem::take(&mut *element.children.borrow_mut());
    let mut children = Vec::with_capacity(old_children.len());
    for child in old_children {
        let Some(text) = text_of(&child) else {
            marked += mark_matches(&child, find);
            children.push(child);
            continue;
        };
        let ranges = find.match_ranges(&text);
        if ranges.is_empty() {
            children.push(child);
            continue;
        }
        let mut last = 0;
        for (start, end) in ranges {
            if start < last || end > text.len() {
                continue;
            }
            if start > last {
                children.push(create_text(&text[last..start]));
            }
            children.push(highlight_marker(&text[start..end]));
            marked += 1;
            last = end;
        }
        if last < text.len() {
            children.push(create_text(&text[last..]));
        }
    }
    set_children(element, children);
    marked
}

fn highlight_marker(text: &str) -> Handle {
    let marker = create_element("span");
    set_attr(&marker, "class", FIND_HIGHLIGHT_CLASS);
    append_child(&marker, create_text(text));
    marker
}

/// Replace every highlight marker below `element` with its children.
/// Returns the number of markers removed.
pub fn unwrap_highlights(element: &Handle) -> usize {
    let mut removed = 0;
    let old_children = std::mem::take(&mut *element.children.borrow_mut());
    let mut children = Vec::with_capacity(old_children.len());
    for child in old_children {
        if text_of(&child).is_some() {
            children.push(child);
            continue;
        }
        removed += unwrap_highlights(&child);
        if is_highlight_marker(&child) {
            removed += 1;
            // Move the content out before the marker drops
            children.extend(std::mem::take(&mut *child.children.borrow_mut()));
        } else {
            children.push(child);
        }
    }
    set_children(element, children);
    if removed > 0 {
        normalize(element);
    }
    removed
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
