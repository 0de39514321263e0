//! Find support for rendered cells
//!
//! Highlighting is a pure consumer of whatever search is active in the
//! notebook: it asks a [`FindProvider`] how many matches there are, which
//! expression is being searched, and where that expression matches inside
//! a piece of text. [`FindState`] is the provider used by default.

use crate::cell::DecorationRange;
use log::debug;
use regex::Regex;
use std::cell::RefCell;

// ─────────────────────────────────────────────────────────────────────────────
// Provider Contract
// ─────────────────────────────────────────────────────────────────────────────

/// The active search of a notebook, as seen by a cell view.
pub trait FindProvider {
    /// Number of matches of the current search.
    fn find_matches(&self) -> usize;

    /// The expression being searched for, if any.
    fn find_expression(&self) -> Option<String>;

    /// Byte ranges in `text` matched by the current expression.
    fn match_ranges(&self, text: &str) -> Vec<(usize, usize)>;
}

impl<T: FindProvider> FindProvider for RefCell<T> {
    fn find_matches(&self) -> usize {
        self.borrow().find_matches()
    }

    fn find_expression(&self) -> Option<String> {
        self.borrow().find_expression()
    }

    fn match_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        self.borrow().match_ranges(text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Query
// ─────────────────────────────────────────────────────────────────────────────

/// What to search for and how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FindQuery {
    pub term: String,
    pub case_sensitive: bool,
    pub whole_word: bool,
    /// `term` is a regular expression rather than literal text
    pub use_regex: bool,
}

impl FindQuery {
    /// Case-insensitive search for the literal `term`.
    pub fn literal(term: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            ..Self::default()
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self {
            use_regex: true,
            ..Self::literal(pattern)
        }
    }

    pub fn case_sensitive(mut self, yes: bool) -> Self {
        self.case_sensitive = yes;
        self
    }

    pub fn whole_word(mut self, yes: bool) -> Self {
        self.whole_word = yes;
        self
    }

    /// The regex this query runs as; `None` for an empty or invalid term.
    fn compile(&self) -> Option<Regex> {
        if self.term.is_empty() {
            return None;
        }
        let body = if self.use_regex {
            self.term.clone()
        } else {
            regex::escape(&self.term)
        };
        let body = if self.whole_word {
            format!(r"\b(?:{})\b", body)
        } else {
            body
        };
        let flags = if self.case_sensitive { "" } else { "(?i)" };

        Regex::new(&format!("{}{}", flags, body))
            .map_err(|e| debug!("Search pattern '{}' does not compile: {}", self.term, e))
            .ok()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Find State
// ─────────────────────────────────────────────────────────────────────────────

/// A query, its compiled pattern and the matches of the last search.
#[derive(Debug, Clone, Default)]
pub struct FindState {
    query: FindQuery,
    pattern: Option<Regex>,
    matches: Vec<(usize, usize)>,
    current: Option<usize>,
}

impl FindState {
    pub fn new(query: FindQuery) -> Self {
        let pattern = query.compile();
        Self {
            query,
            pattern,
            ..Self::default()
        }
    }

    /// Literal, case-insensitive search for `term`.
    pub fn with_term(term: impl Into<String>) -> Self {
        Self::new(FindQuery::literal(term))
    }

    pub fn query(&self) -> &FindQuery {
        &self.query
    }

    /// Replace the query. Previous matches no longer apply and are dropped.
    pub fn set_query(&mut self, query: FindQuery) {
        if query != self.query {
            self.pattern = query.compile();
            self.query = query;
            self.clear();
        }
    }

    /// Search `text`, keeping the cursor on the same match index when it still exists.
    ///
    /// Returns the number of matches.
    pub fn find_matches_in(&mut self, text: &str) -> usize {
        self.matches = self.ranges_in(text);
        self.current = match self.current {
            _ if self.matches.is_empty() => None,
            Some(i) if i < self.matches.len() => Some(i),
            _ => Some(0),
        };
        self.matches.len()
    }

    /// Match ranges of the query in `text`, without touching the stored matches.
    pub fn ranges_in(&self, text: &str) -> Vec<(usize, usize)> {
        match &self.pattern {
            Some(re) => re
                .find_iter(text)
                .filter(|m| !m.is_empty())
                .map(|m| (m.start(), m.end()))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn matches(&self) -> &[(usize, usize)] {
        &self.matches
    }

    /// Index of the match the cursor is on.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Byte range of the match the cursor is on.
    pub fn current_match(&self) -> Option<(usize, usize)> {
        self.current.and_then(|i| self.matches.get(i).copied())
    }

    /// Advance the cursor, wrapping after the last match.
    pub fn next_match(&mut self) -> Option<(usize, usize)> {
        let count = self.matches.len();
        self.current = self.current.filter(|_| count > 0).map(|i| (i + 1) % count);
        self.current_match()
    }

    /// Step the cursor back, wrapping before the first match.
    pub fn prev_match(&mut self) -> Option<(usize, usize)> {
        let count = self.matches.len();
        self.current = self
            .current
            .filter(|_| count > 0)
            .map(|i| (i + count - 1) % count);
        self.current_match()
    }

    pub fn clear(&mut self) {
        self.matches.clear();
        self.current = None;
    }
}

impl FindProvider for FindState {
    fn find_matches(&self) -> usize {
        self.matches.len()
    }

    fn find_expression(&self) -> Option<String> {
        self.pattern.as_ref().map(|_| self.query.term.clone())
    }

    fn match_ranges(&self, text: &str) -> Vec<(usize, usize)> {
        self.ranges_in(text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Mapping
// ─────────────────────────────────────────────────────────────────────────────

/// Map a match in the newline-joined `lines` to the 1-based lines it covers.
///
/// `lines` is a cell's rendered text output, one entry per leaf. Returns
/// `None` when the match lies outside the text.
pub fn decoration_range_for(lines: &[String], (start, end): (usize, usize)) -> Option<DecorationRange> {
    let mut offset = 0;
    let mut start_line = None;
    for (i, line) in lines.iter().enumerate() {
        let line_end = offset + line.len();
        if start_line.is_none() && start < line_end.max(offset + 1) {
            start_line = Some(i + 1);
        }
        if let Some(first) = start_line {
            if end <= line_end {
                return Some(DecorationRange::new(first, i + 1));
            }
        }
        // +1 for the joining newline
        offset = line_end + 1;
    }
    start_line.map(|first| DecorationRange::new(first, lines.len()))
}
