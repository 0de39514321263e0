//! notecell - rich-text markdown cells for notebook documents
//!
//! Renders a cell's markdown into sanitized HTML, lets the rendered output
//! be edited as rich text and converts those edits back into markdown, and
//! highlights find matches inside the rendered output.
//!
//! - [`cell`]: the cell view controller and its models
//! - [`render`]: markdown rendering and sanitizing
//! - [`convert`]: HTML to markdown conversion
//! - [`dom`]: helpers over the html5ever tree everything operates on
//! - [`find`]: the find feature contract
//! - [`config`], [`theme`], [`events`], [`error`]: ambient services

pub mod cell;
pub mod config;
pub mod convert;
pub mod dom;
pub mod error;
pub mod events;
pub mod find;
pub mod render;
pub mod theme;
