//! HTML to Markdown conversion for edited cells
//!
//! - `downconvert`: the converter and its rule set
//! - `paths`: rewriting local link and image targets relative to the notebook

mod downconvert;
mod paths;

pub use downconvert::{ConverterOptions, HeadingStyle, HtmlMarkdownConverter, HIGHLIGHT_SPAN_STYLE};
pub use paths::relative_path_to;
