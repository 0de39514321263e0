//! Markdown cell component
//!
//! - `model`: cell and notebook models the view reads and writes
//! - `range_mapper`: flattening rendered output into line-sized leaves
//! - `decorations`: find-match highlighting on those leaves
//! - `keyboard`: editing shortcuts
//! - `view`: the controller tying rendering, editing and highlighting together

pub mod decorations;
pub mod keyboard;
pub mod model;
pub mod range_mapper;
pub mod view;

pub use decorations::{DecorationRange, ScrollRequest, FIND_HIGHLIGHT_CLASS};
pub use keyboard::{Key, KeyChord, KeyOutcome, Platform, RichTextCommand};
pub use model::{CellModel, CellSource, NotebookModel};
pub use range_mapper::{NodeKind, RenderTarget};
pub use view::{CellServices, MarkdownCellView, SourceEditor, ViewState};
