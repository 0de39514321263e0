//! Cell and notebook models
//!
//! These are the host-side models a cell view reads and writes. All state
//! lives behind `Cell`/`RefCell` so a model can be shared (`Rc`) between the
//! notebook, its views and the find feature, and every setter fires its
//! event only after the new value is stored.

use crate::error::{Error, Result};
use crate::events::{Emitter, Subscription};
use crate::find::FindProvider;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// Cell Source
// ─────────────────────────────────────────────────────────────────────────────

/// Cell source text, stored either whole or as line fragments.
///
/// The line form is what Jupyter notebooks store: each fragment keeps its
/// trailing newline. Rendering always works on the joined text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellSource {
    Text(String),
    Lines(Vec<String>),
}

impl Default for CellSource {
    fn default() -> Self {
        CellSource::Text(String::new())
    }
}

impl CellSource {
    /// Split markdown into newline-terminated line fragments.
    pub fn from_markdown(text: &str) -> Self {
        CellSource::Lines(text.split_inclusive('\n').map(str::to_string).collect())
    }

    pub fn joined(&self) -> String {
        match self {
            CellSource::Text(text) => text.clone(),
            CellSource::Lines(lines) => lines.concat(),
        }
    }

    pub fn first_fragment(&self) -> Option<&str> {
        match self {
            CellSource::Text(text) => Some(text.as_str()),
            CellSource::Lines(lines) => lines.first().map(String::as_str),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellSource::Text(text) => text.is_empty(),
            CellSource::Lines(lines) => lines.iter().all(String::is_empty),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cell Model
// ─────────────────────────────────────────────────────────────────────────────

/// One markdown cell.
pub struct CellModel {
    id: String,
    cell_guid: String,
    source: RefCell<CellSource>,
    trusted_mode: Cell<bool>,
    is_edit_mode: Cell<bool>,
    show_preview: Cell<bool>,
    show_markdown: Cell<bool>,
    active: Cell<bool>,
    loaded: Cell<bool>,
    rendered_output_text_content: RefCell<Vec<String>>,

    on_outputs_changed: Emitter<()>,
    on_cell_mode_changed: Emitter<bool>,
    on_preview_mode_changed: Emitter<bool>,
    on_markdown_mode_changed: Emitter<bool>,
}

impl CellModel {
    /// A cell in preview mode, not editing, not trusted.
    pub fn new(id: impl Into<String>, source: CellSource) -> Self {
        let id = id.into();
        Self {
            cell_guid: format!("cell-{}", id),
            id,
            source: RefCell::new(source),
            trusted_mode: Cell::new(false),
            is_edit_mode: Cell::new(false),
            show_preview: Cell::new(true),
            show_markdown: Cell::new(false),
            active: Cell::new(false),
            loaded: Cell::new(false),
            rendered_output_text_content: RefCell::new(Vec::new()),
            on_outputs_changed: Emitter::new(),
            on_cell_mode_changed: Emitter::new(),
            on_preview_mode_changed: Emitter::new(),
            on_markdown_mode_changed: Emitter::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cell_guid(&self) -> &str {
        &self.cell_guid
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Content
    // ─────────────────────────────────────────────────────────────────────────

    pub fn source(&self) -> CellSource {
        self.source.borrow().clone()
    }

    /// Replace the source and notify output listeners.
    pub fn set_source(&self, source: CellSource) {
        *self.source.borrow_mut() = source;
        self.on_outputs_changed.fire(&());
    }

    pub fn trusted_mode(&self) -> bool {
        self.trusted_mode.get()
    }

    /// Change trust; the rendered output depends on it, so output listeners
    /// are notified.
    pub fn set_trusted_mode(&self, trusted: bool) {
        if self.trusted_mode.replace(trusted) != trusted {
            self.on_outputs_changed.fire(&());
        }
    }

    /// Plain-text shadow of the rendered output, one entry per line.
    pub fn rendered_output_text_content(&self) -> Vec<String> {
        self.rendered_output_text_content.borrow().clone()
    }

    pub fn set_rendered_output_text_content(&self, lines: Vec<String>) {
        *self.rendered_output_text_content.borrow_mut() = lines;
    }

    pub fn loaded(&self) -> bool {
        self.loaded.get()
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.set(loaded);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Modes
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_edit_mode(&self) -> bool {
        self.is_edit_mode.get()
    }

    pub fn set_edit_mode(&self, edit: bool) {
        if self.is_edit_mode.replace(edit) != edit {
            self.on_cell_mode_changed.fire(&edit);
        }
    }

    pub fn show_preview(&self) -> bool {
        self.show_preview.get()
    }

    pub fn set_show_preview(&self, show: bool) {
        if self.show_preview.replace(show) != show {
            self.on_preview_mode_changed.fire(&show);
        }
    }

    pub fn show_markdown(&self) -> bool {
        self.show_markdown.get()
    }

    pub fn set_show_markdown(&self, show: bool) {
        if self.show_markdown.replace(show) != show {
            self.on_markdown_mode_changed.fire(&show);
        }
    }

    pub fn active(&self) -> bool {
        self.active.get()
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────────

    pub fn on_outputs_changed(&self, listener: impl Fn(&()) + 'static) -> Subscription {
        self.on_outputs_changed.subscribe(listener)
    }

    pub fn on_cell_mode_changed(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.on_cell_mode_changed.subscribe(listener)
    }

    pub fn on_preview_mode_changed(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.on_preview_mode_changed.subscribe(listener)
    }

    pub fn on_markdown_mode_changed(&self, listener: impl Fn(&bool) + 'static) -> Subscription {
        self.on_markdown_mode_changed.subscribe(listener)
    }
}

impl fmt::Debug for CellModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CellModel")
            .field("id", &self.id)
            .field("source", &self.source.borrow())
            .field("trusted_mode", &self.trusted_mode.get())
            .field("is_edit_mode", &self.is_edit_mode.get())
            .field("show_preview", &self.show_preview.get())
            .field("show_markdown", &self.show_markdown.get())
            .field("active", &self.active.get())
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Notebook Model
// ─────────────────────────────────────────────────────────────────────────────

/// On-disk shape of a Jupyter notebook, reduced to what cells need.
#[derive(Debug, Deserialize)]
struct IpynbDocument {
    #[serde(default)]
    cells: Vec<IpynbCell>,
}

#[derive(Debug, Deserialize)]
struct IpynbCell {
    cell_type: String,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    source: CellSource,
}

/// The notebook that owns a set of markdown cells.
pub struct NotebookModel {
    uri: Option<Url>,
    trusted: Cell<bool>,
    cells: Vec<Rc<CellModel>>,
    active_cell_id: RefCell<Option<String>>,
    find: RefCell<Option<Rc<dyn FindProvider>>>,
}

impl NotebookModel {
    pub fn new(uri: Option<Url>, cells: Vec<Rc<CellModel>>) -> Self {
        Self {
            uri,
            trusted: Cell::new(false),
            cells,
            active_cell_id: RefCell::new(None),
            find: RefCell::new(None),
        }
    }

    /// Load the markdown cells of a Jupyter notebook.
    pub fn from_ipynb(path: &Path) -> Result<Self> {
        debug!("Loading notebook from: {}", path.display());
        let contents = fs::read_to_string(path)?;
        let document: IpynbDocument = serde_json::from_str(&contents)
            .map_err(|e| Error::Notebook(format!("{}: {}", path.display(), e)))?;

        let cells: Vec<Rc<CellModel>> = document
            .cells
            .into_iter()
            .enumerate()
            .filter(|(_, cell)| cell.cell_type == "markdown")
            .map(|(index, cell)| {
                let id = cell.id.unwrap_or_else(|| index.to_string());
                Rc::new(CellModel::new(id, cell.source))
            })
            .collect();

        let absolute = fs::canonicalize(path)?;
        let uri = Url::from_file_path(&absolute).map_err(|()| Error::InvalidUri {
            uri: absolute.display().to_string(),
            source: None,
        })?;

        info!(
            "Loaded {} markdown cells from {}",
            cells.len(),
            path.display()
        );
        Ok(Self::new(Some(uri), cells))
    }

    pub fn uri(&self) -> Option<&Url> {
        self.uri.as_ref()
    }

    /// Folder containing the notebook file, for local notebooks.
    pub fn notebook_folder(&self) -> Option<PathBuf> {
        let path = self.uri.as_ref()?.to_file_path().ok()?;
        path.parent().map(Path::to_path_buf)
    }

    pub fn cells(&self) -> &[Rc<CellModel>] {
        &self.cells
    }

    pub fn cell(&self, id: &str) -> Option<&Rc<CellModel>> {
        self.cells.iter().find(|c| c.id() == id)
    }

    pub fn trusted(&self) -> bool {
        self.trusted.get()
    }

    /// Change trust for the notebook and every cell in it.
    pub fn set_trusted(&self, trusted: bool) {
        self.trusted.set(trusted);
        for cell in &self.cells {
            cell.set_trusted_mode(trusted);
        }
    }

    pub fn active_cell_id(&self) -> Option<String> {
        self.active_cell_id.borrow().clone()
    }

    pub fn set_active_cell_id(&self, id: Option<&str>) {
        *self.active_cell_id.borrow_mut() = id.map(str::to_string);
    }

    /// The search active in this notebook's editor, if any.
    pub fn active_find(&self) -> Option<Rc<dyn FindProvider>> {
        self.find.borrow().clone()
    }

    pub fn set_find_provider(&self, find: Option<Rc<dyn FindProvider>>) {
        *self.find.borrow_mut() = find;
    }
}

impl fmt::Debug for NotebookModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotebookModel")
            .field("uri", &self.uri)
            .field("trusted", &self.trusted.get())
            .field("cells", &self.cells.len())
            .field("active_cell_id", &self.active_cell_id.borrow())
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
