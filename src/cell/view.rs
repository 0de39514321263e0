//! Markdown cell view controller
//!
//! Drives one markdown cell: renders its source into the output element,
//! switches between preview, markdown source and rich-text editing,
//! converts rich-text edits back into markdown, and applies find
//! highlights.
//!
//! The view is shared as `Rc<RefCell<MarkdownCellView>>`. Model, theme and
//! configuration events reach it through weak handles; an event the view
//! causes itself (while it is borrowed) is skipped, since the view already
//! acted on it.

use super::decorations::{self, unwrap_highlights, DecorationRange, ScrollRequest};
use super::keyboard::{translate, KeyAction, KeyChord, KeyOutcome, Platform};
use super::model::{CellModel, CellSource, NotebookModel};
use super::range_mapper::RenderTarget;
use crate::config::{
    ConfigurationChangeEvent, ConfigurationService, ENABLE_DOUBLE_CLICK_EDIT,
    ENABLE_PREVIEW_FEATURES,
};
use crate::convert::HtmlMarkdownConverter;
use crate::dom::parse_fragment;
use crate::events::{DisposableStore, Emitter, Subscription};
use crate::render::{
    AmmoniaSanitizer, ComrakRenderer, MarkdownRenderer, MarkdownString, RenderResult, Sanitizer,
};
use crate::theme::{ThemeColors, ThemeService};
use log::{debug, trace};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use url::Url;

// ─────────────────────────────────────────────────────────────────────────────
// Constants
// ─────────────────────────────────────────────────────────────────────────────

/// Shown for an empty cell when double-click editing is enabled.
pub const DOUBLE_CLICK_PLACEHOLDER: &str = "<i>Double-click to edit</i>";

/// Shown for an empty cell when double-click editing is disabled.
pub const ADD_CONTENT_PLACEHOLDER: &str = "<i>Add content here...</i>";

/// Rendered instead of a source whose first fragment is empty, so the
/// output keeps a line to click into.
pub const EMPTY_PARAGRAPH: &str = "<p>&nbsp;</p>";

// ─────────────────────────────────────────────────────────────────────────────
// Services
// ─────────────────────────────────────────────────────────────────────────────

/// Collaborators a cell view depends on.
#[derive(Clone)]
pub struct CellServices {
    pub renderer: Rc<RefCell<dyn MarkdownRenderer>>,
    pub sanitizer: Rc<dyn Sanitizer>,
    pub config: Rc<ConfigurationService>,
    pub theme: Rc<ThemeService>,
    pub platform: Platform,
}

impl CellServices {
    /// comrak rendering and ammonia sanitizing on the current platform.
    pub fn new(config: Rc<ConfigurationService>, theme: Rc<ThemeService>) -> Self {
        Self {
            renderer: Rc::new(RefCell::new(ComrakRenderer::new())),
            sanitizer: Rc::new(AmmoniaSanitizer::new()),
            config,
            theme,
            platform: Platform::current(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// View State
// ─────────────────────────────────────────────────────────────────────────────

/// Non-persisted state of a view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    /// Rendered HTML is shown
    pub preview_mode: bool,
    /// Markdown source is shown
    pub markdown_mode: bool,
    pub is_edit_mode: bool,
    /// Joined source of the last render
    last_rendered: Option<String>,
    /// Trust flag of the last render
    last_trusted: Option<bool>,
}

/// Source editor shown for a cell in markdown mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEditor {
    pub cell_id: String,
    pub text: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Markdown Cell View
// ─────────────────────────────────────────────────────────────────────────────

pub struct MarkdownCellView {
    cell: Rc<CellModel>,
    notebook: Rc<NotebookModel>,
    services: CellServices,
    state: ViewState,
    output: RenderTarget,
    markdown_result: Option<RenderResult>,
    editors: Vec<SourceEditor>,
    border_top_color: String,
    output_focused: bool,
    render_count: usize,
    on_link_click: Emitter<String>,
    subscriptions: DisposableStore,
}

impl MarkdownCellView {
    fn new(cell: Rc<CellModel>, notebook: Rc<NotebookModel>, services: CellServices) -> Self {
        let state = ViewState {
            preview_mode: cell.show_preview(),
            markdown_mode: cell.show_markdown(),
            is_edit_mode: cell.is_edit_mode(),
            ..ViewState::default()
        };
        let border_top_color = services.theme.colors().sidebar_background.to_css();
        Self {
            cell,
            notebook,
            services,
            state,
            output: RenderTarget::attached(),
            markdown_result: None,
            editors: Vec::new(),
            border_top_color,
            output_focused: false,
            render_count: 0,
            on_link_click: Emitter::new(),
            subscriptions: DisposableStore::new(),
        }
    }

    /// Create a view, subscribe it to its collaborators and render it.
    pub fn create(
        cell: Rc<CellModel>,
        notebook: Rc<NotebookModel>,
        services: CellServices,
    ) -> Rc<RefCell<Self>> {
        let view = Rc::new(RefCell::new(Self::new(cell, notebook, services)));
        Self::init(&view);
        view
    }

    fn init(this: &Rc<RefCell<Self>>) {
        let weak = Rc::downgrade(this);
        let (cell, theme, config) = {
            let view = this.borrow();
            (
                Rc::clone(&view.cell),
                Rc::clone(&view.services.theme),
                Rc::clone(&view.services.config),
            )
        };

        let subscriptions = [
            cell.on_outputs_changed(with_view(&weak, |view, _: &()| {
                view.refresh_preview();
            })),
            cell.on_cell_mode_changed(with_view(&weak, |view, edit: &bool| {
                view.toggle_edit_mode(Some(*edit));
            })),
            cell.on_preview_mode_changed(with_view(&weak, |view, preview: &bool| {
                view.set_preview_mode(*preview);
            })),
            cell.on_markdown_mode_changed(with_view(&weak, |view, markdown: &bool| {
                view.set_markdown_mode(*markdown);
            })),
            theme.on_did_change_theme(with_view(&weak, |view, colors: &ThemeColors| {
                view.update_theme(colors);
            })),
            config.on_did_change_configuration(with_view(&weak, |view, event: &ConfigurationChangeEvent| {
                if event.affects_configuration(ENABLE_DOUBLE_CLICK_EDIT)
                    || event.affects_configuration(ENABLE_PREVIEW_FEATURES)
                {
                    view.refresh_preview();
                }
            })),
        ];

        let mut view = this.borrow_mut();
        for subscription in subscriptions {
            view.subscriptions.add(subscription);
        }
        view.sync_editors();
        view.refresh_preview();
        debug!("Initialized view for cell {}", view.cell.id());
    }

    /// Release subscriptions and the current render result.
    pub fn dispose(&mut self) {
        self.subscriptions.dispose();
        if let Some(result) = self.markdown_result.take() {
            result.dispose();
        }
        debug!("Disposed view for cell {}", self.cell.id());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Rendering
    // ─────────────────────────────────────────────────────────────────────────

    /// Re-render the cell if trust or content changed, or it is in preview.
    ///
    /// Returns whether a render happened.
    pub fn refresh_preview(&mut self) -> bool {
        let trusted = self.cell.trusted_mode();
        let source = self.cell.source();
        let joined = source.joined();

        let trust_changed = self.state.last_trusted != Some(trusted);
        let content_changed = self.state.last_rendered.as_deref() != Some(joined.as_str());
        if !trust_changed && !content_changed && !self.state.preview_mode {
            trace!("Cell {} unchanged, render skipped", self.cell.id());
            return false;
        }

        let content = if joined.is_empty() && !self.state.is_edit_mode {
            self.placeholder().to_string()
        } else if source.first_fragment() == Some("") {
            EMPTY_PARAGRAPH.to_string()
        } else {
            joined.clone()
        };

        // Renderer trust is always granted; the sanitizer enforces the boundary
        let result = {
            let mut renderer = self.services.renderer.borrow_mut();
            renderer.set_base_location(self.notebook.uri().cloned());
            renderer.render(&MarkdownString::trusted(content))
        };
        let mut html = result.html();
        if !trusted {
            html = self.services.sanitizer.sanitize(&html);
        }
        if let Some(previous) = self.markdown_result.replace(result) {
            previous.dispose();
        }

        if self.state.preview_mode {
            self.output.set_html(&html);
            self.cell
                .set_rendered_output_text_content(self.output.rendered_text_output());
            self.output_focused = true;
        }

        self.state.last_trusted = Some(trusted);
        self.state.last_rendered = Some(joined);
        self.render_count += 1;
        self.cell.set_loaded(true);
        debug!("Rendered cell {} (trusted: {})", self.cell.id(), trusted);
        true
    }

    fn placeholder(&self) -> &'static str {
        if self.services.config.get_bool(ENABLE_DOUBLE_CLICK_EDIT) {
            DOUBLE_CLICK_PLACEHOLDER
        } else {
            ADD_CONTENT_PLACEHOLDER
        }
    }

    fn update_theme(&mut self, colors: &ThemeColors) {
        self.border_top_color = colors.sidebar_background.to_css();
        trace!("Cell {} border color: {}", self.cell.id(), self.border_top_color);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Modes
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter or leave edit mode; `None` toggles.
    ///
    /// Leaving edit mode always returns to the rendered preview.
    pub fn toggle_edit_mode(&mut self, edit_mode: Option<bool>) {
        let edit = edit_mode.unwrap_or(!self.state.is_edit_mode);
        self.state.is_edit_mode = edit;
        self.cell.set_edit_mode(edit);

        if edit {
            self.state.preview_mode = self.cell.show_preview();
            self.state.markdown_mode = self.cell.show_markdown();
        } else {
            self.state.preview_mode = true;
            self.state.markdown_mode = false;
            self.cell.set_show_preview(true);
            self.cell.set_show_markdown(false);
        }

        self.sync_editors();
        self.refresh_preview();
        debug!("Cell {} edit mode: {}", self.cell.id(), edit);
    }

    /// Show or hide the rendered preview. At least one of preview and
    /// markdown source stays visible.
    pub fn set_preview_mode(&mut self, preview: bool) {
        self.state.preview_mode = preview;
        self.cell.set_show_preview(preview);
        if !preview && !self.state.markdown_mode {
            self.state.markdown_mode = true;
            self.cell.set_show_markdown(true);
        }
        self.sync_editors();
        self.refresh_preview();
    }

    /// Show or hide the markdown source. At least one of preview and
    /// markdown source stays visible.
    pub fn set_markdown_mode(&mut self, markdown: bool) {
        self.state.markdown_mode = markdown;
        self.cell.set_show_markdown(markdown);
        if !markdown && !self.state.preview_mode {
            self.state.preview_mode = true;
            self.cell.set_show_preview(true);
        }
        self.sync_editors();
        self.refresh_preview();
    }

    /// Double-click on the cell body. Returns whether edit mode was entered.
    pub fn on_double_click(&mut self) -> bool {
        if !self.services.config.get_bool(ENABLE_DOUBLE_CLICK_EDIT) {
            return false;
        }
        self.notebook.set_active_cell_id(Some(self.cell.id()));
        self.cell.set_active(true);
        self.toggle_edit_mode(Some(true));
        true
    }

    /// The notebook's active cell changed.
    pub fn set_active_cell_id(&mut self, active_cell_id: Option<&str>) {
        let active = active_cell_id == Some(self.cell.id());
        self.cell.set_active(active);
        if !active && self.state.is_edit_mode {
            self.toggle_edit_mode(Some(false));
        }
    }

    fn sync_editors(&mut self) {
        if self.state.is_edit_mode && self.state.markdown_mode {
            let text = self.cell.source().joined();
            match self.editors.first_mut() {
                Some(editor) => editor.text = text,
                None => self.editors.push(SourceEditor {
                    cell_id: self.cell.id().to_string(),
                    text,
                }),
            }
        } else {
            self.editors.clear();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Input
    // ─────────────────────────────────────────────────────────────────────────

    /// Handle a key press while the cell is active.
    pub fn handle_key(&mut self, chord: &KeyChord) -> KeyOutcome {
        if !self.cell.active() {
            return KeyOutcome::Ignored;
        }
        match translate(chord, self.services.platform) {
            Some(KeyAction::ExitEditMode) if self.state.is_edit_mode => {
                self.toggle_edit_mode(Some(false));
                KeyOutcome::ExitedEditMode
            }
            Some(KeyAction::Command(command)) if self.is_editable() => KeyOutcome::Execute(command),
            _ => KeyOutcome::Ignored,
        }
    }

    /// The rich-text surface was edited; store its markdown as the source.
    ///
    /// Returns `false` when the output is not editable.
    pub fn on_output_edited(&mut self, html: &str) -> bool {
        if !self.is_editable() {
            debug!("Ignoring output edit, cell {} is not editable", self.cell.id());
            return false;
        }

        let root = parse_fragment(html);
        unwrap_highlights(&root);
        let converter = HtmlMarkdownConverter::new(self.notebook.notebook_folder());
        let markdown = converter.convert_element(&root);

        self.output.attach(root);
        self.cell
            .set_rendered_output_text_content(self.output.rendered_text_output());

        let source = CellSource::from_markdown(&markdown);
        self.state.last_rendered = Some(source.joined());
        self.cell.set_source(source);
        true
    }

    /// The markdown source editor was edited.
    pub fn on_markdown_edited(&mut self, text: &str) {
        self.cell.set_source(CellSource::from_markdown(text));
        self.sync_editors();
        self.refresh_preview();
    }

    /// A link in the output was clicked.
    pub fn handle_link_click(&self, href: &str) {
        debug!("Link clicked in cell {}: {}", self.cell.id(), href);
        self.on_link_click.fire(&href.to_string());
    }

    pub fn on_link_click(&self, listener: impl Fn(&String) + 'static) -> Subscription {
        self.on_link_click.subscribe(listener)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Find
    // ─────────────────────────────────────────────────────────────────────────

    /// Move the find highlight from `old` to `new`.
    pub fn apply_decoration(
        &mut self,
        old: Option<&DecorationRange>,
        new: Option<&DecorationRange>,
    ) -> Option<ScrollRequest> {
        let find = self.notebook.active_find();
        decorations::apply_decoration(&mut self.output, old, new, find.as_deref())
    }

    /// Text of each rendered line.
    pub fn rendered_text_output(&self) -> Vec<String> {
        self.output.rendered_text_output()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn cell(&self) -> &Rc<CellModel> {
        &self.cell
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn output(&self) -> &RenderTarget {
        &self.output
    }

    /// Detach the output element, e.g. when the host tears down its DOM.
    pub fn detach_output(&mut self) {
        self.output.detach();
    }

    pub fn output_html(&self) -> String {
        self.output.inner_html()
    }

    /// Source editors currently shown for this cell.
    pub fn cell_editors(&self) -> &[SourceEditor] {
        &self.editors
    }

    pub fn is_trusted(&self) -> bool {
        self.notebook.trusted()
    }

    pub fn notebook_uri(&self) -> Option<&Url> {
        self.notebook.uri()
    }

    /// The output is a rich-text editing surface.
    pub fn is_editable(&self) -> bool {
        self.services.config.get_bool(ENABLE_PREVIEW_FEATURES)
            && self.state.is_edit_mode
            && self.state.preview_mode
            && !self.state.markdown_mode
    }

    /// Text in the output can be selected while the cell is active.
    pub fn user_select_enabled(&self) -> bool {
        self.cell.active()
    }

    pub fn border_top_color(&self) -> &str {
        &self.border_top_color
    }

    /// Whether the last render moved focus to the output.
    pub fn output_focused(&self) -> bool {
        self.output_focused
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }
}

/// Adapt a view method into an event listener holding the view weakly.
fn with_view<T: 'static>(
    weak: &Weak<RefCell<MarkdownCellView>>,
    f: impl Fn(&mut MarkdownCellView, &T) + 'static,
) -> impl Fn(&T) + 'static {
    let weak = weak.clone();
    move |value: &T| {
        let Some(view) = weak.upgrade() else {
            return;
        };
        // Busy means the view itself caused the event
        let Ok(mut view) = view.try_borrow_mut() else {
            trace!("View busy, event skipped");
            return;
        };
        f(&mut view, value);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
