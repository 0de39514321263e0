//! End-to-end checks of the render → edit → convert → render cycle.

use notecell::cell::{
    CellModel, CellServices, CellSource, DecorationRange, MarkdownCellView, NotebookModel,
};
use notecell::config::{ConfigurationService, Settings, Theme};
use notecell::convert::{relative_path_to, HtmlMarkdownConverter};
use notecell::dom::is_element;
use notecell::find::{FindProvider, FindState};
use notecell::theme::ThemeService;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

struct Harness {
    cell: Rc<CellModel>,
    notebook: Rc<NotebookModel>,
    view: Rc<RefCell<MarkdownCellView>>,
}

fn harness(markdown: &str, trusted: bool, settings: Settings) -> Harness {
    let cell = Rc::new(CellModel::new("cell", CellSource::from_markdown(markdown)));
    let notebook = Rc::new(NotebookModel::new(None, vec![Rc::clone(&cell)]));
    notebook.set_trusted(trusted);
    let services = CellServices::new(
        Rc::new(ConfigurationService::new(settings)),
        Rc::new(ThemeService::new(Theme::Light)),
    );
    let view = MarkdownCellView::create(Rc::clone(&cell), Rc::clone(&notebook), services);
    Harness {
        cell,
        notebook,
        view,
    }
}

fn editing_settings() -> Settings {
    Settings {
        enable_preview_features: true,
        ..Settings::default()
    }
}

/// Edit the rendered output without changing it, then render the stored source again.
fn edit_cycle(markdown: &str) -> (String, String) {
    let h = harness(markdown, true, editing_settings());
    let mut view = h.view.borrow_mut();
    let first = view.output_html();

    view.toggle_edit_mode(Some(true));
    assert!(view.on_output_edited(&first));
    view.toggle_edit_mode(Some(false));
    (first, view.output_html())
}

#[test]
fn test_code_block_survives_edit_cycle() {
    let (before, after) = edit_cycle("```rust\nfn main() {\n    println!(\"hi\");\n}\n```\n");
    assert!(before.contains("language-rust"));
    assert_eq!(before, after);
}

#[test]
fn test_table_survives_edit_cycle() {
    let (before, after) = edit_cycle("| a | b |\n| :--- | ---: |\n| 1 | 2 |\n| 3 | 4 |\n");
    assert!(before.contains("<table>"));
    assert_eq!(before, after);
}

#[test]
fn test_highlight_survives_edit_cycle() {
    let (before, after) = edit_cycle("some <mark>marked</mark> text\n");
    assert!(before.contains("<mark>marked</mark>"));
    assert_eq!(before, after);
}

#[test]
fn test_yellow_span_becomes_mark() {
    let h = harness("x", true, editing_settings());
    let mut view = h.view.borrow_mut();
    view.toggle_edit_mode(Some(true));
    view.on_output_edited(r#"<p>a <span style="background-color: yellow;">b</span></p>"#);
    assert_eq!(h.cell.source().joined(), "a <mark>b</mark>");
}

#[test]
fn test_rendering_is_deterministic() {
    let markdown = "# T\n\n- a\n- b\n\n[link](https://example.com)\n";
    for trusted in [true, false] {
        let first = harness(markdown, trusted, Settings::default());
        let second = harness(markdown, trusted, Settings::default());
        assert_eq!(
            first.view.borrow().output_html(),
            second.view.borrow().output_html()
        );
    }
}

#[test]
fn test_refresh_twice_changes_nothing() {
    let h = harness("para\n\n| h |\n|---|\n| 1 |\n", false, Settings::default());
    let mut view = h.view.borrow_mut();
    view.refresh_preview();
    let html = view.output_html();
    let text = h.cell.rendered_output_text_content();
    view.refresh_preview();
    assert_eq!(view.output_html(), html);
    assert_eq!(h.cell.rendered_output_text_content(), text);
}

#[test]
fn test_table_leaves_header_then_rows() {
    let h = harness("| h |\n|---|\n| 1 |\n| 2 |\n| 3 |\n", true, Settings::default());
    let view = h.view.borrow();
    assert_eq!(view.output().leaf_count(), 4);
    let lines: Vec<String> = view
        .rendered_text_output()
        .iter()
        .map(|l| l.trim().to_string())
        .collect();
    assert_eq!(lines, vec!["h", "1", "2", "3"]);
}

#[test]
fn test_list_leaves() {
    let h = harness("- a\n- b\n", true, Settings::default());
    let view = h.view.borrow();
    assert_eq!(view.output().leaf_count(), 2);
    assert!(view
        .output()
        .leaf_at(1)
        .map(|l| is_element(&l, "li"))
        .unwrap_or(false));
}

#[test]
fn test_placeholders() {
    let h = harness("", false, Settings::default());
    assert!(h.view.borrow().output_html().contains("Double-click to edit"));

    let settings = Settings {
        enable_double_click_edit: false,
        ..Settings::default()
    };
    let h = harness("", false, settings);
    assert!(h.view.borrow().output_html().contains("Add content here..."));
}

#[test]
fn test_highlight_with_and_without_matches() {
    let h = harness("first line\n\nsecond line\n", true, Settings::default());
    let range = DecorationRange::new(2, 2);

    let mut none = FindState::with_term("absent");
    none.find_matches_in("first line\nsecond line");
    let none: Rc<dyn FindProvider> = Rc::new(none);
    h.notebook.set_find_provider(Some(none));
    let before = h.view.borrow().output_html();
    h.view.borrow_mut().apply_decoration(None, Some(&range));
    assert_eq!(h.view.borrow().output_html(), before);

    let mut some = FindState::with_term("second");
    some.find_matches_in("first line\nsecond line");
    let some: Rc<dyn FindProvider> = Rc::new(some);
    h.notebook.set_find_provider(Some(some));
    let scroll = h.view.borrow_mut().apply_decoration(None, Some(&range));
    assert_eq!(scroll.map(|s| s.leaf_index), Some(1));
    assert!(h
        .view
        .borrow()
        .output_html()
        .contains(r#"<span class="rangeSpecificHighlight">second</span>"#));
}

#[cfg(unix)]
#[test]
fn test_relative_paths() {
    let folder = Some(Path::new("/docs/"));
    assert_eq!(
        relative_path_to(folder, "file:///docs/img/pic.png").as_deref(),
        Some("./img/pic.png")
    );
    assert!(relative_path_to(folder, "file:///other/pic.png")
        .unwrap()
        .starts_with("../"));
    assert_eq!(relative_path_to(folder, "https://example.com/pic.png"), None);

    let converter = HtmlMarkdownConverter::new(Some("/docs".into()));
    assert_eq!(
        converter.convert(r#"<p><img src="https://example.com/pic.png" alt="web"></p>"#),
        "![web](https://example.com/pic.png)"
    );
}

/// An untrusted notebook at `file:///docs/nb.ipynb` holding `markdown`, in
/// rich-text edit mode.
#[cfg(unix)]
fn untrusted_docs_notebook(markdown: &str) -> (Rc<CellModel>, Rc<RefCell<MarkdownCellView>>) {
    let cell = Rc::new(CellModel::new("c", CellSource::from_markdown(markdown)));
    let uri = url::Url::parse("file:///docs/nb.ipynb").unwrap();
    let notebook = Rc::new(NotebookModel::new(Some(uri), vec![Rc::clone(&cell)]));
    let services = CellServices::new(
        Rc::new(ConfigurationService::new(editing_settings())),
        Rc::new(ThemeService::default()),
    );
    let view = MarkdownCellView::create(Rc::clone(&cell), notebook, services);
    (cell, view)
}

/// Submit the current output unchanged as a rich-text edit.
#[cfg(unix)]
fn resubmit_output(view: &Rc<RefCell<MarkdownCellView>>) -> String {
    let mut view = view.borrow_mut();
    let html = view.output_html();
    view.toggle_edit_mode(Some(true));
    assert!(view.on_output_edited(&html));
    html
}

#[cfg(unix)]
#[test]
fn test_untrusted_local_link_round_trip() {
    let (cell, view) = untrusted_docs_notebook("[notes](notes/a.md)\n");
    let html = resubmit_output(&view);
    assert!(!html.contains(" href="));
    assert!(html.contains(r#"data-href="file:///docs/notes/a.md""#));
    assert_eq!(cell.source().joined(), "[notes](./notes/a.md)");
}

#[cfg(unix)]
#[test]
fn test_untrusted_local_link_with_title_round_trip() {
    let (cell, view) = untrusted_docs_notebook("[a](notes/a.md \"tip\")\n");
    let html = resubmit_output(&view);
    assert!(html.contains(r#"title="tip""#));
    assert_eq!(cell.source().joined(), "[a](./notes/a.md \"tip\")");
}

#[cfg(unix)]
#[test]
fn test_untrusted_local_image_round_trip() {
    let (cell, view) = untrusted_docs_notebook("see ![pic](img/pic.png)\n");
    let html = resubmit_output(&view);
    assert!(!html.contains(" src="));
    assert!(html.contains(r#"data-src="file:///docs/img/pic.png""#));
    assert_eq!(cell.source().joined(), "see ![pic](./img/pic.png)");
}
