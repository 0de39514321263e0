//! Link and image target resolution relative to a notebook
//!
//! Edited output refers to local files through absolute `file:` URIs. When
//! such output becomes markdown again those targets are rewritten as paths
//! relative to the notebook's folder so the notebook stays portable.

use log::trace;
use std::path::{Component, Path};
use url::Url;

/// Compute the path of `target` relative to `notebook_folder`.
///
/// `target` is a URI (`file:///docs/img/a.png`) or a bare absolute path.
/// Whitespace is percent-encoded so the result stays a single markdown
/// token, and a `./` prefix is added unless the path already starts with
/// `./` or `../`.
///
/// Returns `None` when there is no folder, the target is not a local file
/// (e.g. a web URL), or the target cannot be interpreted as a path. Callers
/// fall back to the original reference.
pub fn relative_path_to(notebook_folder: Option<&Path>, target: &str) -> Option<String> {
    let folder = notebook_folder?;
    let url = parse_target(target)?;
    if url.scheme() != "file" {
        return None;
    }
    let target_path = url.to_file_path().ok()?;

    let relative = relative_components(folder, &target_path)?;
    let mut path = relative.join("/");
    path = encode_whitespace(&path);

    if !path.starts_with("./") && !path.starts_with("../") {
        path.insert_str(0, "./");
    }
    trace!("Resolved '{}' to '{}'", target, path);
    Some(path)
}

fn parse_target(target: &str) -> Option<Url> {
    match Url::parse(target) {
        Ok(url) => Some(url),
        Err(_) if Path::new(target).is_absolute() => Url::from_file_path(target).ok(),
        Err(_) => None,
    }
}

/// Path components leading from `from` (a directory) to `to`.
fn relative_components(from: &Path, to: &Path) -> Option<Vec<String>> {
    let from: Vec<Component> = from
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component> = to
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    // Different roots or prefixes cannot be expressed relatively
    if common == 0 && (from.first().is_some() || to.first().is_some()) {
        return None;
    }

    let mut parts = Vec::new();
    for component in &from[common..] {
        match component {
            Component::Normal(_) => parts.push("..".to_string()),
            Component::ParentDir => return None,
            _ => {}
        }
    }
    for component in &to[common..] {
        match component {
            Component::Normal(name) => parts.push(name.to_string_lossy().into_owned()),
            Component::ParentDir => parts.push("..".to_string()),
            _ => {}
        }
    }
    Some(parts)
}

fn encode_whitespace(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c.is_whitespace() {
            out.push_str("%20");
        } else {
            out.push(c);
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_file_in_subfolder() {
        let folder = Path::new("/docs/");
        assert_eq!(
            relative_path_to(Some(folder), "file:///docs/img/pic.png").as_deref(),
            Some("./img/pic.png")
        );
    }

    #[test]
    fn test_bare_absolute_path() {
        let folder = Path::new("/docs");
        assert_eq!(
            relative_path_to(Some(folder), "/docs/img/pic.png").as_deref(),
            Some("./img/pic.png")
        );
    }

    #[test]
    fn test_sibling_folder_starts_with_parent() {
        let folder = Path::new("/docs/");
        let path = relative_path_to(Some(folder), "file:///other/pic.png").unwrap();
        assert_eq!(path, "../other/pic.png");
    }

    #[test]
    fn test_web_url_yields_none() {
        let folder = Path::new("/docs/");
        assert_eq!(relative_path_to(Some(folder), "https://example.com/pic.png"), None);
        assert_eq!(relative_path_to(Some(folder), "mailto:a@b.c"), None);
    }

    #[test]
    fn test_missing_folder_yields_none() {
        assert_eq!(relative_path_to(None, "file:///docs/pic.png"), None);
    }

    #[test]
    fn test_relative_reference_yields_none() {
        assert_eq!(relative_path_to(Some(Path::new("/docs")), "img/pic.png"), None);
    }

    #[test]
    fn test_whitespace_is_encoded() {
        let folder = Path::new("/docs");
        assert_eq!(
            relative_path_to(Some(folder), "file:///docs/my%20images/a%20b.png").as_deref(),
            Some("./my%20images/a%20b.png")
        );
    }

    #[test]
    fn test_same_file_name_in_folder() {
        let folder = Path::new("/docs");
        assert_eq!(
            relative_path_to(Some(folder), "file:///docs/notes.md").as_deref(),
            Some("./notes.md")
        );
    }
}
