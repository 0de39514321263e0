//! Reading and writing `config.json`
//!
//! Settings live in the platform configuration directory. A missing or empty
//! file means "all defaults"; a broken file is reported by the readers here
//! and turned into defaults (with a warning) by [`load_config`].

use crate::config::Settings;
use crate::error::{Error, Result, ResultExt};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "notecell";
const CONFIG_FILE_NAME: &str = "config.json";

/// Written first, then renamed over the real file.
const CONFIG_TEMP_NAME: &str = "config.json.bak";

// ─────────────────────────────────────────────────────────────────────────────
// Locations
// ─────────────────────────────────────────────────────────────────────────────

/// `<config dir>/notecell/config.json`, e.g. `~/.config/notecell/config.json`
/// on Linux or `%APPDATA%\notecell\config.json` on Windows.
pub fn config_file_path() -> Result<PathBuf> {
    let base = dirs::config_dir().ok_or(Error::ConfigDirNotFound)?;
    Ok(base.join(APP_NAME).join(CONFIG_FILE_NAME))
}

// ─────────────────────────────────────────────────────────────────────────────
// Reading
// ─────────────────────────────────────────────────────────────────────────────

/// Settings from the user's config file, or defaults if it cannot be used.
pub fn load_config() -> Settings {
    config_file_path()
        .and_then(|path| read_settings(&path))
        .unwrap_or_warn_default(Settings::default(), "Ignoring user settings")
}

/// Read settings from `path`.
pub fn read_settings(path: &Path) -> Result<Settings> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Settings::default());
        }
        Err(source) => {
            return Err(Error::ConfigLoad {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if contents.trim().is_empty() {
        debug!("Settings file {} is empty, using defaults", path.display());
        return Ok(Settings::default());
    }

    let settings = Settings::from_json(&contents).map_err(|e| {
        warn!("Settings file {} is not valid JSON: {}", path.display(), e);
        Error::ConfigParse {
            message: format!("{}: {}", path.display(), e),
            source: Some(Box::new(e)),
        }
    })?;
    info!("Loaded settings from {}", path.display());
    Ok(settings)
}

// ─────────────────────────────────────────────────────────────────────────────
// Writing
// ─────────────────────────────────────────────────────────────────────────────

/// Write `settings` to `path`, creating its directory when needed.
///
/// The JSON goes to a sibling temp file that is then renamed over `path`,
/// so readers never observe a half-written file.
pub fn write_settings(path: &Path, settings: &Settings) -> Result<()> {
    let save_error = |path: &Path| {
        let path = path.to_path_buf();
        move |e: std::io::Error| Error::ConfigSave {
            path,
            source: Box::new(e),
        }
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.exists()) {
        debug!("Creating {}", dir.display());
        fs::create_dir_all(dir).map_err(save_error(dir))?;
    }

    let json = serde_json::to_string_pretty(settings).map_err(|e| Error::ConfigSave {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    let temp = path.with_file_name(CONFIG_TEMP_NAME);
    fs::write(&temp, json).map_err(save_error(&temp))?;
    fs::rename(&temp, path).map_err(save_error(path))?;

    info!("Saved settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Theme;
    use tempfile::TempDir;

    fn settings_path(dir: &TempDir) -> PathBuf {
        dir.path().join(APP_NAME).join(CONFIG_FILE_NAME)
    }

    fn write_raw(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_missing_file_reads_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_settings(&settings_path(&dir)).unwrap(), Settings::default());
    }

    #[test]
    fn test_blank_file_reads_defaults() {
        let dir = TempDir::new().unwrap();
        let path = settings_path(&dir);
        write_raw(&path, "  \n\t");
        assert_eq!(read_settings(&path).unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        let path = settings_path(&dir);
        write_raw(
            &path,
            r#"{"workbench.colorTheme": "dark", "workbench.enablePreviewFeatures": true}"#,
        );

        let settings = read_settings(&path).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.enable_preview_features);
        assert!(settings.enable_double_click_edit);
    }

    #[test]
    fn test_broken_json_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = settings_path(&dir);
        write_raw(&path, "{ \"notebook.enableDoubleClickEdit\": ");
        assert!(matches!(read_settings(&path), Err(Error::ConfigParse { .. })));
    }

    #[test]
    fn test_directory_instead_of_file_is_a_load_error() {
        let dir = TempDir::new().unwrap();
        let path = settings_path(&dir);
        fs::create_dir_all(&path).unwrap();
        assert!(matches!(read_settings(&path), Err(Error::ConfigLoad { .. })));
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let path = settings_path(&dir);
        let settings = Settings {
            enable_double_click_edit: false,
            enable_preview_features: true,
            theme: Theme::Dark,
        };

        write_settings(&path, &settings).unwrap();
        assert!(!path.with_file_name(CONFIG_TEMP_NAME).exists());
        assert_eq!(read_settings(&path).unwrap(), settings);
    }

    #[test]
    fn test_config_file_path_ends_with_app_dir() {
        if let Ok(path) = config_file_path() {
            assert!(path.ends_with(Path::new(APP_NAME).join(CONFIG_FILE_NAME)));
        }
    }
}
