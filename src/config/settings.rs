//! User settings consumed by markdown cells
//!
//! Settings are stored with the dotted keys the rest of a notebook host uses
//! (`notebook.enableDoubleClickEdit`, ...), so the same key works for the
//! JSON file, for [`Settings::get_value`] lookups and for change events.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Setting Keys
// ─────────────────────────────────────────────────────────────────────────────

/// Whether double-clicking a markdown cell enters edit mode.
pub const ENABLE_DOUBLE_CLICK_EDIT: &str = "notebook.enableDoubleClickEdit";

/// Whether preview features (rich-text editing of rendered output) are enabled.
pub const ENABLE_PREVIEW_FEATURES: &str = "workbench.enablePreviewFeatures";

/// Active color theme.
pub const COLOR_THEME: &str = "workbench.colorTheme";

// ─────────────────────────────────────────────────────────────────────────────
// Theme Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Available color themes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Toggle between Light and Dark.
    pub fn toggle(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Theme::Light => "Light",
            Theme::Dark => "Dark",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User-configurable options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Double-click on a cell body enters edit mode
    #[serde(rename = "notebook.enableDoubleClickEdit")]
    pub enable_double_click_edit: bool,

    /// Rendered output becomes a rich-text editing surface in edit mode
    #[serde(rename = "workbench.enablePreviewFeatures")]
    pub enable_preview_features: bool,

    /// Color theme
    #[serde(rename = "workbench.colorTheme")]
    pub theme: Theme,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enable_double_click_edit: true,
            enable_preview_features: false,
            theme: Theme::default(),
        }
    }
}

impl Settings {
    /// Look up a setting by its dotted key.
    pub fn get_value(&self, key: &str) -> Option<serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map.get(key).cloned(),
            _ => None,
        }
    }

    /// Look up a boolean setting, `None` for unknown or non-boolean keys.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_value(key).and_then(|v| v.as_bool())
    }

    /// Keys whose values differ between `self` and `other`.
    pub fn changed_keys(&self, other: &Settings) -> Vec<String> {
        let (Ok(serde_json::Value::Object(before)), Ok(serde_json::Value::Object(after))) =
            (serde_json::to_value(self), serde_json::to_value(other))
        else {
            return Vec::new();
        };
        before
            .iter()
            .filter(|(key, value)| after.get(*key) != Some(*value))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Parse settings from JSON; missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(settings.enable_double_click_edit);
        assert!(!settings.enable_preview_features);
        assert_eq!(settings.theme, Theme::Light);
    }

    #[test]
    fn test_serialized_keys_are_dotted() {
        let json = serde_json::to_string(&Settings::default()).unwrap();
        assert!(json.contains("\"notebook.enableDoubleClickEdit\":true"));
        assert!(json.contains("\"workbench.enablePreviewFeatures\":false"));
        assert!(json.contains("\"workbench.colorTheme\":\"light\""));
    }

    #[test]
    fn test_get_value_by_key() {
        let settings = Settings {
            enable_preview_features: true,
            ..Settings::default()
        };
        assert_eq!(settings.get_bool(ENABLE_PREVIEW_FEATURES), Some(true));
        assert_eq!(settings.get_bool(ENABLE_DOUBLE_CLICK_EDIT), Some(true));
        assert_eq!(
            settings.get_value(COLOR_THEME),
            Some(serde_json::Value::String("light".into()))
        );
        assert_eq!(settings.get_value("editor.fontSize"), None);
        assert_eq!(settings.get_bool(COLOR_THEME), None);
    }

    #[test]
    fn test_changed_keys() {
        let before = Settings::default();
        let after = Settings {
            enable_double_click_edit: false,
            theme: Theme::Dark,
            ..Settings::default()
        };
        let mut keys = before.changed_keys(&after);
        keys.sort();
        assert_eq!(keys, vec![ENABLE_DOUBLE_CLICK_EDIT, COLOR_THEME]);
        assert!(before.changed_keys(&before.clone()).is_empty());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings = Settings::from_json(r#"{"workbench.colorTheme": "dark"}"#).unwrap();
        assert_eq!(settings.theme, Theme::Dark);
        assert!(settings.enable_double_click_edit);
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let settings =
            Settings::from_json(r#"{"notebook.enableDoubleClickEdit": false, "other": 1}"#)
                .unwrap();
        assert!(!settings.enable_double_click_edit);
    }

    #[test]
    fn test_wrong_types_rejected() {
        assert!(Settings::from_json(r#"{"notebook.enableDoubleClickEdit": "yes"}"#).is_err());
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggle(), Theme::Dark);
        assert_eq!(Theme::Dark.toggle(), Theme::Light);
        assert_eq!(Theme::Dark.label(), "Dark");
    }
}
