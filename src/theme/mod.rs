//! Theme colors for rendered cells
//!
//! The `Theme` enum in `config::settings` (Light/Dark) selects which palette
//! is active. Cell views only need a handful of colors: the side-bar
//! background used for the output border, and the find-highlight color.
//!
//! # Usage
//!
//! ```ignore
//! use notecell::theme::{ThemeColors, ThemeService};
//! use notecell::config::Theme;
//!
//! let service = ThemeService::new(Theme::Dark);
//! let border = service.colors().sidebar_background.to_css();
//! ```

pub mod manager;

pub use manager::ThemeService;

use crate::config::Theme;

// ─────────────────────────────────────────────────────────────────────────────
// Color
// ─────────────────────────────────────────────────────────────────────────────

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// CSS hex notation, e.g. `#1e1e1e`.
    pub fn to_css(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Theme Colors
// ─────────────────────────────────────────────────────────────────────────────

/// Colors a cell view draws with.
#[derive(Debug, Clone, PartialEq)]
pub struct ThemeColors {
    /// Primary background color
    pub background: Rgb,
    /// Side-bar background, used for the cell output's top border
    pub sidebar_background: Rgb,
    /// Primary text color
    pub foreground: Rgb,
    /// Background of find-match highlights
    pub find_highlight: Rgb,
}

impl ThemeColors {
    /// Colors for the given theme variant.
    pub fn from_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Rgb::from_rgb(255, 255, 255),
            sidebar_background: Rgb::from_rgb(243, 243, 243),
            foreground: Rgb::from_rgb(30, 30, 30),
            find_highlight: Rgb::from_rgb(255, 235, 120),
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Rgb::from_rgb(30, 30, 30),
            sidebar_background: Rgb::from_rgb(37, 37, 38),
            foreground: Rgb::from_rgb(220, 220, 220),
            find_highlight: Rgb::from_rgb(120, 90, 20),
        }
    }

    /// Check if this is a dark theme (dark themes have darker backgrounds).
    pub fn is_dark(&self) -> bool {
        self.background.r < 128
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_css() {
        assert_eq!(Rgb::from_rgb(30, 30, 30).to_css(), "#1e1e1e");
        assert_eq!(Rgb::from_rgb(255, 0, 16).to_css(), "#ff0010");
    }

    #[test]
    fn test_from_theme() {
        assert_eq!(ThemeColors::from_theme(Theme::Light), ThemeColors::light());
        assert_eq!(ThemeColors::from_theme(Theme::Dark), ThemeColors::dark());
    }

    #[test]
    fn test_is_dark() {
        assert!(ThemeColors::dark().is_dark());
        assert!(!ThemeColors::light().is_dark());
    }

    #[test]
    fn test_sidebar_differs_between_themes() {
        assert_ne!(
            ThemeColors::light().sidebar_background,
            ThemeColors::dark().sidebar_background
        );
    }
}
