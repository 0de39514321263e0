//! Theme service for notecell
//!
//! Holds the current theme and tells subscribed views when it changes.

use log::{debug, info};
use std::cell::Cell;

use super::ThemeColors;
use crate::config::Theme;
use crate::events::{Emitter, Subscription};

// ─────────────────────────────────────────────────────────────────────────────
// Theme Service
// ─────────────────────────────────────────────────────────────────────────────

/// Current theme plus a change feed carrying the new colors.
#[derive(Debug)]
pub struct ThemeService {
    current_theme: Cell<Theme>,
    on_did_change: Emitter<ThemeColors>,
}

impl ThemeService {
    pub fn new(theme: Theme) -> Self {
        info!("ThemeService initialized with theme: {:?}", theme);
        Self {
            current_theme: Cell::new(theme),
            on_did_change: Emitter::new(),
        }
    }

    pub fn current_theme(&self) -> Theme {
        self.current_theme.get()
    }

    /// Colors of the current theme.
    pub fn colors(&self) -> ThemeColors {
        ThemeColors::from_theme(self.current_theme.get())
    }

    /// Switch themes; listeners are notified only on an actual change.
    pub fn set_theme(&self, theme: Theme) {
        let previous = self.current_theme.replace(theme);
        if previous == theme {
            return;
        }
        info!("Theme changed from {:?} to {:?}", previous, theme);
        self.on_did_change.fire(&self.colors());
    }

    /// Toggle between Light and Dark themes. Returns the new theme.
    pub fn toggle(&self) -> Theme {
        let new_theme = self.current_theme().toggle();
        self.set_theme(new_theme);
        new_theme
    }

    pub fn on_did_change_theme(&self, listener: impl Fn(&ThemeColors) + 'static) -> Subscription {
        debug!("Theme listener registered");
        self.on_did_change.subscribe(listener)
    }
}

impl Default for ThemeService {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_new_service() {
        let service = ThemeService::new(Theme::Dark);
        assert_eq!(service.current_theme(), Theme::Dark);
        assert!(service.colors().is_dark());
    }

    #[test]
    fn test_set_theme_notifies() {
        let service = ThemeService::new(Theme::Light);
        let seen: Rc<RefCell<Option<ThemeColors>>> = Rc::default();
        let seen_clone = Rc::clone(&seen);
        let _sub = service.on_did_change_theme(move |colors| {
            *seen_clone.borrow_mut() = Some(colors.clone());
        });

        service.set_theme(Theme::Dark);
        assert_eq!(seen.borrow().clone(), Some(ThemeColors::dark()));
    }

    #[test]
    fn test_set_same_theme_is_silent() {
        let service = ThemeService::new(Theme::Light);
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let _sub = service.on_did_change_theme(move |_| count_clone.set(count_clone.get() + 1));

        service.set_theme(Theme::Light);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn test_toggle() {
        let service = ThemeService::new(Theme::Light);
        assert_eq!(service.toggle(), Theme::Dark);
        assert_eq!(service.toggle(), Theme::Light);
    }
}
