//! Live configuration with change notifications.

use crate::config::{config_file_path, load_config, read_settings, write_settings, Settings};
use crate::error::Result;
use crate::events::{Emitter, Subscription};
use log::debug;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Describes which setting keys changed in one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationChangeEvent {
    pub affected_keys: Vec<String>,
}

impl ConfigurationChangeEvent {
    pub fn affects_configuration(&self, key: &str) -> bool {
        self.affected_keys.iter().any(|k| k == key)
    }
}

/// Holds the current [`Settings`] and notifies listeners when they change.
#[derive(Debug, Default)]
pub struct ConfigurationService {
    settings: RefCell<Settings>,
    /// Where [`save`](Self::save) writes; the user config file when `None`
    path: Option<PathBuf>,
    on_did_change: Emitter<ConfigurationChangeEvent>,
}

impl ConfigurationService {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: RefCell::new(settings),
            path: None,
            on_did_change: Emitter::new(),
        }
    }

    /// Create a service from the persisted user configuration.
    pub fn load() -> Self {
        Self::new(load_config())
    }

    /// Create a service backed by an explicit settings file.
    pub fn load_from(path: &Path) -> Result<Self> {
        Ok(Self {
            path: Some(path.to_path_buf()),
            ..Self::new(read_settings(path)?)
        })
    }

    /// Persist the current settings.
    pub fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => config_file_path()?,
        };
        write_settings(&path, &self.settings.borrow())
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.settings.borrow().clone()
    }

    pub fn get_value(&self, key: &str) -> Option<serde_json::Value> {
        self.settings.borrow().get_value(key)
    }

    /// Boolean setting lookup; unknown keys read as `false`.
    pub fn get_bool(&self, key: &str) -> bool {
        self.settings.borrow().get_bool(key).unwrap_or(false)
    }

    /// Mutate the settings and notify listeners about the keys that changed.
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        let event = {
            let mut settings = self.settings.borrow_mut();
            let before = settings.clone();
            f(&mut *settings);
            ConfigurationChangeEvent {
                affected_keys: before.changed_keys(&*settings),
            }
        };

        if event.affected_keys.is_empty() {
            return;
        }
        debug!("Configuration changed: {:?}", event.affected_keys);
        self.on_did_change.fire(&event);
    }

    pub fn on_did_change_configuration(
        &self,
        listener: impl Fn(&ConfigurationChangeEvent) + 'static,
    ) -> Subscription {
        self.on_did_change.subscribe(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ENABLE_DOUBLE_CLICK_EDIT, ENABLE_PREVIEW_FEATURES};
    use std::rc::Rc;

    #[test]
    fn test_get_bool() {
        let service = ConfigurationService::new(Settings::default());
        assert!(service.get_bool(ENABLE_DOUBLE_CLICK_EDIT));
        assert!(!service.get_bool(ENABLE_PREVIEW_FEATURES));
        assert!(!service.get_bool("does.not.exist"));
    }

    #[test]
    fn test_update_fires_with_affected_keys() {
        let service = ConfigurationService::new(Settings::default());
        let events: Rc<RefCell<Vec<ConfigurationChangeEvent>>> = Rc::default();
        let events_clone = Rc::clone(&events);
        let _sub = service.on_did_change_configuration(move |e| {
            events_clone.borrow_mut().push(e.clone());
        });

        service.update(|s| s.enable_preview_features = true);

        let events = events.borrow();
        assert_eq!(events.len(), 1);
        assert!(events[0].affects_configuration(ENABLE_PREVIEW_FEATURES));
        assert!(!events[0].affects_configuration(ENABLE_DOUBLE_CLICK_EDIT));
    }

    #[test]
    fn test_noop_update_does_not_fire() {
        let service = ConfigurationService::new(Settings::default());
        let fired = Rc::new(std::cell::Cell::new(false));
        let fired_clone = Rc::clone(&fired);
        let _sub = service.on_did_change_configuration(move |_| fired_clone.set(true));

        service.update(|s| s.enable_double_click_edit = true);
        assert!(!fired.get());
    }

    #[test]
    fn test_save_and_reload_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let service = ConfigurationService::load_from(&path).unwrap();
        assert_eq!(service.settings(), Settings::default());
        service.update(|s| s.enable_preview_features = true);
        service.save().unwrap();

        let reloaded = ConfigurationService::load_from(&path).unwrap();
        assert!(reloaded.get_bool(ENABLE_PREVIEW_FEATURES));
    }

    #[test]
    fn test_listener_can_read_settings() {
        let service = Rc::new(ConfigurationService::new(Settings::default()));
        let seen = Rc::new(std::cell::Cell::new(true));
        let (service_clone, seen_clone) = (Rc::clone(&service), Rc::clone(&seen));
        let _sub = service.on_did_change_configuration(move |_| {
            seen_clone.set(service_clone.get_bool(ENABLE_DOUBLE_CLICK_EDIT));
        });

        service.update(|s| s.enable_double_click_edit = false);
        assert!(!seen.get());
    }
}
