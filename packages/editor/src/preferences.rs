//! Editor preferences: theme mode, grid, and the saved-theme library.
//!
//! Held in an explicit object and persisted through an injected key-value
//! store: loaded once at startup, written back on every change.

use crate::{EditorResult, Theme, ThemeMode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use wireframe_common::KeyValueStore;

const PREFERENCES_KEY: &str = "preferences";

pub const DEFAULT_GRID_SIZE: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppPreferences {
    #[serde(default)]
    pub theme_mode: ThemeMode,
    #[serde(default = "default_grid_size")]
    pub grid_size: f64,
    #[serde(default = "default_true")]
    pub snap_to_grid: bool,
    #[serde(default)]
    pub saved_themes: Vec<Theme>,
}

fn default_grid_size() -> f64 {
    DEFAULT_GRID_SIZE
}

fn default_true() -> bool {
    true
}

impl Default for AppPreferences {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::Light,
            grid_size: DEFAULT_GRID_SIZE,
            snap_to_grid: true,
            saved_themes: Vec::new(),
        }
    }
}

/// Preferences bound to their persistence boundary
pub struct PreferenceStore {
    store: Arc<dyn KeyValueStore>,
    current: AppPreferences,
}

impl PreferenceStore {
    /// Load stored preferences, falling back to defaults when missing or
    /// unreadable
    pub fn load(store: Arc<dyn KeyValueStore>) -> EditorResult<Self> {
        let current = match store.get(PREFERENCES_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring unreadable preferences");
                AppPreferences::default()
            }),
            None => AppPreferences::default(),
        };
        Ok(Self { store, current })
    }

    /// Like [`PreferenceStore::load`], but a store that cannot be read
    /// yields defaults. Later updates still try to persist.
    pub fn load_or_default(store: Arc<dyn KeyValueStore>) -> Self {
        match Self::load(store.clone()) {
            Ok(prefs) => prefs,
            Err(e) => {
                tracing::warn!(error = %e, "cannot read preferences; using defaults");
                Self {
                    store,
                    current: AppPreferences::default(),
                }
            }
        }
    }

    pub fn get(&self) -> &AppPreferences {
        &self.current
    }

    /// Apply a change and persist it
    pub fn update(&mut self, change: impl FnOnce(&mut AppPreferences)) -> EditorResult<()> {
        let mut next = self.current.clone();
        change(&mut next);
        if next.grid_size.is_nan() || next.grid_size <= 0.0 {
            next.grid_size = DEFAULT_GRID_SIZE;
        }
        if next == self.current {
            return Ok(());
        }
        self.store
            .set(PREFERENCES_KEY, &serde_json::to_string(&next)?)?;
        self.current = next;
        Ok(())
    }

    /// Add a theme to the library, replacing one with the same name
    pub fn save_theme(&mut self, theme: Theme) -> EditorResult<()> {
        self.update(|prefs| {
            prefs.saved_themes.retain(|t| t.name != theme.name);
            prefs.saved_themes.push(theme);
        })
    }

    pub fn remove_theme(&mut self, name: &str) -> EditorResult<()> {
        self.update(|prefs| prefs.saved_themes.retain(|t| t.name != name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wireframe_common::MemoryKeyValueStore;

    #[test]
    fn test_defaults_when_nothing_stored() {
        let prefs = PreferenceStore::load(Arc::new(MemoryKeyValueStore::new())).unwrap();
        assert_eq!(prefs.get(), &AppPreferences::default());
    }

    #[test]
    fn test_changes_survive_reload() {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryKeyValueStore::new());

        let mut prefs = PreferenceStore::load(store.clone()).unwrap();
        prefs
            .update(|p| {
                p.theme_mode = ThemeMode::Dark;
                p.grid_size = 8.0;
            })
            .unwrap();
        prefs.save_theme(Theme::dark()).unwrap();

        let reloaded = PreferenceStore::load(store).unwrap();
        assert_eq!(reloaded.get().theme_mode, ThemeMode::Dark);
        assert_eq!(reloaded.get().grid_size, 8.0);
        assert_eq!(reloaded.get().saved_themes.len(), 1);
    }

    #[test]
    fn test_invalid_grid_falls_back() {
        let mut prefs = PreferenceStore::load(Arc::new(MemoryKeyValueStore::new())).unwrap();
        prefs.update(|p| p.grid_size = -3.0).unwrap();
        assert_eq!(prefs.get().grid_size, DEFAULT_GRID_SIZE);
    }

    #[test]
    fn test_save_theme_replaces_by_name() {
        let mut prefs = PreferenceStore::load(Arc::new(MemoryKeyValueStore::new())).unwrap();
        prefs.save_theme(Theme::default()).unwrap();
        let mut recolored = Theme::default();
        recolored.colors.primary = "#000000".to_string();
        prefs.save_theme(recolored).unwrap();

        assert_eq!(prefs.get().saved_themes.len(), 1);
        assert_eq!(prefs.get().saved_themes[0].colors.primary, "#000000");

        prefs.remove_theme("Default").unwrap();
        assert!(prefs.get().saved_themes.is_empty());
    }

    #[test]
    fn test_unreadable_preferences_ignored() {
        let store = Arc::new(MemoryKeyValueStore::new());
        store.set(PREFERENCES_KEY, "[]").unwrap();
        let prefs = PreferenceStore::load(store).unwrap();
        assert_eq!(prefs.get(), &AppPreferences::default());
    }
}
