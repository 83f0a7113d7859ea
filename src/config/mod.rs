// (C) 2025 - Enzo Lombardi

//! Persistent configuration and favorites.
//!
//! A JSON file under the platform config directory holds the startup
//! snapshot (pattern, theme, fps, mouse flag) and the favorite slots.
//! The executor only sees the collaborator surface: `get_favorite`,
//! `save_favorite`, `get_all_favorites`, `load`, `save`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SplashError};

/// A persisted snapshot of (pattern, theme, optional preset, optional
/// note), addressable by slot number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteSlot {
    pub pattern_name: String,
    pub theme_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// ISO-8601 timestamp of when the slot was written.
    pub saved_at: String,
}

/// On-disk configuration layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse: Option<bool>,
    #[serde(default)]
    pub favorites: BTreeMap<u32, FavoriteSlot>,
}

/// JSON-backed config store.
pub struct ConfigStore {
    path: PathBuf,
    config: AppConfig,
}

impl ConfigStore {
    /// Open the store at the platform default location, loading any
    /// existing file.
    pub fn open_default() -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| SplashError::invalid_input("no config directory on this platform"))?;
        Self::open(base.join("termsplash").join("config.json"))
    }

    /// Open the store at an explicit path, loading any existing file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self {
            path: path.into(),
            config: AppConfig::default(),
        };
        store.load()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Re-read the file; a missing file yields the default config.
    pub fn load(&mut self) -> Result<()> {
        match fs::read_to_string(&self.path) {
            Ok(text) => {
                self.config = serde_json::from_str(&text).map_err(|e| {
                    SplashError::invalid_input(format!(
                        "config file '{}' is not valid: {}",
                        self.path.display(),
                        e
                    ))
                })?;
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.config = AppConfig::default();
                Ok(())
            }
            Err(e) => Err(SplashError::config_file(self.path.clone(), e)),
        }
    }

    /// Write the current config to disk, creating parent directories.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SplashError::config_file(self.path.clone(), e))?;
        }
        let text = serde_json::to_string_pretty(&self.config)
            .map_err(|e| SplashError::invalid_input(format!("config serialization failed: {}", e)))?;
        fs::write(&self.path, text).map_err(|e| SplashError::config_file(self.path.clone(), e))
    }

    pub fn get_favorite(&self, slot: u32) -> Option<&FavoriteSlot> {
        self.config.favorites.get(&slot)
    }

    pub fn get_all_favorites(&self) -> &BTreeMap<u32, FavoriteSlot> {
        &self.config.favorites
    }

    /// Write a favorite slot and persist immediately.
    pub fn save_favorite(&mut self, slot: u32, favorite: FavoriteSlot) -> Result<()> {
        self.config.favorites.insert(slot, favorite);
        self.save()
    }

    /// Update the startup snapshot (persisted by the save command).
    pub fn set_snapshot(&mut self, pattern: &str, theme: &str, fps: u32, mouse: bool) {
        self.config.pattern = Some(pattern.to_string());
        self.config.theme = Some(theme.to_string());
        self.config.fps = Some(fps);
        self.config.mouse = Some(mouse);
    }
}

/// Current time as an ISO-8601 string for `saved_at`.
pub fn now_iso8601() -> String {
    chrono::Local::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn favorite(pattern: &str) -> FavoriteSlot {
        FavoriteSlot {
            pattern_name: pattern.to_string(),
            theme_name: "fire".to_string(),
            preset: Some(2),
            note: None,
            saved_at: now_iso8601(),
        }
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempdir().unwrap();
        let store = ConfigStore::open(dir.path().join("config.json")).unwrap();
        assert_eq!(store.config(), &AppConfig::default());
        assert!(store.get_favorite(1).is_none());
    }

    #[test]
    fn test_favorite_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut store = ConfigStore::open(&path).unwrap();
        store.save_favorite(3, favorite("waves")).unwrap();

        let reopened = ConfigStore::open(&path).unwrap();
        let fav = reopened.get_favorite(3).unwrap();
        assert_eq!(fav.pattern_name, "waves");
        assert_eq!(fav.preset, Some(2));
        assert_eq!(reopened.get_all_favorites().len(), 1);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut store = ConfigStore::open(&path).unwrap();
        store.set_snapshot("rain", "ocean", 45, false);
        store.save().unwrap();

        let reopened = ConfigStore::open(&path).unwrap();
        assert_eq!(reopened.config().pattern.as_deref(), Some("rain"));
        assert_eq!(reopened.config().theme.as_deref(), Some("ocean"));
        assert_eq!(reopened.config().fps, Some(45));
        assert_eq!(reopened.config().mouse, Some(false));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(ConfigStore::open(&path).is_err());
    }

    #[test]
    fn test_saved_at_is_iso8601() {
        let stamp = now_iso8601();
        assert!(chrono::DateTime::parse_from_rfc3339(&stamp).is_ok());
    }
}
