//! Persistent integer settings for the guiding tools.
//!
//! Settings are flat `section.key` integers (e.g. `graph.maxLength`). The
//! [`SettingsStore`] trait is the seam consumers depend on; [`ConfigStorage`]
//! persists to `~/.guidelog/settings.json` by default, and a plain
//! `HashMap<String, i64>` serves as an in-memory store.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Key-value store of integer settings.
pub trait SettingsStore {
    /// Look up a setting, returning `None` if it has never been written.
    fn get_int(&self, key: &str) -> Option<i64>;

    /// Write a setting.
    fn set_int(&mut self, key: &str, value: i64) -> std::io::Result<()>;

    /// Look up a setting, falling back to `default` when absent.
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }
}

impl SettingsStore for HashMap<String, i64> {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) -> std::io::Result<()> {
        self.insert(key.to_string(), value);
        Ok(())
    }
}

/// File-backed settings store.
///
/// Every `set_int` writes the whole map back to disk, so the file is always
/// consistent with what readers observed.
#[derive(Debug, Clone)]
pub struct ConfigStorage {
    /// Root directory for all configuration (e.g., ~/.guidelog)
    root_path: PathBuf,
    values: BTreeMap<String, i64>,
}

impl ConfigStorage {
    /// Open the default store (~/.guidelog), loading any saved settings.
    pub fn new() -> std::io::Result<Self> {
        let home = std::env::var("HOME")
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
        Self::open(PathBuf::from(home).join(".guidelog"))
    }

    /// Open a store rooted at `root_path`, loading `settings.json` if present.
    pub fn open(root_path: PathBuf) -> std::io::Result<Self> {
        let mut storage = Self::with_path(root_path);
        let path = storage.settings_path();
        if path.exists() {
            let json = std::fs::read_to_string(&path)?;
            storage.values = serde_json::from_str(&json)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        }
        Ok(storage)
    }

    /// Create an empty store with a custom root path, without reading disk.
    pub fn with_path(root_path: PathBuf) -> Self {
        Self {
            root_path,
            values: BTreeMap::new(),
        }
    }

    /// Get the root configuration path
    pub fn root_path(&self) -> &Path {
        &self.root_path
    }

    /// Path of the settings file inside the root directory
    pub fn settings_path(&self) -> PathBuf {
        self.root_path.join("settings.json")
    }

    /// Write all settings to disk, creating the root directory if needed.
    pub fn save(&self) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(&self.root_path)?;

        let path = self.settings_path();
        let json = serde_json::to_string_pretty(&self.values)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// List stored keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl SettingsStore for ConfigStorage {
    fn get_int(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }

    fn set_int(&mut self, key: &str, value: i64) -> std::io::Result<()> {
        self.values.insert(key.to_string(), value);
        self.save().map(|_| ())
    }
}

impl Default for ConfigStorage {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self::with_path(PathBuf::from(".guidelog")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_path() {
        let storage = ConfigStorage::with_path(PathBuf::from("/tmp/guidelog_cfg"));
        assert!(storage.settings_path().ends_with("settings.json"));
        assert_eq!(storage.root_path(), Path::new("/tmp/guidelog_cfg"));
    }

    #[test]
    fn test_missing_key_uses_default() {
        let storage = ConfigStorage::with_path(PathBuf::from("/nonexistent"));
        assert_eq!(storage.get_int("graph.maxLength"), None);
        assert_eq!(storage.get_int_or("graph.maxLength", 400), 400);
    }

    #[test]
    fn test_set_persists_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("cfg");

        let mut storage = ConfigStorage::open(root.clone()).unwrap();
        storage.set_int("graph.minLength", 25).unwrap();
        storage.set_int("graph.maxLength", 800).unwrap();
        assert!(storage.settings_path().exists());

        let reloaded = ConfigStorage::open(root).unwrap();
        assert_eq!(reloaded.get_int("graph.minLength"), Some(25));
        assert_eq!(reloaded.get_int("graph.maxLength"), Some(800));
        let keys: Vec<_> = reloaded.keys().collect();
        assert_eq!(keys, vec!["graph.maxLength", "graph.minLength"]);
    }

    #[test]
    fn test_corrupt_settings_file_is_invalid_data() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "not json").unwrap();

        let err = ConfigStorage::open(temp_dir.path().to_path_buf()).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_hashmap_store() {
        let mut store: HashMap<String, i64> = HashMap::new();
        assert_eq!(store.get_int_or("graph.minHeight", 1), 1);
        store.set_int("graph.minHeight", 2).unwrap();
        assert_eq!(store.get_int("graph.minHeight"), Some(2));
    }
}
