// src/core/config_store.rs

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::core::paths::{self, PathError};
use crate::models::LauncherConfig;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error(transparent)]
    Path(#[from] PathError),
    #[error("Could not serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("Could not write configuration to '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Loads and persists the launcher's `config.json`.
///
/// Loading never fails: a missing, unreadable or corrupt document yields
/// defaults with a warning, so a broken config behaves like a cold start.
/// Writes are serialized through a lock and go through a sibling temp file
/// so a crash mid-write cannot truncate the document.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Opens the store at the default platform location.
    pub fn open_default() -> Result<Self, StorageError> {
        Ok(Self::at(paths::get_config_file_path()?))
    }

    pub fn at(path: PathBuf) -> Self {
        Self {
            path,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> LauncherConfig {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No config at '{}', starting fresh", self.path.display());
                return LauncherConfig::default();
            }
            Err(err) => {
                log::warn!(
                    "Could not read config at '{}': {err}. Using defaults.",
                    self.path.display()
                );
                return LauncherConfig::default();
            }
        };

        let mut value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(err) => {
                log::warn!(
                    "Config at '{}' is not valid JSON: {err}. Using defaults.",
                    self.path.display()
                );
                return LauncherConfig::default();
            }
        };

        migrate(&mut value);

        match serde_json::from_value(value) {
            Ok(config) => config,
            Err(err) => {
                log::warn!(
                    "Config at '{}' has an unusable shape: {err}. Using defaults.",
                    self.path.display()
                );
                LauncherConfig::default()
            }
        }
    }

    pub fn save(&self, config: &LauncherConfig) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().expect("config write lock");

        let serialized = serde_json::to_string_pretty(config)?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized).map_err(|e| StorageError::Write {
            path: tmp_path.display().to_string(),
            source: e,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|e| StorageError::Write {
            path: self.path.display().to_string(),
            source: e,
        })?;
        log::debug!("Config saved to '{}'", self.path.display());
        Ok(())
    }
}

/// In-place schema migrations for documents written by older releases.
fn migrate(value: &mut serde_json::Value) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    // Early documents called the launcher history "recent_files".
    if !object.contains_key("launcher_recents") {
        if let Some(legacy) = object.remove("recent_files") {
            log::info!("Migrating legacy 'recent_files' history");
            object.insert("launcher_recents".into(), legacy);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoredEntry;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::at(dir.path().join("config.json"))
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = store_in(&dir).load();
        assert!(config.launcher_recents.is_empty());
        assert_eq!(config.max_recent_files, 33);
    }

    #[test]
    fn corrupt_json_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{not json").unwrap();
        let config = store.load();
        assert!(config.launcher_recents.is_empty());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let mut config = LauncherConfig::default();
        config.launcher_recents = vec![StoredEntry::new("/p/show.toe", None)];
        config.max_recent_files = 10;
        store.save(&config).unwrap();

        let loaded = store.load();
        assert_eq!(loaded.max_recent_files, 10);
        assert_eq!(loaded.launcher_recents.len(), 1);
        assert_eq!(loaded.launcher_recents[0].path(), "/p/show.toe");
    }

    #[test]
    fn legacy_recent_files_key_is_migrated() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{"recent_files": ["/p/old.toe", {"path": "/p/new.toe", "last_opened": 1700000000.0}]}"#,
        )
        .unwrap();

        let config = store.load();
        assert_eq!(config.launcher_recents.len(), 2);
        assert_eq!(config.launcher_recents[0].path(), "/p/old.toe");
        assert_eq!(config.launcher_recents[1].path(), "/p/new.toe");
    }

    #[test]
    fn migration_prefers_the_modern_key_when_both_exist() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(
            store.path(),
            r#"{"recent_files": ["/p/old.toe"], "launcher_recents": ["/p/kept.toe"]}"#,
        )
        .unwrap();

        let config = store.load();
        assert_eq!(config.launcher_recents.len(), 1);
        assert_eq!(config.launcher_recents[0].path(), "/p/kept.toe");
    }
}
