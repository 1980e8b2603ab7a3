// src/models.rs

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

use crate::constants::DEFAULT_MAX_RECENT_FILES;

// --- VERSION MODELS ---

/// A TouchDesigner build identifier, ordered by `(major, minor, build)`.
///
/// Accepts the two forms the toolchain emits: `2023.11600` (year + build, the
/// common case) and the fully spelled `2023.1.11600`. A product prefix such as
/// `TouchDesigner.2023.11600` is tolerated and stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BuildVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a valid build version")]
pub struct VersionParseError(pub String);

impl FromStr for BuildVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // Strip a leading product name (`TouchDesigner.`, `TouchPlayer.`).
        let numeric = trimmed
            .char_indices()
            .find(|(_, c)| c.is_ascii_digit())
            .map(|(i, _)| &trimmed[i..])
            .unwrap_or("");

        let parts: Vec<&str> = numeric.split('.').collect();
        let parse = |p: &str| p.parse::<u32>().map_err(|_| VersionParseError(s.to_string()));

        match parts.as_slice() {
            [major, build] => Ok(Self {
                major: parse(major)?,
                minor: 0,
                build: parse(build)?,
            }),
            [major, minor, build] => Ok(Self {
                major: parse(major)?,
                minor: parse(minor)?,
                build: parse(build)?,
            }),
            _ => Err(VersionParseError(s.to_string())),
        }
    }
}

impl fmt::Display for BuildVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minor == 0 {
            write!(f, "{}.{}", self.major, self.build)
        } else {
            write!(f, "{}.{}.{}", self.major, self.minor, self.build)
        }
    }
}

/// One installed TouchDesigner build discovered on the host. The catalog keeps
/// at most one entry per distinct version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledVersion {
    pub version: BuildVersion,
    /// Root of the installation (`.app` bundle on macOS, install dir elsewhere).
    pub install_path: PathBuf,
    /// The executable invoked to open a project file.
    pub executable: PathBuf,
}

// --- RECORD MODELS ---

/// Where a reconciled record was observed. Closed set; merge and render
/// logic match exhaustively on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    LauncherHistory,
    NativeHistory,
    Browsed,
    Template,
}

impl RecordSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::LauncherHistory => "launcher",
            Self::NativeHistory => "td",
            Self::Browsed => "browsed",
            Self::Template => "template",
        }
    }
}

/// A reconciled, deduplicated entry representing one project across possibly
/// many on-disk versioned copies.
///
/// `path` is kept verbatim for launching; `display_path` and `exists` are
/// derived on every reconciliation pass and never cached beyond it.
#[derive(Debug, Clone)]
pub struct ProjectRecord {
    pub id: Uuid,
    pub path: PathBuf,
    pub display_path: String,
    pub source: RecordSource,
    pub last_seen: Option<SystemTime>,
    pub exists: bool,
}

impl ProjectRecord {
    pub fn new(
        path: PathBuf,
        display_path: String,
        source: RecordSource,
        last_seen: Option<SystemTime>,
        exists: bool,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            display_path,
            source,
            last_seen,
            exists,
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// --- PERSISTED CONFIGURATION (config.json) ---

/// A persisted history/template entry. Older documents stored bare path
/// strings; newer ones store objects with a timestamp, so both shapes parse.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StoredEntry {
    Detailed(RecentEntry),
    Bare(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RecentEntry {
    pub path: String,
    /// Seconds since the Unix epoch; 0 when unknown.
    #[serde(default)]
    pub last_opened: f64,
}

impl StoredEntry {
    pub fn new(path: impl Into<String>, last_opened: Option<SystemTime>) -> Self {
        Self::Detailed(RecentEntry {
            path: path.into(),
            last_opened: last_opened.map(epoch_secs).unwrap_or(0.0),
        })
    }

    pub fn path(&self) -> &str {
        match self {
            Self::Detailed(e) => &e.path,
            Self::Bare(p) => p,
        }
    }

    pub fn last_opened(&self) -> f64 {
        match self {
            Self::Detailed(e) => e.last_opened,
            Self::Bare(_) => 0.0,
        }
    }

    pub fn last_seen(&self) -> Option<SystemTime> {
        let secs = self.last_opened();
        if secs > 0.0 && secs.is_finite() {
            Some(UNIX_EPOCH + Duration::from_secs_f64(secs))
        } else {
            None
        }
    }
}

pub fn epoch_secs(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// The launcher's persisted configuration document.
///
/// Missing keys fall back to defaults so documents written by any prior
/// release keep loading.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LauncherConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    /// Recents committed by this launcher, most recent first.
    #[serde(default)]
    pub launcher_recents: Vec<StoredEntry>,
    /// Snapshot of TouchDesigner's own recent files, synced by an external
    /// utility. Used where the native history source is unreadable.
    #[serde(default)]
    pub td_recents: Vec<StoredEntry>,
    /// User-ordered template projects.
    #[serde(default)]
    pub templates: Vec<StoredEntry>,
    #[serde(default = "default_max_recent_files")]
    pub max_recent_files: usize,
    #[serde(default = "default_true")]
    pub confirm_remove_from_list: bool,
    #[serde(default = "default_true")]
    pub show_full_history: bool,
    /// Extra directories to scan for TouchDesigner installations. `~` and
    /// environment variables are expanded.
    #[serde(default)]
    pub install_roots: Vec<String>,
    /// Additional arguments appended to every launch, shell-style quoted.
    #[serde(default)]
    pub extra_launch_args: String,
}

fn default_config_version() -> u32 {
    1
}

fn default_max_recent_files() -> usize {
    DEFAULT_MAX_RECENT_FILES
}

fn default_true() -> bool {
    true
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            version: default_config_version(),
            launcher_recents: Vec::new(),
            td_recents: Vec::new(),
            templates: Vec::new(),
            max_recent_files: default_max_recent_files(),
            confirm_remove_from_list: true,
            show_full_history: true,
            install_roots: Vec::new(),
            extra_launch_args: String::new(),
        }
    }
}

impl LauncherConfig {
    pub fn template_paths(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(StoredEntry::path)
    }

    pub fn td_recent_paths(&self) -> Vec<PathBuf> {
        self.td_recents
            .iter()
            .map(|e| PathBuf::from(e.path()))
            .collect()
    }
}

/// Returns the file modification time, when the file is reachable.
pub fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_build_form() {
        let v: BuildVersion = "2023.11600".parse().unwrap();
        assert_eq!(
            v,
            BuildVersion {
                major: 2023,
                minor: 0,
                build: 11600
            }
        );
        assert_eq!(v.to_string(), "2023.11600");
    }

    #[test]
    fn parses_three_part_form_and_product_prefix() {
        let v: BuildVersion = "TouchDesigner.2025.32280".parse().unwrap();
        assert_eq!(v.major, 2025);
        assert_eq!(v.build, 32280);

        let v: BuildVersion = "2023.1.11600".parse().unwrap();
        assert_eq!(v.minor, 1);
        assert_eq!(v.to_string(), "2023.1.11600");
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<BuildVersion>().is_err());
        assert!("banana".parse::<BuildVersion>().is_err());
        assert!("2023".parse::<BuildVersion>().is_err());
    }

    #[test]
    fn orders_by_year_then_build() {
        let old: BuildVersion = "2022.30000".parse().unwrap();
        let new: BuildVersion = "2023.11600".parse().unwrap();
        assert!(new > old);
    }

    #[test]
    fn stored_entry_parses_both_shapes() {
        let bare: StoredEntry = serde_json::from_str("\"/tmp/a.toe\"").unwrap();
        assert_eq!(bare.path(), "/tmp/a.toe");
        assert_eq!(bare.last_seen(), None);

        let detailed: StoredEntry =
            serde_json::from_str(r#"{"path": "/tmp/b.toe", "last_opened": 100.0}"#).unwrap();
        assert_eq!(detailed.path(), "/tmp/b.toe");
        assert!(detailed.last_seen().is_some());
    }
}
