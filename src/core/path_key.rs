// src/core/path_key.rs

use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::constants::BACKUP_DIR_NAME;

lazy_static! {
    /// Matches versioned project file names like `project.7.toe`.
    static ref VERSION_SUFFIX: Regex =
        Regex::new(r"(?i)^(?P<stem>.+)\.(?P<num>\d+)\.toe$").expect("static regex");
}

/// A canonical identity key for a filesystem path.
///
/// Lower-cased, slash-normalized and version-suffix-stripped, so that paths
/// differing only in case, separator style or `.N.toe` revision compare equal.
/// Case folding is applied on every platform to keep cross-source merges
/// deterministic. Normalization never fails: malformed paths normalize to
/// themselves with separators unified.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathKey(String);

impl PathKey {
    pub fn normalize(path: &Path) -> Self {
        let simplified = dunce::simplified(path);
        let mut unified = String::with_capacity(simplified.as_os_str().len());

        // Unify separators and collapse runs of them.
        let mut last_was_sep = false;
        for c in simplified.to_string_lossy().chars() {
            let is_sep = c == '/' || c == '\\';
            if is_sep {
                if !last_was_sep {
                    unified.push('/');
                }
            } else {
                for lower in c.to_lowercase() {
                    unified.push(lower);
                }
            }
            last_was_sep = is_sep;
        }

        // Drop a trailing separator, but keep a bare root.
        if unified.len() > 1 && unified.ends_with('/') {
            unified.pop();
        }

        // Strip the version suffix from the final component.
        let key = match unified.rsplit_once('/') {
            Some((dir, name)) => match strip_version_suffix(name) {
                Some(stripped) => format!("{dir}/{stripped}"),
                None => unified,
            },
            None => strip_version_suffix(&unified).unwrap_or(unified),
        };

        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Project identity for display and dedup purposes: the directory key plus
/// the suffix-stripped file name. Two on-disk revisions of the same project
/// (`show.toe`, `show.7.toe`, `Backup/show.3.toe` next to it) share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionedKey {
    pub directory: PathKey,
    pub base_name: String,
}

impl VersionedKey {
    pub fn of(path: &Path) -> Self {
        let full = PathKey::normalize(path);
        let (dir, name) = match full.as_str().rsplit_once('/') {
            Some((d, n)) => (d.to_string(), n.to_string()),
            None => (String::new(), full.as_str().to_string()),
        };
        Self {
            directory: PathKey(dir),
            base_name: name,
        }
    }
}

/// `project.7.toe` -> `Some("project.toe")`; non-versioned names -> `None`.
pub fn strip_version_suffix(file_name: &str) -> Option<String> {
    VERSION_SUFFIX
        .captures(file_name)
        .map(|caps| format!("{}.toe", &caps["stem"]))
}

/// The integer revision of a versioned file name, if it has one.
pub fn version_suffix(file_name: &str) -> Option<u64> {
    VERSION_SUFFIX
        .captures(file_name)
        .and_then(|caps| caps["num"].parse().ok())
}

/// Whether the file sits in a TouchDesigner `Backup/` folder.
pub fn is_backup_path(path: &Path) -> bool {
    path.parent()
        .and_then(Path::file_name)
        .map(|dir| dir.to_string_lossy().eq_ignore_ascii_case(BACKUP_DIR_NAME))
        .unwrap_or(false)
}

/// Derived presentation path: version suffix stripped, `Backup/` prefix
/// applied for backup copies. The verbatim path stays untouched for launch.
pub fn display_path(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    match strip_version_suffix(&file_name) {
        Some(_) if is_backup_path(path) => format!("Backup/{file_name}"),
        Some(stripped) => path
            .parent()
            .map(|dir| dir.join(&stripped))
            .unwrap_or_else(|| PathBuf::from(&stripped))
            .display()
            .to_string(),
        None => path.display().to_string(),
    }
}
