// src/core/history.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rayon::prelude::*;

use crate::core::path_key::{self, PathKey, VersionedKey};
use crate::models::{LauncherConfig, ProjectRecord, RecordSource, StoredEntry};

/// Merges the launcher's own history, TouchDesigner's native recents and
/// session-only browsed files into one deduplicated, ordered list.
///
/// Identity is the versioned key: `show.toe`, `show.5.toe` and `SHOW.TOE`
/// in the same directory are one project. Within a group the native source
/// wins, and among the observed path variants the suffix-free file is
/// preferred when it exists on disk, else the highest existing version
/// suffix, else the first variant observed.
pub fn reconcile(
    launcher: &[StoredEntry],
    native: &[PathBuf],
    browsed: &[PathBuf],
) -> Vec<ProjectRecord> {
    let mut order: Vec<VersionedKey> = Vec::new();
    let mut groups: HashMap<VersionedKey, Group> = HashMap::new();

    for path in native {
        merge(&mut order, &mut groups, path, RecordSource::NativeHistory, None);
    }
    // Launcher entries are stored most-recent-first; iteration order keeps
    // launcher-only projects behind every native one.
    for entry in launcher {
        merge(
            &mut order,
            &mut groups,
            Path::new(entry.path()),
            RecordSource::LauncherHistory,
            entry.last_seen(),
        );
    }
    for path in browsed {
        merge(&mut order, &mut groups, path, RecordSource::Browsed, None);
    }

    let records: Vec<(VersionedKey, PathBuf, RecordSource, Option<SystemTime>)> = order
        .into_iter()
        .filter_map(|key| {
            let group = groups.remove(&key)?;
            let path = pick_variant(&group.variants);
            Some((key, path, group.source, group.last_seen))
        })
        .collect();

    // Existence probes touch the filesystem once per record; batch them.
    records
        .into_par_iter()
        .map(|(_, path, source, last_seen)| {
            let exists = path.is_file();
            let display_path = path_key::display_path(&path);
            ProjectRecord::new(path, display_path, source, last_seen, exists)
        })
        .collect()
}

fn file_name(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

struct Group {
    source: RecordSource,
    last_seen: Option<SystemTime>,
    variants: Vec<PathBuf>,
}

fn merge(
    order: &mut Vec<VersionedKey>,
    groups: &mut HashMap<VersionedKey, Group>,
    path: &Path,
    source: RecordSource,
    last_seen: Option<SystemTime>,
) {
    let key = VersionedKey::of(path);
    match groups.get_mut(&key) {
        Some(group) => {
            if !group.variants.iter().any(|v| v == path) {
                group.variants.push(path.to_path_buf());
            }
            // Native identity wins a collision; sources merged later never
            // demote it, they only contribute path variants.
            if group.source != RecordSource::NativeHistory && group.last_seen.is_none() {
                group.last_seen = last_seen;
            }
        }
        None => {
            order.push(key.clone());
            groups.insert(key, Group {
                source,
                last_seen,
                variants: vec![path.to_path_buf()],
            });
        }
    }
}

/// Chooses which observed path variant represents the group.
fn pick_variant(variants: &[PathBuf]) -> PathBuf {
    // Suffix-free sibling first, even when only versioned names were
    // observed: `show.5.toe` in history often means `show.toe` on disk.
    let mut candidates: Vec<PathBuf> = Vec::new();
    for variant in variants {
        if let Some(base) = path_key::strip_version_suffix(file_name(variant)) {
            let sibling = variant
                .parent()
                .map_or_else(|| PathBuf::from(&base), |dir| dir.join(&base));
            if !candidates.contains(&sibling) {
                candidates.push(sibling);
            }
        }
    }
    for candidate in &candidates {
        if candidate.is_file() {
            return candidate.clone();
        }
    }
    for variant in variants {
        if path_key::version_suffix(file_name(variant)).is_none() && variant.is_file() {
            return variant.clone();
        }
    }

    let mut versioned: Vec<&PathBuf> = variants
        .iter()
        .filter(|v| path_key::version_suffix(file_name(v)).is_some() && v.is_file())
        .collect();
    versioned.sort_by_key(|v| path_key::version_suffix(file_name(v)));
    if let Some(highest) = versioned.last() {
        return (*highest).clone();
    }

    variants
        .first()
        .cloned()
        .unwrap_or_default()
}

/// Records a successful launch in the launcher history: dedup by versioned
/// key, insert at the front, evict beyond `max_recent_files`.
pub fn commit_launch(config: &mut LauncherConfig, path: &Path, now: SystemTime) {
    let key = VersionedKey::of(path);
    config
        .launcher_recents
        .retain(|entry| VersionedKey::of(Path::new(entry.path())) != key);
    config
        .launcher_recents
        .insert(0, StoredEntry::new(path.to_string_lossy(), Some(now)));
    config
        .launcher_recents
        .sort_by(|a, b| b.last_opened().total_cmp(&a.last_opened()));
    config.launcher_recents.truncate(config.max_recent_files);
}

/// Drops every stored entry matching `path` by versioned key.
pub fn remove_path(config: &mut LauncherConfig, path: &Path) -> bool {
    let key = VersionedKey::of(path);
    let before = config.launcher_recents.len();
    config
        .launcher_recents
        .retain(|entry| VersionedKey::of(Path::new(entry.path())) != key);
    config.launcher_recents.len() != before
}

/// Drops stored entries whose file (and versioned siblings) no longer
/// exists. Returns how many entries were removed.
pub fn clear_missing(config: &mut LauncherConfig) -> usize {
    let before = config.launcher_recents.len();
    config.launcher_recents.retain(|entry| {
        let path = Path::new(entry.path());
        if path.is_file() {
            return true;
        }
        if let Some(base) = path_key::strip_version_suffix(file_name(path)) {
            let sibling = path
                .parent()
                .map_or_else(|| PathBuf::from(&base), |dir| dir.join(&base));
            if sibling.is_file() {
                return true;
            }
        }
        false
    });
    before - config.launcher_recents.len()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Appends a template unless one with the same versioned key is present.
pub fn add_template(config: &mut LauncherConfig, path: &Path) -> bool {
    let key = VersionedKey::of(path);
    let present = config
        .templates
        .iter()
        .any(|entry| VersionedKey::of(Path::new(entry.path())) == key);
    if present {
        return false;
    }
    config
        .templates
        .push(StoredEntry::new(path.to_string_lossy(), None));
    true
}

pub fn remove_template(config: &mut LauncherConfig, path: &Path) -> bool {
    let key = VersionedKey::of(path);
    let before = config.templates.len();
    config
        .templates
        .retain(|entry| VersionedKey::of(Path::new(entry.path())) != key);
    config.templates.len() != before
}

/// Moves a template one slot up or down, wrapping around at the ends.
pub fn move_template(config: &mut LauncherConfig, path: &Path, direction: MoveDirection) -> bool {
    let key = VersionedKey::of(path);
    let Some(index) = config
        .templates
        .iter()
        .position(|entry| VersionedKey::of(Path::new(entry.path())) == key)
    else {
        return false;
    };
    let len = config.templates.len();
    if len < 2 {
        return true;
    }
    let target = match direction {
        MoveDirection::Up => (index + len - 1) % len,
        MoveDirection::Down => (index + 1) % len,
    };
    let entry = config.templates.remove(index);
    config.templates.insert(target, entry);
    true
}
