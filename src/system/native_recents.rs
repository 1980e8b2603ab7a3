// src/system/native_recents.rs

use std::collections::HashSet;
use std::path::PathBuf;

use crate::models::LauncherConfig;

/// Source of TouchDesigner's own recent-file history, outside the
/// launcher's control and treated as read-only.
pub trait NativeRecents {
    fn recent_projects(&self) -> Vec<PathBuf>;
}

/// The platform-native history. On macOS this reads the shared-file-list
/// document TouchDesigner maintains; elsewhere there is no readable native
/// source and the synced snapshot in the config carries the history.
#[derive(Debug, Default)]
pub struct SystemRecents;

impl NativeRecents for SystemRecents {
    fn recent_projects(&self) -> Vec<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            read_shared_file_list().unwrap_or_default()
        }
        #[cfg(not(target_os = "macos"))]
        {
            Vec::new()
        }
    }
}

/// Native history merged with the snapshot synced into the config document.
/// The snapshot covers installs where the shared file list is unreadable.
pub fn native_recent_paths(source: &dyn NativeRecents, config: &LauncherConfig) -> Vec<PathBuf> {
    let mut paths = source.recent_projects();
    let mut seen: HashSet<PathBuf> = paths.iter().cloned().collect();
    for path in config.td_recent_paths() {
        if seen.insert(path.clone()) {
            paths.push(path);
        }
    }
    paths
}

#[cfg(target_os = "macos")]
fn shared_file_list_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| {
        home.join("Library/Application Support/com.apple.sharedfilelist")
            .join("com.apple.LSSharedFileList.ApplicationRecentDocuments")
            .join("ca.derivative.touchdesigner.sfl4")
    })
}

#[cfg(target_os = "macos")]
fn read_shared_file_list() -> Option<Vec<PathBuf>> {
    let path = shared_file_list_path()?;
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(err) => {
            log::debug!("Could not read shared file list at '{}': {err}", path.display());
            return None;
        }
    };
    Some(extract_bookmark_paths(&bytes))
}

/// Pulls file paths out of the bookmark blobs embedded in a shared-file-list
/// document, newest first, without a plist parser: each blob starts with a
/// `book` magic, and the path components inside it are printable fragments
/// preceding a `file:///` marker.
pub fn extract_bookmark_paths(data: &[u8]) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut seen = HashSet::new();

    for blob in split_on_magic(data) {
        if let Some(path) = extract_path_from_bookmark(blob) {
            if seen.insert(path.clone()) {
                paths.push(PathBuf::from(path));
            }
        }
    }
    paths
}

const BOOKMARK_MAGIC: &[u8] = b"book";

/// Slices `data` into one chunk per `book` magic occurrence.
fn split_on_magic(data: &[u8]) -> Vec<&[u8]> {
    let mut starts: Vec<usize> = data
        .windows(BOOKMARK_MAGIC.len())
        .enumerate()
        .filter(|(_, w)| *w == BOOKMARK_MAGIC)
        .map(|(i, _)| i)
        .collect();
    starts.dedup();

    let mut blobs = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(data.len());
        blobs.push(&data[start..end]);
    }
    blobs
}

/// Rebuilds one absolute path from a single bookmark blob. Splits the blob
/// on non-printable runs, drops `book`-prefixed fragments, takes the
/// components before the `file:///` boundary, finds the file name (last
/// fragment with a short alphanumeric extension) and anchors the walk on a
/// known macOS root directory to skip header noise.
fn extract_path_from_bookmark(blob: &[u8]) -> Option<String> {
    const ROOT_DIRS: &[&str] = &[
        "Users", "Volumes", "Applications", "Library", "System", "private", "tmp", "var", "opt",
        "usr", "etc", "Network", "bin", "sbin", "cores", "dev",
    ];

    let components: Vec<String> = blob
        .split(|b| !(0x20..=0x7e).contains(b))
        .filter(|frag| !frag.is_empty())
        .map(|frag| frag.iter().map(|&b| b as char).collect::<String>())
        .filter(|frag| !frag[..frag.len().min(4)].eq_ignore_ascii_case("book"))
        .collect();

    let candidates: &[String] = match components.iter().position(|c| c.as_str() == "file:///") {
        Some(idx) => &components[..idx],
        None => &components,
    };

    let filename_idx = candidates.iter().rposition(|comp| {
        comp.rsplit_once('.').is_some_and(|(stem, ext)| {
            !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
    })?;

    let start_idx = candidates[..filename_idx]
        .iter()
        .position(|comp| ROOT_DIRS.contains(&comp.as_str()))?;

    let parts = &candidates[start_idx..=filename_idx];
    if parts.len() >= 2 {
        Some(format!("/{}", parts.join("/")))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a synthetic bookmark blob: printable fragments separated by
    /// non-printable filler, the way path components sit in real bookmarks.
    fn blob(fragments: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for fragment in fragments {
            bytes.extend_from_slice(fragment.as_bytes());
            bytes.extend_from_slice(&[0x00, 0x08, 0x01]);
        }
        bytes
    }

    #[test]
    fn path_components_before_the_url_marker_are_joined() {
        let data = blob(&[
            "book", "Users", "vj", "shows", "intro.toe", "file:///", "Users/vj/ignored",
        ]);
        let paths = extract_bookmark_paths(&data);
        assert_eq!(paths, vec![PathBuf::from("/Users/vj/shows/intro.toe")]);
    }

    #[test]
    fn header_noise_before_the_root_anchor_is_skipped() {
        let data = blob(&["book", "0A=#", "x!", "Users", "vj", "show.toe"]);
        let paths = extract_bookmark_paths(&data);
        assert_eq!(paths, vec![PathBuf::from("/Users/vj/show.toe")]);
    }

    #[test]
    fn a_blob_without_a_usable_filename_yields_nothing() {
        let data = blob(&["book", "Users", "vj", "no_extension_here"]);
        assert!(extract_bookmark_paths(&data).is_empty());
    }

    #[test]
    fn multiple_bookmarks_come_back_in_order_without_duplicates() {
        let mut data = blob(&["book", "Users", "vj", "a.toe"]);
        data.extend(blob(&["book", "Users", "vj", "b.toe"]));
        data.extend(blob(&["book", "Users", "vj", "a.toe"]));

        let paths = extract_bookmark_paths(&data);
        assert_eq!(
            paths,
            vec![PathBuf::from("/Users/vj/a.toe"), PathBuf::from("/Users/vj/b.toe")]
        );
    }

    #[test]
    fn snapshot_entries_extend_the_native_list_without_duplicates() {
        struct Fixed(Vec<PathBuf>);
        impl NativeRecents for Fixed {
            fn recent_projects(&self) -> Vec<PathBuf> {
                self.0.clone()
            }
        }

        let mut config = LauncherConfig::default();
        config.td_recents = vec![
            crate::models::StoredEntry::new("/p/a.toe", None),
            crate::models::StoredEntry::new("/p/c.toe", None),
        ];
        let native = Fixed(vec![PathBuf::from("/p/a.toe"), PathBuf::from("/p/b.toe")]);

        let merged = native_recent_paths(&native, &config);
        assert_eq!(
            merged,
            vec![
                PathBuf::from("/p/a.toe"),
                PathBuf::from("/p/b.toe"),
                PathBuf::from("/p/c.toe"),
            ]
        );
    }
}
