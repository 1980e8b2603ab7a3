// src/constants.rs

use std::time::Duration;

/// The name of the launcher configuration directory (under the platform config dir).
pub const CONFIG_DIR_NAME: &str = "td-launcher";

/// The name of the persisted configuration document (inside the config dir).
pub const CONFIG_FILENAME: &str = "config.json";

/// File extension of TouchDesigner project files.
pub const TOE_EXTENSION: &str = "toe";

/// Folder name TouchDesigner uses for automatic project backups.
pub const BACKUP_DIR_NAME: &str = "backup";

/// Grace period before an uninterrupted selection launches automatically.
pub const COUNTDOWN_DURATION: Duration = Duration::from_secs(5);

/// Hard ceiling for a single `toeexpand` probe invocation.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Quiet window used to coalesce rapid re-selections into one probe.
pub const RESOLVE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Default cap on the persisted recent-files list.
pub const DEFAULT_MAX_RECENT_FILES: usize = 33;
