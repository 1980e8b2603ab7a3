// src/state.rs

use std::path::PathBuf;

use crate::core::config_store::{ConfigStore, StorageError};
use crate::core::history;
use crate::core::sequencer::LaunchSequencer;
use crate::models::{LauncherConfig, ProjectRecord};
use crate::system::native_recents::{self, NativeRecents};

/// Represents the state of the persisted configuration.
/// It holds the current state and, optionally, a snapshot of the original
/// state before the first mutation occurred.
enum ConfigState {
    /// The state is clean, no mutations have been requested yet.
    Pristine(LauncherConfig),
    /// A mutation has been requested. We now hold both the original snapshot
    /// and the current, mutable state.
    Dirty {
        original: LauncherConfig,
        current: LauncherConfig,
    },
}

/// Everything one command invocation works against: the persisted config
/// with journaled mutation tracking, the reconciled project list for this
/// session and the launch sequencer. Passed down explicitly; there is no
/// global state.
pub struct AppContext {
    store: ConfigStore,
    state: ConfigState,
    pub sequencer: LaunchSequencer,
    records: Vec<ProjectRecord>,
    browsed: Vec<PathBuf>,
}

impl AppContext {
    /// Loads the context from the default config location. A missing or
    /// unreadable document behaves like a cold start.
    pub fn load() -> Result<Self, StorageError> {
        Ok(Self::with_store(ConfigStore::open_default()?))
    }

    pub fn with_store(store: ConfigStore) -> Self {
        let config = store.load();
        Self {
            store,
            state: ConfigState::Pristine(config),
            sequencer: LaunchSequencer::new(),
            records: Vec::new(),
            browsed: Vec::new(),
        }
    }

    pub fn config(&self) -> &LauncherConfig {
        match &self.state {
            ConfigState::Pristine(config) => config,
            ConfigState::Dirty { current, .. } => current,
        }
    }

    /// Hands out mutable access, transitioning to `Dirty` on first use so
    /// `needs_saving` can compare against the original snapshot.
    pub fn config_mut(&mut self) -> &mut LauncherConfig {
        if let ConfigState::Pristine(_) = self.state {
            self.state = match std::mem::replace(
                &mut self.state,
                ConfigState::Pristine(LauncherConfig::default()),
            ) {
                ConfigState::Pristine(config) => ConfigState::Dirty {
                    original: config.clone(),
                    current: config,
                },
                ConfigState::Dirty { .. } => unreachable!(),
            };
        }
        match &mut self.state {
            ConfigState::Dirty { current, .. } => current,
            ConfigState::Pristine(_) => unreachable!(),
        }
    }

    /// Checks if the config needs to be saved by comparing the current state
    /// against the original snapshot, if one exists.
    pub fn needs_saving(&self) -> bool {
        match &self.state {
            ConfigState::Pristine(_) => false,
            ConfigState::Dirty { original, current } => original != current,
        }
    }

    /// Writes the config back if anything changed, returning to pristine.
    pub fn persist(&mut self) -> Result<(), StorageError> {
        if !self.needs_saving() {
            return Ok(());
        }
        self.store.save(self.config())?;
        let current = self.config().clone();
        self.state = ConfigState::Pristine(current);
        Ok(())
    }

    /// Remembers a file the user browsed to. Session-only: it enters the
    /// persisted history when a launch commits, not before.
    pub fn note_browsed(&mut self, path: PathBuf) {
        if !self.browsed.contains(&path) {
            self.browsed.push(path);
        }
    }

    /// Rebuilds the reconciled project list from the launcher history, the
    /// native history and this session's browsed files.
    pub fn refresh_records(&mut self, native: &dyn NativeRecents) {
        let native_paths = native_recents::native_recent_paths(native, self.config());
        self.records = history::reconcile(
            &self.config().launcher_recents,
            &native_paths,
            &self.browsed,
        );
    }

    pub fn records(&self) -> &[ProjectRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::{Duration, SystemTime};

    fn context() -> (tempfile::TempDir, AppContext) {
        let dir = tempfile::tempdir().unwrap();
        let ctx = AppContext::with_store(ConfigStore::at(dir.path().join("config.json")));
        (dir, ctx)
    }

    #[test]
    fn untouched_context_never_saves() {
        let (_dir, ctx) = context();
        assert!(!ctx.needs_saving());
    }

    #[test]
    fn a_real_mutation_marks_the_context_dirty() {
        let (_dir, mut ctx) = context();
        history::commit_launch(
            ctx.config_mut(),
            Path::new("/p/show.toe"),
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        );
        assert!(ctx.needs_saving());
    }

    #[test]
    fn a_mutation_that_changes_nothing_does_not_save() {
        let (_dir, mut ctx) = context();
        ctx.config_mut().max_recent_files = LauncherConfig::default().max_recent_files;
        assert!(!ctx.needs_saving());
    }

    #[test]
    fn a_full_launch_flow_commits_exactly_one_history_entry() {
        use std::time::Instant;

        use crate::core::resolver::Ticket;
        use crate::core::sequencer::LaunchState;
        use crate::models::RecordSource;

        let (_dir, mut ctx) = context();
        let path = PathBuf::from("/projects/show.toe");
        let record = ProjectRecord::new(
            path.clone(),
            path.display().to_string(),
            RecordSource::Browsed,
            None,
            true,
        );

        let ticket = Ticket::of(1);
        ctx.sequencer.select(record, ticket);
        ctx.sequencer
            .resolution_settled(ticket, Ok("2023.11600".parse().unwrap()));

        let start = Instant::now();
        let handle = ctx.sequencer.begin_countdown(start).unwrap();

        // Ctrl+C two seconds in: the countdown disarms, the timer must not
        // fire later, and nothing has touched the history yet.
        assert!(ctx.sequencer.interrupt());
        assert!(!ctx.sequencer.countdown_fired(handle));
        assert_eq!(ctx.sequencer.state(), LaunchState::Selected);
        assert!(ctx.config().launcher_recents.is_empty());

        ctx.sequencer.override_version("2022.30000".parse().unwrap());
        assert_eq!(
            ctx.sequencer.effective_version(),
            Some("2022.30000".parse().unwrap())
        );

        assert!(ctx.sequencer.launch_now());
        assert_eq!(ctx.sequencer.state(), LaunchState::Launching);
        history::commit_launch(
            ctx.config_mut(),
            &path,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
        );

        assert_eq!(ctx.config().launcher_recents.len(), 1);
        assert_eq!(
            ctx.config().launcher_recents[0].path(),
            path.to_string_lossy()
        );
    }

    #[test]
    fn persist_round_trips_and_returns_to_pristine() {
        let (_dir, mut ctx) = context();
        ctx.config_mut().max_recent_files = 7;
        ctx.persist().unwrap();
        assert!(!ctx.needs_saving());

        let reloaded = AppContext::with_store(ConfigStore::at(ctx.store.path().to_path_buf()));
        assert_eq!(reloaded.config().max_recent_files, 7);
    }
}
