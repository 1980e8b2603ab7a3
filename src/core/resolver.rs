// src/core/resolver.rs

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::watch;

use crate::constants::RESOLVE_DEBOUNCE;
use crate::core::path_key::PathKey;
use crate::models::{BuildVersion, modified_time};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The probe tool errored, timed out or produced unusable output.
    /// Reported inline; retrying is a fresh user-triggered attempt.
    #[error("version probe failed: {0}")]
    ProbeFailed(String),
    /// The project file itself could not be read.
    #[error("project file is not readable: {0}")]
    Unreadable(String),
}

/// The version-probe collaborator: project file in, required build out.
pub trait VersionProbe: Send + Sync + 'static {
    fn probe(&self, path: &Path)
    -> impl Future<Output = Result<BuildVersion, ResolveError>> + Send;
}

/// Identifies one resolution request. Every new selection takes a fresh
/// ticket; results belonging to a superseded ticket are dropped on arrival.
/// The default ticket stands in when no probe tool is available at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ticket(u64);

#[cfg(test)]
impl Ticket {
    pub(crate) fn of(value: u64) -> Self {
        Self(value)
    }
}

type ProbeSlot = Option<Result<BuildVersion, ResolveError>>;

struct CacheEntry {
    mtime: SystemTime,
    version: BuildVersion,
}

/// Resolves which build a project file requires, wrapping the probe with a
/// cache, per-path in-flight deduplication and selection debouncing.
///
/// - Cache entries are keyed by normalized path and validated against the
///   file's modification time; a changed mtime invalidates.
/// - At most one probe runs per path: a second request for the same path
///   attaches to the pending result instead of spawning a duplicate.
/// - Rapid re-selections coalesce: a request waits a short quiet window and
///   aborts if a newer ticket exists, and results arriving for superseded
///   tickets are discarded rather than applied. The probe process itself is
///   never killed.
pub struct VersionResolver<P> {
    probe: Arc<P>,
    debounce: Duration,
    cache: Arc<Mutex<HashMap<PathKey, CacheEntry>>>,
    inflight: Arc<Mutex<HashMap<PathKey, watch::Receiver<ProbeSlot>>>>,
    latest: Arc<AtomicU64>,
}

impl<P> std::fmt::Debug for VersionResolver<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionResolver")
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

impl<P: VersionProbe> VersionResolver<P> {
    pub fn new(probe: P) -> Self {
        Self::with_debounce(probe, RESOLVE_DEBOUNCE)
    }

    pub fn with_debounce(probe: P, debounce: Duration) -> Self {
        Self {
            probe: Arc::new(probe),
            debounce,
            cache: Arc::new(Mutex::new(HashMap::new())),
            inflight: Arc::new(Mutex::new(HashMap::new())),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Takes a fresh ticket, superseding every request issued before it.
    pub fn request(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn is_superseded(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) != ticket.0
    }

    /// Resolves the required build for `path`. Returns `None` when the
    /// request was superseded and its result discarded.
    pub async fn resolve(
        &self,
        path: &Path,
        ticket: Ticket,
    ) -> Option<Result<BuildVersion, ResolveError>> {
        let key = PathKey::normalize(path);

        let Some(mtime) = modified_time(path) else {
            return self.deliver(
                ticket,
                Err(ResolveError::Unreadable(path.display().to_string())),
            );
        };

        if let Some(version) = self.cache_lookup(&key, mtime) {
            log::debug!("Resolution cache hit for '{}'", key.as_str());
            return self.deliver(ticket, Ok(version));
        }

        // Quiet window: arrow-key style re-selection supersedes this ticket
        // before a probe is ever spawned.
        tokio::time::sleep(self.debounce).await;
        if self.is_superseded(ticket) {
            log::debug!("Resolution for '{}' superseded before probing", key.as_str());
            return None;
        }

        let mut rx = self.subscribe_or_spawn(key, path.to_path_buf(), mtime);
        let result = match rx.wait_for(Option::is_some).await {
            Ok(slot) => slot.clone().unwrap_or_else(|| {
                Err(ResolveError::ProbeFailed("probe produced no result".into()))
            }),
            Err(_) => Err(ResolveError::ProbeFailed("probe task vanished".into())),
        };
        self.deliver(ticket, result)
    }

    fn deliver(
        &self,
        ticket: Ticket,
        result: Result<BuildVersion, ResolveError>,
    ) -> Option<Result<BuildVersion, ResolveError>> {
        if self.is_superseded(ticket) {
            log::debug!("Dropping superseded resolution result");
            None
        } else {
            Some(result)
        }
    }

    /// Attaches to the pending probe for this path, or spawns one.
    fn subscribe_or_spawn(
        &self,
        key: PathKey,
        path: PathBuf,
        mtime: SystemTime,
    ) -> watch::Receiver<ProbeSlot> {
        let mut inflight = self.inflight.lock().expect("inflight lock");
        if let Some(rx) = inflight.get(&key) {
            log::debug!("Attaching to in-flight probe for '{}'", key.as_str());
            return rx.clone();
        }

        let (tx, rx) = watch::channel(None);
        inflight.insert(key.clone(), rx.clone());
        drop(inflight);

        let probe = Arc::clone(&self.probe);
        let cache = Arc::clone(&self.cache);
        let inflight_map = Arc::clone(&self.inflight);
        tokio::spawn(async move {
            let result = probe.probe(&path).await;
            if let Ok(version) = &result {
                cache
                    .lock()
                    .expect("cache lock")
                    .insert(key.clone(), CacheEntry {
                        mtime,
                        version: *version,
                    });
            }
            inflight_map.lock().expect("inflight lock").remove(&key);
            let _ = tx.send(Some(result));
        });
        rx
    }

    fn cache_lookup(&self, key: &PathKey, mtime: SystemTime) -> Option<BuildVersion> {
        let cache = self.cache.lock().expect("cache lock");
        cache
            .get(key)
            .filter(|entry| entry.mtime == mtime)
            .map(|entry| entry.version)
    }

    #[cfg(test)]
    fn cache_insert(&self, key: PathKey, mtime: SystemTime, version: BuildVersion) {
        self.cache
            .lock()
            .expect("cache lock")
            .insert(key, CacheEntry { mtime, version });
    }
}
