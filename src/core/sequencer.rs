// src/core/sequencer.rs

use std::time::Instant;

use crate::constants::COUNTDOWN_DURATION;
use crate::core::resolver::{ResolveError, Ticket};
use crate::models::{BuildVersion, ProjectRecord};

/// Lifecycle of a launch attempt. `Cancelled` is terminal for the session;
/// a new selection starts a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchState {
    Idle,
    Selected,
    Countdown,
    Launching,
    Cancelled,
}

/// One selected project on its way to launch, together with whatever the
/// resolver and the user have decided about the build to use.
#[derive(Debug, Clone)]
pub struct LaunchSession {
    pub record: ProjectRecord,
    pub ticket: Ticket,
    pub resolved: Option<BuildVersion>,
    pub resolve_error: Option<ResolveError>,
    pub override_version: Option<BuildVersion>,
    pub deadline: Option<Instant>,
}

/// A live countdown. The generation pins it to one `begin_countdown` call:
/// a timer that fires after an interrupt presents a stale generation and is
/// ignored.
#[derive(Debug, Clone, Copy)]
pub struct CountdownHandle {
    pub generation: u64,
    pub deadline: Instant,
}

/// Drives a selection through resolve, countdown and launch, absorbing
/// interruption at any point before the launch actually starts.
#[derive(Debug)]
pub struct LaunchSequencer {
    state: LaunchState,
    session: Option<LaunchSession>,
    generation: u64,
}

impl Default for LaunchSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl LaunchSequencer {
    pub fn new() -> Self {
        Self {
            state: LaunchState::Idle,
            session: None,
            generation: 0,
        }
    }

    pub fn state(&self) -> LaunchState {
        self.state
    }

    pub fn session(&self) -> Option<&LaunchSession> {
        self.session.as_ref()
    }

    /// Starts a fresh session for `record`. Any previous session, counting
    /// down or not, is discarded; its timers die by generation mismatch.
    pub fn select(&mut self, record: ProjectRecord, ticket: Ticket) {
        self.generation += 1;
        self.session = Some(LaunchSession {
            record,
            ticket,
            resolved: None,
            resolve_error: None,
            override_version: None,
            deadline: None,
        });
        self.state = LaunchState::Selected;
    }

    /// Applies a resolver outcome to the current session. Outcomes for a
    /// different ticket belong to an abandoned selection and are dropped.
    pub fn resolution_settled(
        &mut self,
        ticket: Ticket,
        outcome: Result<BuildVersion, ResolveError>,
    ) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.ticket != ticket {
            log::debug!("Ignoring resolution for an abandoned selection");
            return;
        }
        match outcome {
            Ok(version) => {
                session.resolved = Some(version);
                session.resolve_error = None;
            }
            Err(err) => {
                session.resolved = None;
                session.resolve_error = Some(err);
            }
        }
    }

    /// The user picked a build explicitly, taking precedence over whatever
    /// the resolver found.
    pub fn override_version(&mut self, version: BuildVersion) {
        if let Some(session) = self.session.as_mut() {
            session.override_version = Some(version);
        }
    }

    /// The build the launch will actually use.
    pub fn effective_version(&self) -> Option<BuildVersion> {
        let session = self.session.as_ref()?;
        session.override_version.or(session.resolved)
    }

    /// Arms the countdown. Returns `None` when nothing is selected.
    pub fn begin_countdown(&mut self, now: Instant) -> Option<CountdownHandle> {
        match self.state {
            LaunchState::Selected | LaunchState::Countdown => {}
            _ => return None,
        }
        let session = self.session.as_mut()?;
        let deadline = now + COUNTDOWN_DURATION;
        session.deadline = Some(deadline);
        self.generation += 1;
        self.state = LaunchState::Countdown;
        Some(CountdownHandle {
            generation: self.generation,
            deadline,
        })
    }

    /// User input during the countdown: disarm it and fall back to
    /// `Selected` so the user can override the build or relaunch.
    pub fn interrupt(&mut self) -> bool {
        if self.state != LaunchState::Countdown {
            return false;
        }
        self.generation += 1;
        if let Some(session) = self.session.as_mut() {
            session.deadline = None;
        }
        self.state = LaunchState::Selected;
        true
    }

    /// The countdown timer elapsed. Only the handle armed last may move the
    /// sequencer to `Launching`; stale timers report `false`.
    pub fn countdown_fired(&mut self, handle: CountdownHandle) -> bool {
        if self.state != LaunchState::Countdown || handle.generation != self.generation {
            return false;
        }
        self.state = LaunchState::Launching;
        true
    }

    /// Skips any remaining countdown and launches immediately.
    pub fn launch_now(&mut self) -> bool {
        match self.state {
            LaunchState::Selected | LaunchState::Countdown => {
                self.generation += 1;
                if let Some(session) = self.session.as_mut() {
                    session.deadline = None;
                }
                self.state = LaunchState::Launching;
                true
            }
            _ => false,
        }
    }

    /// Abandons the session for good.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.session = None;
        self.state = LaunchState::Cancelled;
    }

    /// Clears an invalidated selection and returns to `Idle`, ready for a
    /// new one. Unlike `cancel`, this does not end the session for good.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.session = None;
        self.state = LaunchState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use crate::models::RecordSource;

    fn record(name: &str) -> ProjectRecord {
        ProjectRecord::new(
            PathBuf::from(format!("/projects/{name}")),
            format!("/projects/{name}"),
            RecordSource::LauncherHistory,
            None,
            true,
        )
    }

    fn armed() -> (LaunchSequencer, CountdownHandle, Ticket) {
        let mut seq = LaunchSequencer::new();
        let ticket = Ticket::of(1);
        seq.select(record("show.toe"), ticket);
        let handle = seq.begin_countdown(Instant::now()).unwrap();
        (seq, handle, ticket)
    }

    #[test]
    fn selection_then_countdown_then_fire_launches() {
        let (mut seq, handle, _) = armed();
        assert_eq!(seq.state(), LaunchState::Countdown);
        assert!(seq.countdown_fired(handle));
        assert_eq!(seq.state(), LaunchState::Launching);
    }

    #[test]
    fn interrupt_disarms_and_the_stale_timer_is_ignored() {
        let (mut seq, handle, _) = armed();
        assert!(seq.interrupt());
        assert_eq!(seq.state(), LaunchState::Selected);
        assert!(!seq.countdown_fired(handle), "old timer must not launch");
        assert_eq!(seq.state(), LaunchState::Selected);
    }

    #[test]
    fn rearming_after_interrupt_yields_a_fresh_generation() {
        let (mut seq, stale, _) = armed();
        seq.interrupt();
        let fresh = seq.begin_countdown(Instant::now()).unwrap();
        assert_ne!(stale.generation, fresh.generation);
        assert!(!seq.countdown_fired(stale));
        assert!(seq.countdown_fired(fresh));
    }

    #[test]
    fn override_takes_precedence_over_the_resolved_version() {
        let mut seq = LaunchSequencer::new();
        let ticket = Ticket::of(7);
        seq.select(record("show.toe"), ticket);
        seq.resolution_settled(ticket, Ok("2023.11600".parse().unwrap()));
        assert_eq!(seq.effective_version(), Some("2023.11600".parse().unwrap()));

        seq.override_version("2022.30000".parse().unwrap());
        assert_eq!(seq.effective_version(), Some("2022.30000".parse().unwrap()));
    }

    #[test]
    fn resolution_for_an_abandoned_selection_is_dropped() {
        let mut seq = LaunchSequencer::new();
        let old = Ticket::of(1);
        seq.select(record("a.toe"), old);
        seq.select(record("b.toe"), Ticket::of(2));

        seq.resolution_settled(old, Ok("2023.11600".parse().unwrap()));
        assert_eq!(seq.effective_version(), None);
    }

    #[test]
    fn launch_now_skips_the_countdown() {
        let (mut seq, handle, _) = armed();
        assert!(seq.launch_now());
        assert_eq!(seq.state(), LaunchState::Launching);
        assert!(!seq.countdown_fired(handle));
    }

    #[test]
    fn cancel_is_terminal_for_the_session() {
        let (mut seq, handle, _) = armed();
        seq.cancel();
        assert_eq!(seq.state(), LaunchState::Cancelled);
        assert!(seq.session().is_none());
        assert!(!seq.countdown_fired(handle));
        assert!(seq.begin_countdown(Instant::now()).is_none());
    }

    #[test]
    fn reset_clears_the_session_and_allows_a_fresh_selection() {
        let (mut seq, stale, _) = armed();
        seq.reset();
        assert_eq!(seq.state(), LaunchState::Idle);
        assert!(seq.session().is_none());
        assert!(!seq.countdown_fired(stale));

        seq.select(record("next.toe"), Ticket::of(2));
        assert_eq!(seq.state(), LaunchState::Selected);
    }

    #[test]
    fn new_selection_supersedes_a_running_countdown() {
        let (mut seq, stale, _) = armed();
        seq.select(record("other.toe"), Ticket::of(9));
        assert_eq!(seq.state(), LaunchState::Selected);
        assert!(!seq.countdown_fired(stale));
    }
}
