//! Worker lifecycle state machine.
//!
//! Transitions are pure: [`Lifecycle::transition`] takes the current lifecycle
//! and an event and returns the next state plus the commands the runtime must
//! execute. The runtime reports command results back as new events, so the
//! whole table is testable without network or storage.
//!
//! ```text
//! parsed --Install--> installing --PrecacheCompleted--> installed --ControllerReleased|SkipWaiting--> activating
//!                          |   \--PrecacheCompleted (skip-waiting requested)----------------------------^   |
//!                          \--PrecacheFailed--> redundant                                 CleanupCompleted |
//!                                                                                      activated <---------/
//! ```
//!
//! `CleanupFailed` returns an activating instance to `installed` so the next
//! `ControllerReleased` or `SkipWaiting` retries the cleanup. Any
//! non-redundant state moves to `redundant` on `Superseded`.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Error;
use crate::config::WorkerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    /// Precached, waiting for the previous instance to release its clients.
    Installed,
    Activating,
    /// Controlling clients.
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Installed => "installed",
            WorkerState::Activating => "activating",
            WorkerState::Activated => "activated",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Install,
    PrecacheCompleted,
    PrecacheFailed,
    /// Explicit request from a client page to activate immediately.
    SkipWaiting,
    /// Runtime signal that no other instance controls the clients.
    ControllerReleased,
    CleanupCompleted,
    /// Stale generations could not be deleted; activation must be retried.
    CleanupFailed,
    /// A newer instance took over.
    Superseded,
}

/// Side effect requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Open `generation` and store every URL, all-or-nothing.
    Precache { generation: String, urls: Vec<Url> },
    /// Drop a generation that never became ready.
    DiscardGeneration { generation: String },
    DeleteStaleGenerations { keep: String },
    ClaimClients,
}

/// Result of a pure transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: WorkerState,
    pub skip_waiting: bool,
    pub commands: Vec<Command>,
}

/// Lifecycle of one worker instance bound to one cache generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lifecycle {
    state: WorkerState,
    skip_waiting: bool,
    generation: String,
    precache: Vec<Url>,
    skip_waiting_on_install: bool,
}

impl Lifecycle {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            state: WorkerState::Parsed,
            skip_waiting: false,
            generation: config.cache_version.clone(),
            precache: config.precache.clone(),
            skip_waiting_on_install: config.skip_waiting_on_install,
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn skip_waiting_requested(&self) -> bool {
        self.skip_waiting
    }

    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// Compute the transition for `event` without mutating the lifecycle.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` if the event is not accepted in the
    /// current state.
    pub fn transition(&self, event: &LifecycleEvent) -> Result<Transition, Error> {
        use LifecycleEvent as E;
        use WorkerState as S;

        let stay = |commands: Vec<Command>| Transition { state: self.state, skip_waiting: self.skip_waiting, commands };
        let to = |state: WorkerState, commands: Vec<Command>| Transition {
            state,
            skip_waiting: self.skip_waiting,
            commands,
        };

        let transition = match (self.state, event) {
            (S::Parsed, E::Install) => Transition {
                state: S::Installing,
                skip_waiting: self.skip_waiting || self.skip_waiting_on_install,
                commands: vec![Command::Precache { generation: self.generation.clone(), urls: self.precache.clone() }],
            },
            (S::Parsed | S::Installing, E::SkipWaiting) => Transition {
                state: self.state,
                skip_waiting: true,
                commands: Vec::new(),
            },
            (S::Installing, E::PrecacheCompleted) if self.skip_waiting => {
                to(S::Activating, vec![self.delete_stale()])
            }
            (S::Installing, E::PrecacheCompleted) => to(S::Installed, Vec::new()),
            (S::Installing, E::PrecacheFailed) => to(
                S::Redundant,
                vec![Command::DiscardGeneration { generation: self.generation.clone() }],
            ),
            (S::Installed, E::SkipWaiting | E::ControllerReleased) => Transition {
                state: S::Activating,
                skip_waiting: true,
                commands: vec![self.delete_stale()],
            },
            (S::Activating | S::Activated, E::SkipWaiting | E::ControllerReleased) => stay(Vec::new()),
            (S::Activating, E::CleanupCompleted) => to(S::Activated, vec![Command::ClaimClients]),
            (S::Activating, E::CleanupFailed) => to(S::Installed, Vec::new()),
            (S::Redundant, _) => return Err(self.rejected(event)),
            (_, E::Superseded) => to(S::Redundant, Vec::new()),
            _ => return Err(self.rejected(event)),
        };

        Ok(transition)
    }

    /// Apply `event`, returning the commands to execute.
    pub fn apply(&mut self, event: &LifecycleEvent) -> Result<Vec<Command>, Error> {
        let transition = self.transition(event)?;
        if transition.state != self.state {
            tracing::info!(
                generation = %self.generation,
                from = %self.state,
                to = %transition.state,
                event = ?event,
                "worker lifecycle transition"
            );
        }
        self.state = transition.state;
        self.skip_waiting = transition.skip_waiting;
        Ok(transition.commands)
    }

    fn delete_stale(&self) -> Command {
        Command::DeleteStaleGenerations { keep: self.generation.clone() }
    }

    fn rejected(&self, event: &LifecycleEvent) -> Error {
        Error::InvalidTransition { state: self.state, event: event.clone() }
    }
}
