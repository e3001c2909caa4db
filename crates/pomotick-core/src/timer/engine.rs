//! Timer engine implementation.
//!
//! The timer engine is a tick-driven state machine. It has no internal
//! threads and never reads the clock: the caller delivers one `tick()` per
//! elapsed second while the timer is running (see [`crate::driver`]).
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//! Running | Paused --reset--> Idle
//! Running --tick to zero--> Idle (next session queued)
//! ```
//!
//! ## Usage
//!
//! ```
//! use pomotick_core::{Configuration, TimerEngine, TimerState};
//!
//! let mut engine = TimerEngine::new(Configuration::default());
//! engine.start();
//! for _ in 0..1500 {
//!     engine.tick();
//! }
//! assert_eq!(engine.state(), TimerState::Idle);
//! assert_eq!(engine.completed_total(), 1);
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::session::SessionType;
use crate::events::Event;
use crate::storage::Configuration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

impl TimerState {
    /// Running or paused: a session is in progress.
    pub fn is_active(self) -> bool {
        !matches!(self, TimerState::Idle)
    }
}

/// Read-only view of the engine handed to presentation code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub lifecycle: TimerState,
    pub session_type: SessionType,
    pub remaining_seconds: u64,
    pub completed_work_sessions_in_cycle: u32,
    pub completed_work_sessions_total: u32,
    pub configuration: Configuration,
}

impl TimerSnapshot {
    /// Full length of the current session in seconds.
    pub fn total_secs(&self) -> u64 {
        self.configuration.duration_for(self.session_type)
    }

    /// 0.0 .. 1.0 progress within the current session.
    pub fn progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_seconds as f64 / total as f64)
    }

    /// Work sessions completed towards the next long break.
    pub fn cycle_position(&self) -> u32 {
        self.completed_work_sessions_in_cycle % self.configuration.cadence()
    }
}

/// Core timer engine.
///
/// Owns the only mutable timer state. Every command either returns the
/// event describing the transition or `None` when the command does not
/// apply to the current state, in which case nothing changed.
#[derive(Debug, Clone)]
pub struct TimerEngine {
    config: Configuration,
    state: TimerState,
    session_type: SessionType,
    remaining_secs: u64,
    completed_in_cycle: u32,
    completed_total: u32,
}

impl TimerEngine {
    /// Create a new engine, idle on a full work session.
    pub fn new(config: Configuration) -> Self {
        Self {
            config,
            state: TimerState::Idle,
            session_type: SessionType::Work,
            remaining_secs: config.duration_for(SessionType::Work),
            completed_in_cycle: 0,
            completed_total: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn completed_in_cycle(&self) -> u32 {
        self.completed_in_cycle
    }

    pub fn completed_total(&self) -> u32 {
        self.completed_total
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn total_secs(&self) -> u64 {
        self.config.duration_for(self.session_type)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            lifecycle: self.state,
            session_type: self.session_type,
            remaining_seconds: self.remaining_secs,
            completed_work_sessions_in_cycle: self.completed_in_cycle,
            completed_work_sessions_total: self.completed_total,
            configuration: self.config,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Idle => {
                self.state = TimerState::Running;
                Some(Event::TimerStarted {
                    session_type: self.session_type,
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            TimerState::Running | TimerState::Paused => None,
        }
    }

    pub fn pause(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                self.state = TimerState::Paused;
                Some(Event::TimerPaused {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    pub fn resume(&mut self) -> Option<Event> {
        match self.state {
            TimerState::Paused => {
                self.state = TimerState::Running;
                Some(Event::TimerResumed {
                    remaining_secs: self.remaining_secs,
                    at: Utc::now(),
                })
            }
            _ => None,
        }
    }

    /// Abandon the session in progress, keeping its type.
    pub fn reset(&mut self) -> Option<Event> {
        if !self.state.is_active() {
            return None;
        }
        self.state = TimerState::Idle;
        self.remaining_secs = self.total_secs();
        Some(Event::TimerReset {
            session_type: self.session_type,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Choose the next session by hand. Ignored unless idle.
    pub fn switch_session(&mut self, session_type: SessionType) -> Option<Event> {
        if self.state.is_active() {
            return None;
        }
        let from = self.session_type;
        self.session_type = session_type;
        self.remaining_secs = self.total_secs();
        Some(Event::SessionSwitched {
            from,
            to: session_type,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Adopt a new configuration.
    ///
    /// The countdown restarts from the new full duration of the current
    /// session type, whatever the lifecycle; a running timer keeps running.
    pub fn apply_config(&mut self, config: Configuration) -> Option<Event> {
        self.config = config;
        self.remaining_secs = self.total_secs();
        Some(Event::ConfigUpdated {
            config,
            remaining_secs: self.remaining_secs,
            at: Utc::now(),
        })
    }

    /// Advance one second. Returns `Some(Event::SessionCompleted)` when the
    /// countdown reaches zero; the rollover happens within the same call.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            return Some(self.complete_session());
        }
        None
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_session(&mut self) -> Event {
        let previous_type = self.session_type;
        if previous_type == SessionType::Work {
            self.completed_in_cycle = self.completed_in_cycle.saturating_add(1);
            self.completed_total = self.completed_total.saturating_add(1);
        }
        let next_type = previous_type.next(self.completed_in_cycle, self.config.cadence());

        self.session_type = next_type;
        self.remaining_secs = self.total_secs();
        self.state = TimerState::Idle;

        Event::SessionCompleted {
            previous_type,
            next_type,
            completed_in_cycle: self.completed_in_cycle,
            completed_total: self.completed_total,
            at: Utc::now(),
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}
