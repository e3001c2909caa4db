//! # pomotick Core Library
//!
//! Core logic for a single-session Pomodoro timer: work sessions alternate
//! with short breaks, and every `sessions_before_long_break`-th work session
//! is followed by a long break. Presentation layers (the `pomotick` CLI, or
//! any GUI) observe snapshots and issue commands; they never mutate timer
//! state directly.
//!
//! ## Architecture
//!
//! - **Timer Engine**: tick-driven state machine (`Idle`, `Running`,
//!   `Paused`) that owns the countdown and the session counters
//! - **Storage**: JSON-persisted durations and cadence, falling back to
//!   defaults when the record is missing or broken
//! - **Pomodoro**: the command surface, composing store, engine and event
//!   listeners into one explicitly owned instance
//! - **Driver**: a tokio task serializing commands and one-second ticks
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`ConfigStore`]: Configuration persistence
//! - [`Pomodoro`]: Commands, snapshots and event delivery
//! - [`driver::spawn`]: Real-time driver

pub mod driver;
pub mod error;
pub mod events;
pub mod pomodoro;
pub mod storage;
pub mod timer;

pub use driver::DriverHandle;
pub use error::{ConfigError, CoreError, Result, ValidationError};
pub use events::Event;
pub use pomodoro::{EventLog, Outcome, Pomodoro, SessionListener, TimerCommand};
pub use storage::{
    ConfigKey, ConfigPatch, ConfigPersistence, ConfigStore, Configuration, JsonFileStore,
    MemoryStore,
};
pub use timer::{SessionType, TimerEngine, TimerSnapshot, TimerState};
