//! The command surface presentation code talks to.
//!
//! [`Pomodoro`] composes the [`ConfigStore`] and the [`TimerEngine`] into one
//! explicitly owned instance. Every command returns the resulting
//! [`TimerSnapshot`]; the events it produced are handed to each subscribed
//! [`SessionListener`] before the command returns.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::{ConfigPatch, ConfigPersistence, ConfigStore, Configuration};
use crate::timer::{SessionType, TimerEngine, TimerSnapshot};

/// Observer of timer events.
pub trait SessionListener: Send {
    fn on_event(&mut self, event: &Event);
}

impl<F> SessionListener for F
where
    F: FnMut(&Event) + Send,
{
    fn on_event(&mut self, event: &Event) {
        self(event)
    }
}

/// Listener that records every event; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn completions(&self) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(Event::is_session_completed)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.events.lock() {
            guard.clear();
        }
    }
}

impl SessionListener for EventLog {
    fn on_event(&mut self, event: &Event) {
        let mut guard = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.push(event.clone());
    }
}

/// A user command, as issued by presentation code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum TimerCommand {
    Start,
    Pause,
    Resume,
    Reset,
    SwitchSession { session_type: SessionType },
    UpdateConfig { patch: ConfigPatch },
    ResetConfig,
}

/// What a command did: the resulting state, and the event it emitted.
///
/// `event` is `None` when the command did not apply and nothing changed.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub snapshot: TimerSnapshot,
    pub event: Option<Event>,
}

impl Outcome {
    pub fn accepted(&self) -> bool {
        self.event.is_some()
    }
}

/// Timer engine plus the configuration it runs on.
pub struct Pomodoro<P> {
    store: ConfigStore<P>,
    engine: TimerEngine,
    listeners: Vec<Box<dyn SessionListener>>,
}

impl<P: ConfigPersistence> Pomodoro<P> {
    /// Build an idle timer on the store's current configuration.
    pub fn new(store: ConfigStore<P>) -> Self {
        let engine = TimerEngine::new(store.current());
        Self {
            store,
            engine,
            listeners: Vec::new(),
        }
    }

    /// Load configuration from `persistence` and build the timer on it.
    pub fn load(persistence: P) -> Self {
        Self::new(ConfigStore::load(persistence))
    }

    pub fn subscribe(&mut self, listener: impl SessionListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn snapshot(&self) -> TimerSnapshot {
        self.engine.snapshot()
    }

    pub fn config(&self) -> Configuration {
        self.store.current()
    }

    pub fn store(&self) -> &ConfigStore<P> {
        &self.store
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> TimerSnapshot {
        self.apply(TimerCommand::Start)
    }

    pub fn pause(&mut self) -> TimerSnapshot {
        self.apply(TimerCommand::Pause)
    }

    pub fn resume(&mut self) -> TimerSnapshot {
        self.apply(TimerCommand::Resume)
    }

    pub fn reset(&mut self) -> TimerSnapshot {
        self.apply(TimerCommand::Reset)
    }

    pub fn switch_session(&mut self, session_type: SessionType) -> TimerSnapshot {
        self.apply(TimerCommand::SwitchSession { session_type })
    }

    /// Merge and persist `patch`, then re-base the countdown on it.
    ///
    /// A patch with a zero field is rejected as a whole and leaves the timer
    /// untouched.
    pub fn update_config(&mut self, patch: &ConfigPatch) -> TimerSnapshot {
        self.apply(TimerCommand::UpdateConfig { patch: *patch })
    }

    pub fn reset_config(&mut self) -> TimerSnapshot {
        self.apply(TimerCommand::ResetConfig)
    }

    /// Deliver one elapsed second.
    pub fn tick(&mut self) -> TimerSnapshot {
        let event = self.engine.tick();
        self.emit(event).snapshot
    }

    pub fn apply(&mut self, command: TimerCommand) -> TimerSnapshot {
        self.execute(command).snapshot
    }

    /// Run `command`, reporting whether it took effect.
    pub fn execute(&mut self, command: TimerCommand) -> Outcome {
        let event = match command {
            TimerCommand::Start => self.engine.start(),
            TimerCommand::Pause => self.engine.pause(),
            TimerCommand::Resume => self.engine.resume(),
            TimerCommand::Reset => self.engine.reset(),
            TimerCommand::SwitchSession { session_type } => {
                let event = self.engine.switch_session(session_type);
                if event.is_none() {
                    tracing::debug!(?session_type, "ignoring session switch while a session is active");
                }
                event
            }
            TimerCommand::UpdateConfig { patch } => match self.store.update(&patch) {
                Ok(config) if !patch.is_empty() => self.engine.apply_config(config),
                _ => None,
            },
            TimerCommand::ResetConfig => {
                let config = self.store.reset();
                self.engine.apply_config(config)
            }
        };
        self.emit(event)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn emit(&mut self, event: Option<Event>) -> Outcome {
        if let Some(event) = &event {
            if let Event::SessionCompleted {
                previous_type,
                next_type,
                completed_total,
                ..
            } = event
            {
                tracing::info!(
                    previous = %previous_type,
                    next = %next_type,
                    completed_total,
                    "session completed"
                );
            } else {
                tracing::debug!(?event, "timer event");
            }
            for listener in &mut self.listeners {
                listener.on_event(event);
            }
        }
        Outcome {
            snapshot: self.engine.snapshot(),
            event,
        }
    }
}

impl<P> std::fmt::Debug for Pomodoro<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pomodoro")
            .field("engine", &self.engine)
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ConfigKey, MemoryStore};
    use crate::timer::TimerState;

    fn pomodoro() -> (Pomodoro<MemoryStore>, EventLog, MemoryStore) {
        let backend = MemoryStore::new();
        let mut pomodoro = Pomodoro::load(backend.clone());
        let log = EventLog::new();
        pomodoro.subscribe(log.clone());
        (pomodoro, log, backend)
    }

    #[test]
    fn default_scenario_notifies_once() {
        let (mut pomodoro, log, _) = pomodoro();
        pomodoro.start();
        let mut snapshot = pomodoro.snapshot();
        for _ in 0..1500 {
            snapshot = pomodoro.tick();
        }
        assert_eq!(snapshot.lifecycle, TimerState::Idle);
        assert_eq!(snapshot.session_type, SessionType::ShortBreak);
        assert_eq!(snapshot.remaining_seconds, 300);
        assert_eq!(snapshot.completed_work_sessions_total, 1);

        let completions = log.completions();
        assert_eq!(completions.len(), 1);
        assert!(matches!(
            completions[0],
            Event::SessionCompleted {
                previous_type: SessionType::Work,
                next_type: SessionType::ShortBreak,
                ..
            }
        ));
    }

    #[test]
    fn no_op_commands_emit_nothing() {
        let (mut pomodoro, log, _) = pomodoro();
        pomodoro.pause();
        pomodoro.resume();
        pomodoro.reset();
        assert!(log.events().is_empty());

        pomodoro.start();
        log.clear();
        let before = pomodoro.snapshot();
        let after = pomodoro.switch_session(SessionType::ShortBreak);
        assert_eq!(before, after);
        assert!(log.events().is_empty());
    }

    #[test]
    fn update_config_persists_and_rebases() {
        let (mut pomodoro, log, backend) = pomodoro();
        pomodoro.start();
        pomodoro.tick();
        let snapshot = pomodoro.update_config(&ConfigPatch {
            work_duration: Some(30),
            ..ConfigPatch::default()
        });
        assert_eq!(snapshot.remaining_seconds, 1800);
        assert_eq!(snapshot.lifecycle, TimerState::Running);
        assert_eq!(pomodoro.config().work_duration, 30);
        assert!(backend.record().unwrap().contains("\"workDuration\":30"));
        assert!(matches!(log.events().last(), Some(Event::ConfigUpdated { .. })));
    }

    #[test]
    fn persisted_config_survives_restart() {
        let backend = MemoryStore::new();
        let mut first = Pomodoro::load(backend.clone());
        first.update_config(&ConfigPatch {
            short_break_duration: Some(10),
            ..ConfigPatch::default()
        });
        drop(first);

        let second = Pomodoro::load(backend);
        assert_eq!(second.config().short_break_duration, 10);
        assert_eq!(second.config().work_duration, 25);
        assert_eq!(second.snapshot().remaining_seconds, 1500);
    }

    #[test]
    fn reset_config_restores_defaults() {
        let (mut pomodoro, _, _) = pomodoro();
        pomodoro.update_config(&ConfigPatch {
            work_duration: Some(50),
            ..ConfigPatch::default()
        });
        let snapshot = pomodoro.reset_config();
        assert_eq!(snapshot.configuration, Configuration::default());
        assert_eq!(snapshot.remaining_seconds, 1500);
    }

    #[test]
    fn apply_dispatches_commands() {
        let (mut pomodoro, log, _) = pomodoro();
        pomodoro.apply(TimerCommand::SwitchSession {
            session_type: SessionType::LongBreak,
        });
        let snapshot = pomodoro.apply(TimerCommand::Start);
        assert_eq!(snapshot.session_type, SessionType::LongBreak);
        assert_eq!(snapshot.lifecycle, TimerState::Running);
        assert_eq!(log.events().len(), 2);
    }

    #[test]
    fn closures_can_listen() {
        let backend = MemoryStore::new();
        let mut pomodoro = Pomodoro::load(backend);
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        pomodoro.subscribe(move |event: &Event| {
            if event.is_session_completed() {
                *counter.lock().unwrap() += 1;
            }
        });
        pomodoro.update_config(&ConfigPatch {
            work_duration: Some(1),
            ..ConfigPatch::default()
        });
        pomodoro.start();
        for _ in 0..60 {
            pomodoro.tick();
        }
        assert_eq!(*seen.lock().unwrap(), 1);
    }

    #[test]
    fn zero_duration_update_is_rejected() {
        let (mut pomodoro, log, backend) = pomodoro();
        let outcome = pomodoro.execute(TimerCommand::UpdateConfig {
            patch: ConfigPatch {
                work_duration: Some(0),
                ..ConfigPatch::default()
            },
        });
        assert!(!outcome.accepted());
        assert_eq!(outcome.snapshot.remaining_seconds, 1500);
        assert_eq!(pomodoro.config(), Configuration::default());
        assert!(backend.record().is_none());
        assert!(log.events().is_empty());

        // A full session still has to elapse before anything completes.
        pomodoro.start();
        let snapshot = pomodoro.tick();
        assert_eq!(snapshot.lifecycle, TimerState::Running);
        assert_eq!(snapshot.remaining_seconds, 1499);
        assert!(log.completions().is_empty());
    }

    #[test]
    fn outcome_reports_whether_the_command_applied() {
        let (mut pomodoro, _, _) = pomodoro();
        assert!(!pomodoro.execute(TimerCommand::Pause).accepted());

        // Re-applying the current values is still an update.
        let same = pomodoro.execute(TimerCommand::UpdateConfig {
            patch: ConfigPatch::default().with(ConfigKey::WorkDuration, 25),
        });
        assert!(matches!(same.event, Some(Event::ConfigUpdated { .. })));
        assert!(pomodoro.execute(TimerCommand::ResetConfig).accepted());

        let started = pomodoro.execute(TimerCommand::Start);
        assert!(matches!(started.event, Some(Event::TimerStarted { .. })));
        assert!(!pomodoro
            .execute(TimerCommand::SwitchSession {
                session_type: SessionType::LongBreak
            })
            .accepted());
    }

    #[test]
    fn command_serializes_tagged() {
        let json = serde_json::to_value(TimerCommand::SwitchSession {
            session_type: SessionType::ShortBreak,
        })
        .unwrap();
        assert_eq!(json["command"], "switch_session");
        assert_eq!(json["session_type"], "shortBreak");
    }
}
