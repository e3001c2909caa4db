//! Real-time driver for a [`Pomodoro`].
//!
//! All commands and ticks are serialized through one tokio task, so the
//! engine is only ever touched by a single logical thread. The tick source
//! is a capability ([`TickSource`]) produced by a factory: a fresh source
//! is created on every transition into `Running` and dropped on every
//! transition out of it, so at most one is live at a time and a stopped
//! timer never holds a timer registration.
//!
//! Events reach observers two ways. Listeners subscribed on the `Pomodoro`
//! before [`spawn`] are called synchronously for every event and never miss
//! one. [`DriverHandle::subscribe`] is a bounded broadcast for convenience:
//! a receiver that falls more than its capacity behind gets
//! `RecvError::Lagged` and loses the oldest events.
//!
//! ```no_run
//! # async fn demo() -> pomotick_core::Result<()> {
//! use pomotick_core::driver::{self, IntervalTicks};
//! use pomotick_core::{MemoryStore, Pomodoro};
//!
//! let (handle, task) = driver::spawn(Pomodoro::load(MemoryStore::new()), IntervalTicks::every_second);
//! handle.start().await?;
//! let mut state = handle.watch();
//! state.changed().await.ok();
//! handle.shutdown().await?;
//! let _pomodoro = task.await;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::pomodoro::{Outcome, Pomodoro, SessionListener, TimerCommand};
use crate::storage::{ConfigPatch, ConfigPersistence};
use crate::timer::{SessionType, TimerSnapshot, TimerState};

const COMMAND_QUEUE: usize = 32;
const EVENT_CAPACITY: usize = 64;

/// A stream of one-second ticks.
pub trait TickSource: Send + 'static {
    /// Resolves at the next tick, or `None` once the source is exhausted.
    fn next_tick(&mut self) -> Pin<Box<dyn Future<Output = Option<()>> + Send + '_>>;
}

/// Wall-clock ticks from a tokio interval.
///
/// The first tick fires one full period after creation, so a pause/resume
/// never yields an immediate extra decrement.
#[derive(Debug)]
pub struct IntervalTicks {
    interval: Interval,
}

impl IntervalTicks {
    pub fn new(period: Duration) -> Self {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { interval }
    }

    pub fn every_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl TickSource for IntervalTicks {
    fn next_tick(&mut self) -> Pin<Box<dyn Future<Output = Option<()>> + Send + '_>> {
        Box::pin(async move {
            self.interval.tick().await;
            Some(())
        })
    }
}

/// Hand-cranked clock for tests and simulations.
///
/// Each call to [`ManualClock::source`] replaces the previous source. A tick
/// is only delivered while a source is live; ticks sent while the timer is
/// not running are dropped, as a real clock's would be.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    sender: Arc<Mutex<Option<mpsc::UnboundedSender<()>>>>,
}

/// Tick source handed out by a [`ManualClock`].
#[derive(Debug)]
pub struct ManualTicks {
    receiver: mpsc::UnboundedReceiver<()>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(&self) -> ManualTicks {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.slot() = Some(tx);
        ManualTicks { receiver: rx }
    }

    /// Deliver one tick. Returns false when no source is live.
    pub fn tick(&self) -> bool {
        self.slot()
            .as_ref()
            .is_some_and(|tx| tx.send(()).is_ok())
    }

    /// Deliver `n` ticks, returning how many were queued on a live source.
    ///
    /// Queued is not applied: when a session completes the driver drops its
    /// source, and ticks still queued on it are discarded unapplied.
    pub fn advance(&self, n: u64) -> u64 {
        let mut delivered = 0;
        for _ in 0..n {
            if !self.tick() {
                break;
            }
            delivered += 1;
        }
        delivered
    }

    pub fn is_live(&self) -> bool {
        self.slot().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<mpsc::UnboundedSender<()>>> {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TickSource for ManualTicks {
    fn next_tick(&mut self) -> Pin<Box<dyn Future<Output = Option<()>> + Send + '_>> {
        Box::pin(self.receiver.recv())
    }
}

enum Message {
    Command(TimerCommand, oneshot::Sender<Outcome>),
    Snapshot(oneshot::Sender<TimerSnapshot>),
    Shutdown,
}

enum Step {
    Tick(Option<()>),
    Message(Option<Message>),
}

struct Broadcaster(broadcast::Sender<Event>);

impl SessionListener for Broadcaster {
    fn on_event(&mut self, event: &Event) {
        // No receivers is fine.
        let _ = self.0.send(event.clone());
    }
}

/// Cloneable handle to a running driver.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    sender: mpsc::Sender<Message>,
    state: watch::Receiver<TimerSnapshot>,
    events: broadcast::Sender<Event>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Command(command, _) => f.debug_tuple("Command").field(command).finish(),
            Message::Snapshot(_) => f.write_str("Snapshot"),
            Message::Shutdown => f.write_str("Shutdown"),
        }
    }
}

impl DriverHandle {
    /// Issue a command and wait for the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DriverClosed`] if the driver has stopped.
    pub async fn command(&self, command: TimerCommand) -> Result<TimerSnapshot> {
        Ok(self.execute(command).await?.snapshot)
    }

    /// Issue a command and wait for its [`Outcome`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DriverClosed`] if the driver has stopped.
    pub async fn execute(&self, command: TimerCommand) -> Result<Outcome> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Message::Command(command, reply))
            .await
            .map_err(|_| CoreError::DriverClosed)?;
        response.await.map_err(|_| CoreError::DriverClosed)
    }

    pub async fn start(&self) -> Result<TimerSnapshot> {
        self.command(TimerCommand::Start).await
    }

    pub async fn pause(&self) -> Result<TimerSnapshot> {
        self.command(TimerCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<TimerSnapshot> {
        self.command(TimerCommand::Resume).await
    }

    pub async fn reset(&self) -> Result<TimerSnapshot> {
        self.command(TimerCommand::Reset).await
    }

    pub async fn switch_session(&self, session_type: SessionType) -> Result<TimerSnapshot> {
        self.command(TimerCommand::SwitchSession { session_type })
            .await
    }

    pub async fn update_config(&self, patch: ConfigPatch) -> Result<TimerSnapshot> {
        self.command(TimerCommand::UpdateConfig { patch }).await
    }

    /// State after every command and tick queued before this call.
    pub async fn snapshot(&self) -> Result<TimerSnapshot> {
        let (reply, response) = oneshot::channel();
        self.sender
            .send(Message::Snapshot(reply))
            .await
            .map_err(|_| CoreError::DriverClosed)?;
        response.await.map_err(|_| CoreError::DriverClosed)
    }

    /// Ask the driver to stop. The task then resolves to the `Pomodoro`.
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(Message::Shutdown)
            .await
            .map_err(|_| CoreError::DriverClosed)
    }

    /// Latest published state, without a round trip.
    pub fn current(&self) -> TimerSnapshot {
        *self.state.borrow()
    }

    /// Receiver that wakes on every state change, ticks included.
    pub fn watch(&self) -> watch::Receiver<TimerSnapshot> {
        self.state.clone()
    }

    /// Receiver for timer events emitted after this call.
    ///
    /// Best effort: a receiver more than 64 events behind loses the oldest
    /// ones. Subscribe a [`SessionListener`] on the `Pomodoro` before
    /// spawning when every completion must be seen.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }
}

struct TimerDriver<P, F, T> {
    pomodoro: Pomodoro<P>,
    factory: F,
    ticks: Option<T>,
    commands: mpsc::Receiver<Message>,
    state: watch::Sender<TimerSnapshot>,
}

/// Move `pomodoro` onto its own task, ticking from sources built by `factory`.
///
/// Must be called from within a tokio runtime.
pub fn spawn<P, F, T>(mut pomodoro: Pomodoro<P>, factory: F) -> (DriverHandle, JoinHandle<Pomodoro<P>>)
where
    P: ConfigPersistence + Send + 'static,
    F: FnMut() -> T + Send + 'static,
    T: TickSource,
{
    let (events, _) = broadcast::channel(EVENT_CAPACITY);
    pomodoro.subscribe(Broadcaster(events.clone()));

    let (sender, commands) = mpsc::channel(COMMAND_QUEUE);
    let (state, watcher) = watch::channel(pomodoro.snapshot());

    let mut driver = TimerDriver {
        pomodoro,
        factory,
        ticks: None,
        commands,
        state,
    };
    // A timer restored mid-run needs its source straight away.
    let initial = driver.pomodoro.snapshot().lifecycle;
    driver.reconcile(TimerState::Idle, initial);

    let task = tokio::spawn(driver.run());
    let handle = DriverHandle {
        sender,
        state: watcher,
        events,
    };
    (handle, task)
}

impl<P, F, T> TimerDriver<P, F, T>
where
    P: ConfigPersistence + Send + 'static,
    F: FnMut() -> T + Send + 'static,
    T: TickSource,
{
    async fn run(mut self) -> Pomodoro<P> {
        tracing::debug!("timer driver started");
        loop {
            let step = tokio::select! {
                biased;
                tick = next_tick(&mut self.ticks) => Step::Tick(tick),
                message = self.commands.recv() => Step::Message(message),
            };

            match step {
                Step::Tick(Some(())) => {
                    self.step(Pomodoro::tick);
                }
                Step::Tick(None) => {
                    tracing::warn!("tick source ended while running");
                    self.ticks = None;
                }
                Step::Message(Some(Message::Command(command, reply))) => {
                    let mut event = None;
                    let snapshot = self.step(|pomodoro| {
                        let outcome = pomodoro.execute(command);
                        event = outcome.event;
                        outcome.snapshot
                    });
                    let _ = reply.send(Outcome { snapshot, event });
                }
                Step::Message(Some(Message::Snapshot(reply))) => {
                    let _ = reply.send(self.pomodoro.snapshot());
                }
                Step::Message(Some(Message::Shutdown)) | Step::Message(None) => break,
            }
        }
        self.ticks = None;
        tracing::debug!("timer driver stopped");
        self.pomodoro
    }

    fn step(&mut self, apply: impl FnOnce(&mut Pomodoro<P>) -> TimerSnapshot) -> TimerSnapshot {
        let before = self.pomodoro.snapshot().lifecycle;
        let snapshot = apply(&mut self.pomodoro);
        self.reconcile(before, snapshot.lifecycle);
        self.state.send_replace(snapshot);
        snapshot
    }

    /// Keep exactly one tick source alive iff the timer is running.
    fn reconcile(&mut self, before: TimerState, after: TimerState) {
        if after != TimerState::Running {
            if self.ticks.take().is_some() {
                tracing::trace!(?after, "tick source stopped");
            }
        } else if before != TimerState::Running || self.ticks.is_none() {
            self.ticks = Some((self.factory)());
            tracing::trace!("tick source started");
        }
    }
}

async fn next_tick<T: TickSource>(ticks: &mut Option<T>) -> Option<()> {
    match ticks {
        Some(source) => source.next_tick().await,
        None => std::future::pending().await,
    }
}
