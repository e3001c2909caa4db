use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::storage::Configuration;
use crate::timer::SessionType;

/// Every state change of the timer produces an Event.
/// Listeners receive them in order, synchronously, once each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        session_type: SessionType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        session_type: SessionType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    SessionSwitched {
        from: SessionType,
        to: SessionType,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Configuration changed; the countdown was re-based to the new total.
    ConfigUpdated {
        config: Configuration,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// The countdown hit zero while running. Fired exactly once per session.
    SessionCompleted {
        previous_type: SessionType,
        next_type: SessionType,
        completed_in_cycle: u32,
        completed_total: u32,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_session_completed(&self) -> bool {
        matches!(self, Event::SessionCompleted { .. })
    }
}
