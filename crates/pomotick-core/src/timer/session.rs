use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Kind of interval the timer is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub const ALL: [SessionType; 3] = [
        SessionType::Work,
        SessionType::ShortBreak,
        SessionType::LongBreak,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SessionType::Work => "Work",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    /// Session that follows `self` once it completes.
    ///
    /// `completed_in_cycle` is the work counter *after* the completing
    /// session has been counted, so with a cadence of 4 the fourth work
    /// session (counter = 4) is followed by a long break. Any break is
    /// followed by work. A cadence of zero behaves like 1.
    pub fn next(self, completed_in_cycle: u32, cadence: u32) -> SessionType {
        match self {
            SessionType::Work => {
                if completed_in_cycle % cadence.max(1) == 0 {
                    SessionType::LongBreak
                } else {
                    SessionType::ShortBreak
                }
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SessionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "work" | "focus" | "pomodoro" => Ok(SessionType::Work),
            "short" | "shortbreak" => Ok(SessionType::ShortBreak),
            "long" | "longbreak" => Ok(SessionType::LongBreak),
            _ => Err(ValidationError::UnknownSessionType(s.to_string())),
        }
    }
}
