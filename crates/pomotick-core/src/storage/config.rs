//! Timer configuration.
//!
//! Four positive integers: the work, short-break and long-break durations in
//! minutes and the number of work sessions before a long break. Persisted as
//! a single JSON record:
//!
//! ```json
//! { "workDuration": 25, "shortBreakDuration": 5, "longBreakDuration": 15, "sessionsBeforeLongBreak": 4 }
//! ```
//!
//! Missing fields take their defaults, so an older or partial record still
//! loads.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;
use crate::timer::SessionType;

/// Durations (minutes) and long-break cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break")]
    pub long_break_duration: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
}

// Default functions
fn default_work_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break(),
            long_break_duration: default_long_break(),
            sessions_before_long_break: default_sessions_before_long_break(),
        }
    }
}

impl Configuration {
    /// Length of a session of the given type, in seconds.
    ///
    /// Uses saturating arithmetic so absurd values cannot overflow.
    pub fn duration_for(&self, session_type: SessionType) -> u64 {
        let minutes = match session_type {
            SessionType::Work => self.work_duration,
            SessionType::ShortBreak => self.short_break_duration,
            SessionType::LongBreak => self.long_break_duration,
        };
        u64::from(minutes).saturating_mul(60)
    }

    /// Work sessions per cycle, never zero.
    pub fn cadence(&self) -> u32 {
        self.sessions_before_long_break.max(1)
    }

    pub fn get(&self, key: ConfigKey) -> u32 {
        match key {
            ConfigKey::WorkDuration => self.work_duration,
            ConfigKey::ShortBreakDuration => self.short_break_duration,
            ConfigKey::LongBreakDuration => self.long_break_duration,
            ConfigKey::SessionsBeforeLongBreak => self.sessions_before_long_break,
        }
    }

    /// Merge the fields present in `patch` over `self`.
    pub fn merged(&self, patch: &ConfigPatch) -> Self {
        Self {
            work_duration: patch.work_duration.unwrap_or(self.work_duration),
            short_break_duration: patch
                .short_break_duration
                .unwrap_or(self.short_break_duration),
            long_break_duration: patch.long_break_duration.unwrap_or(self.long_break_duration),
            sessions_before_long_break: patch
                .sessions_before_long_break
                .unwrap_or(self.sessions_before_long_break),
        }
    }

    /// Replace non-positive fields with their defaults.
    ///
    /// Returns the keys that had to be replaced.
    pub fn sanitize(&mut self) -> Vec<ConfigKey> {
        let defaults = Self::default();
        let mut replaced = Vec::new();
        for key in ConfigKey::ALL {
            if self.get(key) == 0 {
                *self = self.merged(&ConfigPatch::default().with(key, defaults.get(key)));
                replaced.push(key);
            }
        }
        replaced
    }
}

/// A partial configuration: only the present fields are applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_before_long_break: Option<u32>,
}

impl ConfigPatch {
    pub fn with(mut self, key: ConfigKey, value: u32) -> Self {
        let slot = match key {
            ConfigKey::WorkDuration => &mut self.work_duration,
            ConfigKey::ShortBreakDuration => &mut self.short_break_duration,
            ConfigKey::LongBreakDuration => &mut self.long_break_duration,
            ConfigKey::SessionsBeforeLongBreak => &mut self.sessions_before_long_break,
        };
        *slot = Some(value);
        self
    }

    pub fn get(&self, key: ConfigKey) -> Option<u32> {
        match key {
            ConfigKey::WorkDuration => self.work_duration,
            ConfigKey::ShortBreakDuration => self.short_break_duration,
            ConfigKey::LongBreakDuration => self.long_break_duration,
            ConfigKey::SessionsBeforeLongBreak => self.sessions_before_long_break,
        }
    }

    pub fn is_empty(&self) -> bool {
        ConfigKey::ALL.iter().all(|k| self.get(*k).is_none())
    }

    /// Build a single-field patch from raw user input.
    ///
    /// # Errors
    ///
    /// Rejects unknown keys, non-numeric text and values outside the key's
    /// accepted range (which excludes zero and negatives).
    pub fn parse_field(key: &str, input: &str) -> Result<Self, ValidationError> {
        let key: ConfigKey = key.parse()?;
        let value = key.parse_value(input)?;
        Ok(Self::default().with(key, value))
    }

    /// Check that every present field is positive.
    ///
    /// The user-facing ranges are enforced by [`ConfigPatch::parse_field`];
    /// this is the floor the store itself holds to.
    ///
    /// # Errors
    ///
    /// Returns the first zero field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match ConfigKey::ALL.into_iter().find(|key| self.get(*key) == Some(0)) {
            Some(key) => Err(ValidationError::NotPositive {
                field: key.as_str().to_string(),
            }),
            None => Ok(()),
        }
    }
}

/// Names one configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    WorkDuration,
    ShortBreakDuration,
    LongBreakDuration,
    SessionsBeforeLongBreak,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 4] = [
        ConfigKey::WorkDuration,
        ConfigKey::ShortBreakDuration,
        ConfigKey::LongBreakDuration,
        ConfigKey::SessionsBeforeLongBreak,
    ];

    /// Name as it appears in the persisted record.
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::WorkDuration => "workDuration",
            ConfigKey::ShortBreakDuration => "shortBreakDuration",
            ConfigKey::LongBreakDuration => "longBreakDuration",
            ConfigKey::SessionsBeforeLongBreak => "sessionsBeforeLongBreak",
        }
    }

    /// Inclusive range accepted from user input.
    pub fn bounds(self) -> (u32, u32) {
        match self {
            ConfigKey::WorkDuration => (1, 120),
            ConfigKey::ShortBreakDuration => (1, 30),
            ConfigKey::LongBreakDuration => (1, 60),
            ConfigKey::SessionsBeforeLongBreak => (1, 10),
        }
    }

    fn check(self, value: i64) -> Result<u32, ValidationError> {
        let (min, max) = self.bounds();
        if value < i64::from(min) || value > i64::from(max) {
            return Err(ValidationError::OutOfRange {
                field: self.as_str().to_string(),
                value,
                min,
                max,
            });
        }
        // In range, so it fits.
        Ok(value as u32)
    }

    /// Parse and range-check raw text for this key.
    pub fn parse_value(self, input: &str) -> Result<u32, ValidationError> {
        let value: i64 = input
            .trim()
            .parse()
            .map_err(|_| ValidationError::NotANumber {
                field: self.as_str().to_string(),
                input: input.to_string(),
            })?;
        self.check(value)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigKey {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | '.'))
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "workduration" | "work" => Ok(ConfigKey::WorkDuration),
            "shortbreakduration" | "shortbreak" | "short" => Ok(ConfigKey::ShortBreakDuration),
            "longbreakduration" | "longbreak" | "long" => Ok(ConfigKey::LongBreakDuration),
            "sessionsbeforelongbreak" | "cadence" => Ok(ConfigKey::SessionsBeforeLongBreak),
            _ => Err(ValidationError::UnknownKey(s.to_string())),
        }
    }
}
