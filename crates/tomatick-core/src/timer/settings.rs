//! Timer configuration: stage lengths and cycle length.
//!
//! Read-only for the duration of a session; replaced wholesale when the user
//! edits it (see [`crate::TimerEngine::apply_settings`]).

use serde::{Deserialize, Serialize};

use super::stage::Stage;
use crate::error::{ConfigError, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u32,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u32,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u32,
    /// Work stages per long break. 0 disables long breaks.
    #[serde(default = "default_pomodoros_per_long_break")]
    pub pomodoros_per_long_break: u32,
}

pub(crate) fn default_work_minutes() -> u32 {
    25
}
pub(crate) fn default_short_break_minutes() -> u32 {
    5
}
pub(crate) fn default_long_break_minutes() -> u32 {
    15
}
pub(crate) fn default_pomodoros_per_long_break() -> u32 {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            pomodoros_per_long_break: default_pomodoros_per_long_break(),
        }
    }
}

impl Settings {
    pub fn minutes(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Work => self.work_minutes,
            Stage::ShortBreak => self.short_break_minutes,
            Stage::LongBreak => self.long_break_minutes,
        }
    }

    /// Stage length in seconds.
    pub fn duration_secs(&self, stage: Stage) -> u64 {
        u64::from(self.minutes(stage)).saturating_mul(60)
    }

    pub fn has_zero_duration(&self) -> bool {
        Stage::ALL.iter().any(|&s| self.minutes(s) == 0)
    }

    pub fn long_breaks_enabled(&self) -> bool {
        self.pomodoros_per_long_break > 0
    }

    /// Highest value `pomodoros_completed_in_cycle` may hold between transitions.
    pub fn max_cycle_count(&self) -> u32 {
        self.pomodoros_per_long_break.max(1) - 1
    }

    /// Reject configurations the stage machine cannot run.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, minutes) in [
            ("work_minutes", self.work_minutes),
            ("short_break_minutes", self.short_break_minutes),
            ("long_break_minutes", self.long_break_minutes),
        ] {
            if minutes == 0 {
                return Err(ValidationError::ZeroDuration { field });
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        match key {
            "work_minutes" => Some(self.work_minutes),
            "short_break_minutes" => Some(self.short_break_minutes),
            "long_break_minutes" => Some(self.long_break_minutes),
            "pomodoros_per_long_break" => Some(self.pomodoros_per_long_break),
            _ => None,
        }
    }

    /// Return a copy with one field replaced. The result is not validated.
    pub fn with(mut self, key: &str, value: &str) -> Result<Self, ConfigError> {
        let parsed: u32 = value.trim().parse().map_err(|_| ConfigError::ParseFailed {
            key: key.to_string(),
            value: value.to_string(),
        })?;
        let slot = match key {
            "work_minutes" => &mut self.work_minutes,
            "short_break_minutes" => &mut self.short_break_minutes,
            "long_break_minutes" => &mut self.long_break_minutes,
            "pomodoros_per_long_break" => &mut self.pomodoros_per_long_break,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        *slot = parsed;
        Ok(self)
    }
}
