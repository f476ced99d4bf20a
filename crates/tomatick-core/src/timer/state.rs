use serde::{Deserialize, Serialize};

use super::settings::Settings;
use super::stage::Stage;

/// Observable timer state. Mutated once per tick while running and
/// atomically by the gap reconciler on resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub stage: Stage,
    /// Never negative, never above the configured length of `stage`.
    pub seconds_remaining: u64,
    pub is_running: bool,
    pub pomodoros_completed_today: u32,
    /// Resets to 0 exactly when a long break is entered.
    pub pomodoros_completed_in_cycle: u32,
}

impl TimerState {
    /// A stopped timer at the start of a full work stage.
    pub fn new(settings: &Settings) -> Self {
        Self {
            stage: Stage::Work,
            seconds_remaining: settings.duration_secs(Stage::Work),
            is_running: false,
            pomodoros_completed_today: 0,
            pomodoros_completed_in_cycle: 0,
        }
    }
}
