use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{Settings, Stage};

/// Every state change in the engine produces an Event.
/// The CLI prints them; a GUI would render from `StateSnapshot`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        stage: Stage,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        stage: Stage,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    TimerReset {
        stage: Stage,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Stage,
        to: Stage,
        at: DateTime<Utc>,
    },
    /// A running stage reached zero and the next one started.
    StageCompleted {
        from: Stage,
        to: Stage,
        work_completed: bool,
        at: DateTime<Utc>,
    },
    /// Tick delivery stopped while running (window hidden, process exit).
    Suspended {
        stage: Stage,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    /// Catch-up after a suspension.
    Reconciled {
        elapsed_secs: u64,
        stages_crossed: usize,
        work_completions: u32,
        stage: Stage,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    SettingsApplied {
        settings: Settings,
        stage: Stage,
        seconds_remaining: u64,
        at: DateTime<Utc>,
    },
    /// Read-only view for display.
    StateSnapshot {
        stage: Stage,
        stage_label: String,
        seconds_remaining: u64,
        total_secs: u64,
        /// `MM:SS`
        clock: String,
        /// 0.0 .. 1.0 progress within the stage.
        progress: f64,
        is_running: bool,
        pomodoros_completed_today: u32,
        pomodoros_completed_in_cycle: u32,
        pomodoros_per_long_break: u32,
        at: DateTime<Utc>,
    },
}

/// Format seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}
