//! Cycle controller: picks the stage that follows a finished one.

use serde::{Deserialize, Serialize};

use super::settings::Settings;
use super::stage::Stage;
use super::state::TimerState;

/// Credit owed to the daily ledger for a finished work stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkCompleted {
    pub work_minutes: u32,
}

/// Result of [`advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advance {
    pub next: Stage,
    pub cycle_count: u32,
    pub work_completed: Option<WorkCompleted>,
}

/// One stage boundary as applied to a [`TimerState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Stage,
    pub to: Stage,
    pub work_completed: Option<WorkCompleted>,
}

/// Decide the next stage after `completed` finished.
///
/// `cycle_count` is the number of pomodoros already finished in the current
/// long-break cycle. With long breaks disabled it stays at 0.
pub fn advance(completed: Stage, cycle_count: u32, settings: &Settings) -> Advance {
    match completed {
        Stage::Work => {
            let work_completed = Some(WorkCompleted {
                work_minutes: settings.work_minutes,
            });
            if !settings.long_breaks_enabled() {
                return Advance {
                    next: Stage::ShortBreak,
                    cycle_count: 0,
                    work_completed,
                };
            }
            let finished = cycle_count.saturating_add(1);
            if finished >= settings.pomodoros_per_long_break {
                Advance {
                    next: Stage::LongBreak,
                    cycle_count: 0,
                    work_completed,
                }
            } else {
                Advance {
                    next: Stage::ShortBreak,
                    cycle_count: finished,
                    work_completed,
                }
            }
        }
        Stage::ShortBreak | Stage::LongBreak => Advance {
            next: Stage::Work,
            cycle_count,
            work_completed: None,
        },
    }
}

/// Apply the boundary after the current stage to `state`.
///
/// Moves to the next stage with its full length loaded and bumps today's
/// count for a finished work stage. `is_running` is left untouched.
pub(crate) fn complete_stage(state: &mut TimerState, settings: &Settings) -> Transition {
    let from = state.stage;
    let step = advance(from, state.pomodoros_completed_in_cycle, settings);
    state.stage = step.next;
    state.pomodoros_completed_in_cycle = step.cycle_count;
    state.seconds_remaining = settings.duration_secs(step.next);
    if step.work_completed.is_some() {
        state.pomodoros_completed_today = state.pomodoros_completed_today.saturating_add(1);
    }
    Transition {
        from,
        to: step.next,
        work_completed: step.work_completed,
    }
}
