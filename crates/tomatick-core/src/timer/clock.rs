//! Stage clock: a single-stage countdown.
//!
//! The clock only counts. Choosing what comes after a finished stage is the
//! cycle controller's job.

use super::settings::Settings;
use super::stage::Stage;
use super::state::TimerState;

/// What a single clock tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Not running, or already at zero.
    Idle,
    /// One second was counted off.
    Counted,
    /// This tick brought the stage to zero while running.
    StageComplete,
}

/// Count one second off the current stage.
pub fn count_down(state: &mut TimerState) -> ClockTick {
    if !state.is_running || state.seconds_remaining == 0 {
        return ClockTick::Idle;
    }
    state.seconds_remaining -= 1;
    if state.seconds_remaining == 0 {
        ClockTick::StageComplete
    } else {
        ClockTick::Counted
    }
}

/// Stop the clock and load the full length of `stage`.
pub fn reset(state: &mut TimerState, stage: Stage, settings: &Settings) {
    state.stage = stage;
    state.seconds_remaining = settings.duration_secs(stage);
    state.is_running = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running(seconds: u64) -> TimerState {
        TimerState {
            seconds_remaining: seconds,
            is_running: true,
            ..TimerState::new(&Settings::default())
        }
    }

    #[test]
    fn counts_down_while_running() {
        let mut state = running(10);
        assert_eq!(count_down(&mut state), ClockTick::Counted);
        assert_eq!(state.seconds_remaining, 9);
    }

    #[test]
    fn paused_clock_does_not_move() {
        let mut state = running(10);
        state.is_running = false;
        assert_eq!(count_down(&mut state), ClockTick::Idle);
        assert_eq!(state.seconds_remaining, 10);
    }

    #[test]
    fn fires_stage_complete_exactly_at_zero() {
        let mut state = running(2);
        assert_eq!(count_down(&mut state), ClockTick::Counted);
        assert_eq!(count_down(&mut state), ClockTick::StageComplete);
        assert_eq!(state.seconds_remaining, 0);
        // Already at zero: nothing more to count.
        assert_eq!(count_down(&mut state), ClockTick::Idle);
        assert_eq!(state.seconds_remaining, 0);
    }

    #[test]
    fn reset_loads_full_stage_and_stops() {
        let settings = Settings::default();
        let mut state = running(3);
        reset(&mut state, Stage::LongBreak, &settings);
        assert_eq!(state.stage, Stage::LongBreak);
        assert_eq!(state.seconds_remaining, 15 * 60);
        assert!(!state.is_running);
    }
}
