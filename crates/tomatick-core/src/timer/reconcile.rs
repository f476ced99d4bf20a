//! Pure transition functions over [`TimerState`].
//!
//! [`tick`] is what the scheduler calls once per second while the timer runs.
//! [`reconcile`] replaces the ticks that were never delivered while the
//! application was suspended, and lands on the same state N ticks would have
//! produced. A stage with zero seconds left is held by both; only
//! [`crate::TimerEngine::start`] reloads it.
//!
//! ```text
//! remaining = seconds_remaining - elapsed
//! while remaining <= 0:
//!     overrun = -remaining
//!     stage   = advance(stage)
//!     remaining = duration(stage) - overrun
//! ```

use tracing::{debug, warn};

use super::clock::{self, ClockTick};
use super::cycle::{self, Transition};
use super::settings::Settings;
use super::state::TimerState;

/// Result of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub state: TimerState,
    /// Set when this tick finished a stage.
    pub transition: Option<Transition>,
}

/// Advance the timer by one second.
///
/// When the countdown reaches zero the next stage is loaded straight away
/// and keeps running, so a stage boundary costs no extra tick.
pub fn tick(mut state: TimerState, settings: &Settings) -> TickOutcome {
    let transition = match clock::count_down(&mut state) {
        ClockTick::StageComplete if !settings.has_zero_duration() => {
            Some(cycle::complete_stage(&mut state, settings))
        }
        ClockTick::StageComplete => {
            warn!("stage finished under a zero-length configuration; holding at zero");
            None
        }
        ClockTick::Idle | ClockTick::Counted => None,
    };
    TickOutcome { state, transition }
}

/// Result of a catch-up pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub state: TimerState,
    /// Every stage boundary crossed during the gap, in order.
    pub transitions: Vec<Transition>,
}

impl Reconciliation {
    pub fn crossed_boundary(&self) -> bool {
        !self.transitions.is_empty()
    }

    /// Number of work stages finished during the gap.
    pub fn work_completions(&self) -> u32 {
        self.transitions
            .iter()
            .filter(|t| t.work_completed.is_some())
            .count() as u32
    }

    pub fn work_minutes(&self) -> u64 {
        self.transitions
            .iter()
            .filter_map(|t| t.work_completed)
            .map(|w| u64::from(w.work_minutes))
            .sum()
    }
}

/// Replay `elapsed_secs` of continuous ticking in one step.
///
/// The returned state is running. Ledger credits are left to the caller,
/// which knows the calendar date the reconciliation runs on.
pub fn reconcile(state: TimerState, settings: &Settings, elapsed_secs: u64) -> Reconciliation {
    let mut state = state;
    let mut transitions = Vec::new();
    let elapsed = i64::try_from(elapsed_secs).unwrap_or(i64::MAX);
    let mut remaining = to_signed(state.seconds_remaining).saturating_sub(elapsed);

    if settings.has_zero_duration() {
        warn!(elapsed_secs, "zero-length stage configured; reconciling without stage replay");
    } else if state.seconds_remaining == 0 {
        // A stage already at zero is held there, as `tick` holds it.
        debug!(stage = %state.stage, "stage held at zero; nothing to replay");
    } else {
        while remaining <= 0 {
            let overrun = remaining.saturating_neg();
            transitions.push(cycle::complete_stage(&mut state, settings));
            remaining = to_signed(settings.duration_secs(state.stage)).saturating_sub(overrun);
        }
    }

    state.seconds_remaining = u64::try_from(remaining).unwrap_or(0);
    state.is_running = true;

    debug!(
        elapsed_secs,
        crossed = transitions.len(),
        stage = %state.stage,
        seconds_remaining = state.seconds_remaining,
        "reconciled suspended interval"
    );
    Reconciliation { state, transitions }
}

fn to_signed(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}
