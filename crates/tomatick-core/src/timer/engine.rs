//! Timer engine implementation.
//!
//! The engine owns the application state (settings, timer state, ledger) and
//! the collaborators it talks to (store, notifier, wall clock). It does not
//! run a thread: the caller delivers `tick()` once per second while running,
//! and calls `suspend()` / `resume()` around periods when it cannot.
//!
//! ## State Transitions
//!
//! ```text
//! stopped --start--> running --pause--> stopped
//! running --suspend--> suspended --resume (reconcile)--> running
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::load(store, notifier, wall_clock);
//! engine.resume();          // catch up on time spent not running
//! engine.start();
//! // Once per second:
//! engine.tick();            // Some(Event::StageCompleted) on a boundary
//! ```
//!
//! Persistence and notification failures are logged and otherwise ignored;
//! the in-memory state stays authoritative.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, warn};

use super::clock;
use super::cycle::Transition;
use super::reconcile::{self, Reconciliation};
use super::settings::Settings;
use super::stage::Stage;
use super::state::TimerState;
use crate::error::ValidationError;
use crate::events::{format_clock, Event};
use crate::notify::Notifier;
use crate::stats::{DailyStat, Ledger};
use crate::storage::persist::{self, PersistedTimerState};
use crate::storage::{KeyValueStore, DAILY_STATS_KEY, SETTINGS_KEY, TIMER_STATE_KEY};
use crate::wall_clock::{self, WallClock};

pub struct TimerEngine {
    settings: Settings,
    state: TimerState,
    /// Date `state.pomodoros_completed_today` refers to.
    counted_on: NaiveDate,
    ledger: Ledger,
    /// Wall time tick delivery stopped while running.
    suspended_at: Option<DateTime<Utc>>,
    store: Box<dyn KeyValueStore>,
    notifier: Box<dyn Notifier>,
    wall_clock: Box<dyn WallClock>,
}

impl TimerEngine {
    /// Fresh engine with default settings, a full work stage and an empty
    /// ledger. Nothing is read from `store`.
    pub fn new(
        store: Box<dyn KeyValueStore>,
        notifier: Box<dyn Notifier>,
        wall_clock: Box<dyn WallClock>,
    ) -> Self {
        let settings = Settings::default();
        let counted_on = wall_clock.today();
        Self {
            state: TimerState::new(&settings),
            settings,
            counted_on,
            ledger: Ledger::new(),
            suspended_at: None,
            store,
            notifier,
            wall_clock,
        }
    }

    /// Restore settings, timer snapshot and ledger from `store`.
    ///
    /// Never fails: unreadable blobs fall back to defaults. The restored timer
    /// is stopped; if it was running when saved, a suspension is pending and
    /// the next `resume()` reconciles the time since.
    pub fn load(
        store: Box<dyn KeyValueStore>,
        notifier: Box<dyn Notifier>,
        wall_clock: Box<dyn WallClock>,
    ) -> Self {
        let today = wall_clock.today();
        let settings = persist::decode_settings(read_blob(&*store, SETTINGS_KEY).as_deref());
        let restored = persist::decode_timer_state(
            read_blob(&*store, TIMER_STATE_KEY).as_deref(),
            &settings,
            today,
        );
        let ledger = persist::decode_ledger(read_blob(&*store, DAILY_STATS_KEY).as_deref());

        debug!(
            stage = %restored.state.stage,
            seconds_remaining = restored.state.seconds_remaining,
            suspended = restored.suspended_at.is_some(),
            days = ledger.len(),
            "loaded timer"
        );

        Self {
            settings,
            state: restored.state,
            counted_on: restored.counted_on,
            ledger,
            suspended_at: restored.suspended_at,
            store,
            notifier,
            wall_clock,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended_at.is_some()
    }

    /// Ledger entry for the wall clock's current date.
    pub fn today_stat(&self) -> Option<DailyStat> {
        self.ledger.get(self.wall_clock.today()).copied()
    }

    pub fn total_secs(&self) -> u64 {
        self.settings.duration_secs(self.state.stage)
    }

    /// 0.0 .. 1.0 progress within current stage.
    pub fn stage_progress(&self) -> f64 {
        let total = self.total_secs();
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.state.seconds_remaining as f64 / total as f64)
    }

    /// Build a full state snapshot event. A count from a previous day shows
    /// as 0 even before the next tick rolls it over.
    pub fn snapshot(&self) -> Event {
        let pomodoros_completed_today = if self.wall_clock.today() == self.counted_on {
            self.state.pomodoros_completed_today
        } else {
            0
        };
        Event::StateSnapshot {
            stage: self.state.stage,
            stage_label: self.state.stage.label().to_string(),
            seconds_remaining: self.state.seconds_remaining,
            total_secs: self.total_secs(),
            clock: format_clock(self.state.seconds_remaining),
            progress: self.stage_progress(),
            is_running: self.state.is_running,
            pomodoros_completed_today,
            pomodoros_completed_in_cycle: self.state.pomodoros_completed_in_cycle,
            pomodoros_per_long_break: self.settings.pomodoros_per_long_break,
            at: self.now(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.settle();
        if self.state.is_running {
            return None;
        }
        self.roll_day(self.wall_clock.today());
        if self.state.seconds_remaining == 0 {
            self.state.seconds_remaining = self.total_secs();
        }
        self.state.is_running = true;
        self.persist_state();
        Some(Event::TimerStarted {
            stage: self.state.stage,
            seconds_remaining: self.state.seconds_remaining,
            at: self.now(),
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.settle();
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        self.persist_state();
        Some(Event::TimerPaused {
            stage: self.state.stage,
            seconds_remaining: self.state.seconds_remaining,
            at: self.now(),
        })
    }

    /// Start when stopped, pause when running.
    pub fn toggle(&mut self) -> Option<Event> {
        self.settle();
        if self.state.is_running {
            self.pause()
        } else {
            self.start()
        }
    }

    /// Stop and rewind the current stage to its full length.
    pub fn reset(&mut self) -> Option<Event> {
        self.settle();
        let stage = self.state.stage;
        clock::reset(&mut self.state, stage, &self.settings);
        self.persist_state();
        Some(Event::TimerReset {
            stage: self.state.stage,
            seconds_remaining: self.state.seconds_remaining,
            at: self.now(),
        })
    }

    /// Abandon the current stage. Work goes to a short break, any break goes
    /// to work. Nothing is credited and the cycle count is left alone.
    pub fn skip(&mut self) -> Option<Event> {
        self.settle();
        let from = self.state.stage;
        let to = match from {
            Stage::Work => Stage::ShortBreak,
            Stage::ShortBreak | Stage::LongBreak => Stage::Work,
        };
        clock::reset(&mut self.state, to, &self.settings);
        self.notify();
        self.persist_state();
        Some(Event::TimerSkipped {
            from,
            to,
            at: self.now(),
        })
    }

    /// Call once per second. Returns `Some(Event::StageCompleted)` when a
    /// stage finishes; the next stage is already running by then.
    pub fn tick(&mut self) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        let today = self.wall_clock.today();
        self.roll_day(today);

        let outcome = reconcile::tick(self.state, &self.settings);
        self.state = outcome.state;

        let event = outcome.transition.map(|t| {
            self.credit(&t, today);
            self.notify();
            debug!(from = %t.from, to = %t.to, "stage completed");
            Event::StageCompleted {
                from: t.from,
                to: t.to,
                work_completed: t.work_completed.is_some(),
                at: self.now(),
            }
        });
        if event.is_some() {
            self.persist_ledger();
        }
        self.persist_state();
        event
    }

    /// Stop tick delivery. Only meaningful while running; the time until
    /// `resume()` is replayed by the reconciler.
    pub fn suspend(&mut self) -> Option<Event> {
        if !self.state.is_running || self.suspended_at.is_some() {
            return None;
        }
        let at = self.now();
        self.suspended_at = Some(at);
        self.state.is_running = false;
        self.persist_state();
        Some(Event::Suspended {
            stage: self.state.stage,
            seconds_remaining: self.state.seconds_remaining,
            at,
        })
    }

    /// Catch up on a pending suspension and keep running.
    ///
    /// Work completions inside the gap are credited to today's date as seen
    /// now, not the date the stage started on. At most one notification fires
    /// however many stages were crossed. Without a pending suspension this
    /// is a no-op, so repeated resume signals are harmless.
    pub fn resume(&mut self) -> Option<Event> {
        let suspended_at = self.suspended_at.take()?;
        let elapsed_secs = wall_clock::whole_secs_between(&suspended_at, &self.now());
        Some(self.replay(elapsed_secs))
    }

    /// Replay `elapsed_secs` of ticks that a running timer missed without
    /// being suspended first (a stalled scheduler, a sleeping host).
    pub fn catch_up(&mut self, elapsed_secs: u64) -> Option<Event> {
        if !self.state.is_running || self.suspended_at.is_some() {
            return None;
        }
        Some(self.replay(elapsed_secs))
    }

    /// Replace the settings wholesale.
    ///
    /// Stops the timer, keeps the current stage, reloads its full length under
    /// the new settings and restarts the long-break cycle.
    pub fn apply_settings(&mut self, settings: Settings) -> Result<Event, ValidationError> {
        settings.validate()?;
        self.settle();
        self.settings = settings;
        let stage = self.state.stage;
        clock::reset(&mut self.state, stage, &self.settings);
        self.state.pomodoros_completed_in_cycle = 0;
        self.persist_settings();
        self.persist_state();
        Ok(Event::SettingsApplied {
            settings,
            stage: self.state.stage,
            seconds_remaining: self.state.seconds_remaining,
            at: self.now(),
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn now(&self) -> DateTime<Utc> {
        self.wall_clock.now().with_timezone(&Utc)
    }

    /// Resolve a pending suspension before a user action touches the state.
    fn settle(&mut self) {
        if self.suspended_at.is_some() {
            self.resume();
        }
    }

    fn replay(&mut self, elapsed_secs: u64) -> Event {
        let today = self.wall_clock.today();
        self.roll_day(today);

        let reconciliation = reconcile::reconcile(self.state, &self.settings, elapsed_secs);
        self.apply_reconciliation(&reconciliation, today);

        Event::Reconciled {
            elapsed_secs,
            stages_crossed: reconciliation.transitions.len(),
            work_completions: reconciliation.work_completions(),
            stage: self.state.stage,
            seconds_remaining: self.state.seconds_remaining,
            at: self.now(),
        }
    }

    fn apply_reconciliation(&mut self, reconciliation: &Reconciliation, today: NaiveDate) {
        self.state = reconciliation.state;
        for transition in &reconciliation.transitions {
            self.credit(transition, today);
        }
        if reconciliation.crossed_boundary() {
            self.notify();
            self.persist_ledger();
        }
        self.persist_state();
    }

    fn roll_day(&mut self, today: NaiveDate) {
        if today != self.counted_on {
            debug!(from = %self.counted_on, to = %today, "day rollover");
            self.counted_on = today;
            self.state.pomodoros_completed_today = 0;
        }
    }

    fn credit(&mut self, transition: &Transition, today: NaiveDate) {
        if let Some(work) = transition.work_completed {
            self.ledger.record_completion(today, work.work_minutes);
        }
    }

    fn notify(&self) {
        if let Err(e) = self.notifier.play_completion_sound() {
            debug!(error = %e, "notification failed");
        }
    }

    fn persist_state(&self) {
        // A running timer is saved as if it were suspended now, so a process
        // that dies without suspending still gets its time reconciled.
        let suspended_at = if self.state.is_running {
            Some(self.now())
        } else {
            self.suspended_at
        };
        let snapshot = PersistedTimerState {
            stage: self.state.stage,
            seconds_remaining: self.state.seconds_remaining,
            pomodoros_completed_today: self.state.pomodoros_completed_today,
            pomodoros_completed_in_cycle: self.state.pomodoros_completed_in_cycle,
            persisted_date: self.counted_on,
            suspended_at,
        };
        self.write_blob(TIMER_STATE_KEY, persist::encode_timer_state(&snapshot));
    }

    fn persist_ledger(&self) {
        self.write_blob(DAILY_STATS_KEY, persist::encode_ledger(&self.ledger));
    }

    fn persist_settings(&self) {
        self.write_blob(SETTINGS_KEY, persist::encode_settings(&self.settings));
    }

    fn write_blob(&self, key: &str, encoded: Result<String, serde_json::Error>) {
        let result = encoded
            .map_err(|e| e.to_string())
            .and_then(|value| self.store.set(key, &value).map_err(|e| e.to_string()));
        if let Err(e) = result {
            warn!(key, error = %e, "failed to persist, keeping in-memory state");
        }
    }
}

fn read_blob(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value,
        Err(e) => {
            warn!(key, error = %e, "failed to read persisted state, using defaults");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::CountingNotifier;
    use crate::storage::MemoryStore;
    use crate::wall_clock::ManualWallClock;
    use chrono::{Duration, Local, TimeZone};

    struct Harness {
        engine: TimerEngine,
        store: MemoryStore,
        notifier: CountingNotifier,
        clock: ManualWallClock,
    }

    fn harness() -> Harness {
        let store = MemoryStore::new();
        let notifier = CountingNotifier::new();
        let clock = ManualWallClock::new(
            Local.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).earliest().unwrap(),
        );
        let engine = TimerEngine::new(
            Box::new(store.clone()),
            Box::new(notifier.clone()),
            Box::new(clock.clone()),
        );
        Harness {
            engine,
            store,
            notifier,
            clock,
        }
    }

    #[test]
    fn start_pause_toggle() {
        let mut h = harness();
        assert!(!h.engine.is_running());
        assert!(h.engine.start().is_some());
        assert!(h.engine.is_running());
        assert!(h.engine.start().is_none());
        assert!(h.engine.pause().is_some());
        assert!(!h.engine.is_running());
        assert!(h.engine.pause().is_none());
        h.engine.toggle();
        assert!(h.engine.is_running());
        h.engine.toggle();
        assert!(!h.engine.is_running());
    }

    #[test]
    fn tick_only_counts_while_running() {
        let mut h = harness();
        assert!(h.engine.tick().is_none());
        assert_eq!(h.engine.state().seconds_remaining, 1500);
        h.engine.start();
        h.engine.tick();
        assert_eq!(h.engine.state().seconds_remaining, 1499);
    }

    #[test]
    fn finishing_work_credits_ledger_and_notifies() {
        let mut h = harness();
        h.engine.start();
        for _ in 0..1500 {
            h.engine.tick();
        }
        assert_eq!(h.engine.state().stage, Stage::ShortBreak);
        assert!(h.engine.is_running());
        assert_eq!(h.engine.state().pomodoros_completed_today, 1);
        assert_eq!(
            h.engine.today_stat(),
            Some(DailyStat {
                count: 1,
                total_work_minutes: 25
            })
        );
        assert_eq!(h.notifier.calls(), 1);
    }

    #[test]
    fn reset_rewinds_current_stage() {
        let mut h = harness();
        h.engine.skip();
        h.engine.start();
        h.engine.tick();
        h.engine.tick();
        h.engine.reset();
        assert_eq!(h.engine.state().stage, Stage::ShortBreak);
        assert_eq!(h.engine.state().seconds_remaining, 300);
        assert!(!h.engine.is_running());
    }

    #[test]
    fn skip_goes_work_short_work_without_credit() {
        let mut h = harness();
        h.engine.skip();
        assert_eq!(h.engine.state().stage, Stage::ShortBreak);
        h.engine.skip();
        assert_eq!(h.engine.state().stage, Stage::Work);
        assert_eq!(h.engine.state().pomodoros_completed_today, 0);
        assert_eq!(h.engine.state().pomodoros_completed_in_cycle, 0);
        assert!(h.engine.ledger().is_empty());
        assert_eq!(h.notifier.calls(), 2);
    }

    #[test]
    fn suspend_resume_reconciles_gap() {
        let mut h = harness();
        h.engine.start();
        h.engine.suspend();
        assert!(!h.engine.is_running());
        h.clock.advance(Duration::seconds(1500 + 60));
        let event = h.engine.resume().unwrap();
        match event {
            Event::Reconciled {
                elapsed_secs,
                stages_crossed,
                work_completions,
                stage,
                seconds_remaining,
                ..
            } => {
                assert_eq!(elapsed_secs, 1560);
                assert_eq!(stages_crossed, 1);
                assert_eq!(work_completions, 1);
                assert_eq!(stage, Stage::ShortBreak);
                assert_eq!(seconds_remaining, 240);
            }
            other => panic!("Expected Reconciled, got {other:?}"),
        }
        assert!(h.engine.is_running());
    }

    #[test]
    fn second_resume_is_ignored() {
        let mut h = harness();
        h.engine.start();
        h.engine.suspend();
        h.clock.advance(Duration::seconds(10));
        assert!(h.engine.resume().is_some());
        h.clock.advance(Duration::seconds(10));
        assert!(h.engine.resume().is_none());
        assert_eq!(h.engine.state().seconds_remaining, 1490);
    }

    #[test]
    fn suspend_while_stopped_is_a_no_op() {
        let mut h = harness();
        assert!(h.engine.suspend().is_none());
        h.clock.advance(Duration::seconds(600));
        assert!(h.engine.resume().is_none());
        assert_eq!(h.engine.state().seconds_remaining, 1500);
        assert!(!h.engine.is_running());
    }

    #[test]
    fn catch_up_replays_missed_ticks() {
        let mut h = harness();
        assert!(h.engine.catch_up(30).is_none());
        h.engine.start();
        h.engine.catch_up(1500 + 10);
        assert_eq!(h.engine.state().stage, Stage::ShortBreak);
        assert_eq!(h.engine.state().seconds_remaining, 290);
        assert_eq!(h.engine.ledger().totals().count, 1);
        assert_eq!(h.notifier.calls(), 1);
    }

    #[test]
    fn many_stages_in_one_gap_notify_once() {
        let mut h = harness();
        h.engine.start();
        h.engine.suspend();
        h.clock.advance(Duration::hours(3));
        h.engine.resume();
        assert_eq!(h.notifier.calls(), 1);
    }

    #[test]
    fn apply_settings_keeps_stage_and_resets_cycle() {
        let mut h = harness();
        h.engine.start();
        for _ in 0..1500 {
            h.engine.tick();
        }
        assert_eq!(h.engine.state().pomodoros_completed_in_cycle, 1);
        let new = Settings {
            short_break_minutes: 2,
            ..Settings::default()
        };
        h.engine.apply_settings(new).unwrap();
        assert_eq!(h.engine.state().stage, Stage::ShortBreak);
        assert_eq!(h.engine.state().seconds_remaining, 120);
        assert_eq!(h.engine.state().pomodoros_completed_in_cycle, 0);
        assert!(!h.engine.is_running());
        assert_eq!(h.engine.settings(), &new);
    }

    #[test]
    fn apply_settings_rejects_zero_lengths() {
        let mut h = harness();
        let bad = Settings {
            work_minutes: 0,
            ..Settings::default()
        };
        assert!(h.engine.apply_settings(bad).is_err());
        assert_eq!(h.engine.settings(), &Settings::default());
    }

    #[test]
    fn notification_failure_does_not_stop_timer() {
        let store = MemoryStore::new();
        let clock = ManualWallClock::new(Local::now());
        let mut engine = TimerEngine::new(
            Box::new(store),
            Box::new(CountingNotifier::failing()),
            Box::new(clock),
        );
        engine.start();
        for _ in 0..1500 {
            engine.tick();
        }
        assert_eq!(engine.state().stage, Stage::ShortBreak);
        assert!(engine.is_running());
    }

    #[test]
    fn write_failures_keep_memory_state() {
        let mut h = harness();
        h.store.reject_writes(true);
        h.engine.start();
        h.engine.tick();
        assert_eq!(h.engine.state().seconds_remaining, 1499);
        assert!(h.store.is_empty());
    }

    #[test]
    fn state_survives_reload_with_pending_suspension() {
        let mut h = harness();
        h.engine.start();
        h.engine.tick();
        drop(h.engine);

        h.clock.advance(Duration::seconds(99));
        let mut reloaded = TimerEngine::load(
            Box::new(h.store.clone()),
            Box::new(h.notifier.clone()),
            Box::new(h.clock.clone()),
        );
        assert!(reloaded.is_suspended());
        assert!(!reloaded.is_running());
        reloaded.resume();
        assert_eq!(reloaded.state().seconds_remaining, 1400);
        assert!(reloaded.is_running());
    }

    #[test]
    fn snapshot_returns_display_view() {
        let h = harness();
        match h.engine.snapshot() {
            Event::StateSnapshot {
                stage,
                stage_label,
                seconds_remaining,
                total_secs,
                clock,
                pomodoros_per_long_break,
                ..
            } => {
                assert_eq!(stage, Stage::Work);
                assert_eq!(stage_label, "Work");
                assert_eq!(seconds_remaining, 1500);
                assert_eq!(total_secs, 1500);
                assert_eq!(clock, "25:00");
                assert_eq!(pomodoros_per_long_break, 4);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    #[test]
    fn zero_second_snapshot_is_not_credited_on_resume() {
        let h = harness();
        let now = h.clock.now().with_timezone(&Utc);
        let raw = format!(
            r#"{{"stage": "WORK", "seconds_remaining": 0, "pomodoros_completed_today": 0,
                "pomodoros_completed_in_cycle": 0, "persisted_date": "2024-06-01",
                "suspended_at": "{}"}}"#,
            now.to_rfc3339()
        );
        h.store.set(TIMER_STATE_KEY, &raw).unwrap();

        let mut engine = TimerEngine::load(
            Box::new(h.store.clone()),
            Box::new(h.notifier.clone()),
            Box::new(h.clock.clone()),
        );
        assert!(engine.resume().is_some());
        assert_eq!(engine.state().stage, Stage::Work);
        assert_eq!(engine.state().seconds_remaining, 1500);
        assert!(engine.ledger().is_empty());
        assert_eq!(h.notifier.calls(), 0);
    }

    #[test]
    fn paused_count_from_yesterday_reads_zero() {
        let mut h = harness();
        h.engine.start();
        for _ in 0..1500 {
            h.engine.tick();
        }
        h.engine.pause();
        assert_eq!(h.engine.state().pomodoros_completed_today, 1);

        h.clock.advance(Duration::days(1));
        match h.engine.snapshot() {
            Event::StateSnapshot {
                pomodoros_completed_today,
                ..
            } => assert_eq!(pomodoros_completed_today, 0),
            _ => panic!("Expected StateSnapshot"),
        }

        h.engine.start();
        assert_eq!(h.engine.state().pomodoros_completed_today, 0);
        assert_eq!(h.engine.ledger().totals().count, 1);
    }
}
