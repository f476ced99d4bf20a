//! One CLI invocation's view of the timer.
//!
//! A process that is not running counts as a suspended host: opening a
//! session reconciles the time since the last invocation, closing it
//! suspends a running timer again.

use tomatick_core::{AppConfig, Database, Event, SystemWallClock, TimerEngine};

use crate::notifier::TerminalNotifier;

pub struct Session {
    pub engine: TimerEngine,
}

impl Session {
    pub fn open(app_config: &AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let db = Database::open()?;
        let mut engine = TimerEngine::load(
            Box::new(db),
            TerminalNotifier::from_config(&app_config.notifications),
            Box::new(SystemWallClock),
        );
        if let Some(Event::Reconciled {
            elapsed_secs,
            stages_crossed,
            work_completions,
            ..
        }) = engine.resume()
        {
            tracing::info!(elapsed_secs, stages_crossed, work_completions, "caught up");
        }
        Ok(Self { engine })
    }

    pub fn close(mut self) {
        self.engine.suspend();
    }
}
