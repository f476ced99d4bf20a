use std::io::Write;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use tokio::time::MissedTickBehavior;
use tomatick_core::{format_clock, whole_secs_between, AppConfig, Event, TimerEngine};

use crate::session::Session;

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start the current stage
    Start,
    /// Pause the current stage
    Pause,
    /// Start if paused, pause if running
    Toggle,
    /// Rewind the current stage to its full length
    Reset,
    /// Abandon the current stage and move on
    Skip,
    /// Print current timer state as JSON
    Status,
    /// Run the timer in the foreground until Ctrl-C.
    ///
    /// Only one `run` process per data directory is supported: it saves its
    /// own state every second, so changes made from another terminal while
    /// it runs are overwritten.
    Run,
}

pub fn run(action: TimerAction, app_config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::open(app_config)?;
    let engine = &mut session.engine;

    let event = match action {
        TimerAction::Start => engine.start(),
        TimerAction::Pause => engine.pause(),
        TimerAction::Toggle => engine.toggle(),
        TimerAction::Reset => engine.reset(),
        TimerAction::Skip => engine.skip(),
        TimerAction::Status => Some(engine.snapshot()),
        TimerAction::Run => {
            engine.start();
            run_foreground(engine)?;
            None
        }
    };

    match event {
        Some(event) => println!("{}", serde_json::to_string_pretty(&event)?),
        None => println!("{}", serde_json::to_string_pretty(&engine.snapshot())?),
    }

    session.close();
    Ok(())
}

/// Deliver one tick per second until Ctrl-C.
///
/// Gaps are measured on the wall clock, which keeps moving while the host
/// sleeps. If the loop wakes up late (process stopped, host asleep) the
/// missed seconds are replayed in one jump instead of tick by tick.
fn run_foreground(engine: &mut TimerEngine) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval.tick().await;
        let mut last = Utc::now();
        print_line(engine);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let event = match seconds_passed(&mut last, Utc::now()) {
                        0 => None,
                        1 => engine.tick(),
                        missed => engine.catch_up(missed),
                    };
                    if let Some(Event::StageCompleted { from, to, .. }) = &event {
                        println!("\n{from} finished, {to} started");
                    }
                    if let Some(Event::Reconciled { stages_crossed, .. }) = &event {
                        if *stages_crossed > 0 {
                            println!("\ncaught up across {stages_crossed} stage(s)");
                        }
                    }
                    print_line(engine);
                }
                _ = tokio::signal::ctrl_c() => {
                    println!();
                    break;
                }
            }
        }
    });
    Ok(())
}

/// Whole wall-clock seconds since `last`, advancing `last` by exactly that
/// much so rounding never accumulates. A clock set backwards restarts the
/// measurement from `now`.
fn seconds_passed(last: &mut DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    if now < *last {
        *last = now;
        return 0;
    }
    let secs = whole_secs_between(last, &now);
    let counted_ms = i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    *last = *last + chrono::Duration::milliseconds(counted_ms);
    secs
}

fn print_line(engine: &TimerEngine) {
    let state = engine.state();
    let mut stdout = std::io::stdout();
    let _ = write!(
        stdout,
        "\r{:<12} {}  today: {}  cycle: {}/{}   ",
        state.stage.label(),
        format_clock(state.seconds_remaining),
        state.pomodoros_completed_today,
        state.pomodoros_completed_in_cycle,
        engine.settings().pomodoros_per_long_break,
    );
    let _ = stdout.flush();
}
