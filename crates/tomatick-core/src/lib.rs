//! # Tomatick Core Library
//!
//! Core logic for the Tomatick Pomodoro timer: alternating work and break
//! stages, tracked across periods when the host cannot deliver ticks, with
//! per-day totals.
//!
//! ## Architecture
//!
//! - **Stage clock / cycle controller**: pure functions over [`TimerState`].
//!   [`timer::tick`] advances one second; [`timer::reconcile`] replays an
//!   arbitrary gap in one step with the same result.
//! - **Ledger**: per-date completed pomodoros and work minutes.
//! - **Storage**: an opaque [`KeyValueStore`] (SQLite or in-memory) holding
//!   three JSON blobs, plus a TOML [`AppConfig`] for host preferences.
//! - **Engine**: [`TimerEngine`] ties the above to injected collaborators
//!   (store, [`Notifier`], [`WallClock`]).
//!
//! Single-threaded by design: the caller must not deliver ticks while a
//! `resume()` is in progress.

pub mod error;
pub mod events;
pub mod notify;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod wall_clock;

pub use error::{ConfigError, CoreError, NotifyError, StorageError, ValidationError};
pub use events::{format_clock, Event};
pub use notify::{CountingNotifier, Notifier, SilentNotifier};
pub use stats::{DailyStat, Ledger};
pub use storage::{AppConfig, Database, KeyValueStore, MemoryStore};
pub use timer::{Settings, Stage, TimerEngine, TimerState};
pub use wall_clock::{whole_secs_between, ManualWallClock, SystemWallClock, WallClock};
