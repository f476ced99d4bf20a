//! Daily statistics for Tomatick.
//!
//! Only per-day totals are kept: completed pomodoros and work minutes.

mod ledger;

pub use ledger::{DailyStat, Ledger};
