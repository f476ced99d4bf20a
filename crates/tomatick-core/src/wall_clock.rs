//! Source of wall-clock time and the local calendar date.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};

pub trait WallClock {
    fn now(&self) -> DateTime<Local>;

    /// Local calendar date, used to key the ledger.
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// Whole seconds from `from` to `to`, rounded half up. A clock that moved
/// backwards yields zero.
pub fn whole_secs_between<Tz: TimeZone>(from: &DateTime<Tz>, to: &DateTime<Tz>) -> u64 {
    let ms = to.clone().signed_duration_since(from.clone()).num_milliseconds();
    if ms <= 0 {
        return 0;
    }
    u64::try_from(ms.saturating_add(500) / 1000).unwrap_or(0)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemWallClock;

impl WallClock for SystemWallClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualWallClock {
    now: Rc<Cell<DateTime<Local>>>,
}

impl ManualWallClock {
    pub fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl WallClock for ManualWallClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}
