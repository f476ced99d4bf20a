//! Per-day completion ledger.
//!
//! Entries are created on the first work completion of a date and only ever
//! grow. Retention is somebody else's problem.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStat {
    pub count: u32,
    pub total_work_minutes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    days: BTreeMap<NaiveDate, DailyStat>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit one finished work stage to `date`. Returns the updated entry.
    pub fn record_completion(&mut self, date: NaiveDate, work_minutes: u32) -> DailyStat {
        let entry = self.days.entry(date).or_default();
        entry.count = entry.count.saturating_add(1);
        entry.total_work_minutes = entry
            .total_work_minutes
            .saturating_add(u64::from(work_minutes));
        *entry
    }

    pub fn get(&self, date: NaiveDate) -> Option<&DailyStat> {
        self.days.get(&date)
    }

    /// Newest date first.
    pub fn entries_desc(&self) -> impl Iterator<Item = (NaiveDate, DailyStat)> + '_ {
        self.days.iter().rev().map(|(d, s)| (*d, *s))
    }

    /// Sum over every recorded date.
    pub fn totals(&self) -> DailyStat {
        self.days.values().fold(DailyStat::default(), |acc, s| DailyStat {
            count: acc.count.saturating_add(s.count),
            total_work_minutes: acc.total_work_minutes.saturating_add(s.total_work_minutes),
        })
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Insert a loaded entry as-is. Only the persistence codec uses this.
    pub(crate) fn insert_loaded(&mut self, date: NaiveDate, stat: DailyStat) {
        self.days.insert(date, stat);
    }
}
