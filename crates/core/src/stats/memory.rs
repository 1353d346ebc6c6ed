//! In-process statistics.

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;

use super::{DailyStatistics, StatisticsTotals};
use crate::ledger::{LedgerEntry, LedgerObserver, ObserverError};

/// Daily statistics kept in memory, keyed by UTC date.
#[derive(Debug, Default)]
pub struct MemoryStatistics {
    days: DashMap<NaiveDate, DailyStatistics>,
}

impl MemoryStatistics {
    /// Creates empty statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts `entry` on the day it was committed.
    pub fn record(&self, entry: &LedgerEntry) {
        let date = entry.created_at.date_naive();
        self.days
            .entry(date)
            .or_insert_with(|| DailyStatistics::new(date))
            .record(entry);
    }

    /// Counters for one day, if anything was recorded.
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> Option<DailyStatistics> {
        self.days.get(&date).map(|day| day.value().clone())
    }

    /// Every recorded day, oldest first.
    #[must_use]
    pub fn days(&self) -> Vec<DailyStatistics> {
        let mut days: Vec<DailyStatistics> = self.days.iter().map(|d| d.value().clone()).collect();
        days.sort_by_key(|d| d.date);
        days
    }

    /// Totals across all days.
    #[must_use]
    pub fn totals(&self) -> StatisticsTotals {
        StatisticsTotals::from_days(&self.days())
    }
}

#[async_trait]
impl LedgerObserver for MemoryStatistics {
    async fn entry_committed(&self, entry: &LedgerEntry) -> Result<(), ObserverError> {
        self.record(entry);
        Ok(())
    }
}
