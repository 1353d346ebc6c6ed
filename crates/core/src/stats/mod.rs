//! Per-day transaction counters and platform profit.
//!
//! Fed after commit through `LedgerObserver`, so a statistics failure
//! never affects a transfer.

pub mod memory;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::{LedgerEntry, ObserverError, TransferKind};

pub use memory::MemoryStatistics;

/// Errors raised by a statistics backend.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Backend storage failure.
    #[error("Statistics storage error: {0}")]
    Storage(String),
}

impl From<StatsError> for ObserverError {
    fn from(err: StatsError) -> Self {
        Self(err.to_string())
    }
}

/// Counters for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatistics {
    /// The day.
    pub date: NaiveDate,
    /// Number of committed entries.
    pub transactions: i64,
    /// Sum of `PlatformProfit` amounts.
    pub profit: Decimal,
}

impl DailyStatistics {
    /// Empty counters for `date`.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            transactions: 0,
            profit: Decimal::ZERO,
        }
    }

    /// Counts one committed entry.
    pub fn record(&mut self, entry: &LedgerEntry) {
        self.transactions += 1;
        self.profit += profit_of(entry);
    }
}

/// Totals across every recorded day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsTotals {
    /// Number of committed entries.
    pub transactions: i64,
    /// Platform profit.
    pub profit: Decimal,
}

impl StatisticsTotals {
    /// Sums a set of days.
    pub fn from_days<'a, I>(days: I) -> Self
    where
        I: IntoIterator<Item = &'a DailyStatistics>,
    {
        days.into_iter().fold(Self::default(), |acc, day| Self {
            transactions: acc.transactions + day.transactions,
            profit: acc.profit + day.profit,
        })
    }
}

/// Profit contributed by `entry`: its amount for a fee skim, else zero.
#[must_use]
pub fn profit_of(entry: &LedgerEntry) -> Decimal {
    if entry.kind == TransferKind::PlatformProfit {
        entry.amount.as_decimal()
    } else {
        Decimal::ZERO
    }
}
