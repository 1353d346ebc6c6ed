//! Daily statistics repository.

use async_trait::async_trait;
use chrono::NaiveDate;
use coinvault_core::ledger::{LedgerEntry, LedgerObserver, ObserverError};
use coinvault_core::stats::{DailyStatistics, StatisticsTotals, StatsError, profit_of};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, QueryOrder, Statement,
};

use crate::entities::daily_statistics;

const RECORD_SQL: &str = r"
INSERT INTO daily_statistics (date, transactions, profit)
VALUES ($1, 1, $2)
ON CONFLICT (date) DO UPDATE
SET transactions = daily_statistics.transactions + 1,
    profit = daily_statistics.profit + EXCLUDED.profit
";

/// Per-day counters stored in `daily_statistics`.
#[derive(Debug, Clone)]
pub struct StatisticsRepository {
    db: DatabaseConnection,
}

impl StatisticsRepository {
    /// Creates a new statistics repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Counts one committed entry on its commit day.
    ///
    /// # Errors
    ///
    /// Returns an error if the upsert fails.
    pub async fn record(&self, entry: &LedgerEntry) -> Result<(), DbErr> {
        let date: NaiveDate = entry.created_at.date_naive();
        self.db
            .execute(Statement::from_sql_and_values(
                DbBackend::Postgres,
                RECORD_SQL,
                [date.into(), profit_of(entry).into()],
            ))
            .await?;
        Ok(())
    }

    /// Every recorded day, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn days(&self) -> Result<Vec<DailyStatistics>, DbErr> {
        let days = daily_statistics::Entity::find()
            .order_by_asc(daily_statistics::Column::Date)
            .all(&self.db)
            .await?;
        Ok(days.into_iter().map(DailyStatistics::from).collect())
    }

    /// Counters for one day.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn day(&self, date: NaiveDate) -> Result<Option<DailyStatistics>, DbErr> {
        let day = daily_statistics::Entity::find_by_id(date).one(&self.db).await?;
        Ok(day.map(DailyStatistics::from))
    }

    /// Totals across all days.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn totals(&self) -> Result<StatisticsTotals, DbErr> {
        Ok(StatisticsTotals::from_days(&self.days().await?))
    }
}

#[async_trait]
impl LedgerObserver for StatisticsRepository {
    async fn entry_committed(&self, entry: &LedgerEntry) -> Result<(), ObserverError> {
        self.record(entry)
            .await
            .map_err(|e| StatsError::Storage(e.to_string()).into())
    }
}
