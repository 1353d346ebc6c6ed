//! Platform statistics (admin token).

use axum::{
    Json, Router,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use chrono::NaiveDate;
use coinvault_core::stats::{DailyStatistics, StatisticsTotals};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::{AppState, error::ApiError};

/// Creates the statistics routes (requires admin middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/statistics", get(get_statistics))
        .route("/statistics/daily", get(list_daily_statistics))
}

/// Query parameters for statistics.
#[derive(Debug, Deserialize)]
pub struct StatisticsQuery {
    /// Restrict totals to a single day.
    pub date: Option<NaiveDate>,
}

/// Transaction count and profit.
#[derive(Debug, Serialize)]
pub struct StatisticsResponse {
    /// Number of committed ledger entries.
    pub transactions: i64,
    /// Sum of platform profit entries, in BTC.
    pub profit: String,
}

impl From<StatisticsTotals> for StatisticsResponse {
    fn from(totals: StatisticsTotals) -> Self {
        Self {
            transactions: totals.transactions,
            profit: totals.profit.normalize().to_string(),
        }
    }
}

/// GET `/statistics` - Totals over all days, or one day with `?date=`.
async fn get_statistics(
    State(state): State<AppState>,
    Query(query): Query<StatisticsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let totals = match query.date {
        Some(date) => {
            let day = state.statistics.day(date).await.map_err(|e| {
                error!(error = %e, %date, "Failed to load statistics");
                ApiError::from(e)
            })?;
            let day = day.unwrap_or_else(|| DailyStatistics::new(date));
            StatisticsTotals::from_days([&day])
        }
        None => state.statistics.totals().await.map_err(|e| {
            error!(error = %e, "Failed to load statistics");
            ApiError::from(e)
        })?,
    };

    Ok(Json(StatisticsResponse::from(totals)))
}

/// GET `/statistics/daily` - One row per day, oldest first.
async fn list_daily_statistics(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let days = state.statistics.days().await.map_err(|e| {
        error!(error = %e, "Failed to load daily statistics");
        ApiError::from(e)
    })?;
    Ok(Json(days))
}
