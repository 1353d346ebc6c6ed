//! Exchange rate source seam.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failure to obtain a rate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    /// Transport or HTTP status failure.
    #[error("Rate request failed: {0}")]
    Request(String),

    /// The response did not contain a usable rate.
    #[error("Unexpected rate response: {0}")]
    InvalidResponse(String),
}

/// Provides the price of one bitcoin in a fiat currency.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Fetches the current rate for `currency` (e.g. `usd`).
    async fn fetch_rate(&self, currency: &str) -> Result<Decimal, RateError>;
}
