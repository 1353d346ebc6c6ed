//! Cached BTC to fiat conversion.
//!
//! The rate is fetched once per currency and reused until the process
//! restarts. Failed lookups are not cached, so the next call retries.

use std::fmt;
use std::sync::Arc;

use coinvault_shared::types::Btc;
use moka::future::Cache;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};
use tracing::warn;

use super::source::{RateError, RateSource};

/// Text shown in place of a fiat amount when no rate is available.
pub const UNAVAILABLE: &str = "Not available at the moment";

/// Maximum number of currencies kept in the cache.
const DEFAULT_CACHE_CAPACITY: u64 = 64;

/// Fiat amounts are truncated to this many places.
const FIAT_SCALE: u32 = 2;

/// Result of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Converted amount, truncated to cents and normalized.
    Available(Decimal),
    /// No rate could be obtained.
    Unavailable,
}

impl Conversion {
    /// The converted amount, if any.
    #[must_use]
    pub const fn amount(&self) -> Option<Decimal> {
        match self {
            Self::Available(amount) => Some(*amount),
            Self::Unavailable => None,
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available(amount) => write!(f, "{amount}"),
            Self::Unavailable => f.write_str(UNAVAILABLE),
        }
    }
}

impl Serialize for Conversion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Converts bitcoin amounts using a cached per-currency rate.
pub struct RateConverter<R: RateSource> {
    source: Arc<R>,
    cache: Cache<String, Decimal>,
}

impl<R: RateSource> RateConverter<R> {
    /// Creates a converter with an empty cache.
    pub fn new(source: Arc<R>) -> Self {
        Self {
            source,
            cache: Cache::builder().max_capacity(DEFAULT_CACHE_CAPACITY).build(),
        }
    }

    /// Rate for `currency`, from cache or from the source.
    ///
    /// Concurrent misses for the same currency share one fetch.
    pub async fn rate(&self, currency: &str) -> Result<Decimal, RateError> {
        let key = currency.to_ascii_lowercase();
        let source = Arc::clone(&self.source);
        self.cache
            .try_get_with(key.clone(), async move { source.fetch_rate(&key).await })
            .await
            .map_err(|e| (*e).clone())
    }

    /// Converts `amount` into `currency`, degrading to `Unavailable`.
    pub async fn convert(&self, amount: Btc, currency: &str) -> Conversion {
        self.convert_decimal(amount.as_decimal(), currency).await
    }

    /// Converts an arbitrary decimal balance, which may be negative for
    /// the platform wallet.
    pub async fn convert_decimal(&self, amount: Decimal, currency: &str) -> Conversion {
        match self.rate(currency).await {
            Ok(rate) => Conversion::Available(
                (amount * rate)
                    .round_dp_with_strategy(FIAT_SCALE, RoundingStrategy::ToZero)
                    .normalize(),
            ),
            Err(e) => {
                warn!(currency, error = %e, "BTC rate unavailable");
                Conversion::Unavailable
            }
        }
    }
}
