//! Bitcoin amount type with fixed decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `rust_decimal::Decimal` values limited to 16 total digits,
//! 8 of them fractional (one satoshi is `0.00000001`). Anything finer is
//! either rejected (parsing) or truncated toward zero (calculations).

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits carried by an amount.
pub const BTC_SCALE: u32 = 8;

/// Total number of significant digits an amount may carry.
pub const BTC_MAX_DIGITS: u32 = 16;

/// Smallest integer part that no longer fits (10^8).
const INTEGER_LIMIT: i64 = 100_000_000;

/// Errors raised when constructing an amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The text is not a decimal number.
    #[error("Invalid amount format: {0}")]
    Malformed(String),

    /// More than 8 fractional digits.
    #[error("Amount {0} has more than {BTC_SCALE} decimal places")]
    TooPrecise(Decimal),

    /// More than 16 total digits.
    #[error("Amount {0} exceeds {BTC_MAX_DIGITS} total digits")]
    TooLarge(Decimal),
}

/// An amount of bitcoin.
///
/// The value is kept at scale 8, so `Btc::parse("0.55")` stores
/// `0.55000000`. `Display` prints the normalized form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Btc(Decimal);

impl Btc {
    /// Zero bitcoin.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// One satoshi.
    pub const SATOSHI: Self = Self(Decimal::from_parts(1, 0, 0, false, BTC_SCALE));

    /// Parses a decimal string, rejecting values that do not fit.
    pub fn parse(s: &str) -> Result<Self, AmountError> {
        let value =
            Decimal::from_str(s.trim()).map_err(|_| AmountError::Malformed(s.to_string()))?;
        Self::try_from(value)
    }

    /// Truncates `value` toward zero to 8 decimal places.
    ///
    /// Never rounds up: `0.000000039` becomes `0.00000003`.
    pub fn truncate(value: Decimal) -> Result<Self, AmountError> {
        let truncated = value.round_dp_with_strategy(BTC_SCALE, RoundingStrategy::ToZero);
        Self::try_from(truncated)
    }

    /// Returns the underlying decimal (scale 8).
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }

    /// Returns the value with insignificant trailing zeros removed.
    #[must_use]
    pub fn normalized(&self) -> Decimal {
        self.0.normalize()
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Formats with all 8 fractional digits, e.g. `0.45000000`.
    #[must_use]
    pub fn to_fixed(&self) -> String {
        format!("{:.8}", self.0)
    }
}

impl TryFrom<Decimal> for Btc {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        let normalized = value.normalize();
        if normalized.scale() > BTC_SCALE {
            return Err(AmountError::TooPrecise(value));
        }
        if normalized.trunc().abs() >= Decimal::from(INTEGER_LIMIT) {
            return Err(AmountError::TooLarge(value));
        }
        let mut scaled = normalized;
        scaled.rescale(BTC_SCALE);
        Ok(Self(scaled))
    }
}

impl From<Btc> for Decimal {
    fn from(amount: Btc) -> Self {
        amount.0
    }
}

impl FromStr for Btc {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Btc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

/// Rounds a decimal toward zero to 8 places without the magnitude check.
///
/// Used for intermediate values such as balances, which may exceed what a
/// single entry can carry.
#[must_use]
pub fn truncate_to_satoshi(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(BTC_SCALE, RoundingStrategy::ToZero)
}
