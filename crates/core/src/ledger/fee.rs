//! Platform fee calculation.
//!
//! Only `SentExternal` transfers pay a fee. The recorded profit is
//! `amount * rate` truncated to 8 decimal places; it is never rounded up.

use coinvault_shared::types::{AmountError, Btc};
use rust_decimal::Decimal;

use super::types::TransferKind;

/// Fee rate applied to external transfers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSchedule {
    rate: Decimal,
}

impl FeeSchedule {
    /// Creates a schedule charging `rate` (e.g. `0.015`) on external transfers.
    ///
    /// Returns `None` unless `0 <= rate < 1`.
    #[must_use]
    pub fn new(rate: Decimal) -> Option<Self> {
        (rate >= Decimal::ZERO && rate < Decimal::ONE).then_some(Self { rate })
    }

    /// Configured external transfer rate.
    #[must_use]
    pub const fn rate(&self) -> Decimal {
        self.rate
    }

    /// Rate applicable to `kind`: the configured rate for external
    /// transfers, zero otherwise.
    #[must_use]
    pub fn rate_for(&self, kind: TransferKind) -> Decimal {
        match kind {
            TransferKind::SentExternal => self.rate,
            _ => Decimal::ZERO,
        }
    }

    /// Platform profit recorded for a transfer of `amount`.
    pub fn calculate_profit(&self, amount: Btc, kind: TransferKind) -> Result<Btc, AmountError> {
        Btc::truncate(amount.as_decimal() * self.rate_for(kind))
    }

    /// Funds the debited wallet must hold for the transfer to proceed.
    ///
    /// This is `amount + amount * rate`, computed from the rate rather than
    /// the truncated profit, so it is never less than what gets debited.
    #[must_use]
    pub fn required_funds(&self, amount: Btc, kind: TransferKind) -> Decimal {
        let amount = amount.as_decimal();
        amount + amount * self.rate_for(kind)
    }

    /// Human readable rate, e.g. `1.5%`.
    #[must_use]
    pub fn rate_percent(&self) -> String {
        format!("{}%", (self.rate * Decimal::ONE_HUNDRED).normalize())
    }
}
