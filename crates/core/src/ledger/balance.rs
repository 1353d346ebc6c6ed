//! Wallet balance derivation.
//!
//! There is no stored balance anywhere. A wallet's balance is
//! `sum(credits) - sum(debits)` over its ledger entries, recomputed on
//! every read.

use coinvault_shared::types::WalletAddress;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::LedgerEntry;

/// A wallet balance with its two aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletBalance {
    /// The wallet.
    pub address: WalletAddress,
    /// Sum of amounts received.
    pub credited: Decimal,
    /// Sum of amounts sent.
    pub debited: Decimal,
}

impl WalletBalance {
    /// Creates an empty balance.
    #[must_use]
    pub const fn new(address: WalletAddress) -> Self {
        Self {
            address,
            credited: Decimal::ZERO,
            debited: Decimal::ZERO,
        }
    }

    /// Builds a balance from aggregates computed by a store.
    ///
    /// A missing aggregate (no matching rows) counts as zero.
    #[must_use]
    pub fn from_totals(
        address: WalletAddress,
        credited: Option<Decimal>,
        debited: Option<Decimal>,
    ) -> Self {
        Self {
            address,
            credited: credited.unwrap_or_default(),
            debited: debited.unwrap_or_default(),
        }
    }

    /// Folds `entries` into a balance for `address`.
    ///
    /// Entries not touching the wallet are ignored.
    pub fn from_entries<'a, I>(address: WalletAddress, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a LedgerEntry>,
    {
        let mut balance = Self::new(address);
        for entry in entries {
            balance.apply(entry);
        }
        balance
    }

    /// Applies one entry.
    pub fn apply(&mut self, entry: &LedgerEntry) {
        let amount = entry.amount.as_decimal();
        if entry.wallet_to == Some(self.address) {
            self.credited += amount;
        }
        if entry.wallet_from == Some(self.address) {
            self.debited += amount;
        }
    }

    /// Net balance.
    #[must_use]
    pub fn balance(&self) -> Decimal {
        self.credited - self.debited
    }
}
