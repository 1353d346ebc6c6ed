//! Ledger domain types: wallets, entries, and transfer requests.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use coinvault_shared::types::{Btc, UserId, WalletAddress};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Classification of a ledger entry.
///
/// The serialized names are the ones persisted in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransferKind {
    /// Transfer to a wallet owned by somebody else. Carries a platform fee.
    #[serde(rename = "sent_external")]
    SentExternal,
    /// Transfer between two wallets of the same owner. Free.
    #[serde(rename = "sent_internal")]
    SentInternal,
    /// Platform-originated funds (bootstrap and welcome grants).
    #[serde(rename = "platform")]
    Mint,
    /// Fee skim credited to the platform wallet.
    #[serde(rename = "platform_profit")]
    PlatformProfit,
}

impl TransferKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::SentExternal,
        Self::SentInternal,
        Self::Mint,
        Self::PlatformProfit,
    ];

    /// Returns the storage name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::SentExternal => "sent_external",
            Self::SentInternal => "sent_internal",
            Self::Mint => "platform",
            Self::PlatformProfit => "platform_profit",
        }
    }

    /// Returns true for kinds a wallet owner may request.
    ///
    /// `Mint` and `PlatformProfit` are written only by the platform itself.
    #[must_use]
    pub const fn is_user_transfer(&self) -> bool {
        matches!(self, Self::SentExternal | Self::SentInternal)
    }
}

impl fmt::Display for TransferKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown transaction type: {s}"))
    }
}

/// A custodial wallet.
///
/// There is no balance field: balances are always derived from entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Immutable, globally unique address.
    pub address: WalletAddress,
    /// Display label, unique per owner.
    pub alias: String,
    /// Controlling identity. `None` only for a platform wallet bootstrapped
    /// before its owner exists.
    pub owner: Option<UserId>,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Commit time of the most recent outgoing transfer.
    pub last_updated: DateTime<Utc>,
}

impl Wallet {
    /// Returns true if `user` controls this wallet.
    #[must_use]
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner == Some(user)
    }
}

/// A wallet that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWallet {
    /// Address to register.
    pub address: WalletAddress,
    /// Display alias.
    pub alias: String,
    /// Owner, if any.
    pub owner: Option<UserId>,
    /// Creation time, also used as the initial `last_updated`.
    pub created_at: DateTime<Utc>,
}

impl NewWallet {
    /// Builds a wallet with a fresh random address.
    ///
    /// The alias is trimmed; a blank alias defaults to the address string.
    #[must_use]
    pub fn generate(owner: Option<UserId>, alias: Option<&str>, created_at: DateTime<Utc>) -> Self {
        Self::with_address(WalletAddress::new(), owner, alias, created_at)
    }

    /// Builds a wallet with a known address.
    #[must_use]
    pub fn with_address(
        address: WalletAddress,
        owner: Option<UserId>,
        alias: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Self {
        let alias = match alias.map(str::trim) {
            Some(a) if !a.is_empty() => a.to_string(),
            _ => address.to_string(),
        };
        Self {
            address,
            alias,
            owner,
            created_at,
        }
    }

    /// Converts into the stored representation.
    #[must_use]
    pub fn into_wallet(self) -> Wallet {
        Wallet {
            address: self.address,
            alias: self.alias,
            owner: self.owner,
            created: self.created_at,
            last_updated: self.created_at,
        }
    }
}

/// An immutable record of value moving between wallets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Monotonic, store-assigned identifier.
    pub id: i64,
    /// Debited wallet. Absent only for a pure mint.
    pub wallet_from: Option<WalletAddress>,
    /// Credited wallet.
    pub wallet_to: Option<WalletAddress>,
    /// Entry classification.
    pub kind: TransferKind,
    /// Strictly positive amount.
    pub amount: Btc,
    /// Free-text description written by the engine.
    pub details: String,
    /// Free-text annotation supplied by the caller.
    pub extra: String,
    /// Timestamp shared by every entry of the same commit.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Signed effect of this entry on `address`'s balance.
    ///
    /// Receiving adds, sending subtracts, regardless of kind.
    #[must_use]
    pub fn effect_on(&self, address: WalletAddress) -> Decimal {
        let mut effect = Decimal::ZERO;
        if self.wallet_to == Some(address) {
            effect += self.amount.as_decimal();
        }
        if self.wallet_from == Some(address) {
            effect -= self.amount.as_decimal();
        }
        effect
    }

    /// Returns true if the entry debits or credits `address`.
    #[must_use]
    pub fn touches(&self, address: WalletAddress) -> bool {
        self.wallet_from == Some(address) || self.wallet_to == Some(address)
    }
}

/// An entry waiting to be appended by a unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Debited wallet.
    pub wallet_from: Option<WalletAddress>,
    /// Credited wallet.
    pub wallet_to: Option<WalletAddress>,
    /// Entry classification.
    pub kind: TransferKind,
    /// Strictly positive amount.
    pub amount: Btc,
    /// Engine-written description.
    pub details: String,
    /// Caller annotation.
    pub extra: String,
    /// Commit timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewLedgerEntry {
    /// Attaches the store-assigned id.
    #[must_use]
    pub fn into_entry(self, id: i64) -> LedgerEntry {
        LedgerEntry {
            id,
            wallet_from: self.wallet_from,
            wallet_to: self.wallet_to,
            kind: self.kind,
            amount: self.amount,
            details: self.details,
            extra: self.extra,
            created_at: self.created_at,
        }
    }
}

/// Description written on a primary transfer or grant entry.
#[must_use]
pub fn transfer_details(amount: Btc, from: WalletAddress, to: WalletAddress) -> String {
    format!("Transfers {amount} bitcoins from {from} wallet to {to} wallet.")
}

/// A request to move funds between two wallets.
///
/// The amount is raw input; the engine validates it before locking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Wallet to debit.
    pub from: WalletAddress,
    /// Wallet to credit.
    pub to: WalletAddress,
    /// Either `SentExternal` or `SentInternal`.
    pub kind: TransferKind,
    /// Amount to move.
    pub amount: Decimal,
    /// Caller annotation.
    pub extra: String,
}
