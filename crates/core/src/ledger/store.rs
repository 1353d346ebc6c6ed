//! Storage contract consumed by the ledger engine.
//!
//! A store provides two things the engine cannot do on its own: an
//! exclusive, blocking lock scoped to one wallet, and an all-or-nothing
//! commit of several writes. Both are expressed through `UnitOfWork`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinvault_shared::types::{UserId, WalletAddress};

use super::balance::WalletBalance;
use super::error::LedgerError;
use super::types::{LedgerEntry, NewLedgerEntry, NewWallet, Wallet};

/// One atomic, isolated unit of work.
///
/// Writes become visible only after `commit`. Dropping a unit without
/// committing discards every write and releases any lock it holds.
#[async_trait]
pub trait UnitOfWork: Send {
    /// Looks a wallet up, seeing this unit's own uncommitted inserts.
    async fn find_wallet(&mut self, address: WalletAddress) -> Result<Option<Wallet>, LedgerError>;

    /// Registers a wallet unless one with the same address exists.
    ///
    /// Returns the wallet if this call inserted it, `None` if it already
    /// existed. Concurrent inserts of the same address are serialized.
    async fn insert_wallet_if_absent(
        &mut self,
        wallet: NewWallet,
    ) -> Result<Option<Wallet>, LedgerError>;

    /// Balance of `address` as seen by this unit.
    async fn balance(&mut self, address: WalletAddress) -> Result<WalletBalance, LedgerError>;

    /// Sets `last_updated` on a wallet.
    async fn touch_wallet(
        &mut self,
        address: WalletAddress,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Appends an entry and returns it with its store-assigned id.
    async fn append(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError>;

    /// Makes every write of this unit visible at once.
    async fn commit(self) -> Result<(), LedgerError>;
}

/// Durable wallet registry plus append-only entry collection.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    /// Unit of work type produced by this store.
    type Unit: UnitOfWork + 'static;

    /// Opens a unit of work holding the exclusive lock on `address`.
    ///
    /// Blocks until the lock is free. Fails with
    /// `LedgerError::InvalidWalletReference` if the wallet does not exist.
    async fn lock_wallet(&self, address: WalletAddress) -> Result<Self::Unit, LedgerError>;

    /// Opens a unit of work without taking any wallet lock.
    async fn begin(&self) -> Result<Self::Unit, LedgerError>;

    /// Looks a committed wallet up.
    async fn find_wallet(&self, address: WalletAddress) -> Result<Option<Wallet>, LedgerError>;

    /// Lists the wallets controlled by `owner`, oldest first.
    async fn wallets_of(&self, owner: UserId) -> Result<Vec<Wallet>, LedgerError>;

    /// Committed balance of `address`. Not suitable for funds checks.
    async fn balance(&self, address: WalletAddress) -> Result<WalletBalance, LedgerError>;

    /// Entries debiting or crediting any of `addresses`, newest first.
    async fn entries_touching(
        &self,
        addresses: &[WalletAddress],
    ) -> Result<Vec<LedgerEntry>, LedgerError>;
}
