//! In-process `LedgerStore`.
//!
//! The per-wallet lock is a `tokio::sync::Mutex` kept in a `DashMap`
//! keyed by address. Writes are staged inside the unit and applied under
//! a single write lock on commit, so readers never observe half a unit.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinvault_shared::types::{UserId, WalletAddress};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use super::balance::WalletBalance;
use super::error::LedgerError;
use super::store::{LedgerStore, UnitOfWork};
use super::types::{LedgerEntry, NewLedgerEntry, NewWallet, Wallet};

#[derive(Debug, Default)]
struct LedgerState {
    wallets: HashMap<WalletAddress, Wallet>,
    entries: Vec<LedgerEntry>,
}

#[derive(Debug, Default)]
struct Shared {
    state: RwLock<LedgerState>,
    locks: DashMap<WalletAddress, Arc<Mutex<()>>>,
    next_id: AtomicI64,
}

impl Shared {
    fn lock_handle(&self, address: WalletAddress) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(address).or_default().value())
    }
}

/// Ledger store held entirely in memory.
///
/// Cloning shares the same underlying ledger.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    shared: Arc<Shared>,
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every committed entry, in commit order.
    pub async fn entries(&self) -> Vec<LedgerEntry> {
        self.shared.state.read().await.entries.clone()
    }
}

/// Unit of work over a `MemoryLedgerStore`.
pub struct MemoryUnit {
    shared: Arc<Shared>,
    guards: Vec<(WalletAddress, OwnedMutexGuard<()>)>,
    wallets: Vec<Wallet>,
    touches: Vec<(WalletAddress, DateTime<Utc>)>,
    entries: Vec<LedgerEntry>,
}

impl MemoryUnit {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            shared,
            guards: Vec::new(),
            wallets: Vec::new(),
            touches: Vec::new(),
            entries: Vec::new(),
        }
    }

    fn holds_lock(&self, address: WalletAddress) -> bool {
        self.guards.iter().any(|(held, _)| *held == address)
    }

    async fn wallet_exists(&self, address: WalletAddress) -> bool {
        self.wallets.iter().any(|w| w.address == address)
            || self.shared.state.read().await.wallets.contains_key(&address)
    }

    async fn ensure_wallet(&self, address: Option<WalletAddress>) -> Result<(), LedgerError> {
        match address {
            Some(address) if !self.wallet_exists(address).await => {
                Err(LedgerError::InvalidWalletReference(address))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnit {
    async fn find_wallet(&mut self, address: WalletAddress) -> Result<Option<Wallet>, LedgerError> {
        if let Some(wallet) = self.wallets.iter().find(|w| w.address == address) {
            return Ok(Some(wallet.clone()));
        }
        let mut wallet = self.shared.state.read().await.wallets.get(&address).cloned();
        if let Some(wallet) = wallet.as_mut() {
            if let Some((_, at)) = self.touches.iter().rev().find(|(a, _)| *a == address) {
                wallet.last_updated = *at;
            }
        }
        Ok(wallet)
    }

    async fn insert_wallet_if_absent(
        &mut self,
        wallet: NewWallet,
    ) -> Result<Option<Wallet>, LedgerError> {
        if self.wallets.iter().any(|w| w.address == wallet.address) {
            return Ok(None);
        }
        // Held until commit so a concurrent insert of the same address
        // waits and then sees this one.
        if !self.holds_lock(wallet.address) {
            let guard = self.shared.lock_handle(wallet.address).lock_owned().await;
            self.guards.push((wallet.address, guard));
        }
        if self.shared.state.read().await.wallets.contains_key(&wallet.address) {
            return Ok(None);
        }
        let wallet = wallet.into_wallet();
        self.wallets.push(wallet.clone());
        Ok(Some(wallet))
    }

    async fn balance(&mut self, address: WalletAddress) -> Result<WalletBalance, LedgerError> {
        let mut balance = {
            let state = self.shared.state.read().await;
            WalletBalance::from_entries(address, &state.entries)
        };
        for entry in &self.entries {
            balance.apply(entry);
        }
        Ok(balance)
    }

    async fn touch_wallet(
        &mut self,
        address: WalletAddress,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        self.ensure_wallet(Some(address)).await?;
        if let Some(wallet) = self.wallets.iter_mut().find(|w| w.address == address) {
            wallet.last_updated = at;
        } else {
            self.touches.push((address, at));
        }
        Ok(())
    }

    async fn append(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError> {
        self.ensure_wallet(entry.wallet_from).await?;
        self.ensure_wallet(entry.wallet_to).await?;
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let entry = entry.into_entry(id);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    async fn commit(self) -> Result<(), LedgerError> {
        let Self {
            shared,
            guards,
            wallets,
            touches,
            entries,
        } = self;

        {
            let mut state = shared.state.write().await;
            if let Some(dup) = wallets.iter().find(|w| state.wallets.contains_key(&w.address)) {
                return Err(LedgerError::Storage(format!(
                    "wallet {} already exists",
                    dup.address
                )));
            }
            for wallet in wallets {
                state.wallets.insert(wallet.address, wallet);
            }
            for (address, at) in touches {
                if let Some(wallet) = state.wallets.get_mut(&address) {
                    wallet.last_updated = at;
                }
            }
            state.entries.extend(entries);
        }

        drop(guards);
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    type Unit = MemoryUnit;

    async fn lock_wallet(&self, address: WalletAddress) -> Result<MemoryUnit, LedgerError> {
        if !self.shared.state.read().await.wallets.contains_key(&address) {
            return Err(LedgerError::InvalidWalletReference(address));
        }
        let guard = self.shared.lock_handle(address).lock_owned().await;
        let mut unit = MemoryUnit::new(Arc::clone(&self.shared));
        unit.guards.push((address, guard));
        Ok(unit)
    }

    async fn begin(&self) -> Result<MemoryUnit, LedgerError> {
        Ok(MemoryUnit::new(Arc::clone(&self.shared)))
    }

    async fn find_wallet(&self, address: WalletAddress) -> Result<Option<Wallet>, LedgerError> {
        Ok(self.shared.state.read().await.wallets.get(&address).cloned())
    }

    async fn wallets_of(&self, owner: UserId) -> Result<Vec<Wallet>, LedgerError> {
        let state = self.shared.state.read().await;
        let mut wallets: Vec<Wallet> = state
            .wallets
            .values()
            .filter(|w| w.owner == Some(owner))
            .cloned()
            .collect();
        wallets.sort_by_key(|w| w.created);
        Ok(wallets)
    }

    async fn balance(&self, address: WalletAddress) -> Result<WalletBalance, LedgerError> {
        let state = self.shared.state.read().await;
        Ok(WalletBalance::from_entries(address, &state.entries))
    }

    async fn entries_touching(
        &self,
        addresses: &[WalletAddress],
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let state = self.shared.state.read().await;
        let mut entries: Vec<LedgerEntry> = state
            .entries
            .iter()
            .filter(|e| addresses.iter().any(|a| e.touches(*a)))
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::TransferKind;
    use coinvault_shared::types::Btc;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    async fn seeded_wallet(store: &MemoryLedgerStore) -> WalletAddress {
        let mut unit = store.begin().await.unwrap();
        let wallet = unit
            .insert_wallet_if_absent(NewWallet::generate(Some(UserId::new()), None, Utc::now()))
            .await
            .unwrap()
            .unwrap();
        unit.commit().await.unwrap();
        wallet.address
    }

    fn mint_to(address: WalletAddress) -> NewLedgerEntry {
        NewLedgerEntry {
            wallet_from: None,
            wallet_to: Some(address),
            kind: TransferKind::Mint,
            amount: Btc::try_from(dec!(1)).unwrap(),
            details: String::new(),
            extra: String::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_uncommitted_unit_is_discarded() {
        let store = MemoryLedgerStore::new();
        let address = seeded_wallet(&store).await;

        {
            let mut unit = store.begin().await.unwrap();
            unit.append(mint_to(address)).await.unwrap();
            assert_eq!(unit.balance(address).await.unwrap().balance(), dec!(1));
        }

        assert!(store.entries().await.is_empty());
        assert_eq!(store.balance(address).await.unwrap().balance(), dec!(0));
    }

    #[tokio::test]
    async fn test_commit_publishes_all_writes() {
        let store = MemoryLedgerStore::new();
        let address = seeded_wallet(&store).await;

        let mut unit = store.begin().await.unwrap();
        let first = unit.append(mint_to(address)).await.unwrap();
        let second = unit.append(mint_to(address)).await.unwrap();
        assert!(second.id > first.id);
        unit.commit().await.unwrap();

        assert_eq!(store.entries().await.len(), 2);
        assert_eq!(store.balance(address).await.unwrap().balance(), dec!(2));
    }

    #[tokio::test]
    async fn test_lock_unknown_wallet_fails() {
        let store = MemoryLedgerStore::new();
        let missing = WalletAddress::new();
        assert!(matches!(
            store.lock_wallet(missing).await,
            Err(LedgerError::InvalidWalletReference(a)) if a == missing
        ));
    }

    #[tokio::test]
    async fn test_append_rejects_unknown_wallet() {
        let store = MemoryLedgerStore::new();
        let mut unit = store.begin().await.unwrap();
        assert!(matches!(
            unit.append(mint_to(WalletAddress::new())).await,
            Err(LedgerError::InvalidWalletReference(_))
        ));
    }

    #[tokio::test]
    async fn test_lock_blocks_second_holder_until_release() {
        let store = MemoryLedgerStore::new();
        let address = seeded_wallet(&store).await;

        let held = store.lock_wallet(address).await.unwrap();
        let waiting = tokio::time::timeout(Duration::from_millis(50), store.lock_wallet(address)).await;
        assert!(waiting.is_err(), "second lock must block while the first is held");

        drop(held);
        let acquired =
            tokio::time::timeout(Duration::from_millis(500), store.lock_wallet(address)).await;
        assert!(acquired.is_ok());
    }

    #[tokio::test]
    async fn test_insert_if_absent_is_idempotent() {
        let store = MemoryLedgerStore::new();
        let address = WalletAddress::new();

        let mut unit = store.begin().await.unwrap();
        let inserted = unit
            .insert_wallet_if_absent(NewWallet::with_address(address, None, None, Utc::now()))
            .await
            .unwrap();
        assert!(inserted.is_some());
        let again = unit
            .insert_wallet_if_absent(NewWallet::with_address(address, None, None, Utc::now()))
            .await
            .unwrap();
        assert!(again.is_none());
        unit.commit().await.unwrap();

        let mut unit = store.begin().await.unwrap();
        let after_commit = unit
            .insert_wallet_if_absent(NewWallet::with_address(address, None, None, Utc::now()))
            .await
            .unwrap();
        assert!(after_commit.is_none());
    }

    #[tokio::test]
    async fn test_touch_is_visible_only_after_commit() {
        let store = MemoryLedgerStore::new();
        let address = seeded_wallet(&store).await;
        let before = store.find_wallet(address).await.unwrap().unwrap().last_updated;
        let later = before + chrono::Duration::seconds(30);

        let mut unit = store.lock_wallet(address).await.unwrap();
        unit.touch_wallet(address, later).await.unwrap();
        assert_eq!(unit.find_wallet(address).await.unwrap().unwrap().last_updated, later);
        assert_eq!(store.find_wallet(address).await.unwrap().unwrap().last_updated, before);
        unit.commit().await.unwrap();

        assert_eq!(store.find_wallet(address).await.unwrap().unwrap().last_updated, later);
    }

    #[tokio::test]
    async fn test_wallets_of_and_entries_touching() {
        let store = MemoryLedgerStore::new();
        let owner = UserId::new();
        let mut unit = store.begin().await.unwrap();
        let mine = unit
            .insert_wallet_if_absent(NewWallet::generate(Some(owner), Some("mine"), Utc::now()))
            .await
            .unwrap()
            .unwrap();
        unit.commit().await.unwrap();
        let other = seeded_wallet(&store).await;

        let mut unit = store.begin().await.unwrap();
        unit.append(mint_to(mine.address)).await.unwrap();
        unit.append(mint_to(other)).await.unwrap();
        unit.commit().await.unwrap();

        let wallets = store.wallets_of(owner).await.unwrap();
        assert_eq!(wallets.len(), 1);
        assert_eq!(wallets[0].alias, "mine");

        let entries = store.entries_touching(&[mine.address]).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].wallet_to, Some(mine.address));
    }
}
