//! Transfer engine.
//!
//! A transfer runs as one unit of work holding the exclusive lock on the
//! debited wallet:
//!
//! 1. lock `from` (blocking, optionally bounded)
//! 2. recompute the balance of `from` under the lock
//! 3. reject if `balance - amount - amount * rate < 0`
//! 4. set `from.last_updated` to the shared commit timestamp
//! 5. append the primary entry
//! 6. for external transfers, append the fee skim to the platform wallet
//! 7. commit
//!
//! Every rejection happens before step 4, so a failed transfer writes
//! nothing. Destination wallets are never locked.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use coinvault_shared::types::{Btc, WalletAddress};
use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};

use super::error::LedgerError;
use super::fee::FeeSchedule;
use super::observer::{LedgerObserver, NoopObserver, notify_committed};
use super::store::{LedgerStore, UnitOfWork};
use super::treasury::{PlatformWallet, ensure_platform};
use super::types::{LedgerEntry, NewLedgerEntry, TransferKind, TransferRequest, transfer_details};

/// Moves funds between wallets and records the platform fee.
pub struct TransferEngine<S: LedgerStore> {
    store: Arc<S>,
    fees: FeeSchedule,
    platform: PlatformWallet,
    lock_timeout: Option<Duration>,
    observer: Arc<dyn LedgerObserver>,
}

impl<S: LedgerStore> TransferEngine<S> {
    /// Creates an engine that waits indefinitely for wallet locks.
    pub fn new(store: Arc<S>, fees: FeeSchedule, platform: PlatformWallet) -> Self {
        Self {
            store,
            fees,
            platform,
            lock_timeout: None,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Fails with `LockTimeout` if the source lock is not acquired in time.
    ///
    /// The bound is enforced by dropping the store's `lock_wallet` future,
    /// which only releases the wait for in-process stores. Database-backed
    /// stores must bound the wait server side instead (see
    /// `PgLedgerStore::with_lock_timeout` in `coinvault-db`).
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    /// Notifies `observer` of every committed entry.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LedgerObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The fee schedule in use.
    #[must_use]
    pub const fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Executes a transfer and returns the primary entry.
    ///
    /// An external transfer normally commits two entries, the transfer and
    /// the platform's fee skim. When the fee truncates to zero satoshi the
    /// skim is omitted and only the transfer entry is written. The default
    /// minimum enforced by `TransferPolicy` keeps API requests above that
    /// threshold.
    ///
    /// # Errors
    ///
    /// - `NonPositiveAmount`, `InvalidAmount`, `UnsupportedTransferKind`
    ///   before any lock is taken
    /// - `InvalidWalletReference` if either wallet does not exist
    /// - `InsufficientFunds` if the balance does not cover amount plus fee
    /// - `LockTimeout` if a lock timeout (here or in the store) elapses
    /// - `Storage` on store failure
    #[instrument(
        skip(self, request),
        fields(from = %request.from, to = %request.to, kind = %request.kind, amount = %request.amount)
    )]
    pub async fn transfer(&self, request: TransferRequest) -> Result<LedgerEntry, LedgerError> {
        let amount = Self::check_request(&request)?;
        let required = self.fees.required_funds(amount, request.kind);
        let profit = self.fees.calculate_profit(amount, request.kind)?;

        let mut unit = self.acquire(request.from).await?;

        if unit.find_wallet(request.to).await?.is_none() {
            return Err(LedgerError::InvalidWalletReference(request.to));
        }

        let balance = unit.balance(request.from).await?.balance();
        if balance - required < Decimal::ZERO {
            debug!(%balance, %required, "Transfer rejected for insufficient funds");
            return Err(LedgerError::InsufficientFunds {
                address: request.from,
                balance,
                required,
            });
        }

        let now = Utc::now();
        let mut committed = Vec::with_capacity(3);

        unit.touch_wallet(request.from, now).await?;
        let entry = unit
            .append(NewLedgerEntry {
                wallet_from: Some(request.from),
                wallet_to: Some(request.to),
                kind: request.kind,
                amount,
                details: transfer_details(amount, request.from, request.to),
                extra: request.extra,
                created_at: now,
            })
            .await?;
        committed.push(entry.clone());

        if request.kind == TransferKind::SentExternal && profit.is_positive() {
            committed.extend(ensure_platform(&mut unit, &self.platform, now).await?);
            let skim = unit
                .append(NewLedgerEntry {
                    wallet_from: Some(request.from),
                    wallet_to: Some(self.platform.address),
                    kind: TransferKind::PlatformProfit,
                    amount: profit,
                    details: format!(
                        "Platform profits. {} of the transferred amount",
                        self.fees.rate_percent()
                    ),
                    extra: String::new(),
                    created_at: now,
                })
                .await?;
            committed.push(skim);
        }

        unit.commit().await?;

        info!(entry_id = entry.id, %profit, "Transfer committed");
        notify_committed(self.observer.as_ref(), &committed).await;
        Ok(entry)
    }

    /// Current committed balance of a wallet.
    pub async fn balance(&self, address: WalletAddress) -> Result<Decimal, LedgerError> {
        if self.store.find_wallet(address).await?.is_none() {
            return Err(LedgerError::InvalidWalletReference(address));
        }
        Ok(self.store.balance(address).await?.balance())
    }

    fn check_request(request: &TransferRequest) -> Result<Btc, LedgerError> {
        if request.amount <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(request.amount));
        }
        if !request.kind.is_user_transfer() {
            return Err(LedgerError::UnsupportedTransferKind(request.kind));
        }
        Ok(Btc::try_from(request.amount)?)
    }

    async fn acquire(&self, address: WalletAddress) -> Result<S::Unit, LedgerError> {
        let locked = match self.lock_timeout {
            Some(limit) => tokio::time::timeout(limit, self.store.lock_wallet(address))
                .await
                .unwrap_or(Err(LedgerError::LockTimeout(address))),
            None => self.store.lock_wallet(address).await,
        };
        if let Err(LedgerError::LockTimeout(_)) = &locked {
            warn!(wallet = %address, "Wallet lock wait timed out");
        }
        locked
    }
}
