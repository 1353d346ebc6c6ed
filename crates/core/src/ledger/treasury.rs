//! Mint and grant workflow.
//!
//! These paths originate funds instead of moving them, so they take no
//! wallet lock and skip the funds check. The platform wallet is exempt
//! from insufficiency checks entirely.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use coinvault_shared::types::{Btc, UserId, WalletAddress};
use tracing::info;

use super::error::LedgerError;
use super::observer::{LedgerObserver, NoopObserver, notify_committed};
use super::store::{LedgerStore, UnitOfWork};
use super::types::{LedgerEntry, NewLedgerEntry, NewWallet, TransferKind, Wallet, transfer_details};

/// Details written on the bootstrap mint.
pub const INITIAL_FUNDS_DETAILS: &str = "Initial funds";

/// The well-known platform wallet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformWallet {
    /// Stable address, taken from configuration.
    pub address: WalletAddress,
    /// Alias used when the wallet is created.
    pub alias: String,
    /// Owning identity, if it exists yet.
    pub owner: Option<UserId>,
    /// Amount minted once, when the wallet is first created.
    pub initial_funds: Btc,
}

impl PlatformWallet {
    /// Describes a platform wallet with the default alias and no owner.
    #[must_use]
    pub fn new(address: WalletAddress, initial_funds: Btc) -> Self {
        Self {
            address,
            alias: "Platform Wallet".to_string(),
            owner: None,
            initial_funds,
        }
    }

    /// Sets the alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Sets the owning identity.
    #[must_use]
    pub const fn with_owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }
}

/// Creates the platform wallet inside `unit` unless it already exists.
///
/// The initial funds are minted only when this call created the wallet,
/// so repeated calls never grow the platform balance. Returns the mint
/// entry when one was written.
pub(crate) async fn ensure_platform<U: UnitOfWork>(
    unit: &mut U,
    platform: &PlatformWallet,
    now: DateTime<Utc>,
) -> Result<Option<LedgerEntry>, LedgerError> {
    if unit.find_wallet(platform.address).await?.is_some() {
        return Ok(None);
    }
    let created = unit
        .insert_wallet_if_absent(NewWallet::with_address(
            platform.address,
            platform.owner,
            Some(&platform.alias),
            now,
        ))
        .await?;
    if created.is_none() || platform.initial_funds.is_zero() {
        return Ok(None);
    }

    let mint = unit
        .append(NewLedgerEntry {
            wallet_from: None,
            wallet_to: Some(platform.address),
            kind: TransferKind::Mint,
            amount: platform.initial_funds,
            details: INITIAL_FUNDS_DETAILS.to_string(),
            extra: String::new(),
            created_at: now,
        })
        .await?;
    Ok(Some(mint))
}

/// A freshly opened wallet and its welcome grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedWallet {
    /// The new wallet.
    pub wallet: Wallet,
    /// Welcome grant entry, absent when the grant is configured to zero.
    pub grant: Option<LedgerEntry>,
}

/// Platform-side funding: bootstrap, wallet creation with welcome grant,
/// and ad-hoc grants.
pub struct Treasury<S: LedgerStore> {
    store: Arc<S>,
    platform: PlatformWallet,
    welcome_grant: Btc,
    observer: Arc<dyn LedgerObserver>,
}

impl<S: LedgerStore> Treasury<S> {
    /// Creates a treasury granting `welcome_grant` to every new wallet.
    pub fn new(store: Arc<S>, platform: PlatformWallet, welcome_grant: Btc) -> Self {
        Self {
            store,
            platform,
            welcome_grant,
            observer: Arc::new(NoopObserver),
        }
    }

    /// Notifies `observer` of every committed mint.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn LedgerObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The platform wallet this treasury funds from.
    #[must_use]
    pub const fn platform(&self) -> &PlatformWallet {
        &self.platform
    }

    /// Returns the platform wallet, creating and funding it on first use.
    pub async fn ensure_platform_wallet(&self) -> Result<Wallet, LedgerError> {
        let mut unit = self.store.begin().await?;
        let mint = ensure_platform(&mut unit, &self.platform, Utc::now()).await?;
        let wallet = unit
            .find_wallet(self.platform.address)
            .await?
            .ok_or(LedgerError::InvalidWalletReference(self.platform.address))?;
        unit.commit().await?;

        if let Some(mint) = mint {
            info!(
                wallet = %wallet.address,
                amount = %mint.amount,
                "Platform wallet created with initial funds"
            );
            notify_committed(self.observer.as_ref(), &[mint]).await;
        }
        Ok(wallet)
    }

    /// Creates a wallet for `owner` and grants it the welcome amount.
    ///
    /// Wallet and grant are committed together.
    pub async fn open_wallet(
        &self,
        owner: UserId,
        alias: Option<&str>,
    ) -> Result<OpenedWallet, LedgerError> {
        let now = Utc::now();
        let mut unit = self.store.begin().await?;
        let mut committed = Vec::with_capacity(2);
        committed.extend(ensure_platform(&mut unit, &self.platform, now).await?);

        let candidate = NewWallet::generate(Some(owner), alias, now);
        let address = candidate.address;
        let wallet = unit
            .insert_wallet_if_absent(candidate)
            .await?
            .ok_or_else(|| LedgerError::Storage(format!("wallet address {address} already taken")))?;

        let grant = if self.welcome_grant.is_positive() {
            let entry = unit
                .append(self.grant_entry(
                    address,
                    self.welcome_grant,
                    format!("Platform grants {} BTC after wallet creation.", self.welcome_grant),
                    now,
                ))
                .await?;
            committed.push(entry.clone());
            Some(entry)
        } else {
            None
        };
        unit.commit().await?;

        info!(
            wallet = %wallet.address,
            owner = %owner,
            grant = %self.welcome_grant,
            "Wallet opened"
        );
        notify_committed(self.observer.as_ref(), &committed).await;
        Ok(OpenedWallet { wallet, grant })
    }

    /// Mints `amount` from the platform wallet to `to`.
    pub async fn grant(
        &self,
        to: WalletAddress,
        amount: Btc,
        extra: &str,
    ) -> Result<LedgerEntry, LedgerError> {
        if !amount.is_positive() {
            return Err(LedgerError::NonPositiveAmount(amount.as_decimal()));
        }
        let now = Utc::now();
        let mut unit = self.store.begin().await?;
        let mut committed = Vec::with_capacity(2);
        committed.extend(ensure_platform(&mut unit, &self.platform, now).await?);

        if unit.find_wallet(to).await?.is_none() {
            return Err(LedgerError::InvalidWalletReference(to));
        }
        let entry = unit
            .append(self.grant_entry(to, amount, extra.to_string(), now))
            .await?;
        unit.commit().await?;

        info!(wallet = %to, amount = %amount, "Platform grant committed");
        committed.push(entry.clone());
        notify_committed(self.observer.as_ref(), &committed).await;
        Ok(entry)
    }

    fn grant_entry(
        &self,
        to: WalletAddress,
        amount: Btc,
        extra: String,
        now: DateTime<Utc>,
    ) -> NewLedgerEntry {
        NewLedgerEntry {
            wallet_from: Some(self.platform.address),
            wallet_to: Some(to),
            kind: TransferKind::Mint,
            amount,
            details: transfer_details(amount, self.platform.address, to),
            extra,
            created_at: now,
        }
    }
}
