//! PostgreSQL implementation of the ledger store.
//!
//! A unit of work is a database transaction. The per-wallet lock is the
//! wallet row, taken with `SELECT ... FOR NO KEY UPDATE` and held until the
//! transaction commits or is dropped. `NO KEY UPDATE` still serializes
//! debits of the same wallet but does not block the foreign key checks of
//! entries crediting it, so transfers crossing between two wallets cannot
//! deadlock.
//!
//! The wait for that row lock is bounded by PostgreSQL itself through
//! `SET LOCAL lock_timeout`. Abandoning the future on the client side would
//! leave the backend queued on the row and its pool connection checked out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use coinvault_core::ledger::{
    LedgerEntry, LedgerError, LedgerStore, NewLedgerEntry, NewWallet, UnitOfWork, Wallet,
    WalletBalance,
};
use coinvault_shared::types::{UserId, WalletAddress};
use std::time::Duration;

use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, LockType, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QueryOrder, QuerySelect, RuntimeErr,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{ledger_entries, wallets};

/// Maps a database failure onto the ledger's storage error.
pub(crate) fn storage_error(err: DbErr) -> LedgerError {
    LedgerError::Storage(err.to_string())
}

/// SQLSTATE `lock_not_available`, raised when `lock_timeout` expires.
const LOCK_NOT_AVAILABLE: &str = "55P03";

fn is_lock_timeout(err: &DbErr) -> bool {
    match err {
        DbErr::Query(RuntimeErr::SqlxError(e)) | DbErr::Exec(RuntimeErr::SqlxError(e)) => e
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == LOCK_NOT_AVAILABLE),
        _ => false,
    }
}

async fn sum_amount<C: ConnectionTrait>(
    db: &C,
    column: ledger_entries::Column,
    address: Uuid,
) -> Result<Option<Decimal>, DbErr> {
    let total: Option<Option<Decimal>> = ledger_entries::Entity::find()
        .select_only()
        .column_as(ledger_entries::Column::Amount.sum(), "total")
        .filter(column.eq(address))
        .into_tuple()
        .one(db)
        .await?;
    Ok(total.flatten())
}

async fn wallet_balance<C: ConnectionTrait>(
    db: &C,
    address: WalletAddress,
) -> Result<WalletBalance, LedgerError> {
    let id = address.into_inner();
    let credited = sum_amount(db, ledger_entries::Column::WalletTo, id)
        .await
        .map_err(storage_error)?;
    let debited = sum_amount(db, ledger_entries::Column::WalletFrom, id)
        .await
        .map_err(storage_error)?;
    Ok(WalletBalance::from_totals(address, credited, debited))
}

async fn find_wallet<C: ConnectionTrait>(
    db: &C,
    address: WalletAddress,
) -> Result<Option<Wallet>, LedgerError> {
    let wallet = wallets::Entity::find_by_id(address.into_inner())
        .one(db)
        .await
        .map_err(storage_error)?;
    Ok(wallet.map(Wallet::from))
}

/// Ledger store backed by PostgreSQL.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
    lock_timeout: Option<Duration>,
}

impl PgLedgerStore {
    /// Creates a new store over a connection pool. Lock waits are unbounded.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            lock_timeout: None,
        }
    }

    /// Bounds how long [`LedgerStore::lock_wallet`] waits for a wallet row.
    ///
    /// When the bound expires PostgreSQL cancels the waiting statement and
    /// the call fails with [`LedgerError::LockTimeout`]; the transaction is
    /// rolled back and its connection goes back to the pool.
    #[must_use]
    pub const fn with_lock_timeout(mut self, limit: Duration) -> Self {
        self.lock_timeout = Some(limit);
        self
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// A PostgreSQL transaction used as a unit of work.
pub struct PgUnit {
    txn: DatabaseTransaction,
}

#[async_trait]
impl UnitOfWork for PgUnit {
    async fn find_wallet(&mut self, address: WalletAddress) -> Result<Option<Wallet>, LedgerError> {
        find_wallet(&self.txn, address).await
    }

    async fn insert_wallet_if_absent(
        &mut self,
        wallet: NewWallet,
    ) -> Result<Option<Wallet>, LedgerError> {
        let address = wallet.address;
        let created: DateTimeWithTimeZone = wallet.created_at.into();
        let model = wallets::ActiveModel {
            address: Set(address.into_inner()),
            alias: Set(wallet.alias),
            user_id: Set(wallet.owner.map(UserId::into_inner)),
            created: Set(created),
            last_updated: Set(created),
        };

        // Blocks on a concurrent uncommitted insert of the same address.
        let inserted = wallets::Entity::insert(model)
            .on_conflict(
                OnConflict::column(wallets::Column::Address)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.txn)
            .await
            .map_err(storage_error)?;
        if inserted == 0 {
            return Ok(None);
        }
        find_wallet(&self.txn, address).await
    }

    async fn balance(&mut self, address: WalletAddress) -> Result<WalletBalance, LedgerError> {
        wallet_balance(&self.txn, address).await
    }

    async fn touch_wallet(
        &mut self,
        address: WalletAddress,
        at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let result = wallets::Entity::update_many()
            .col_expr(
                wallets::Column::LastUpdated,
                Expr::value(DateTimeWithTimeZone::from(at)),
            )
            .filter(wallets::Column::Address.eq(address.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(storage_error)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::InvalidWalletReference(address));
        }
        Ok(())
    }

    async fn append(&mut self, entry: NewLedgerEntry) -> Result<LedgerEntry, LedgerError> {
        let model = ledger_entries::ActiveModel {
            wallet_from: Set(entry.wallet_from.map(WalletAddress::into_inner)),
            wallet_to: Set(entry.wallet_to.map(WalletAddress::into_inner)),
            kind: Set(entry.kind.into()),
            amount: Set(entry.amount.as_decimal()),
            details: Set(entry.details),
            extra: Set(entry.extra),
            created_at: Set(entry.created_at.into()),
            ..Default::default()
        };
        let stored = model.insert(&self.txn).await.map_err(storage_error)?;
        LedgerEntry::try_from(stored)
    }

    async fn commit(self) -> Result<(), LedgerError> {
        self.txn.commit().await.map_err(storage_error)
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    type Unit = PgUnit;

    async fn lock_wallet(&self, address: WalletAddress) -> Result<PgUnit, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        if let Some(limit) = self.lock_timeout {
            // Scoped to this transaction; 0 would mean "no limit".
            let millis = limit.as_millis().max(1);
            txn.execute_unprepared(&format!("SET LOCAL lock_timeout = '{millis}ms'"))
                .await
                .map_err(storage_error)?;
        }
        let locked = wallets::Entity::find_by_id(address.into_inner())
            .lock(LockType::NoKeyUpdate)
            .one(&txn)
            .await
            .map_err(|err| {
                if is_lock_timeout(&err) {
                    LedgerError::LockTimeout(address)
                } else {
                    storage_error(err)
                }
            })?;
        if locked.is_none() {
            return Err(LedgerError::InvalidWalletReference(address));
        }
        Ok(PgUnit { txn })
    }

    async fn begin(&self) -> Result<PgUnit, LedgerError> {
        let txn = self.db.begin().await.map_err(storage_error)?;
        Ok(PgUnit { txn })
    }

    async fn find_wallet(&self, address: WalletAddress) -> Result<Option<Wallet>, LedgerError> {
        find_wallet(&self.db, address).await
    }

    async fn wallets_of(&self, owner: UserId) -> Result<Vec<Wallet>, LedgerError> {
        let wallets = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(owner.into_inner()))
            .order_by_asc(wallets::Column::Created)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        Ok(wallets.into_iter().map(Wallet::from).collect())
    }

    async fn balance(&self, address: WalletAddress) -> Result<WalletBalance, LedgerError> {
        wallet_balance(&self.db, address).await
    }

    async fn entries_touching(
        &self,
        addresses: &[WalletAddress],
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        if addresses.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = addresses.iter().map(|a| a.into_inner()).collect();
        let entries = ledger_entries::Entity::find()
            .filter(
                Condition::any()
                    .add(ledger_entries::Column::WalletFrom.is_in(ids.clone()))
                    .add(ledger_entries::Column::WalletTo.is_in(ids)),
            )
            .order_by_desc(ledger_entries::Column::CreatedAt)
            .order_by_desc(ledger_entries::Column::Id)
            .all(&self.db)
            .await
            .map_err(storage_error)?;
        entries.into_iter().map(LedgerEntry::try_from).collect()
    }
}
