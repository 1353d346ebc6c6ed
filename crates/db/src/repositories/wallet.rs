//! Owner-scoped wallet lookups.

use coinvault_core::ledger::Wallet;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::entities::wallets;

/// Read-only wallet queries.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a wallet by address, only if `user_id` owns it.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_owned(&self, user_id: Uuid, address: Uuid) -> Result<Option<Wallet>, DbErr> {
        let wallet = wallets::Entity::find_by_id(address)
            .filter(wallets::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(wallet.map(Wallet::from))
    }
}
