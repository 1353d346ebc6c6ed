//! `SeaORM` Entity for ledger_entries table.

use coinvault_core::ledger::{LedgerEntry, LedgerError};
use coinvault_shared::types::{Btc, WalletAddress};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::TransferKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub wallet_from: Option<Uuid>,
    pub wallet_to: Option<Uuid>,
    pub kind: TransferKind,
    #[sea_orm(column_type = "Decimal(Some((16, 8)))")]
    pub amount: Decimal,
    pub details: String,
    #[sea_orm(column_type = "Text")]
    pub extra: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletFrom",
        to = "super::wallets::Column::Address",
        on_delete = "Restrict"
    )]
    WalletFrom,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::WalletTo",
        to = "super::wallets::Column::Address",
        on_delete = "Restrict"
    )]
    WalletTo,
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for LedgerEntry {
    type Error = LedgerError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            wallet_from: model.wallet_from.map(WalletAddress::from_uuid),
            wallet_to: model.wallet_to.map(WalletAddress::from_uuid),
            kind: model.kind.into(),
            amount: Btc::try_from(model.amount)?,
            details: model.details,
            extra: model.extra,
            created_at: model.created_at.to_utc(),
        })
    }
}
