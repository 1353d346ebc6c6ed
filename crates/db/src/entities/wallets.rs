//! `SeaORM` Entity for wallets table.

use coinvault_core::ledger::Wallet;
use coinvault_shared::types::{UserId, WalletAddress};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "wallets")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub address: Uuid,
    pub alias: String,
    pub user_id: Option<Uuid>,
    pub created: DateTimeWithTimeZone,
    pub last_updated: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_delete = "Restrict"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Wallet {
    fn from(model: Model) -> Self {
        Self {
            address: WalletAddress::from_uuid(model.address),
            alias: model.alias,
            owner: model.user_id.map(UserId::from_uuid),
            created: model.created.to_utc(),
            last_updated: model.last_updated.to_utc(),
        }
    }
}
