//! `SeaORM` Entity for daily_statistics table.

use coinvault_core::stats::DailyStatistics;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_statistics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub date: Date,
    pub transactions: i64,
    #[sea_orm(column_type = "Decimal(Some((16, 8)))")]
    pub profit: Decimal,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for DailyStatistics {
    fn from(model: Model) -> Self {
        Self {
            date: model.date,
            transactions: model.transactions,
            profit: model.profit,
        }
    }
}
