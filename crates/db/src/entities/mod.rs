//! `SeaORM` entity definitions.

pub mod daily_statistics;
pub mod ledger_entries;
pub mod sea_orm_active_enums;
pub mod users;
pub mod wallets;
