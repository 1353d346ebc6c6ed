//! `SeaORM` active enums.

use coinvault_core::ledger::TransferKind as LedgerKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transfer_kind")]
pub enum TransferKind {
    #[sea_orm(string_value = "sent_external")]
    SentExternal,
    #[sea_orm(string_value = "sent_internal")]
    SentInternal,
    #[sea_orm(string_value = "platform")]
    Platform,
    #[sea_orm(string_value = "platform_profit")]
    PlatformProfit,
}

impl From<LedgerKind> for TransferKind {
    fn from(kind: LedgerKind) -> Self {
        match kind {
            LedgerKind::SentExternal => Self::SentExternal,
            LedgerKind::SentInternal => Self::SentInternal,
            LedgerKind::Mint => Self::Platform,
            LedgerKind::PlatformProfit => Self::PlatformProfit,
        }
    }
}

impl From<TransferKind> for LedgerKind {
    fn from(kind: TransferKind) -> Self {
        match kind {
            TransferKind::SentExternal => Self::SentExternal,
            TransferKind::SentInternal => Self::SentInternal,
            TransferKind::Platform => Self::Mint,
            TransferKind::PlatformProfit => Self::PlatformProfit,
        }
    }
}
