//! Custodial BTC ledger.
//!
//! Balances are never stored. They are derived from an append-only set of
//! entries, and every transfer debiting a wallet runs under that wallet's
//! exclusive lock so the funds check and the write cannot interleave with
//! another debit.

pub mod balance;
pub mod engine;
pub mod error;
pub mod fee;
pub mod memory;
pub mod observer;
pub mod store;
pub mod treasury;
pub mod types;
pub mod validation;

#[cfg(test)]
mod fee_props;

pub use balance::WalletBalance;
pub use engine::TransferEngine;
pub use error::LedgerError;
pub use fee::FeeSchedule;
pub use memory::{MemoryLedgerStore, MemoryUnit};
pub use observer::{LedgerObserver, NoopObserver, ObserverError};
pub use store::{LedgerStore, UnitOfWork};
pub use treasury::{INITIAL_FUNDS_DETAILS, OpenedWallet, PlatformWallet, Treasury};
pub use types::{
    LedgerEntry, NewLedgerEntry, NewWallet, TransferKind, TransferRequest, Wallet,
    transfer_details,
};
pub use validation::{
    MAX_ALIAS_LEN, MAX_WALLETS_PER_OWNER, TransferPolicy, ValidationError, validate_new_wallet,
};
