//! Core business logic for Coinvault.
//!
//! This crate contains the ledger engine with ZERO web or database
//! dependencies. Storage is reached through the `LedgerStore` trait.
//!
//! # Modules
//!
//! - `ledger` - Balances, fees, transfers, and the mint/grant workflow
//! - `rates` - BTC to fiat conversion for balance display
//! - `stats` - Per-day transaction and profit counters

pub mod ledger;
pub mod rates;
pub mod stats;
