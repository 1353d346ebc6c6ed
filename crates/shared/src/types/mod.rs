//! Common types used across the application.

pub mod amount;
pub mod id;

pub use amount::{AmountError, Btc};
pub use id::*;
