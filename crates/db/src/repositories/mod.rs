//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod ledger;
pub mod statistics;
pub mod user;
pub mod wallet;

pub use ledger::{PgLedgerStore, PgUnit};
pub use statistics::StatisticsRepository;
pub use user::{CreatedUser, UserRepository};
pub use wallet::WalletRepository;
