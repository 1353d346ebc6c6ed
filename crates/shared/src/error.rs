//! Errors raised while turning configuration into a running service.

use thiserror::Error;

use crate::types::AmountError;

/// A configuration or startup failure.
///
/// Request handling has its own error types; this one never reaches a client.
#[derive(Debug, Error)]
pub enum AppError {
    /// A configured value is outside its allowed range.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// A configured amount is not a valid BTC amount.
    #[error("Invalid configured amount: {0}")]
    Amount(#[from] AmountError),

    /// A component could not be initialized.
    #[error("Startup failed: {0}")]
    Startup(String),
}
