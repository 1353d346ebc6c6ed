//! Ledger error types.
//!
//! Business-rule rejections are always detected before any write, so a
//! failed operation never leaves partial state behind.

use coinvault_shared::types::{AmountError, WalletAddress};
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::TransferKind;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Precondition Errors ==========
    /// Amount is zero or negative.
    #[error("Amount must be greater than zero, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount does not fit the 16/8 fixed-point format.
    #[error(transparent)]
    InvalidAmount(#[from] AmountError),

    /// The kind cannot be requested through a transfer.
    #[error("Transaction type {0} cannot be used for transfers")]
    UnsupportedTransferKind(TransferKind),

    // ========== Business Rule Errors ==========
    /// Balance does not cover amount plus fee.
    #[error("Insufficient funds in wallet with address {address}")]
    InsufficientFunds {
        /// Debited wallet.
        address: WalletAddress,
        /// Balance read under the lock.
        balance: Decimal,
        /// Amount plus fee the transfer needed.
        required: Decimal,
    },

    /// Unknown or foreign wallet address.
    #[error("Invalid wallet with address {0}")]
    InvalidWalletReference(WalletAddress),

    // ========== Concurrency Errors ==========
    /// The wallet lock was not acquired in time.
    #[error("Timed out waiting for lock on wallet {0}, please retry")]
    LockTimeout(WalletAddress),

    // ========== Storage Errors ==========
    /// Durable store failure.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::UnsupportedTransferKind(_) => "UNSUPPORTED_TRANSFER_KIND",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InvalidWalletReference(_) => "INVALID_WALLET_REFERENCE",
            Self::LockTimeout(_) => "LOCK_TIMEOUT",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - precondition errors
            Self::NonPositiveAmount(_)
            | Self::InvalidAmount(_)
            | Self::UnsupportedTransferKind(_) => 400,

            // 404 Not Found
            Self::InvalidWalletReference(_) => 404,

            // 422 Unprocessable - business rule rejection
            Self::InsufficientFunds { .. } => 422,

            // 503 Service Unavailable - retryable
            Self::LockTimeout(_) => 503,

            // 500 Internal Server Error
            Self::Storage(_) => 500,
        }
    }

    /// Returns true if this error is retryable.
    ///
    /// Storage failures are not: a retry decision belongs to the caller.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LockTimeout(_))
    }
}
