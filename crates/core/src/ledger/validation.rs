//! Request validation performed by callers before reaching the engine.
//!
//! The engine trusts the wallets it is given. Ownership, the per-owner
//! wallet limit and the external minimum are checked here, against
//! wallets the caller has already looked up.

use coinvault_shared::types::UserId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::{TransferKind, TransferRequest, Wallet};

/// Maximum number of wallets a single owner may register.
pub const MAX_WALLETS_PER_OWNER: usize = 10;

/// Maximum alias length, in characters.
pub const MAX_ALIAS_LEN: usize = 50;

/// A rejected wallet or transfer request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Owner already has the maximum number of wallets.
    #[error("User may register only up to {MAX_WALLETS_PER_OWNER} wallets.")]
    WalletLimitReached,

    /// Alias longer than allowed.
    #[error("Ensure alias has no more than {MAX_ALIAS_LEN} characters.")]
    AliasTooLong,

    /// Owner already uses this alias.
    #[error("Alias already exists for another wallet")]
    DuplicateAlias,

    /// Source wallet missing or not owned by the caller.
    #[error("Invalid from wallet with address {0}")]
    InvalidSource(String),

    /// Internal destination missing or owned by somebody else.
    #[error("Invalid internal wallet/address to transfer.")]
    InvalidInternalDestination,

    /// External destination missing or owned by the caller.
    #[error("Invalid external wallet/address to transfer.")]
    InvalidExternalDestination,

    /// External transfer below the configured minimum.
    #[error(
        "The minimum amount of bitcoins you can send in a transaction to another user is {0} BTCs"
    )]
    BelowMinimum(Decimal),

    /// Kind cannot be requested by a wallet owner.
    #[error("Transaction type {0} cannot be requested")]
    UnsupportedKind(TransferKind),
}

impl ValidationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::WalletLimitReached => "WALLET_LIMIT_REACHED",
            Self::AliasTooLong => "ALIAS_TOO_LONG",
            Self::DuplicateAlias => "DUPLICATE_ALIAS",
            Self::InvalidSource(_) => "INVALID_SOURCE_WALLET",
            Self::InvalidInternalDestination | Self::InvalidExternalDestination => {
                "INVALID_DESTINATION_WALLET"
            }
            Self::BelowMinimum(_) => "BELOW_MINIMUM_AMOUNT",
            Self::UnsupportedKind(_) => "UNSUPPORTED_TRANSACTION_TYPE",
        }
    }
}

/// Checks a wallet creation request against the owner's current wallets.
pub fn validate_new_wallet(existing: &[Wallet], alias: Option<&str>) -> Result<(), ValidationError> {
    if existing.len() >= MAX_WALLETS_PER_OWNER {
        return Err(ValidationError::WalletLimitReached);
    }

    let alias = alias.map(str::trim).unwrap_or_default();
    if alias.is_empty() {
        return Ok(());
    }
    if alias.chars().count() > MAX_ALIAS_LEN {
        return Err(ValidationError::AliasTooLong);
    }
    if existing.iter().any(|w| w.alias == alias) {
        return Err(ValidationError::DuplicateAlias);
    }
    Ok(())
}

/// Caller-side transfer rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferPolicy {
    min_external_amount: Decimal,
}

impl TransferPolicy {
    /// Creates a policy with the given external transfer minimum.
    #[must_use]
    pub const fn new(min_external_amount: Decimal) -> Self {
        Self {
            min_external_amount,
        }
    }

    /// Minimum amount for `SentExternal` transfers.
    #[must_use]
    pub const fn min_external_amount(&self) -> Decimal {
        self.min_external_amount
    }

    /// Validates `request` on behalf of `caller`.
    ///
    /// `from` and `to` are the wallets found for the request's addresses,
    /// `None` when the address is unknown. Funds are not checked here;
    /// only the engine can do that safely, under the wallet lock.
    pub fn validate_transfer(
        &self,
        caller: UserId,
        request: &TransferRequest,
        from: Option<&Wallet>,
        to: Option<&Wallet>,
    ) -> Result<(), ValidationError> {
        if !request.kind.is_user_transfer() {
            return Err(ValidationError::UnsupportedKind(request.kind));
        }
        if !from.is_some_and(|w| w.is_owned_by(caller)) {
            return Err(ValidationError::InvalidSource(request.from.to_string()));
        }

        match request.kind {
            TransferKind::SentInternal => {
                if !to.is_some_and(|w| w.is_owned_by(caller)) {
                    return Err(ValidationError::InvalidInternalDestination);
                }
            }
            _ => {
                if !to.is_some_and(|w| !w.is_owned_by(caller)) {
                    return Err(ValidationError::InvalidExternalDestination);
                }
                if request.amount < self.min_external_amount {
                    return Err(ValidationError::BelowMinimum(
                        self.min_external_amount.normalize(),
                    ));
                }
            }
        }
        Ok(())
    }
}
