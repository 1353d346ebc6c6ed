//! Transfer routes.
//!
//! Ownership and minimum-amount rules are checked here; the funds check
//! happens inside the engine, under the source wallet lock.

use axum::{
    Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get,
};
use chrono::{DateTime, Utc};
use coinvault_core::ledger::{LedgerEntry, LedgerError, LedgerStore, TransferKind, TransferRequest};
use coinvault_shared::types::WalletAddress;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the transaction routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new().route("/transactions", get(list_transactions).post(create_transaction))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for a transfer.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// `sent_internal` or `sent_external`.
    pub transaction_type: TransferKind,
    /// Debited wallet, owned by the caller.
    pub wallet_from: Uuid,
    /// Credited wallet.
    pub wallet_to: Uuid,
    /// Amount in BTC, at most 8 decimal places.
    pub amount: Decimal,
    /// Free text stored with the entry.
    #[serde(default)]
    pub extra: Option<String>,
}

impl CreateTransactionRequest {
    fn into_transfer(self) -> TransferRequest {
        TransferRequest {
            from: WalletAddress::from_uuid(self.wallet_from),
            to: WalletAddress::from_uuid(self.wallet_to),
            kind: self.transaction_type,
            amount: self.amount,
            extra: self.extra.unwrap_or_default(),
        }
    }
}

/// A ledger entry as returned by the API.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Entry ID.
    pub id: i64,
    /// Entry kind.
    pub transaction_type: TransferKind,
    /// Debited wallet, absent for the bootstrap mint.
    pub wallet_from: Option<Uuid>,
    /// Credited wallet.
    pub wallet_to: Option<Uuid>,
    /// Amount in BTC.
    pub amount: String,
    /// Generated description.
    pub details: String,
    /// Caller-supplied text.
    pub extra: String,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for TransactionResponse {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            transaction_type: entry.kind,
            wallet_from: entry.wallet_from.map(WalletAddress::into_inner),
            wallet_to: entry.wallet_to.map(WalletAddress::into_inner),
            amount: entry.amount.to_string(),
            details: entry.details,
            extra: entry.extra,
            created_at: entry.created_at,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET `/transactions` - Entries touching any of the caller's wallets.
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let addresses: Vec<WalletAddress> = state
        .ledger
        .wallets_of(auth.id)
        .await?
        .into_iter()
        .map(|w| w.address)
        .collect();

    let entries = state.ledger.entries_touching(&addresses).await?;
    let items: Vec<TransactionResponse> = entries.into_iter().map(Into::into).collect();
    Ok(Json(items))
}

/// POST `/transactions` - Transfer bitcoins from one of the caller's wallets.
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let request = payload.into_transfer();

    let from = state.ledger.find_wallet(request.from).await?;
    let to = state.ledger.find_wallet(request.to).await?;
    state
        .policy
        .validate_transfer(auth.id, &request, from.as_ref(), to.as_ref())?;

    match state.engine.transfer(request).await {
        Ok(entry) => {
            info!(entry_id = entry.id, username = %auth.username, "Transfer accepted");
            Ok((StatusCode::CREATED, Json(TransactionResponse::from(entry))))
        }
        Err(e @ LedgerError::Storage(_)) => {
            error!(error = %e, "Transfer failed");
            Err(e.into())
        }
        Err(e) => {
            warn!(error = %e, code = e.error_code(), "Transfer rejected");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coinvault_shared::types::Btc;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_request_accepts_string_and_number_amounts() {
        let body = json!({
            "transaction_type": "sent_external",
            "wallet_from": Uuid::nil(),
            "wallet_to": Uuid::nil(),
            "amount": "0.55"
        });
        let parsed: CreateTransactionRequest = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.amount, dec!(0.55));
        assert_eq!(parsed.transaction_type, TransferKind::SentExternal);

        let body = json!({
            "transaction_type": "sent_internal",
            "wallet_from": Uuid::nil(),
            "wallet_to": Uuid::nil(),
            "amount": 0.55,
            "extra": "rent"
        });
        let parsed: CreateTransactionRequest = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.amount, dec!(0.55));
        assert_eq!(parsed.into_transfer().extra, "rent");
    }

    #[test]
    fn test_unknown_transaction_type_rejected() {
        let body = json!({
            "transaction_type": "refund",
            "wallet_from": Uuid::nil(),
            "wallet_to": Uuid::nil(),
            "amount": "1"
        });
        assert!(serde_json::from_value::<CreateTransactionRequest>(body).is_err());
    }

    #[test]
    fn test_response_uses_wire_names() {
        let entry = LedgerEntry {
            id: 7,
            wallet_from: None,
            wallet_to: Some(WalletAddress::from_uuid(Uuid::nil())),
            kind: TransferKind::Mint,
            amount: Btc::try_from(dec!(1000.00000000)).unwrap(),
            details: "Initial funds".to_string(),
            extra: String::new(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(TransactionResponse::from(entry)).unwrap();
        assert_eq!(json["transaction_type"], "platform");
        assert_eq!(json["amount"], "1000");
        assert!(json["wallet_from"].is_null());
    }
}
