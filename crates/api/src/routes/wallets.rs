//! Wallet routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use coinvault_core::ledger::{LedgerStore, Wallet, validate_new_wallet};
use coinvault_db::WalletRepository;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info};
use uuid::Uuid;

use super::transactions::TransactionResponse;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the wallet routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets", get(list_wallets).post(create_wallet))
        .route("/wallets/{address}", get(get_wallet))
        .route("/wallets/{address}/transactions", get(list_wallet_transactions))
}

/// Request body for creating a wallet.
#[derive(Debug, Default, Deserialize)]
pub struct CreateWalletRequest {
    /// Optional display alias; defaults to the address.
    #[serde(default)]
    pub alias: Option<String>,
}

/// Wallet detail with its derived balance.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    /// Wallet address.
    pub address: Uuid,
    /// Display alias.
    pub alias: String,
    /// `{"btc": "...", "<currency>": "..."}`.
    pub balance: Map<String, Value>,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Time of the last outgoing transfer.
    pub last_updated: DateTime<Utc>,
}

/// Builds the balance object, converting to `currency` when a rate is available.
async fn balance_view(state: &AppState, balance: Decimal) -> Map<String, Value> {
    let converted = state.rates.convert_decimal(balance, &state.currency).await;

    let mut view = Map::new();
    view.insert("btc".to_string(), Value::String(balance.normalize().to_string()));
    view.insert(state.currency.to_string(), Value::String(converted.to_string()));
    view
}

async fn wallet_response(state: &AppState, wallet: Wallet) -> Result<WalletResponse, ApiError> {
    let balance = state.engine.balance(wallet.address).await?;
    Ok(WalletResponse {
        address: wallet.address.into_inner(),
        alias: wallet.alias,
        balance: balance_view(state, balance).await,
        created: wallet.created,
        last_updated: wallet.last_updated,
    })
}

async fn find_owned(state: &AppState, auth: &AuthUser, address: Uuid) -> Result<Wallet, ApiError> {
    WalletRepository::new((*state.db).clone())
        .find_owned(auth.id.into_inner(), address)
        .await?
        .ok_or_else(|| ApiError::not_found("Wallet not found"))
}

/// POST `/wallets` - Create a wallet; the platform grants the welcome amount.
async fn create_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    payload: Option<Json<CreateWalletRequest>>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(payload) = payload.unwrap_or_default();
    let alias = payload.alias.as_deref();

    let existing = state.ledger.wallets_of(auth.id).await?;
    validate_new_wallet(&existing, alias)?;

    let opened = state.treasury.open_wallet(auth.id, alias).await.map_err(|e| {
        error!(error = %e, user_id = %auth.id, "Failed to open wallet");
        ApiError::from(e)
    })?;
    info!(wallet = %opened.wallet.address, username = %auth.username, "Wallet created");

    let response = wallet_response(&state, opened.wallet).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET `/wallets` - List the caller's wallets.
async fn list_wallets(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let wallets = state.ledger.wallets_of(auth.id).await?;

    let mut items = Vec::with_capacity(wallets.len());
    for wallet in wallets {
        items.push(wallet_response(&state, wallet).await?);
    }
    Ok(Json(items))
}

/// GET `/wallets/{address}` - Wallet detail, owner only.
async fn get_wallet(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(address): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = find_owned(&state, &auth, address).await?;
    Ok(Json(wallet_response(&state, wallet).await?))
}

/// GET `/wallets/{address}/transactions` - Entries touching one of the caller's wallets.
async fn list_wallet_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(address): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let wallet = find_owned(&state, &auth, address).await?;
    let entries = state
        .ledger
        .entries_touching(&[wallet.address])
        .await?;

    let items: Vec<TransactionResponse> = entries.into_iter().map(Into::into).collect();
    Ok(Json(items))
}
