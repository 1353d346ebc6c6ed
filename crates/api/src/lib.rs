//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Token authentication middleware
//! - The BitPay exchange rate source

pub mod error;
pub mod middleware;
pub mod rates;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use coinvault_core::ledger::{
    FeeSchedule, LedgerObserver, PlatformWallet, TransferEngine, TransferPolicy, Treasury,
};
use coinvault_core::rates::RateConverter;
use coinvault_db::{PgLedgerStore, StatisticsRepository};
use coinvault_shared::types::{Btc, UserId, WalletAddress};
use coinvault_shared::{AppConfig, AppError};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use error::ApiError;
pub use rates::BitpayRateSource;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Ledger store backing the engine and read queries.
    pub ledger: Arc<PgLedgerStore>,
    /// Transfer engine for user-requested transfers.
    pub engine: Arc<TransferEngine<PgLedgerStore>>,
    /// Platform mint and wallet creation.
    pub treasury: Arc<Treasury<PgLedgerStore>>,
    /// Daily statistics, also registered as the ledger observer.
    pub statistics: Arc<StatisticsRepository>,
    /// Cached BTC rate lookups for balance display.
    pub rates: Arc<RateConverter<BitpayRateSource>>,
    /// Caller-side transfer rules.
    pub policy: TransferPolicy,
    /// Currency shown next to BTC balances.
    pub currency: Arc<str>,
    /// Token guarding the statistics endpoint.
    pub admin_token: Arc<str>,
}

impl AppState {
    /// Builds the state from configuration.
    ///
    /// `platform_owner` is the user the platform wallet belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured amount or the fee rate is invalid,
    /// or if the HTTP client for rates cannot be built.
    pub fn new(
        db: DatabaseConnection,
        config: &AppConfig,
        platform_owner: Option<UserId>,
    ) -> Result<Self, AppError> {
        let platform_config = &config.platform;

        let mut platform = PlatformWallet::new(
            WalletAddress::from_uuid(platform_config.wallet_address),
            Btc::try_from(platform_config.initial_funds)?,
        )
        .with_alias(platform_config.wallet_alias.clone());
        if let Some(owner) = platform_owner {
            platform = platform.with_owner(owner);
        }

        let fees = FeeSchedule::new(platform_config.fee_rate).ok_or_else(|| {
            AppError::Config(format!(
                "fee rate {} must be between 0 and 1",
                platform_config.fee_rate
            ))
        })?;

        let mut store = PgLedgerStore::new(db.clone());
        if let Some(ms) = platform_config.lock_timeout_ms {
            store = store.with_lock_timeout(Duration::from_millis(ms));
        }
        let ledger = Arc::new(store);
        let statistics = Arc::new(StatisticsRepository::new(db.clone()));
        let observer: Arc<dyn LedgerObserver> = statistics.clone();

        let engine = TransferEngine::new(Arc::clone(&ledger), fees, platform.clone())
            .with_observer(Arc::clone(&observer));

        let treasury = Treasury::new(
            Arc::clone(&ledger),
            platform,
            Btc::try_from(platform_config.welcome_grant)?,
        )
        .with_observer(observer);

        let source = BitpayRateSource::new(
            &config.rates.api_url,
            Duration::from_secs(config.rates.timeout_secs),
        )
        .map_err(|e| AppError::Startup(format!("failed to build rates client: {e}")))?;

        Ok(Self {
            db: Arc::new(db),
            ledger,
            engine: Arc::new(engine),
            treasury: Arc::new(treasury),
            statistics,
            rates: Arc::new(RateConverter::new(Arc::new(source))),
            policy: TransferPolicy::new(platform_config.min_external_amount),
            currency: Arc::from(config.rates.currency.to_ascii_lowercase()),
            admin_token: Arc::from(platform_config.admin_token.as_str()),
        })
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
pub(crate) mod test_support {
    use coinvault_shared::config::{DatabaseConfig, PlatformConfig, RatesConfig, ServerConfig};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use super::*;

    pub const ADMIN_TOKEN: &str = "admin-secret";

    pub fn test_config() -> AppConfig {
        AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url: "postgres://localhost/coinvault_test".to_string(),
                max_connections: 1,
                min_connections: 1,
            },
            platform: PlatformConfig {
                wallet_address: Uuid::new_v4(),
                wallet_alias: "Platform Wallet".to_string(),
                owner_username: "platform".to_string(),
                initial_funds: dec!(1000),
                welcome_grant: dec!(1),
                fee_rate: dec!(0.015),
                min_external_amount: dec!(0.000001),
                admin_token: ADMIN_TOKEN.to_string(),
                lock_timeout_ms: Some(5_000),
            },
            rates: RatesConfig::default(),
        }
    }

    /// State without a database: enough for routes that reject early.
    pub fn offline_state() -> AppState {
        AppState::new(DatabaseConnection::Disconnected, &test_config(), None)
            .expect("test config is valid")
    }
}
