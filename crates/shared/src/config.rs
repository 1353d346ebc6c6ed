//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Platform wallet and fee configuration.
    pub platform: PlatformConfig,
    /// Exchange rate lookup configuration.
    #[serde(default)]
    pub rates: RatesConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Platform wallet, fee, and limit settings.
///
/// The ledger engine reads these values but does not own them.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// Well-known address of the platform wallet.
    pub wallet_address: Uuid,
    /// Display alias of the platform wallet.
    #[serde(default = "default_wallet_alias")]
    pub wallet_alias: String,
    /// Username that owns the platform wallet.
    #[serde(default = "default_owner_username")]
    pub owner_username: String,
    /// Amount minted into the platform wallet when it is first created.
    #[serde(default = "default_initial_funds")]
    pub initial_funds: Decimal,
    /// Amount granted to every newly created wallet.
    #[serde(default = "default_welcome_grant")]
    pub welcome_grant: Decimal,
    /// Fraction of an external transfer skimmed as platform profit.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    /// Smallest amount that may be sent to another user's wallet.
    #[serde(default = "default_min_external_amount")]
    pub min_external_amount: Decimal,
    /// Static token guarding the statistics endpoint.
    pub admin_token: String,
    /// Upper bound on waiting for a wallet lock. Unbounded when absent.
    #[serde(default)]
    pub lock_timeout_ms: Option<u64>,
}

fn default_wallet_alias() -> String {
    "Platform Wallet".to_string()
}

fn default_owner_username() -> String {
    "platform".to_string()
}

fn default_initial_funds() -> Decimal {
    Decimal::from(1000)
}

fn default_welcome_grant() -> Decimal {
    Decimal::ONE
}

fn default_fee_rate() -> Decimal {
    Decimal::new(15, 3) // 1.5%
}

fn default_min_external_amount() -> Decimal {
    Decimal::new(1, 6) // 0.000001 BTC
}

/// Exchange rate lookup configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Base URL of the rates API; the currency code is appended.
    #[serde(default = "default_rates_url")]
    pub api_url: String,
    /// Currency shown next to BTC balances.
    #[serde(default = "default_rates_currency")]
    pub currency: String,
    /// Request timeout in seconds.
    #[serde(default = "default_rates_timeout")]
    pub timeout_secs: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            api_url: default_rates_url(),
            currency: default_rates_currency(),
            timeout_secs: default_rates_timeout(),
        }
    }
}

fn default_rates_url() -> String {
    "https://bitpay.com/rates/BTC/".to_string()
}

fn default_rates_currency() -> String {
    "usd".to_string()
}

fn default_rates_timeout() -> u64 {
    5
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("COINVAULT").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
