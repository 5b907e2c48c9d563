//! API configuration
//!
//! Loaded from `API_`-prefixed environment variables (a `.env` file is read
//! first by the server binary), falling back to [`ApiConfig::default`].

use serde::Deserialize;

use core_kernel::{Currency, MoneyError};

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    /// HMAC secret for bearer tokens
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub database_url: String,
    pub db_max_connections: u32,
    /// Default `EnvFilter` directive when `RUST_LOG` is unset
    pub log_level: String,
    /// Emit JSON log lines instead of the human-readable format
    pub log_json: bool,
    /// Currency for prices submitted without one, and for revenue totals
    pub default_currency: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/travel".to_string(),
            db_max_connections: 10,
            log_level: "info".to_string(),
            log_json: false,
            default_currency: "USD".to_string(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("jwt_secret", defaults.jwt_secret)?
            .set_default("jwt_expiration_secs", defaults.jwt_expiration_secs as i64)?
            .set_default("database_url", defaults.database_url)?
            .set_default("db_max_connections", i64::from(defaults.db_max_connections))?
            .set_default("log_level", defaults.log_level)?
            .set_default("log_json", defaults.log_json)?
            .set_default("default_currency", defaults.default_currency)?
            .add_source(config::Environment::with_prefix("API").try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn currency(&self) -> Result<Currency, MoneyError> {
        self.default_currency.parse()
    }
}
