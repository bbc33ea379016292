//! API configuration module.
//!
//! Configuration is loaded from `BILLBOOK_*` environment variables with
//! fallback to development defaults.

use billbook_core::validation::validate_state_code;
use billbook_core::DEFAULT_STORE_STATE_CODE;
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;

const DEV_JWT_SECRET: &str = "billbook-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// `dev` or `production`
    pub environment: String,

    /// HTTP listen address
    pub bind_addr: SocketAddr,

    /// SQLite database file
    pub db_path: String,

    /// JWT secret key for signing session tokens
    pub jwt_secret: String,

    /// Session token lifetime in seconds
    pub token_lifetime_secs: i64,

    /// How long a login code stays valid
    pub challenge_lifetime_secs: i64,

    /// Wrong codes allowed before a challenge is burned
    pub challenge_max_attempts: u32,

    /// Printed on invoices
    pub store_name: String,

    /// GST state code of the store, decides CGST/SGST vs IGST
    pub store_state_code: String,

    pub currency_symbol: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            environment: "dev".to_string(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: "./billbook.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_lifetime_secs: 43_200, // 12 hours, one shift
            challenge_lifetime_secs: 300,
            challenge_max_attempts: 5,
            store_name: "Billbook Store".to_string(),
            store_state_code: DEFAULT_STORE_STATE_CODE.to_string(),
            currency_symbol: "₹".to_string(),
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let environment = lookup("BILLBOOK_ENV").unwrap_or(defaults.environment);
        let is_production = environment.eq_ignore_ascii_case("production");

        let jwt_secret = match lookup("BILLBOOK_JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ if is_production => {
                return Err(ConfigError::MissingRequired("BILLBOOK_JWT_SECRET".to_string()))
            }
            _ => defaults.jwt_secret,
        };

        let config = ApiConfig {
            environment,
            bind_addr: parse_or(&lookup, "BILLBOOK_BIND_ADDR", defaults.bind_addr)?,
            db_path: lookup("BILLBOOK_DB_PATH").unwrap_or(defaults.db_path),
            jwt_secret,
            token_lifetime_secs: parse_or(
                &lookup,
                "BILLBOOK_TOKEN_LIFETIME_SECS",
                defaults.token_lifetime_secs,
            )?,
            challenge_lifetime_secs: parse_or(
                &lookup,
                "BILLBOOK_CHALLENGE_LIFETIME_SECS",
                defaults.challenge_lifetime_secs,
            )?,
            challenge_max_attempts: parse_or(
                &lookup,
                "BILLBOOK_CHALLENGE_MAX_ATTEMPTS",
                defaults.challenge_max_attempts,
            )?,
            store_name: lookup("BILLBOOK_STORE_NAME").unwrap_or(defaults.store_name),
            store_state_code: lookup("BILLBOOK_STORE_STATE_CODE")
                .map(|s| s.trim().to_string())
                .unwrap_or(defaults.store_state_code),
            currency_symbol: lookup("BILLBOOK_CURRENCY_SYMBOL").unwrap_or(defaults.currency_symbol),
        };

        if config.token_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("BILLBOOK_TOKEN_LIFETIME_SECS".to_string()));
        }
        if config.challenge_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue(
                "BILLBOOK_CHALLENGE_LIFETIME_SECS".to_string(),
            ));
        }
        if config.challenge_max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "BILLBOOK_CHALLENGE_MAX_ATTEMPTS".to_string(),
            ));
        }
        validate_state_code(&config.store_state_code)
            .map_err(|_| ConfigError::InvalidValue("BILLBOOK_STORE_STATE_CODE".to_string()))?;

        Ok(config)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}
