//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `KARTHIK_API_URL` - Base URL of the API server (default: `http://localhost:5000`)
//! - `KARTHIK_DATA_DIR` - Directory for the local store (default: `.karthik`)
//! - `KARTHIK_HTTP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `KARTHIK_INR_RATE` - Rupees per dollar; when set, cart totals display in INR

use std::path::PathBuf;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

use karthik_core::CurrencyConverter;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const DEFAULT_DATA_DIR: &str = ".karthik";
const DEFAULT_TIMEOUT_SECS: &str = "10";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Settings for the client managers.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API server base URL
    pub api_url: Url,
    /// Local store directory
    pub data_dir: PathBuf,
    /// HTTP request timeout
    pub http_timeout: Duration,
    /// Display currency, if not USD
    pub currency: Option<CurrencyConverter>,
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to an unparseable value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let api_url = Url::parse(&get_or("KARTHIK_API_URL", DEFAULT_API_URL))
            .map_err(|e| invalid("KARTHIK_API_URL", e))?;
        if api_url.cannot_be_a_base() {
            return Err(invalid("KARTHIK_API_URL", "not a base URL"));
        }

        let data_dir = PathBuf::from(get_or("KARTHIK_DATA_DIR", DEFAULT_DATA_DIR));

        let http_timeout = get_or("KARTHIK_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| invalid("KARTHIK_HTTP_TIMEOUT_SECS", e))?;

        let currency = lookup("KARTHIK_INR_RATE")
            .map(|raw| {
                let rate = raw
                    .trim()
                    .parse::<Decimal>()
                    .map_err(|e| invalid("KARTHIK_INR_RATE", e))?;
                if rate <= Decimal::ZERO {
                    return Err(invalid("KARTHIK_INR_RATE", "must be positive"));
                }
                Ok(CurrencyConverter::new(rate))
            })
            .transpose()?;

        Ok(Self {
            api_url,
            data_dir,
            http_timeout,
            currency,
        })
    }
}

fn invalid(key: &str, reason: impl ToString) -> ConfigError {
    ConfigError::InvalidEnvVar(key.to_owned(), reason.to_string())
}
