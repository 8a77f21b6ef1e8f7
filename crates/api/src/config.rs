//! API server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `API_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `API_HOST` - Bind address (default: 127.0.0.1)
//! - `API_PORT` - Listen port (default: 5000)
//! - `API_CORS_ORIGIN` - Allowed browser origin (default: any)
//! - `ADMIN_BOOTSTRAP_USERID` / `ADMIN_BOOTSTRAP_PASSWORD` - Admin created at
//!   startup if missing; both or neither
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use axum::http::HeaderValue;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use karthik_core::{AdminUserId, MIN_PASSWORD_LENGTH};

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// `PostgreSQL` connection URL
    pub database_url: SecretString,
    /// Server bind address
    pub host: IpAddr,
    /// Server port
    pub port: u16,
    /// Allowed CORS origin; any origin when unset
    pub cors_origin: Option<HeaderValue>,
    /// Admin to create on startup
    pub admin_bootstrap: Option<AdminBootstrap>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "production", "development")
    pub sentry_environment: Option<String>,
}

/// Credentials for the admin seeded at startup.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub userid: AdminUserId,
    pub password: SecretString,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let database_url = env.database_url("API_DATABASE_URL")?;
        let host = env
            .or_default("API_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_HOST".to_string(), e.to_string()))?;
        let port = env
            .or_default("API_PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("API_PORT".to_string(), e.to_string()))?;
        let cors_origin = env
            .optional("API_CORS_ORIGIN")
            .map(|origin| HeaderValue::from_str(&origin))
            .transpose()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("API_CORS_ORIGIN".to_string(), e.to_string())
            })?;

        Ok(Self {
            database_url,
            host,
            port,
            cors_origin,
            admin_bootstrap: AdminBootstrap::from_env(&env)?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl AdminBootstrap {
    fn from_env<F: Fn(&str) -> Option<String>>(env: &Env<F>) -> Result<Option<Self>, ConfigError> {
        match (
            env.optional("ADMIN_BOOTSTRAP_USERID"),
            env.optional("ADMIN_BOOTSTRAP_PASSWORD"),
        ) {
            (None, None) => Ok(None),
            (Some(_), None) => Err(ConfigError::MissingEnvVar(
                "ADMIN_BOOTSTRAP_PASSWORD".to_string(),
            )),
            (None, Some(_)) => Err(ConfigError::MissingEnvVar(
                "ADMIN_BOOTSTRAP_USERID".to_string(),
            )),
            (Some(userid), Some(password)) => {
                let password = SecretString::from(password);
                validate_bootstrap_password(&password)?;
                Ok(Some(Self {
                    userid: AdminUserId::new(userid),
                    password,
                }))
            }
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Environment lookup with the usual accessors.
struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional environment variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.is_empty())
    }

    /// Get an environment variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }

    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        self.optional(primary_key)
            .or_else(|| self.optional("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
    }
}

/// Bootstrap passwords follow the same length rule as every other password.
fn validate_bootstrap_password(password: &SecretString) -> Result<(), ConfigError> {
    if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ConfigError::InvalidEnvVar(
            "ADMIN_BOOTSTRAP_PASSWORD".to_string(),
            format!("must be at least {MIN_PASSWORD_LENGTH} characters"),
        ));
    }
    Ok(())
}
