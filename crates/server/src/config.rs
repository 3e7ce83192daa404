//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 3000)
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-01)
//! - `SHOPIFY_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SCHEDULER_ENABLED` - Enable the background sync job (default: true)
//! - `SYNC_CRON` - Cron expression for the sync job (default: `0 0 */6 * * *`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `FRONTEND_URL` - Extra CORS origins for the dashboard, comma-separated

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Admin API version used for all tenants
    pub shopify_api_version: String,
    /// Per-request timeout for Shopify API calls
    pub shopify_http_timeout: Duration,
    /// Whether the background sync job runs
    pub scheduler_enabled: bool,
    /// Cron expression for the background sync job
    pub sync_cron: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Dashboard origins allowed by CORS, on top of the localhost defaults
    pub frontend_urls: Vec<String>,
}

impl ServerConfig {
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

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host: IpAddr = parse_value("HOST", &get_env_or_default("HOST", "127.0.0.1"))?;
        let port: u16 = parse_value("PORT", &get_env_or_default("PORT", "3000"))?;
        let shopify_api_version = get_env_or_default("SHOPIFY_API_VERSION", "2024-01");
        let shopify_http_timeout = parse_value::<u64>(
            "SHOPIFY_HTTP_TIMEOUT_SECS",
            &get_env_or_default("SHOPIFY_HTTP_TIMEOUT_SECS", "30"),
        )
        .map(Duration::from_secs)?;
        let scheduler_enabled: bool = parse_value(
            "SCHEDULER_ENABLED",
            &get_env_or_default("SCHEDULER_ENABLED", "true"),
        )?;
        let sync_cron = get_env_or_default("SYNC_CRON", "0 0 */6 * * *");
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let frontend_urls =
            get_optional_env("FRONTEND_URL").map_or_else(Vec::new, |v| split_csv(&v));

        Ok(Self {
            database_url,
            host,
            port,
            shopify_api_version,
            shopify_http_timeout,
            scheduler_enabled,
            sync_cron,
            sentry_dsn,
            sentry_environment,
            frontend_urls,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
