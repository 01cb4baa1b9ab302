//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_DELAY_MS` - Simulated order processing time (default: 3000)
//! - `CONTACT_DELAY_MS` - Simulated contact form submission time (default: 2000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const DEFAULT_CHECKOUT_DELAY_MS: &str = "3000";
const DEFAULT_CONTACT_DELAY_MS: &str = "2000";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// How long placing an order takes
    pub checkout_delay: Duration,
    /// How long sending the contact form takes
    pub contact_delay: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
    pub sentry_sample_rate: f32,
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
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
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get_database_url(&var, "STOREFRONT_DATABASE_URL")?;
        validate_database_url(&database_url, "STOREFRONT_DATABASE_URL")?;

        let host = parse_env(&var, "STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env(&var, "STOREFRONT_PORT", "3000")?;
        let base_url = get_required_env(&var, "STOREFRONT_BASE_URL")?;
        let checkout_delay =
            Duration::from_millis(parse_env(&var, "CHECKOUT_DELAY_MS", DEFAULT_CHECKOUT_DELAY_MS)?);
        let contact_delay =
            Duration::from_millis(parse_env(&var, "CONTACT_DELAY_MS", DEFAULT_CONTACT_DELAY_MS)?);

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            checkout_delay,
            contact_delay,
            sentry_dsn: var("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: var("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env(&var, "SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env(&var, "SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether cookies should carry the `Secure` attribute.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env<F>(var: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    var(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url<F>(var: &F, primary_key: &str) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    var(primary_key)
        .or_else(|| var("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Parse an environment variable, using `default` when it is unset.
fn parse_env<F, T>(var: &F, key: &str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    var(key)
        .unwrap_or_else(|| default.to_string())
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Reject connection strings for anything other than `PostgreSQL`.
fn validate_database_url(url: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = url.expose_secret();
    if value.starts_with("postgres://") || value.starts_with("postgresql://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            "must be a postgres:// or postgresql:// URL".to_string(),
        ))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const MINIMAL: &[(&str, &str)] = &[
        ("STOREFRONT_DATABASE_URL", "postgres://localhost/px_shop"),
        ("STOREFRONT_BASE_URL", "http://localhost:3000"),
    ];

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(MINIMAL)).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.checkout_delay, Duration::from_millis(3000));
        assert_eq!(config.contact_delay, Duration::from_millis(2000));
        assert!(config.sentry_dsn.is_none());
        assert!((config.sentry_sample_rate - 1.0).abs() < f32::EPSILON);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_database_url_fallback() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgresql://fly/px"),
            ("STOREFRONT_BASE_URL", "https://shop.example"),
        ]))
        .unwrap();
        assert_eq!(config.database_url.expose_secret(), "postgresql://fly/px");
        assert!(config.is_secure());
    }

    #[test]
    fn test_missing_required() {
        let err = StorefrontConfig::from_lookup(lookup(&[(
            "STOREFRONT_DATABASE_URL",
            "postgres://localhost/px_shop",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "STOREFRONT_BASE_URL"));
    }

    #[test]
    fn test_rejects_non_postgres_url() {
        let err = StorefrontConfig::from_lookup(lookup(&[
            ("STOREFRONT_DATABASE_URL", "mysql://localhost/px"),
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));
    }

    #[test]
    fn test_invalid_port_and_delay() {
        let mut pairs = MINIMAL.to_vec();
        pairs.push(("STOREFRONT_PORT", "eighty"));
        assert!(StorefrontConfig::from_lookup(lookup(&pairs)).is_err());

        let mut pairs = MINIMAL.to_vec();
        pairs.push(("CHECKOUT_DELAY_MS", "-5"));
        assert!(StorefrontConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_overrides() {
        let mut pairs = MINIMAL.to_vec();
        pairs.extend([
            ("STOREFRONT_HOST", "0.0.0.0"),
            ("STOREFRONT_PORT", "8080"),
            ("CHECKOUT_DELAY_MS", "0"),
            ("SENTRY_DSN", "https://key@sentry.example/1"),
        ]);
        let config = StorefrontConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.checkout_delay, Duration::ZERO);
        assert!(config.sentry_dsn.is_some());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let mut pairs = MINIMAL.to_vec();
        pairs[0] = ("STOREFRONT_DATABASE_URL", "postgres://user:hunter2@db/px");
        let config = StorefrontConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }
}
