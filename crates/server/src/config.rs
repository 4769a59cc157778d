//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - Postgres connection string
//! - `APP_SECRET` - Session token signing secret (min 32 chars)
//! - `FRONTEND_URL` - Public URL of the storefront frontend (CORS origin and
//!   password-reset links)
//! - `MAIL_HOST`, `MAIL_USER`, `MAIL_PASS`, `MAIL_FROM` - SMTP relay
//! - `STRIPE_SECRET` - Payment gateway secret key
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 4444)
//! - `MAIL_PORT` - SMTP port (default: 587)
//! - `STRIPE_API_URL` - Gateway base URL (default: https://api.stripe.com)
//! - `CHECKOUT_CURRENCY` - ISO 4217 code for charges (default: USD)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

const MIN_APP_SECRET_LENGTH: usize = 32;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Postgres connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the frontend
    pub frontend_url: String,
    /// Session token signing secret
    pub app_secret: SecretString,
    /// SMTP relay configuration
    pub mail: MailConfig,
    /// Payment gateway configuration
    pub stripe: StripeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// SMTP relay configuration.
#[derive(Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: SecretString,
    /// From address on outbound mail
    pub from_address: String,
}

impl std::fmt::Debug for MailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

/// Payment gateway configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Gateway secret key
    pub secret_key: SecretString,
    /// Gateway base URL (overridable for test doubles)
    pub api_url: String,
    /// ISO 4217 currency code all charges are made in
    pub currency: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("currency", &self.currency)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the app secret fails validation.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = SecretString::from(get_required_env("DATABASE_URL")?);
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_owned(), e.to_string()))?;
        let port = get_env_or_default("PORT", "4444")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_owned(), e.to_string()))?;
        let frontend_url = get_required_env("FRONTEND_URL")?;
        let app_secret = get_validated_secret("APP_SECRET")?;

        let mail = MailConfig::from_env()?;
        let stripe = StripeConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");

        Ok(Self {
            database_url,
            host,
            port,
            frontend_url,
            app_secret,
            mail,
            stripe,
            sentry_dsn,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            smtp_host: get_required_env("MAIL_HOST")?,
            smtp_port: get_env_or_default("MAIL_PORT", "587")
                .parse::<u16>()
                .map_err(|e| ConfigError::InvalidEnvVar("MAIL_PORT".to_owned(), e.to_string()))?,
            smtp_username: get_required_env("MAIL_USER")?,
            smtp_password: SecretString::from(get_required_env("MAIL_PASS")?),
            from_address: get_required_env("MAIL_FROM")?,
        })
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            secret_key: SecretString::from(get_required_env("STRIPE_SECRET")?),
            api_url: get_env_or_default("STRIPE_API_URL", "https://api.stripe.com"),
            currency: get_env_or_default("CHECKOUT_CURRENCY", "USD"),
        })
    }
}

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_owned()))
}

fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_owned())
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn get_validated_secret(name: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(name)?;
    validate_secret(name, &value)?;
    Ok(SecretString::from(value))
}

/// Reject short or obviously-placeholder secrets before the server starts.
fn validate_secret(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.len() < MIN_APP_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            name.to_owned(),
            format!("must be at least {MIN_APP_SECRET_LENGTH} characters"),
        ));
    }

    let lowered = value.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lowered.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                name.to_owned(),
                format!("looks like a placeholder (contains {pattern:?})"),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_secret_rejects_short() {
        assert!(validate_secret("APP_SECRET", "short").is_err());
    }

    #[test]
    fn test_validate_secret_rejects_placeholder() {
        assert!(validate_secret("APP_SECRET", &"changeme".repeat(8)).is_err());
        assert!(validate_secret("APP_SECRET", &"your-key".repeat(8)).is_err());
    }

    #[test]
    fn test_validate_secret_accepts_random() {
        assert!(validate_secret("APP_SECRET", "kD93jfnW02mfkAls9dhw7CmdkE82hdQz").is_ok());
    }
}
