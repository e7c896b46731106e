//! Configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `HELPERS_HOST` - Bind address (default: 127.0.0.1)
//! - `HELPERS_PORT` - Listen port (default: 3000)
//! - `HELPERS_ENV` - `development`, `test` or `production` (default: production)
//! - `HELPERS_UPSTREAM_URL` - URL relayed by `GET /upstream`
//! - `HELPERS_UPSTREAM_TIMEOUT_SECS` - Timeout for outbound GETs (default: none)
//! - `HELPERS_SECURE_COOKIES` - Mark the session cookie `Secure` (default: false)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Deployment environment, fixed at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development. Enables the `custId` query override.
    Development,
    /// Automated test runs.
    Test,
    /// Anything serving real customers.
    #[default]
    Production,
}

impl Environment {
    /// The label this environment is configured with.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" => Ok(Self::Development),
            "test" => Ok(Self::Test),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "unknown environment '{other}' (expected development, test or production)"
            )),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct HelpersConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// URL relayed by the upstream route
    pub upstream_url: Option<Url>,
    /// Timeout applied to outbound GETs
    pub upstream_timeout: Option<Duration>,
    /// Whether the session cookie is marked `Secure`
    pub secure_cookies: bool,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl Default for HelpersConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            environment: Environment::default(),
            upstream_url: None,
            upstream_timeout: None,
            secure_cookies: false,
            sentry_dsn: None,
        }
    }
}

impl HelpersConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set to a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env_or_default("HELPERS_HOST", "127.0.0.1")?;
        let port = parse_env_or_default("HELPERS_PORT", "3000")?;
        let environment = parse_env_or_default("HELPERS_ENV", "production")?;
        let secure_cookies = parse_env_or_default("HELPERS_SECURE_COOKIES", "false")?;

        let upstream_url = get_optional_env("HELPERS_UPSTREAM_URL")
            .map(|value| parse_value::<Url>("HELPERS_UPSTREAM_URL", &value))
            .transpose()?;

        let upstream_timeout = get_optional_env("HELPERS_UPSTREAM_TIMEOUT_SECS")
            .map(|value| parse_timeout("HELPERS_UPSTREAM_TIMEOUT_SECS", &value))
            .transpose()?;

        Ok(Self {
            host,
            port,
            environment,
            upstream_url,
            upstream_timeout,
            secure_cookies,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env_or_default<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let value = get_optional_env(key).unwrap_or_else(|| default.to_string());
    parse_value(key, &value)
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a timeout in whole seconds. Zero is rejected.
fn parse_timeout(key: &str, value: &str) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_value(key, value)?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}
