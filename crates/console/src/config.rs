//! Console configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `PRICEWATCH_API_BASE_URL` - Base URL of the price data service. When unset the
//!   built-in mock catalogue is used.
//! - `PRICEWATCH_API_TOKEN` - Static API key sent with every request
//! - `PRICEWATCH_HTTP_TIMEOUT_SECS` - Request timeout (default: 10)
//! - `PRICEWATCH_CATALOGUE_CACHE_TTL_SECS` - Category/brand cache TTL (default: 300)
//! - `PRICEWATCH_FLASH_TTL_MS` - Lifetime of confirmation messages (default: 2500)
//! - `PRICEWATCH_AUTH_CLOSE_DELAY_MS` - Delay before the login dialog closes (default: 1500)
//! - `PRICEWATCH_MOCK_LATENCY_MS` - Artificial latency of the mock service (default: 0)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Console configuration.
#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Remote data service; `None` selects the in-memory mock.
    pub api: Option<ApiConfig>,
    /// How long flash messages stay visible.
    pub flash_ttl: Duration,
    /// Delay between a successful login and the dialog closing.
    pub auth_close_delay: Duration,
    /// Latency injected into every mock call.
    pub mock_latency: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

/// Remote data service configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    pub base_url: Url,
    pub token: Option<SecretString>,
    pub timeout: Duration,
    /// TTL of cached categories and brands.
    pub catalogue_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .field("catalogue_ttl", &self.catalogue_ttl)
            .finish()
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api: None,
            flash_ttl: Duration::from_millis(2500),
            auth_close_delay: Duration::from_millis(1500),
            mock_latency: Duration::ZERO,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ConsoleConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api = match lookup("PRICEWATCH_API_BASE_URL") {
            Some(raw) => Some(ApiConfig {
                base_url: Url::parse(&raw).map_err(|e| {
                    ConfigError::InvalidEnvVar("PRICEWATCH_API_BASE_URL".to_string(), e.to_string())
                })?,
                token: lookup("PRICEWATCH_API_TOKEN").map(SecretString::from),
                timeout: Duration::from_secs(parse_or(
                    &lookup,
                    "PRICEWATCH_HTTP_TIMEOUT_SECS",
                    10,
                )?),
                catalogue_ttl: Duration::from_secs(parse_or(
                    &lookup,
                    "PRICEWATCH_CATALOGUE_CACHE_TTL_SECS",
                    300,
                )?),
            }),
            None => None,
        };

        Ok(Self {
            api,
            flash_ttl: Duration::from_millis(parse_or(&lookup, "PRICEWATCH_FLASH_TTL_MS", 2500)?),
            auth_close_delay: Duration::from_millis(parse_or(
                &lookup,
                "PRICEWATCH_AUTH_CLOSE_DELAY_MS",
                1500,
            )?),
            mock_latency: Duration::from_millis(parse_or(
                &lookup,
                "PRICEWATCH_MOCK_LATENCY_MS",
                0,
            )?),
            sentry_dsn: lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT"),
        })
    }
}

/// Parse a variable, falling back to `default` when it is unset.
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_select_mock_service() {
        let config = ConsoleConfig::from_lookup(lookup_from(&[])).unwrap();
        assert!(config.api.is_none());
        assert_eq!(config.flash_ttl, Duration::from_millis(2500));
        assert_eq!(config.auth_close_delay, Duration::from_millis(1500));
        assert_eq!(config.mock_latency, Duration::ZERO);
    }

    #[test]
    fn test_api_section_is_parsed() {
        let config = ConsoleConfig::from_lookup(lookup_from(&[
            ("PRICEWATCH_API_BASE_URL", "https://prices.example.com/api/"),
            ("PRICEWATCH_API_TOKEN", "tok"),
            ("PRICEWATCH_HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        let api = config.api.unwrap();
        assert_eq!(api.base_url.as_str(), "https://prices.example.com/api/");
        assert_eq!(api.timeout, Duration::from_secs(3));
        assert_eq!(api.catalogue_ttl, Duration::from_secs(300));
        assert!(api.token.is_some());
    }

    #[test]
    fn test_invalid_number_is_reported() {
        let err = ConsoleConfig::from_lookup(lookup_from(&[("PRICEWATCH_FLASH_TTL_MS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("PRICEWATCH_FLASH_TTL_MS"));
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let err =
            ConsoleConfig::from_lookup(lookup_from(&[("PRICEWATCH_API_BASE_URL", "not a url")]))
                .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "PRICEWATCH_API_BASE_URL"));
    }

    #[test]
    fn test_debug_redacts_token() {
        let api = ApiConfig {
            base_url: Url::parse("https://prices.example.com").unwrap(),
            token: Some(SecretString::from("super-secret-token")),
            timeout: Duration::from_secs(1),
            catalogue_ttl: Duration::from_secs(1),
        };
        let debug = format!("{api:?}");
        assert!(!debug.contains("super-secret-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
