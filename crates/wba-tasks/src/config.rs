//! Configuration management
//!
//! Handles the backend location, the Telegram session and polling cadence.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::auth::AuthHeaders;

/// Error types for configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// API base URL (env: WBA_API_URL)
    pub base_url: String,
    /// Telegram WebApp initData (env: WBA_INIT_DATA)
    #[serde(skip_serializing)]
    pub init_data: Option<String>,
    /// Poll interval override (env: WBA_POLL_INTERVAL_MS)
    pub poll_interval: Option<Duration>,
    /// Attempt budget override (env: WBA_POLL_MAX_ATTEMPTS)
    pub max_attempts: Option<u32>,
    /// Per-request HTTP timeout (env: WBA_HTTP_TIMEOUT_SECS)
    pub http_timeout: Duration,
}

const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            init_data: None,
            poll_interval: None,
            max_attempts: None,
            http_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }
}

fn positive(name: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid(format!("{name} must be greater than zero"))),
        Ok(v) => Ok(v),
        Err(e) => Err(ConfigError::Invalid(format!("{name}={raw:?}: {e}"))),
    }
}

impl ClientConfig {
    /// Load configuration from environment variables, ignoring unparsable values
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok(), false).unwrap_or_default()
    }

    /// Load configuration from environment variables, rejecting unparsable values
    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok(), true)
    }

    fn from_lookup<F>(lookup: F, strict: bool) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |name: &str| -> Result<Option<u64>, ConfigError> {
            match lookup(name) {
                None => Ok(None),
                Some(raw) => match positive(name, &raw) {
                    Ok(v) => Ok(Some(v)),
                    Err(e) if strict => Err(e),
                    Err(_) => Ok(None),
                },
            }
        };

        let max_attempts = match number("WBA_POLL_MAX_ATTEMPTS")?.map(u32::try_from) {
            None => None,
            Some(Ok(v)) => Some(v),
            Some(Err(_)) if strict => {
                return Err(ConfigError::Invalid(
                    "WBA_POLL_MAX_ATTEMPTS is out of range".to_string(),
                ))
            }
            Some(Err(_)) => None,
        };

        Ok(Self {
            base_url: lookup("WBA_API_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            init_data: lookup("WBA_INIT_DATA").filter(|v| !v.is_empty()),
            poll_interval: number("WBA_POLL_INTERVAL_MS")?.map(Duration::from_millis),
            max_attempts,
            http_timeout: number("WBA_HTTP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_HTTP_TIMEOUT),
        })
    }

    /// Headers for the configured Telegram session, empty when there is none
    pub fn auth_headers(&self) -> AuthHeaders {
        self.init_data
            .as_deref()
            .map(AuthHeaders::telegram)
            .unwrap_or_default()
    }

    /// Headers for the configured session, failing when none is configured
    pub fn require_init_data(&self) -> Result<AuthHeaders, ConfigError> {
        match self.init_data.as_deref() {
            Some(data) => Ok(AuthHeaders::telegram(data)),
            None => Err(ConfigError::MissingEnvVar("WBA_INIT_DATA".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert!(config.auth_headers().is_empty());
        assert!(matches!(
            config.require_init_data(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_values_from_lookup() {
        let config = ClientConfig::from_lookup(
            lookup(&[
                ("WBA_API_URL", "https://wb.example.com"),
                ("WBA_INIT_DATA", "user=1&hash=aa"),
                ("WBA_POLL_INTERVAL_MS", "1500"),
                ("WBA_POLL_MAX_ATTEMPTS", "40"),
            ]),
            true,
        )
        .unwrap();
        assert_eq!(config.base_url, "https://wb.example.com");
        assert_eq!(config.poll_interval, Some(Duration::from_millis(1500)));
        assert_eq!(config.max_attempts, Some(40));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.require_init_data().is_ok());
    }

    #[test]
    fn test_strict_rejects_bad_numbers() {
        let result =
            ClientConfig::from_lookup(lookup(&[("WBA_POLL_INTERVAL_MS", "fast")]), true);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let result = ClientConfig::from_lookup(lookup(&[("WBA_POLL_MAX_ATTEMPTS", "0")]), true);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));

        let lenient =
            ClientConfig::from_lookup(lookup(&[("WBA_POLL_INTERVAL_MS", "fast")]), false).unwrap();
        assert_eq!(lenient.poll_interval, None);
    }

    #[test]
    fn test_out_of_range_attempts() {
        let vars = [
            ("WBA_API_URL", "https://prod.example"),
            ("WBA_INIT_DATA", "hash=1"),
            ("WBA_POLL_INTERVAL_MS", "2500"),
            ("WBA_POLL_MAX_ATTEMPTS", "99999999999"),
        ];

        let strict = ClientConfig::from_lookup(lookup(&vars), true);
        assert!(matches!(strict, Err(ConfigError::Invalid(_))));

        let lenient = ClientConfig::from_lookup(lookup(&vars), false).unwrap();
        assert_eq!(lenient.base_url, "https://prod.example");
        assert_eq!(lenient.init_data.as_deref(), Some("hash=1"));
        assert_eq!(lenient.poll_interval, Some(Duration::from_millis(2500)));
        assert_eq!(lenient.max_attempts, None);
    }
}
