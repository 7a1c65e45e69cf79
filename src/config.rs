//! Configuration for the synchronization layer.
//!
//! Configuration can be set via environment variables:
//! - `MISSION_API_URL` - Required. Base URL of the mission API (http or https).
//! - `MISSION_POLL_SECS` - Optional. Poll delay between mission fetches. Defaults to `5`.
//! - `MISSION_PING_SECS` - Optional. Keepalive period for event channels. Defaults to `30`.

use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Synchronization layer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the mission API, without a trailing slash.
    pub api_base_url: String,

    /// Delay between a completed mission fetch and the next scheduled one.
    pub poll_interval: Duration,

    /// Period between outbound keepalive pings on an open event channel.
    pub ping_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `MISSION_API_URL` is not set.
    /// A missing base URL is a fatal startup condition for this layer.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_base_url = std::env::var("MISSION_API_URL")
            .map_err(|_| ConfigError::MissingEnvVar("MISSION_API_URL".to_string()))?;
        let api_base_url = validate_base_url(&api_base_url)?;

        let poll_interval = duration_env("MISSION_POLL_SECS", 5)?;
        let ping_interval = duration_env("MISSION_PING_SECS", 30)?;

        Ok(Self {
            api_base_url,
            poll_interval,
            ping_interval,
        })
    }

    /// Create a config with default intervals (useful for testing).
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(5),
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// Validate and normalize the API base URL.
///
/// The URL must be absolute with an http or https scheme. A trailing
/// slash is trimmed so endpoint paths can be appended uniformly.
fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let parsed = Url::parse(raw)
        .map_err(|e| ConfigError::InvalidValue("MISSION_API_URL".to_string(), e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(raw.trim_end_matches('/').to_string()),
        other => Err(ConfigError::InvalidValue(
            "MISSION_API_URL".to_string(),
            format!("unsupported scheme: {}", other),
        )),
    }
}

fn duration_env(name: &str, default_secs: u64) -> Result<Duration, ConfigError> {
    let secs = match std::env::var(name) {
        Ok(raw) => raw
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), format!("{}", e)))?,
        Err(_) => default_secs,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let normalized = validate_base_url("https://api.example.com/").expect("valid url");
        assert_eq!(normalized, "https://api.example.com");
    }

    #[test]
    fn base_url_rejects_non_http_schemes() {
        let err = validate_base_url("ftp://api.example.com").expect_err("ftp should be rejected");
        assert!(matches!(err, ConfigError::InvalidValue(_, _)));
    }

    #[test]
    fn base_url_rejects_garbage() {
        assert!(validate_base_url("not a url").is_err());
    }
}
