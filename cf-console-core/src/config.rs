//! Service configuration sections
//!
//! Deserialized from the application config file; every field has a default so a
//! partial file is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use cf_console_provider::{ClientConfig, DEFAULT_API_BASE};

/// Hard ceiling on attempts per gateway call, including the first
pub const MAX_ATTEMPTS_CEILING: u32 = 3;

/// Upstream connection and retry settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub api_base: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Attempts per non-mutating call; 1 disables retries.
    pub max_attempts: u32,
    pub retry_base_delay_ms: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            max_attempts: 1,
            retry_base_delay_ms: 100,
        }
    }
}

impl GatewayConfig {
    /// `max_attempts` clamped to `1..=3`
    #[must_use]
    pub fn effective_attempts(&self) -> u32 {
        self.max_attempts.clamp(1, MAX_ATTEMPTS_CEILING)
    }

    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            api_base: self.api_base.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}

/// Pages deployment limits and polling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployConfig {
    /// Lowercase extensions without the dot
    pub accepted_extensions: Vec<String>,
    pub max_asset_bytes: u64,
    pub branch_pattern: String,
    pub poll_interval_secs: u64,
    pub poll_timeout_secs: u64,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            accepted_extensions: vec!["js".to_string(), "mjs".to_string()],
            max_asset_bytes: 10 * 1024 * 1024,
            branch_pattern: r"^[A-Za-z0-9][A-Za-z0-9._/-]{0,127}$".to_string(),
            poll_interval_secs: 2,
            poll_timeout_secs: 300,
        }
    }
}

impl DeployConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: GatewayConfig = serde_json::from_str(r#"{"max_attempts": 9}"#).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.effective_attempts(), MAX_ATTEMPTS_CEILING);
    }

    #[test]
    fn zero_attempts_still_sends_once() {
        let config = GatewayConfig {
            max_attempts: 0,
            ..GatewayConfig::default()
        };
        assert_eq!(config.effective_attempts(), 1);
    }

    #[test]
    fn deploy_defaults() {
        let config = DeployConfig::default();
        assert_eq!(config.accepted_extensions, vec!["js", "mjs"]);
        assert_eq!(config.max_asset_bytes, 10_485_760);
        assert_eq!(config.poll_timeout(), Duration::from_secs(300));
    }
}
