//! Application configuration file
//!
//! JSON at `<config_dir>/cf-console/config.json`. A missing file means
//! defaults; missing fields take their defaults too.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use cf_console_core::config::{DeployConfig, GatewayConfig};
use cf_console_core::error::{CoreError, CoreResult};

/// Directory name under the platform config and data dirs
pub const APP_DIR_NAME: &str = "cf-console";
const CONFIG_FILE_NAME: &str = "config.json";
const DATABASE_FILE_NAME: &str = "cf-console.db";

/// Durable storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// `None` means `<data_dir>/cf-console/cf-console.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured path, or the platform default.
    pub fn resolve_database_path(&self) -> CoreResult<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME).join(DATABASE_FILE_NAME))
            .ok_or_else(|| {
                CoreError::StorageError("Cannot determine the platform data directory".to_string())
            })
    }
}

/// Whole application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub deploy: DeployConfig,
    pub storage: StorageConfig,
}

impl AppConfig {
    /// `<config_dir>/cf-console/config.json`
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Read the file at `path`; a missing file yields defaults.
    pub fn load(path: &Path) -> CoreResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let config: Self = serde_json::from_str(&text).map_err(|e| {
                    CoreError::SerializationError(format!(
                        "Invalid config file {}: {e}",
                        path.display()
                    ))
                })?;
                log::debug!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No configuration at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(CoreError::StorageError(format!(
                "Failed to read {}: {e}",
                path.display()
            ))),
        }
    }

    /// Load from the default location, or defaults when there is none.
    pub fn load_default() -> CoreResult<Self> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"gateway": {"max_attempts": 2}, "storage": {"database_path": "/tmp/x.db"}}"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.gateway.max_attempts, 2);
        assert_eq!(config.gateway.request_timeout_secs, 30);
        assert_eq!(config.deploy, DeployConfig::default());
        assert_eq!(
            config.storage.resolve_database_path().unwrap(),
            PathBuf::from("/tmp/x.db")
        );
    }

    #[test]
    fn malformed_file_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            AppConfig::load(&path),
            Err(CoreError::SerializationError(_))
        ));
    }
}
