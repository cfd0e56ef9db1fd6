//! Platform-agnostic application bootstrap for cf-console.
//!
//! Provides `AppConfig` (configuration file), `AppState` (service container)
//! and `AppStateBuilder` (adapter injection). Frontends build one `AppState`
//! at startup and drive the core services through it.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod adapters;
pub mod config;

use std::sync::Arc;

use cf_console_core::error::{CoreError, CoreResult};
use cf_console_core::services::{AccountRegistry, DeploymentOrchestrator, ResourceGateway};
use cf_console_core::traits::CredentialStore;
use cf_console_provider::{CloudflareClient, Upstream};

pub use config::{AppConfig, StorageConfig};

/// Platform-agnostic application state.
pub struct AppState {
    /// Configuration the services were built from
    pub config: AppConfig,
    /// Account registry (credentials and the current account)
    pub registry: Arc<AccountRegistry>,
    /// Resource gateway
    pub gateway: Arc<ResourceGateway>,
    /// Pages deployment orchestrator
    pub orchestrator: Arc<DeploymentOrchestrator>,
}

/// Builder for constructing `AppState` with platform-specific adapters.
///
/// # Required adapters
/// - `credential_store`: where credentials live
///
/// # Optional
/// - `upstream`: defaults to a `CloudflareClient` built from `config.gateway`
/// - `config`: defaults to `AppConfig::default()`
#[derive(Default)]
pub struct AppStateBuilder {
    config: Option<AppConfig>,
    credential_store: Option<Arc<dyn CredentialStore>>,
    upstream: Option<Arc<dyn Upstream>>,
}

impl AppStateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    #[must_use]
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.credential_store = Some(store);
        self
    }

    #[must_use]
    pub fn upstream(mut self, upstream: Arc<dyn Upstream>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Build the `AppState`, restoring the current account from the store.
    ///
    /// # Errors
    /// `ValidationError` if `credential_store` is missing or the deploy
    /// configuration is invalid; `StorageError` if the store cannot be read;
    /// `UpstreamUnreachable` if the HTTP client cannot be constructed.
    pub async fn build(self) -> CoreResult<AppState> {
        let credential_store = self.credential_store.ok_or_else(|| {
            CoreError::ValidationError("credential_store is required".to_string())
        })?;
        let config = self.config.unwrap_or_default();

        let upstream: Arc<dyn Upstream> = match self.upstream {
            Some(upstream) => upstream,
            None => Arc::new(CloudflareClient::new(config.gateway.client_config())?),
        };

        let registry = Arc::new(AccountRegistry::load(credential_store).await?);
        let gateway = Arc::new(ResourceGateway::new(
            Arc::clone(&registry),
            upstream,
            &config.gateway,
        ));
        let orchestrator = Arc::new(DeploymentOrchestrator::new(
            Arc::clone(&gateway),
            config.deploy.clone(),
        )?);

        log::debug!("Application state ready");
        Ok(AppState {
            config,
            registry,
            gateway,
            orchestrator,
        })
    }
}
