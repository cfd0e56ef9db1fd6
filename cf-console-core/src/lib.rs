//! cf-console Core Library
//!
//! Business logic for operating several Cloudflare accounts from one console:
//! - Account Registry (stored credentials, exactly one current account)
//! - Resource Gateway (authenticated, table-routed calls against resource kinds)
//! - Deployment Orchestrator (Pages publish flow as an explicit state machine)
//!
//! Storage is abstracted through the [`CredentialStore`] trait and the remote
//! API through [`cf_console_provider::Upstream`], so frontends inject their own
//! implementations.
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod crypto;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use config::{DeployConfig, GatewayConfig};
pub use error::{CoreError, CoreResult};
pub use services::{AccountRegistry, DeploymentOrchestrator, ResourceGateway};
pub use traits::{CredentialStore, InMemoryCredentialStore};
