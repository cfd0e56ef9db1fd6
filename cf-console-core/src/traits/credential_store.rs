//! Credential storage abstract Trait

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};
use crate::types::AccountCredential;

/// Credential storage Trait
///
/// Durable table of named account credentials, keyed by `AccountCredential::name`.
/// Implementations make no network calls.
///
/// Platform implementations:
/// - `InMemoryCredentialStore` (this crate; tests, ephemeral sessions)
/// - `SqliteStore` (cf-console-app; `SeaORM` + AES encryption)
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a credential
    ///
    /// # Errors
    /// * `DuplicateName` - the name exists and `overwrite` is false
    async fn put(&self, credential: &AccountCredential, overwrite: bool) -> CoreResult<()>;

    /// Get a single credential
    ///
    /// # Errors
    /// * `NotFound` - unknown name
    async fn get(&self, name: &str) -> CoreResult<AccountCredential>;

    /// Delete a credential
    ///
    /// # Errors
    /// * `NotFound` - unknown name
    async fn remove(&self, name: &str) -> CoreResult<()>;

    /// All stored credentials, in no particular order
    async fn list(&self) -> CoreResult<Vec<AccountCredential>>;

    /// Whether no credential is stored. Implementations should answer without
    /// decrypting rows.
    async fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.list().await?.is_empty())
    }

    /// Persist the current flag on `name` and clear it everywhere else.
    ///
    /// `None` clears every flag.
    ///
    /// # Errors
    /// * `NotFound` - `name` is given but unknown
    async fn set_current(&self, name: Option<&str>) -> CoreResult<()>;
}

/// In-memory credential store
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    credentials: Arc<RwLock<HashMap<String, AccountCredential>>>,
}

impl InMemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn put(&self, credential: &AccountCredential, overwrite: bool) -> CoreResult<()> {
        let mut credentials = self.credentials.write().await;
        if !overwrite && credentials.contains_key(&credential.name) {
            return Err(CoreError::DuplicateName(credential.name.clone()));
        }
        credentials.insert(credential.name.clone(), credential.clone());
        Ok(())
    }

    async fn get(&self, name: &str) -> CoreResult<AccountCredential> {
        self.credentials
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(format!("account '{name}'")))
    }

    async fn remove(&self, name: &str) -> CoreResult<()> {
        self.credentials
            .write()
            .await
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CoreError::NotFound(format!("account '{name}'")))
    }

    async fn list(&self) -> CoreResult<Vec<AccountCredential>> {
        Ok(self.credentials.read().await.values().cloned().collect())
    }

    async fn is_empty(&self) -> CoreResult<bool> {
        Ok(self.credentials.read().await.is_empty())
    }

    async fn set_current(&self, name: Option<&str>) -> CoreResult<()> {
        let mut credentials = self.credentials.write().await;
        if let Some(name) = name {
            if !credentials.contains_key(name) {
                return Err(CoreError::NotFound(format!("account '{name}'")));
            }
        }
        for credential in credentials.values_mut() {
            credential.is_current = Some(credential.name.as_str()) == name;
        }
        Ok(())
    }
}
