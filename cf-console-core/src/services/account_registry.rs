//! Account registry
//!
//! Wraps a [`CredentialStore`] and owns the "current account" pointer. Every
//! operation that reads or moves the pointer runs inside one mutex section, so a
//! switch racing a remove or an add never leaves two accounts current.
//!
//! The current credential is kept in memory; the registry is the only writer of
//! the store it wraps, so reading it needs no store round trip.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{CoreError, CoreResult};
use crate::traits::CredentialStore;
use crate::types::{validate_account_name, AccountCredential, CreateAccountRequest};

/// Account registry
pub struct AccountRegistry {
    store: Arc<dyn CredentialStore>,
    current: Mutex<Option<AccountCredential>>,
}

fn is_named(current: Option<&AccountCredential>, name: &str) -> bool {
    current.is_some_and(|c| c.name == name)
}

impl AccountRegistry {
    /// Restore the registry from persisted state.
    ///
    /// If several rows carry the current flag, the first by name wins and the
    /// others are cleared.
    pub async fn load(store: Arc<dyn CredentialStore>) -> CoreResult<Self> {
        let mut flagged: Vec<AccountCredential> = store
            .list()
            .await?
            .into_iter()
            .filter(|c| c.is_current)
            .collect();
        flagged.sort_by(|a, b| a.name.cmp(&b.name));

        if flagged.len() > 1 {
            let names: Vec<&str> = flagged.iter().map(|c| c.name.as_str()).collect();
            log::warn!(
                "Credential store had {} current accounts ({}); keeping '{}'",
                flagged.len(),
                names.join(", "),
                names[0]
            );
            store.set_current(Some(names[0])).await?;
        }

        let current = flagged.into_iter().next();
        match &current {
            Some(credential) => {
                log::info!("Account registry loaded, current account: {}", credential.name);
            }
            None => log::info!("Account registry loaded, no current account"),
        }

        Ok(Self {
            store,
            current: Mutex::new(current),
        })
    }

    /// Add an account.
    ///
    /// The new account becomes current iff the store held no accounts.
    pub async fn add_account(&self, request: CreateAccountRequest) -> CoreResult<AccountCredential> {
        request.validate()?;
        let mut current = self.current.lock().await;

        let was_empty = self.store.is_empty().await?;
        let mut credential = request.into_credential();
        credential.is_current = was_empty;
        self.store.put(&credential, false).await?;

        if was_empty {
            *current = Some(credential.clone());
            log::info!("Added account '{}' (now current)", credential.name);
        } else {
            log::info!("Added account '{}'", credential.name);
        }
        Ok(credential)
    }

    /// Make `name` the current account.
    pub async fn switch_to(&self, name: &str) -> CoreResult<AccountCredential> {
        let mut current = self.current.lock().await;

        let mut credential = self.store.get(name).await?;
        self.store.set_current(Some(name)).await?;
        credential.is_current = true;

        let previous = current.replace(credential.clone());
        log::info!(
            "Switched current account: {} -> {name}",
            previous.as_ref().map_or("<none>", |c| c.name.as_str())
        );
        Ok(credential)
    }

    /// Owned snapshot of the current account.
    pub async fn current(&self) -> CoreResult<AccountCredential> {
        self.current
            .lock()
            .await
            .clone()
            .ok_or(CoreError::NoCurrentAccount)
    }

    /// Remove an account. Removing the current account leaves none current.
    pub async fn remove(&self, name: &str) -> CoreResult<()> {
        let mut current = self.current.lock().await;

        self.store.remove(name).await?;
        if is_named(current.as_ref(), name) {
            *current = None;
            log::info!("Removed current account '{name}'; no account is current");
        } else {
            log::info!("Removed account '{name}'");
        }
        Ok(())
    }

    /// All accounts sorted by name, `is_current` reflecting the registry.
    pub async fn list(&self) -> CoreResult<Vec<AccountCredential>> {
        let current = self.current.lock().await;
        let mut credentials = self.store.list().await?;
        for credential in &mut credentials {
            credential.is_current = is_named(current.as_ref(), &credential.name);
        }
        credentials.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(credentials)
    }

    pub async fn get(&self, name: &str) -> CoreResult<AccountCredential> {
        let current = self.current.lock().await;
        let mut credential = self.store.get(name).await?;
        credential.is_current = is_named(current.as_ref(), name);
        Ok(credential)
    }

    /// Persist an upstream account id resolved for `name`.
    pub async fn record_account_id(&self, name: &str, account_id: &str) -> CoreResult<()> {
        validate_account_name(name)?;
        let mut current = self.current.lock().await;

        let mut credential = self.store.get(name).await?;
        if credential.account_id.as_deref() == Some(account_id) {
            return Ok(());
        }
        credential.account_id = Some(account_id.to_string());
        credential.is_current = is_named(current.as_ref(), name);
        self.store.put(&credential, true).await?;
        if credential.is_current {
            *current = Some(credential);
        }
        log::debug!("Recorded account id for '{name}'");
        Ok(())
    }
}
