//! `CredentialStore` implementation for `SqliteStore`.
//!
//! Auth material is serialized to JSON and sealed with
//! `cf_console_core::crypto::SecretBox` before it reaches the database.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    TransactionTrait,
};

use cf_console_core::crypto::{SealedSecret, SecretBox};
use cf_console_core::error::{CoreError, CoreResult};
use cf_console_core::traits::CredentialStore;
use cf_console_core::types::{AccountCredential, AuthMaterial};

use super::entity::credential;
use super::SqliteStore;

fn storage_err(action: &'static str) -> impl FnOnce(DbErr) -> CoreError {
    move |e| CoreError::StorageError(format!("Failed to {action}: {e}"))
}

impl SqliteStore {
    /// Return the configured secret box or an explicit storage error.
    fn secrets(&self) -> CoreResult<&SecretBox> {
        self.secrets.as_ref().ok_or_else(|| {
            CoreError::StorageError("Encryption password not configured for SqliteStore".into())
        })
    }

    fn encode_row(&self, credential: &AccountCredential) -> CoreResult<credential::ActiveModel> {
        let json = serde_json::to_vec(&credential.auth)?;
        let sealed = self.secrets()?.seal(&json)?;
        Ok(credential::ActiveModel {
            name: Set(credential.name.clone()),
            salt: Set(sealed.salt),
            nonce: Set(sealed.nonce),
            ciphertext: Set(sealed.ciphertext),
            account_id: Set(credential.account_id.clone()),
            email: Set(credential.email.clone()),
            is_current: Set(credential.is_current),
        })
    }

    fn decode_row(&self, model: credential::Model) -> CoreResult<AccountCredential> {
        let plaintext = self.secrets()?.open(&SealedSecret {
            salt: model.salt,
            nonce: model.nonce,
            ciphertext: model.ciphertext,
        })?;
        let auth: AuthMaterial = serde_json::from_slice(&plaintext).map_err(|e| {
            CoreError::SerializationError(format!(
                "Invalid auth material for '{}': {e}",
                model.name
            ))
        })?;
        Ok(AccountCredential {
            name: model.name,
            auth,
            account_id: model.account_id,
            email: model.email,
            is_current: model.is_current,
        })
    }
}

#[async_trait]
impl CredentialStore for SqliteStore {
    async fn put(&self, credential: &AccountCredential, overwrite: bool) -> CoreResult<()> {
        let active_model = self.encode_row(credential)?;
        let txn = self.db.begin().await.map_err(storage_err("begin transaction"))?;

        let existing = credential::Entity::find_by_id(credential.name.as_str())
            .one(&txn)
            .await
            .map_err(storage_err("query credential"))?;
        if existing.is_some() && !overwrite {
            return Err(CoreError::DuplicateName(credential.name.clone()));
        }

        credential::Entity::insert(active_model)
            .on_conflict(
                OnConflict::column(credential::Column::Name)
                    .update_columns([
                        credential::Column::Salt,
                        credential::Column::Nonce,
                        credential::Column::Ciphertext,
                        credential::Column::AccountId,
                        credential::Column::Email,
                        credential::Column::IsCurrent,
                    ])
                    .to_owned(),
            )
            .exec(&txn)
            .await
            .map_err(storage_err("save credential"))?;

        txn.commit().await.map_err(storage_err("commit credential"))?;
        log::debug!("Stored credential '{}'", credential.name);
        Ok(())
    }

    async fn get(&self, name: &str) -> CoreResult<AccountCredential> {
        // Fail before touching the database when no password is configured.
        self.secrets()?;
        let row = credential::Entity::find_by_id(name)
            .one(&self.db)
            .await
            .map_err(storage_err("query credential"))?
            .ok_or_else(|| CoreError::NotFound(format!("account '{name}'")))?;
        self.decode_row(row)
    }

    async fn remove(&self, name: &str) -> CoreResult<()> {
        self.secrets()?;
        let result = credential::Entity::delete_by_id(name)
            .exec(&self.db)
            .await
            .map_err(storage_err("delete credential"))?;
        if result.rows_affected == 0 {
            return Err(CoreError::NotFound(format!("account '{name}'")));
        }
        log::debug!("Deleted credential '{name}'");
        Ok(())
    }

    async fn list(&self) -> CoreResult<Vec<AccountCredential>> {
        self.secrets()?;
        let rows = credential::Entity::find()
            .all(&self.db)
            .await
            .map_err(storage_err("query credentials"))?;
        rows.into_iter().map(|row| self.decode_row(row)).collect()
    }

    async fn is_empty(&self) -> CoreResult<bool> {
        self.secrets()?;
        let rows = credential::Entity::find()
            .count(&self.db)
            .await
            .map_err(storage_err("count credentials"))?;
        Ok(rows == 0)
    }

    async fn set_current(&self, name: Option<&str>) -> CoreResult<()> {
        self.secrets()?;
        let txn = self.db.begin().await.map_err(storage_err("begin transaction"))?;

        if let Some(name) = name {
            let exists = credential::Entity::find_by_id(name)
                .one(&txn)
                .await
                .map_err(storage_err("query credential"))?
                .is_some();
            if !exists {
                return Err(CoreError::NotFound(format!("account '{name}'")));
            }
        }

        credential::Entity::update_many()
            .col_expr(credential::Column::IsCurrent, Expr::value(false))
            .exec(&txn)
            .await
            .map_err(storage_err("clear current flag"))?;

        if let Some(name) = name {
            credential::Entity::update_many()
                .col_expr(credential::Column::IsCurrent, Expr::value(true))
                .filter(credential::Column::Name.eq(name))
                .exec(&txn)
                .await
                .map_err(storage_err("set current flag"))?;
        }

        txn.commit().await.map_err(storage_err("commit current flag"))?;
        Ok(())
    }
}
