//! SQLite-backed credential store using `SeaORM`.
//!
//! Auth material is encrypted with AES-256-GCM using a password provided at
//! construction; names, account ids, labels and the current flag stay in clear.

mod credential_store;
pub(crate) mod entity;
mod migration;

use std::path::Path;

use cf_console_core::crypto::SecretBox;
use cf_console_core::error::{CoreError, CoreResult};
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use migration::Migrator;

/// SQLite-based credential store.
///
/// If `encryption_password` is `None`, every `CredentialStore` method returns
/// `StorageError`.
pub struct SqliteStore {
    /// Shared `SeaORM` database connection.
    pub(crate) db: DatabaseConnection,
    pub(crate) secrets: Option<SecretBox>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path` and run migrations.
    ///
    /// # Errors
    /// Returns `CoreError::StorageError` if directory creation, database
    /// connection, or schema migration fails.
    pub async fn new(db_path: &Path, encryption_password: Option<String>) -> CoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CoreError::StorageError(format!("Failed to create directory: {e}")))?;
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let db = Database::connect(&db_url)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to connect to SQLite: {e}")))?;

        Migrator::up(&db, None)
            .await
            .map_err(|e| CoreError::StorageError(format!("Failed to run migrations: {e}")))?;

        log::debug!("Opened credential store at {}", db_path.display());
        Ok(Self {
            db,
            secrets: encryption_password.map(SecretBox::new),
        })
    }

    /// Override the PBKDF2 work factor. Rows written under one factor only decrypt under the same one.
    #[must_use]
    pub fn with_kdf_iterations(mut self, iterations: u32) -> Self {
        self.secrets = self.secrets.map(|s| s.with_iterations(iterations));
        self
    }
}
