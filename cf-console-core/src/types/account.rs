//! Account-related type definitions

use serde::{Deserialize, Serialize};

use cf_console_provider::AuthMaterial;

use crate::error::{CoreError, CoreResult};

/// Stored credential of one Cloudflare account.
///
/// `name` is the unique key. `account_id` is filled in lazily the first time an
/// account-scoped route is called.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountCredential {
    pub name: String,
    pub auth: AuthMaterial,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    /// Display label, independent of the auth material
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub is_current: bool,
}

impl AccountCredential {
    pub fn new(name: impl Into<String>, auth: AuthMaterial) -> Self {
        Self {
            name: name.into(),
            auth,
            account_id: None,
            email: None,
            is_current: false,
        }
    }

    #[must_use]
    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Request to add an account to the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub name: String,
    pub auth: AuthMaterial,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub account_id: Option<String>,
}

impl CreateAccountRequest {
    pub fn new(name: impl Into<String>, auth: AuthMaterial) -> Self {
        Self {
            name: name.into(),
            auth,
            email: None,
            account_id: None,
        }
    }

    /// Reject names the registry cannot key on and auth material with blank secrets.
    pub fn validate(&self) -> CoreResult<()> {
        validate_account_name(&self.name)?;
        if self.auth.is_incomplete() {
            return Err(CoreError::ValidationError(format!(
                "{} credential for '{}' has an empty field",
                self.auth.kind(),
                self.name
            )));
        }
        if let Some(id) = &self.account_id {
            if id.trim().is_empty() {
                return Err(CoreError::ValidationError(
                    "account id must not be blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub(crate) fn into_credential(self) -> AccountCredential {
        AccountCredential {
            name: self.name,
            auth: self.auth,
            account_id: self.account_id,
            email: self.email,
            is_current: false,
        }
    }
}

/// Account names are non-empty and contain no whitespace.
pub fn validate_account_name(name: &str) -> CoreResult<()> {
    if name.is_empty() {
        return Err(CoreError::ValidationError(
            "account name must not be empty".to_string(),
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(CoreError::ValidationError(format!(
            "account name '{name}' must not contain whitespace"
        )));
    }
    Ok(())
}
