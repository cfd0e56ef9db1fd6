//! `cfc account ...`

use clap::{Args, Subcommand};
use serde::Serialize;

use cf_console_app::AppState;
use cf_console_core::types::{AccountCredential, AuthMaterial, CreateAccountRequest};

use super::emit;

#[derive(Subcommand)]
pub enum AccountCommand {
    /// Store a new account (the first one becomes current)
    Add(AddArgs),
    /// List stored accounts
    List,
    /// Make an account current
    Switch { name: String },
    /// Delete a stored account
    Remove { name: String },
    /// Show the current account
    Current,
}

#[derive(Args)]
pub struct AddArgs {
    /// Unique account name (no whitespace)
    name: String,

    /// Scoped API token
    #[arg(long, conflicts_with = "api_key", required_unless_present = "api_key")]
    api_token: Option<String>,

    /// Login email; required with --api-key, a label with --api-token
    #[arg(long)]
    email: Option<String>,

    /// Global API key
    #[arg(long, requires = "email")]
    api_key: Option<String>,

    /// Upstream account id; resolved on first use when omitted
    #[arg(long)]
    account_id: Option<String>,
}

impl AddArgs {
    fn into_request(self) -> CreateAccountRequest {
        let auth = match (self.api_token, self.api_key) {
            (Some(api_token), _) => AuthMaterial::ApiToken { api_token },
            (None, api_key) => AuthMaterial::GlobalApiKey {
                email: self.email.clone().unwrap_or_default(),
                api_key: api_key.unwrap_or_default(),
            },
        };
        let mut request = CreateAccountRequest::new(self.name, auth);
        request.email = self.email;
        request.account_id = self.account_id;
        request
    }
}

/// Account as printed: secrets never leave the store.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountView {
    name: String,
    auth_kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    is_current: bool,
}

impl From<AccountCredential> for AccountView {
    fn from(credential: AccountCredential) -> Self {
        Self {
            auth_kind: credential.auth.kind(),
            name: credential.name,
            account_id: credential.account_id,
            email: credential.email,
            is_current: credential.is_current,
        }
    }
}

pub async fn run(state: &AppState, command: AccountCommand) -> anyhow::Result<bool> {
    let registry = &state.registry;
    match command {
        AccountCommand::Add(args) => {
            emit(registry.add_account(args.into_request()).await.map(AccountView::from))
        }
        AccountCommand::List => emit(
            registry
                .list()
                .await
                .map(|accounts| accounts.into_iter().map(AccountView::from).collect::<Vec<_>>()),
        ),
        AccountCommand::Switch { name } => {
            emit(registry.switch_to(&name).await.map(AccountView::from))
        }
        AccountCommand::Remove { name } => emit(registry.remove(&name).await),
        AccountCommand::Current => emit(registry.current().await.map(AccountView::from)),
    }
}
