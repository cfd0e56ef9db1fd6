//! Type definition module

mod account;
mod pages;
mod record;
mod resource;

pub use account::{validate_account_name, AccountCredential, CreateAccountRequest};
pub use pages::{
    Asset, Deployment, DeploymentFailure, DeploymentStatus, PagesProject, WORKER_SCRIPT_NAME,
};
pub use record::ResourceRecord;
pub use resource::{Operation, RequestParams, ResourceKind};

// Re-export provider library public types
pub use cf_console_provider::{ApiMessage, AuthMaterial, FormPart, RequestBody};
