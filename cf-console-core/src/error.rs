//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

// Re-export library error type
pub use cf_console_provider::{ApiMessage, UpstreamError};

/// Core layer error type
///
/// Local failures carry codes below 100 (see [`CoreError::code`]); upstream
/// rejections keep the upstream code, which is always 100 or above.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// An account with this name is already stored
    #[error("Account already exists: {0}")]
    DuplicateName(String),

    /// Account, deployment, or other named entity is unknown
    #[error("Not found: {0}")]
    NotFound(String),

    /// An account-scoped operation was requested with no current account
    #[error("No current account selected")]
    NoCurrentAccount,

    /// Malformed input, rejected before any network traffic
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The upstream answered and declined the request
    #[error("Upstream rejected request ({code}): {message}")]
    UpstreamRejected {
        code: i64,
        message: String,
        errors: Vec<ApiMessage>,
    },

    /// Transport failure or timeout talking to the upstream
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// A deployment is already in flight for the project
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A local wait exceeded its limit
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    StorageError(String),

    /// serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl CoreError {
    /// Whether it is expected behavior (user input, unknown names, upstream refusal),
    /// used for log classification.
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method simultaneously when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::DuplicateName(_)
                | Self::NotFound(_)
                | Self::NoCurrentAccount
                | Self::ValidationError(_)
                | Self::UpstreamRejected { .. }
                | Self::Conflict(_)
        )
    }

    /// Stable numeric code, used in [`ResourceRecord`](crate::types::ResourceRecord) error lists.
    #[must_use]
    pub fn code(&self) -> i64 {
        match self {
            Self::DuplicateName(_) => 1,
            Self::NotFound(_) => 2,
            Self::NoCurrentAccount => 3,
            Self::ValidationError(_) => 4,
            Self::UpstreamUnreachable(_) => 5,
            Self::Conflict(_) => 6,
            Self::Timeout(_) => 7,
            Self::StorageError(_) => 8,
            Self::SerializationError(_) => 9,
            Self::UpstreamRejected { code, .. } => *code,
        }
    }

    /// Error list as it appears in a failed `ResourceRecord`.
    #[must_use]
    pub fn to_messages(&self) -> Vec<ApiMessage> {
        match self {
            Self::UpstreamRejected { errors, .. } if !errors.is_empty() => errors.clone(),
            Self::UpstreamRejected { code, message, .. } => vec![ApiMessage::new(*code, message)],
            other => vec![ApiMessage::new(other.code(), other.to_string())],
        }
    }
}

impl From<UpstreamError> for CoreError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unreachable { detail } => Self::UpstreamUnreachable(detail),
            UpstreamError::Timeout { detail } => {
                Self::UpstreamUnreachable(format!("timed out: {detail}"))
            }
            UpstreamError::Rejected {
                code,
                message,
                errors,
                ..
            } => Self::UpstreamRejected {
                code,
                message,
                errors,
            },
            UpstreamError::InvalidRequest { detail } => Self::ValidationError(detail),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
