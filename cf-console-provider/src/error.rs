use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ApiMessage;

/// Cloudflare error codes that mean the credential itself was refused.
///
/// 6003: Invalid request headers
/// 6103: Invalid format for X-Auth-Key header
/// 6111: Invalid format for Authorization header
/// 9103: Unknown X-Auth-Key or X-Auth-Email
/// 9109: Unauthorized to access requested resource
/// 10000: Authentication error
const AUTH_ERROR_CODES: [i64; 6] = [6003, 6103, 6111, 9103, 9109, 10000];

/// Failure of a single upstream exchange.
///
/// # Transport vs. rejection
///
/// [`Unreachable`](Self::Unreachable) and [`Timeout`](Self::Timeout) mean the
/// request may never have been processed. [`Rejected`](Self::Rejected) means the
/// upstream answered and declined; it must not be retried.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum UpstreamError {
    /// Connection refused, reset, DNS failure, or a gateway error without an envelope.
    #[error("upstream unreachable: {detail}")]
    Unreachable { detail: String },

    /// The request did not complete within the client timeout.
    #[error("upstream timed out: {detail}")]
    Timeout { detail: String },

    /// The upstream answered with an error envelope or an error status.
    #[error("upstream rejected request (HTTP {status}, code {code}): {message}")]
    Rejected {
        /// HTTP status of the reply.
        status: u16,
        /// First upstream error code, or the HTTP status when none was given.
        code: i64,
        /// First upstream error message.
        message: String,
        /// Every error the upstream reported, in order.
        errors: Vec<ApiMessage>,
    },

    /// The request could not be built (bad header value, client construction).
    #[error("invalid request: {detail}")]
    InvalidRequest { detail: String },
}

impl UpstreamError {
    /// Whether the request may never have reached the upstream.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Unreachable { .. } | Self::Timeout { .. })
    }

    /// Whether the upstream refused the credential used for the request.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::Rejected { status, errors, .. } => {
                matches!(status, 401 | 403)
                    || errors.iter().any(|e| AUTH_ERROR_CODES.contains(&e.code))
            }
            _ => false,
        }
    }
}

/// Provider crate result alias
pub type Result<T> = std::result::Result<T, UpstreamError>;
