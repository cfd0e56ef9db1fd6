//! # cf-console-provider
//!
//! Transport layer for the Cloudflare v4 API.
//!
//! The crate knows how to authenticate a request, send it, and classify the
//! reply. It deliberately knows nothing about *which* resource a path points
//! at: routing lives in `cf-console-core`, which talks to this crate only
//! through the [`Upstream`] trait.
//!
//! ## Authentication
//!
//! | Material | Headers |
//! |----------|---------|
//! | [`AuthMaterial::ApiToken`] | `Authorization: Bearer <token>` |
//! | [`AuthMaterial::GlobalApiKey`] | `X-Auth-Email`, `X-Auth-Key` |
//!
//! ## Reply classification
//!
//! Every reply is reduced to either an [`UpstreamReply`] or an [`UpstreamError`]:
//!
//! - connection failures, timeouts and gateway errors without an envelope
//!   become [`UpstreamError::Unreachable`] / [`UpstreamError::Timeout`];
//! - `success: false` envelopes and other 4xx/5xx replies become
//!   [`UpstreamError::Rejected`], carrying the ordered upstream error list.
//!
//! Non-JSON 2xx bodies (e.g. a KV value) are passed through as a string result.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use cf_console_provider::{
//!     AuthMaterial, ClientConfig, CloudflareClient, HttpMethod, Upstream, UpstreamRequest,
//! };
//!
//! # async fn example() -> Result<(), cf_console_provider::UpstreamError> {
//! let client = CloudflareClient::new(ClientConfig::default())?;
//! let request = UpstreamRequest::new(
//!     HttpMethod::Get,
//!     "/zones",
//!     AuthMaterial::ApiToken { api_token: "token".to_string() },
//! );
//! let reply = client.send(&request).await?;
//! println!("{:?}", reply.result);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

mod cloudflare;
mod error;
mod http_client;
mod traits;
mod types;
mod utils;

pub use cloudflare::{ClientConfig, CloudflareClient, DEFAULT_API_BASE};
pub use error::{Result, UpstreamError};
pub use traits::Upstream;
pub use types::{
    ApiMessage, AuthMaterial, FormPart, HttpMethod, RequestBody, ResultInfo, UpstreamReply,
    UpstreamRequest,
};
pub use utils::log_sanitizer;
