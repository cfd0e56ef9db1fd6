//! Cloudflare v4 API client

mod request;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{Result, UpstreamError};
use crate::http_client::HttpUtils;
use crate::traits::Upstream;
use crate::types::{UpstreamReply, UpstreamRequest};

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default connect timeout (seconds)
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Default request timeout (seconds)
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Connection settings for [`CloudflareClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_base: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// Cloudflare upstream backed by a shared `reqwest` client.
pub struct CloudflareClient {
    pub(crate) client: Client,
    pub(crate) api_base: String,
}

impl CloudflareClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .user_agent(concat!("cf-console/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| UpstreamError::InvalidRequest {
                detail: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }
}

#[async_trait]
impl Upstream for CloudflareClient {
    fn name(&self) -> &'static str {
        "cloudflare"
    }

    async fn send(&self, request: &UpstreamRequest) -> Result<UpstreamReply> {
        let builder = self.build_request(request)?;
        let (status, body) =
            HttpUtils::execute_request(builder, self.name(), request.method.as_str(), &request.path)
                .await?;
        HttpUtils::classify_reply(status, &body)
    }
}
