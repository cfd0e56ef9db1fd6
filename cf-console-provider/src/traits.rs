use async_trait::async_trait;

use crate::error::Result;
use crate::types::{UpstreamReply, UpstreamRequest};

/// A remote resource-management API.
///
/// Implementations send exactly one request per call: retry decisions belong
/// to the caller, which knows whether the route is safe to repeat.
///
/// Platform implementations:
/// - [`CloudflareClient`](crate::CloudflareClient) (reqwest)
/// - test doubles in `cf-console-core::test_utils`
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Identifier used in log lines.
    fn name(&self) -> &'static str;

    /// Send one authenticated request and classify the reply.
    async fn send(&self, request: &UpstreamRequest) -> Result<UpstreamReply>;
}
