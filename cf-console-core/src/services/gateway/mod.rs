//! Resource gateway
//!
//! Turns `(kind, operation, params)` into one authenticated upstream call using
//! the current account, and normalizes the reply into a [`ResourceRecord`].

mod retry;
mod routes;

pub use retry::RetryPolicy;
pub use routes::{lookup, operations_for, BodyKind, Route, ROUTES};

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use cf_console_provider::{HttpMethod, RequestBody, Upstream, UpstreamReply, UpstreamRequest};

use crate::config::GatewayConfig;
use crate::error::{CoreError, CoreResult};
use crate::services::AccountRegistry;
use crate::types::{AccountCredential, Operation, RequestParams, ResourceKind, ResourceRecord};

#[derive(Debug, Deserialize)]
struct AccountSummary {
    id: String,
}

/// Resource gateway
pub struct ResourceGateway {
    registry: Arc<AccountRegistry>,
    upstream: Arc<dyn Upstream>,
    retry: RetryPolicy,
}

impl ResourceGateway {
    #[must_use]
    pub fn new(
        registry: Arc<AccountRegistry>,
        upstream: Arc<dyn Upstream>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            registry,
            upstream,
            retry: RetryPolicy::from_config(config),
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<AccountRegistry> {
        &self.registry
    }

    /// Perform one call. Failures are folded into the returned record.
    pub async fn call(
        &self,
        kind: ResourceKind,
        operation: Operation,
        params: RequestParams,
    ) -> ResourceRecord<Value> {
        let result = self.execute(kind, operation, params).await;
        if let Err(e) = &result {
            if e.is_expected() {
                log::warn!("{kind}/{operation} failed: {e}");
            } else {
                log::error!("{kind}/{operation} failed: {e}");
            }
        }
        ResourceRecord::from_result(result)
    }

    /// Perform one call, keeping the typed error.
    pub async fn execute(
        &self,
        kind: ResourceKind,
        operation: Operation,
        params: RequestParams,
    ) -> CoreResult<Option<Value>> {
        // Captured once; a concurrent switch does not affect this call.
        let credential = self.registry.current().await?;
        let route = routes::lookup(kind, operation)?;
        route.check_params(&params.path, &params.body)?;

        let account_id = if route.needs_account() {
            Some(self.resolve_account_id(&credential).await?)
        } else {
            None
        };

        let path = route.render(&params.path, account_id.as_deref())?;
        let body = Self::prepare_body(&route, params.body, account_id.as_deref())?;
        let request = UpstreamRequest::new(route.method, path, credential.auth)
            .with_query(params.query)
            .with_body(body);

        log::debug!(
            "[{}] {kind}/{operation} as '{}' -> {} {}",
            self.upstream.name(),
            credential.name,
            request.method,
            request.path
        );

        let reply = self.send(&request, route.mutating).await?;
        match reply.result {
            Some(value) => Ok(Some(value)),
            None if route.expects_result => Err(CoreError::UpstreamRejected {
                code: i64::from(reply.status),
                message: format!("{kind}/{operation} reply carried no result"),
                errors: Vec::new(),
            }),
            None => Ok(None),
        }
    }

    fn prepare_body(
        route: &Route,
        body: RequestBody,
        account_id: Option<&str>,
    ) -> CoreResult<RequestBody> {
        let body = match (route.body, body) {
            (BodyKind::JsonOr(default), RequestBody::Empty) => {
                RequestBody::Json(serde_json::from_str(default)?)
            }
            (_, body) => body,
        };

        match (route.inject_account, body, account_id) {
            (true, RequestBody::Json(mut value), Some(id)) => {
                let Some(object) = value.as_object_mut() else {
                    return Err(CoreError::ValidationError(format!(
                        "{} {} expects a JSON object body",
                        route.method, route.template
                    )));
                };
                object
                    .entry("account")
                    .or_insert_with(|| json!({ "id": id }));
                Ok(RequestBody::Json(value))
            }
            (_, body, _) => Ok(body),
        }
    }

    /// Upstream account id of `credential`, resolving and recording it on first use.
    async fn resolve_account_id(&self, credential: &AccountCredential) -> CoreResult<String> {
        if let Some(id) = credential.account_id.as_ref().filter(|id| !id.is_empty()) {
            return Ok(id.clone());
        }

        log::debug!("Resolving account id for '{}'", credential.name);
        let request = UpstreamRequest::new(HttpMethod::Get, "/accounts", credential.auth.clone());
        let reply = self.send(&request, false).await?;

        let accounts: Vec<AccountSummary> =
            serde_json::from_value(reply.result.unwrap_or(Value::Array(Vec::new())))?;
        let Some(first) = accounts.into_iter().next() else {
            return Err(CoreError::UpstreamRejected {
                code: 0,
                message: "no accounts visible to this credential".to_string(),
                errors: Vec::new(),
            });
        };

        if let Err(e) = self
            .registry
            .record_account_id(&credential.name, &first.id)
            .await
        {
            // The call proceeds with the captured credential even if it was removed meanwhile.
            log::warn!(
                "Could not record account id for '{}': {e}",
                credential.name
            );
        }
        Ok(first.id)
    }

    async fn send(&self, request: &UpstreamRequest, mutating: bool) -> CoreResult<UpstreamReply> {
        let mut attempt = 0;
        loop {
            match self.upstream.send(request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if self.retry.should_retry(&e, attempt, mutating) => {
                    let delay = self.retry.delay(attempt);
                    log::warn!(
                        "[{}] {} {} failed (attempt {}/{}), retrying in {:.1}s: {e}",
                        self.upstream.name(),
                        request.method,
                        request.path,
                        attempt + 1,
                        self.retry.max_attempts(),
                        delay.as_secs_f32()
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_auth_failure() {
                        log::warn!(
                            "[{}] credential refused for {} {}: {e}",
                            self.upstream.name(),
                            request.method,
                            request.path
                        );
                    }
                    return Err(e.into());
                }
            }
        }
    }
}
