//! Test helpers: scripted upstream and factories
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;

use cf_console_provider::{
    ApiMessage, AuthMaterial, Result as UpstreamResult, Upstream, UpstreamError, UpstreamReply,
    UpstreamRequest,
};

use crate::config::{DeployConfig, GatewayConfig};
use crate::services::{AccountRegistry, DeploymentOrchestrator, ResourceGateway};
use crate::traits::InMemoryCredentialStore;
use crate::types::CreateAccountRequest;

#[derive(Default)]
struct MockState {
    replies: VecDeque<UpstreamResult<UpstreamReply>>,
    fallback: Option<UpstreamResult<UpstreamReply>>,
    requests: Vec<UpstreamRequest>,
}

/// Upstream that answers from a script and records every request.
///
/// Replies are consumed in order; once the script is empty the fallback is
/// repeated, or `Unreachable` is returned when none is set.
#[derive(Clone, Default)]
pub struct MockUpstream {
    state: Arc<Mutex<MockState>>,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_ok(&self, result: Value) {
        self.push(Ok(UpstreamReply::ok(Some(result))));
    }

    pub fn push_ok_empty(&self) {
        self.push(Ok(UpstreamReply::ok(None)));
    }

    pub fn push_err(&self, error: UpstreamError) {
        self.push(Err(error));
    }

    fn push(&self, reply: UpstreamResult<UpstreamReply>) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    /// Reply used for every request after the script runs out
    pub fn set_fallback_ok(&self, result: Value) {
        self.state.lock().unwrap().fallback = Some(Ok(UpstreamReply::ok(Some(result))));
    }

    pub fn set_fallback_err(&self, error: UpstreamError) {
        self.state.lock().unwrap().fallback = Some(Err(error));
    }

    pub fn requests(&self) -> Vec<UpstreamRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn send(&self, request: &UpstreamRequest) -> UpstreamResult<UpstreamReply> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());
        if let Some(reply) = state.replies.pop_front() {
            return reply;
        }
        state.fallback.clone().unwrap_or_else(|| {
            Err(UpstreamError::Unreachable {
                detail: "no scripted reply".to_string(),
            })
        })
    }
}

pub fn token_auth(name: &str) -> AuthMaterial {
    AuthMaterial::ApiToken {
        api_token: format!("token-{name}"),
    }
}

pub fn create_request(name: &str) -> CreateAccountRequest {
    CreateAccountRequest::new(name, token_auth(name))
}

pub fn rejected(code: i64, message: &str) -> UpstreamError {
    UpstreamError::Rejected {
        status: 400,
        code,
        message: message.to_string(),
        errors: vec![ApiMessage::new(code, message)],
    }
}

pub fn unreachable() -> UpstreamError {
    UpstreamError::Unreachable {
        detail: "connection refused".to_string(),
    }
}

pub async fn registry_with_store() -> (AccountRegistry, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new());
    let registry = AccountRegistry::load(store.clone()).await.unwrap();
    (registry, store)
}

pub async fn gateway_with(
    mock: &MockUpstream,
    config: GatewayConfig,
) -> (Arc<ResourceGateway>, Arc<AccountRegistry>) {
    let (registry, _) = registry_with_store().await;
    let registry = Arc::new(registry);
    let gateway = ResourceGateway::new(registry.clone(), Arc::new(mock.clone()), &config);
    (Arc::new(gateway), registry)
}

/// Orchestrator over a registry whose only account `a1` has a resolved account id
pub async fn orchestrator_with(
    mock: &MockUpstream,
    config: DeployConfig,
) -> (DeploymentOrchestrator, Arc<AccountRegistry>) {
    let (gateway, registry) = gateway_with(mock, GatewayConfig::default()).await;
    let mut request = create_request("a1");
    request.account_id = Some("acc-1".to_string());
    registry.add_account(request).await.unwrap();
    let orchestrator = DeploymentOrchestrator::new(gateway, config).unwrap();
    (orchestrator, registry)
}
