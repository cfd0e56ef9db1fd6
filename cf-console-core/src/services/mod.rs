//! Business logic service layer

mod account_registry;
mod deployment_orchestrator;
pub mod gateway;

pub use account_registry::AccountRegistry;
pub use deployment_orchestrator::{validate_project_name, DeploymentOrchestrator};
pub use gateway::ResourceGateway;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::config::GatewayConfig;
    use crate::error::CoreError;
    use crate::test_utils::{create_request, gateway_with, token_auth, MockUpstream};
    use crate::types::{Operation, RequestParams, ResourceKind};

    #[tokio::test]
    async fn switching_accounts_end_to_end() {
        let mock = MockUpstream::new();
        mock.set_fallback_ok(json!([]));
        let (gateway, registry) = gateway_with(&mock, GatewayConfig::default()).await;

        registry.add_account(create_request("a1")).await.unwrap();
        assert_eq!(registry.current().await.unwrap().name, "a1");
        registry.add_account(create_request("a2")).await.unwrap();
        assert_eq!(registry.current().await.unwrap().name, "a1");

        let record = gateway
            .call(ResourceKind::Zone, Operation::List, RequestParams::new())
            .await;
        assert!(record.success);

        registry.switch_to("a2").await.unwrap();
        assert_eq!(registry.current().await.unwrap().name, "a2");
        gateway
            .call(ResourceKind::Zone, Operation::List, RequestParams::new())
            .await;

        let auths: Vec<_> = mock.requests().into_iter().map(|r| r.auth).collect();
        assert_eq!(auths, vec![token_auth("a1"), token_auth("a2")]);

        registry.remove("a2").await.unwrap();
        assert!(matches!(
            registry.current().await,
            Err(CoreError::NoCurrentAccount)
        ));
        let record = gateway
            .call(ResourceKind::Zone, Operation::List, RequestParams::new())
            .await;
        assert!(!record.success);
        assert_eq!(mock.call_count(), 2);
    }
}
