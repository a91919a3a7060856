#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! In-memory fakes for the gateway session's capabilities.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use apim_gateway::{GatewaySession, SessionTarget};
use apim_gateway_sdk::{
    AccountIdentity, AccountProvider, ApiContract, ApimError, DebugCredentialsRequest,
    ManagementPlane, PolicyFragment, SecretValue, ServiceDescriptor, ServiceResource,
    ServiceScope, SubscriptionContract, SubscriptionSecrets,
};
use async_trait::async_trait;

pub const SERVICE_ID: &str =
    "/subscriptions/sub-1/resourceGroups/rg-ai/providers/Microsoft.ApiManagement/service/apim-ai";

pub fn account() -> AccountIdentity {
    AccountIdentity {
        user_name: "dev@example.com".to_owned(),
        tenant_id: "tenant-1".to_owned(),
        subscription_id: "sub-1".to_owned(),
    }
}

pub struct FakeAccount(pub Result<AccountIdentity, String>);

#[async_trait]
impl AccountProvider for FakeAccount {
    async fn current_account(&self) -> Result<AccountIdentity, ApimError> {
        self.0.clone().map_err(ApimError::AccountUnavailable)
    }
}

/// Scripted management plane. Every call is recorded by name.
pub struct FakePlane {
    pub resources: Vec<ServiceResource>,
    pub gateway_urls: Mutex<Vec<String>>,
    pub subscriptions: Vec<(String, String)>,
    /// Subscription whose secret fetch fails with HTTP 500.
    pub failing_secret: Option<String>,
    pub apis: Vec<ApiContract>,
    pub fragments: HashMap<String, Result<Option<String>, u16>>,
    pub debug_token: Result<Option<String>, u16>,
    pub trace: Result<Option<serde_json::Value>, u16>,
    pub calls: Mutex<Vec<String>>,
    pub debug_requests: Mutex<Vec<DebugCredentialsRequest>>,
}

impl Default for FakePlane {
    fn default() -> Self {
        Self {
            resources: vec![ServiceResource {
                id: SERVICE_ID.to_owned(),
                name: "apim-ai".to_owned(),
                resource_type: "Microsoft.ApiManagement/service".to_owned(),
            }],
            gateway_urls: Mutex::new(vec!["https://g.example".to_owned()]),
            subscriptions: vec![
                ("master".to_owned(), "key-master".to_owned()),
                ("team-a".to_owned(), "key-a".to_owned()),
                ("team-b".to_owned(), "key-b".to_owned()),
            ],
            failing_secret: None,
            apis: vec![
                api("v1", "/v1"),
                api("azure-openai", "/openai/deployments"),
            ],
            fragments: HashMap::new(),
            debug_token: Ok(Some("debug-token".to_owned())),
            trace: Ok(Some(serde_json::json!({"traceEntries": {"inbound": []}}))),
            calls: Mutex::new(Vec::new()),
            debug_requests: Mutex::new(Vec::new()),
        }
    }
}

pub fn api(name: &str, path: &str) -> ApiContract {
    ApiContract {
        id: format!("{SERVICE_ID}/apis/{name}"),
        name: name.to_owned(),
        path: path.to_owned(),
        display_name: None,
    }
}

impl FakePlane {
    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_owned());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }
}

#[async_trait]
impl ManagementPlane for FakePlane {
    async fn list_service_resources(
        &self,
        subscription_id: &str,
        resource_group: &str,
    ) -> Result<Vec<ServiceResource>, ApimError> {
        assert_eq!(subscription_id, "sub-1");
        assert_eq!(resource_group, "rg-ai");
        self.record("list_service_resources");
        Ok(self.resources.clone())
    }

    async fn get_service(&self, scope: &ServiceScope) -> Result<ServiceDescriptor, ApimError> {
        self.record("get_service");
        let mut urls = self.gateway_urls.lock().unwrap();
        let gateway_url = if urls.len() > 1 {
            urls.remove(0)
        } else {
            urls[0].clone()
        };
        Ok(ServiceDescriptor {
            id: scope.service_path(),
            name: scope.service_name.clone(),
            gateway_url,
        })
    }

    async fn list_subscriptions(
        &self,
        scope: &ServiceScope,
    ) -> Result<Vec<SubscriptionContract>, ApimError> {
        self.record("list_subscriptions");
        Ok(self
            .subscriptions
            .iter()
            .map(|(name, _)| SubscriptionContract {
                id: format!("{}/subscriptions/{name}", scope.service_path()),
                name: name.clone(),
                display_name: None,
                state: Some("active".to_owned()),
            })
            .collect())
    }

    async fn list_subscription_secrets(
        &self,
        _scope: &ServiceScope,
        subscription_name: &str,
    ) -> Result<SubscriptionSecrets, ApimError> {
        self.record("list_subscription_secrets");
        if self.failing_secret.as_deref() == Some(subscription_name) {
            return Err(ApimError::http("list subscription secrets", 500));
        }
        let (_, key) = self
            .subscriptions
            .iter()
            .find(|(name, _)| name == subscription_name)
            .ok_or_else(|| ApimError::NotFound(subscription_name.to_owned()))?;
        Ok(SubscriptionSecrets {
            primary_key: SecretValue::new(key.clone()),
            secondary_key: None,
        })
    }

    async fn list_apis(&self, _scope: &ServiceScope) -> Result<Vec<ApiContract>, ApimError> {
        self.record("list_apis");
        Ok(self.apis.clone())
    }

    async fn get_policy_fragment(
        &self,
        scope: &ServiceScope,
        fragment_id: &str,
    ) -> Result<PolicyFragment, ApimError> {
        self.record("get_policy_fragment");
        match self.fragments.get(fragment_id) {
            None => Err(ApimError::http("get policy fragment", 404)),
            Some(Err(status)) => Err(ApimError::http("get policy fragment", *status)),
            Some(Ok(value)) => Ok(PolicyFragment {
                id: format!("{}/policyFragments/{fragment_id}", scope.service_path()),
                name: fragment_id.to_owned(),
                description: None,
                value: value.clone(),
            }),
        }
    }

    async fn list_debug_credentials(
        &self,
        service_id: &str,
        request: &DebugCredentialsRequest,
    ) -> Result<Option<String>, ApimError> {
        assert_eq!(service_id, SERVICE_ID);
        self.record("list_debug_credentials");
        self.debug_requests.lock().unwrap().push(request.clone());
        self.debug_token
            .clone()
            .map_err(|status| ApimError::http("list debug credentials", status))
    }

    async fn list_trace(
        &self,
        service_id: &str,
        _trace_id: &str,
    ) -> Result<Option<serde_json::Value>, ApimError> {
        assert_eq!(service_id, SERVICE_ID);
        self.record("list_trace");
        self.trace
            .clone()
            .map_err(|status| ApimError::http("list trace", status))
    }
}

pub fn session(plane: Arc<FakePlane>, service_name: Option<&str>) -> GatewaySession {
    GatewaySession::new(
        SessionTarget::new("rg-ai", service_name.map(ToOwned::to_owned)),
        Arc::new(FakeAccount(Ok(account()))),
        plane,
    )
}

pub async fn initialized(plane: Arc<FakePlane>) -> GatewaySession {
    let mut session = session(plane, None);
    session.initialize().await.unwrap();
    session
}
