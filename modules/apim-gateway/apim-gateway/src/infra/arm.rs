//! Typed ARM REST transport.

use std::sync::Arc;
use std::time::Duration;

use apim_gateway_sdk::{
    ApiContract, ApimError, CredentialProvider, DebugCredentialsRequest, ManagementPlane,
    PolicyFragment, ServiceDescriptor, ServiceResource, ServiceScope, SubscriptionContract,
    SubscriptionSecrets,
};
use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use super::dto::{
    self, ApiDto, ArmPage, PolicyFragmentDto, ResourceDto, ServiceDto, SubscriptionDto,
    SubscriptionSecretsDto,
};
use super::routes::{ArmRoutes, next_link};

/// [`ManagementPlane`] over `reqwest`, authenticated with a bearer token
/// from the injected [`CredentialProvider`].
pub struct ArmManagementClient {
    http: reqwest::Client,
    routes: ArmRoutes,
    credential: Arc<dyn CredentialProvider>,
}

impl ArmManagementClient {
    /// # Errors
    ///
    /// Returns [`ApimError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        routes: ArmRoutes,
        credential: Arc<dyn CredentialProvider>,
        timeout: Duration,
    ) -> Result<Self, ApimError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApimError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            routes,
            credential,
        })
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
        operation: &str,
    ) -> Result<reqwest::Response, ApimError> {
        let token = self
            .credential
            .access_token(&self.routes.token_resource())
            .await?;

        let mut builder = self
            .http
            .request(method.clone(), url)
            .bearer_auth(token.token.expose());
        builder = match body {
            Some(body) => builder.json(body),
            None if method == Method::POST => builder.body(Vec::new()),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApimError::Transport(format!("{operation}: {}", e.without_url())))?;

        let status = response.status();
        debug!(operation, status = status.as_u16(), "ARM request completed");
        if !status.is_success() {
            return Err(ApimError::http(operation, status.as_u16()));
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, operation: &str) -> Result<T, ApimError> {
        let value = self.send_json(Method::GET, url, None, operation).await?;
        dto::decode(value.unwrap_or(serde_json::Value::Null), operation)
    }

    /// Send a request and parse the body as JSON. An empty body is `None`.
    async fn send_json(
        &self,
        method: Method,
        url: Url,
        body: Option<&serde_json::Value>,
        operation: &str,
    ) -> Result<Option<serde_json::Value>, ApimError> {
        let response = self.send(method, url, body, operation).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ApimError::Transport(format!("{operation}: {}", e.without_url())))?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApimError::InvalidResponse(format!("{operation}: {e}")))
    }

    /// Collect every page of an ARM collection, following `nextLink`.
    async fn list_all<T: DeserializeOwned>(
        &self,
        first: Url,
        operation: &str,
    ) -> Result<Vec<T>, ApimError> {
        let mut items = Vec::new();
        let mut url = first;
        loop {
            let page: ArmPage<T> = self.get_json(url, operation).await?;
            items.extend(page.value);
            match page.next_link {
                Some(link) => url = next_link(&link)?,
                None => return Ok(items),
            }
        }
    }
}

#[async_trait]
impl ManagementPlane for ArmManagementClient {
    #[instrument(skip(self))]
    async fn list_service_resources(
        &self,
        subscription_id: &str,
        resource_group: &str,
    ) -> Result<Vec<ServiceResource>, ApimError> {
        let url = self
            .routes
            .service_resources(subscription_id, resource_group)?;
        let resources: Vec<ResourceDto> = self.list_all(url, "list APIM resources").await?;
        Ok(resources.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_service(&self, scope: &ServiceScope) -> Result<ServiceDescriptor, ApimError> {
        let url = self.routes.service(scope)?;
        let service: ServiceDto = self.get_json(url, "get service").await?;
        service.try_into()
    }

    #[instrument(skip(self))]
    async fn list_subscriptions(
        &self,
        scope: &ServiceScope,
    ) -> Result<Vec<SubscriptionContract>, ApimError> {
        let url = self.routes.subscriptions(scope)?;
        let subscriptions: Vec<SubscriptionDto> = self.list_all(url, "list subscriptions").await?;
        Ok(subscriptions.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn list_subscription_secrets(
        &self,
        scope: &ServiceScope,
        subscription_name: &str,
    ) -> Result<SubscriptionSecrets, ApimError> {
        let url = self.routes.subscription_secrets(scope, subscription_name)?;
        let operation = "list subscription secrets";
        let value = self
            .send_json(Method::POST, url, None, operation)
            .await?
            .unwrap_or(serde_json::Value::Null);
        let secrets: SubscriptionSecretsDto = dto::decode(value, operation)?;
        secrets.into_secrets(subscription_name)
    }

    #[instrument(skip(self))]
    async fn list_apis(&self, scope: &ServiceScope) -> Result<Vec<ApiContract>, ApimError> {
        let url = self.routes.apis(scope)?;
        let apis: Vec<ApiDto> = self.list_all(url, "list APIs").await?;
        Ok(apis.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_policy_fragment(
        &self,
        scope: &ServiceScope,
        fragment_id: &str,
    ) -> Result<PolicyFragment, ApimError> {
        let url = self.routes.policy_fragment(scope, fragment_id)?;
        let fragment: PolicyFragmentDto = self.get_json(url, "get policy fragment").await?;
        Ok(fragment.into())
    }

    #[instrument(skip(self, request))]
    async fn list_debug_credentials(
        &self,
        service_id: &str,
        request: &DebugCredentialsRequest,
    ) -> Result<Option<String>, ApimError> {
        let url = self.routes.debug_credentials(service_id)?;
        let body = serde_json::to_value(request)
            .map_err(|e| ApimError::InvalidResponse(format!("list debug credentials: {e}")))?;
        let value = self
            .send_json(Method::POST, url, Some(&body), "list debug credentials")
            .await?;
        dto::debug_token(value.and_then(dto::present))
    }

    #[instrument(skip(self))]
    async fn list_trace(
        &self,
        service_id: &str,
        trace_id: &str,
    ) -> Result<Option<serde_json::Value>, ApimError> {
        let url = self.routes.trace(service_id)?;
        let body = serde_json::json!({ "traceId": trace_id });
        let value = self
            .send_json(Method::POST, url, Some(&body), "list trace")
            .await?;
        Ok(value.and_then(dto::present))
    }
}
