//! Generic REST transport through `az rest`.

use std::sync::Arc;

use apim_gateway_sdk::{
    APIM_RESOURCE_TYPE, ApiContract, ApimError, DebugCredentialsRequest, ManagementPlane,
    PolicyFragment, ServiceDescriptor, ServiceResource, ServiceScope, SubscriptionContract,
    SubscriptionSecrets,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::cli::{CliOutput, CommandRunner, args, command_line};
use super::dto::{
    self, ApiDto, ArmPage, PolicyFragmentDto, ResourceDto, ServiceDto, SubscriptionDto,
    SubscriptionSecretsDto,
};
use super::routes::{ArmRoutes, next_link};

/// [`ManagementPlane`] that shells out to `az rest` and `az resource list`.
///
/// Authentication is whatever the CLI session holds.
pub struct AzRestManagementClient {
    runner: Arc<dyn CommandRunner>,
    routes: ArmRoutes,
}

impl AzRestManagementClient {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, routes: ArmRoutes) -> Self {
        Self { runner, routes }
    }

    async fn run(&self, argv: &[String]) -> Result<serde_json::Value, ApimError> {
        let rendered = command_line(self.runner.program(), argv);
        let output = self.runner.run(argv).await?;
        if !output.success {
            return Err(failure(&rendered, &output));
        }
        Ok(output.json().unwrap_or(serde_json::Value::Null))
    }

    async fn rest(
        &self,
        method: &str,
        url: &Url,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value, ApimError> {
        let mut argv = args(["rest", "--method", method, "--uri", url.as_str()]);
        argv.extend(args(["--output", "json"]));
        if let Some(body) = body {
            argv.push("--body".to_owned());
            argv.push(body.to_string());
        }
        self.run(&argv).await
    }

    async fn get<T: DeserializeOwned>(&self, url: &Url, operation: &str) -> Result<T, ApimError> {
        let value = self.rest("get", url, None).await?;
        dto::decode(value, operation)
    }

    async fn list_all<T: DeserializeOwned>(
        &self,
        first: Url,
        operation: &str,
    ) -> Result<Vec<T>, ApimError> {
        let mut items = Vec::new();
        let mut url = first;
        loop {
            let page: ArmPage<T> = self.get(&url, operation).await?;
            items.extend(page.value);
            match page.next_link {
                Some(link) => url = next_link(&link)?,
                None => return Ok(items),
            }
        }
    }
}

/// Map a failed invocation to an error, recognising ARM "not found" replies.
fn failure(command: &str, output: &CliOutput) -> ApimError {
    let message = output.error_message();
    if message.contains("NotFound") || message.contains("(404)") {
        ApimError::NotFound(message)
    } else {
        ApimError::cli(command, message)
    }
}

#[async_trait]
impl ManagementPlane for AzRestManagementClient {
    #[instrument(skip(self))]
    async fn list_service_resources(
        &self,
        subscription_id: &str,
        resource_group: &str,
    ) -> Result<Vec<ServiceResource>, ApimError> {
        let value = self
            .run(&args([
                "resource",
                "list",
                "--subscription",
                subscription_id,
                "--resource-group",
                resource_group,
                "--resource-type",
                APIM_RESOURCE_TYPE,
                "--output",
                "json",
            ]))
            .await?;
        let resources: Vec<ResourceDto> = match value {
            serde_json::Value::Null => Vec::new(),
            other => dto::decode(other, "list APIM resources")?,
        };
        Ok(resources.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_service(&self, scope: &ServiceScope) -> Result<ServiceDescriptor, ApimError> {
        let service: ServiceDto = self.get(&self.routes.service(scope)?, "get service").await?;
        service.try_into()
    }

    #[instrument(skip(self))]
    async fn list_subscriptions(
        &self,
        scope: &ServiceScope,
    ) -> Result<Vec<SubscriptionContract>, ApimError> {
        let subscriptions: Vec<SubscriptionDto> = self
            .list_all(self.routes.subscriptions(scope)?, "list subscriptions")
            .await?;
        Ok(subscriptions.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn list_subscription_secrets(
        &self,
        scope: &ServiceScope,
        subscription_name: &str,
    ) -> Result<SubscriptionSecrets, ApimError> {
        let url = self.routes.subscription_secrets(scope, subscription_name)?;
        let value = self.rest("post", &url, None).await?;
        let secrets: SubscriptionSecretsDto = dto::decode(value, "list subscription secrets")?;
        secrets.into_secrets(subscription_name)
    }

    #[instrument(skip(self))]
    async fn list_apis(&self, scope: &ServiceScope) -> Result<Vec<ApiContract>, ApimError> {
        let apis: Vec<ApiDto> = self.list_all(self.routes.apis(scope)?, "list APIs").await?;
        Ok(apis.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_policy_fragment(
        &self,
        scope: &ServiceScope,
        fragment_id: &str,
    ) -> Result<PolicyFragment, ApimError> {
        let url = self.routes.policy_fragment(scope, fragment_id)?;
        let fragment: PolicyFragmentDto = self.get(&url, "get policy fragment").await?;
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
        let value = self.rest("post", &url, Some(&body)).await?;
        dto::debug_token(dto::present(value))
    }

    #[instrument(skip(self))]
    async fn list_trace(
        &self,
        service_id: &str,
        trace_id: &str,
    ) -> Result<Option<serde_json::Value>, ApimError> {
        let url = self.routes.trace(service_id)?;
        let body = serde_json::json!({ "traceId": trace_id });
        let value = self.rest("post", &url, Some(&body)).await?;
        Ok(dto::present(value))
    }
}
