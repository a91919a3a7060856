//! Gateway session.
//!
//! Holds the resolved identity of one APIM service and answers queries
//! against it. State is written by `initialize` and `discover_api` only and
//! read by everything else.

use std::sync::Arc;

use apim_gateway_sdk::{
    AccountProvider, ApiDescriptor, ApimError, DebugCredential, DebugCredentialsRequest,
    ManagementPlane, ModelExtractor, QueryOutcome, SecretValue, ServiceDescriptor, ServiceScope,
    SessionIdentity, SubscriptionKey, TraceRecord,
};
use tracing::{info, instrument, warn};

use super::extractor::RegexModelExtractor;
use crate::infra::dto;

/// Path filter used by `discover_api` when the caller has no preference.
pub const DEFAULT_API_PATH_FILTER: &str = "/openai";

/// Fragment read by `get_policy_fragment_supported_models` by default.
pub const DEFAULT_POLICY_FRAGMENT: &str = "set-backend-pools";

const SEPARATOR_WIDTH: usize = 80;

/// Which service a session talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTarget {
    pub resource_group: String,
    /// `None` means "take the first APIM service in the resource group".
    pub service_name: Option<String>,
}

impl SessionTarget {
    /// A blank service name is treated as absent.
    #[must_use]
    pub fn new(resource_group: impl Into<String>, service_name: Option<String>) -> Self {
        Self {
            resource_group: resource_group.into(),
            service_name: service_name.filter(|name| !name.trim().is_empty()),
        }
    }
}

/// Session over one APIM service.
pub struct GatewaySession {
    target: SessionTarget,
    account: Arc<dyn AccountProvider>,
    plane: Arc<dyn ManagementPlane>,
    extractor: Arc<dyn ModelExtractor>,
    identity: Option<SessionIdentity>,
    service: Option<ServiceDescriptor>,
    subscription_keys: Vec<SubscriptionKey>,
    api: Option<ApiDescriptor>,
}

impl GatewaySession {
    /// Create an uninitialized session using the regex model extractor.
    #[must_use]
    pub fn new(
        target: SessionTarget,
        account: Arc<dyn AccountProvider>,
        plane: Arc<dyn ManagementPlane>,
    ) -> Self {
        Self {
            target,
            account,
            plane,
            extractor: Arc::new(RegexModelExtractor),
            identity: None,
            service: None,
            subscription_keys: Vec::new(),
            api: None,
        }
    }

    /// Replace the supported-model extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ModelExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    #[must_use]
    pub fn target(&self) -> &SessionTarget {
        &self.target
    }

    #[must_use]
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn service(&self) -> Option<&ServiceDescriptor> {
        self.service.as_ref()
    }

    /// Keys harvested at initialization, in subscription listing order.
    #[must_use]
    pub fn subscription_keys(&self) -> &[SubscriptionKey] {
        &self.subscription_keys
    }

    #[must_use]
    pub fn api(&self) -> Option<&ApiDescriptor> {
        self.api.as_ref()
    }

    /// Public endpoint of the discovered API.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.api.as_ref().map(|api| api.endpoint.as_str())
    }

    /// Resolve the account, locate the service and harvest subscription keys.
    ///
    /// Nothing is stored unless every step succeeds.
    ///
    /// # Errors
    ///
    /// - [`ApimError::AlreadyInitialized`] on a second call
    /// - [`ApimError::AccountUnavailable`] if the account cannot be resolved
    /// - [`ApimError::ServiceNotFound`] if no service exists in the resource group
    /// - any management-plane error, unchanged
    #[instrument(skip(self), fields(resource_group = %self.target.resource_group))]
    pub async fn initialize(&mut self) -> Result<(), ApimError> {
        if self.identity.is_some() {
            return Err(ApimError::AlreadyInitialized);
        }

        let account = self.account.current_account().await?;
        info!(user = %account.user_name, "Current user");
        info!(tenant_id = %account.tenant_id, "Tenant ID");
        info!(subscription_id = %account.subscription_id, "Subscription ID");

        let service_name = match &self.target.service_name {
            Some(name) => name.clone(),
            None => self.discover_service_name(&account.subscription_id).await?,
        };

        let identity = SessionIdentity {
            resource_group: self.target.resource_group.clone(),
            service_name,
            account,
        };
        let scope = identity.scope();

        let service = self.plane.get_service(&scope).await?;
        info!(service_id = %service.id, "APIM Service Id");
        info!(gateway_url = %service.gateway_url, "APIM Gateway URL");

        let keys = self.harvest_subscription_keys(&scope).await?;

        self.identity = Some(identity);
        self.service = Some(service);
        self.subscription_keys = keys;
        Ok(())
    }

    async fn discover_service_name(&self, subscription_id: &str) -> Result<String, ApimError> {
        let resources = self
            .plane
            .list_service_resources(subscription_id, &self.target.resource_group)
            .await?;

        let first = resources
            .into_iter()
            .next()
            .ok_or_else(|| ApimError::ServiceNotFound {
                resource_group: self.target.resource_group.clone(),
            })?;
        info!(service_name = %first.name, "Discovered APIM resource");
        Ok(first.name)
    }

    async fn harvest_subscription_keys(
        &self,
        scope: &ServiceScope,
    ) -> Result<Vec<SubscriptionKey>, ApimError> {
        let subscriptions = self.plane.list_subscriptions(scope).await?;

        let mut keys = Vec::with_capacity(subscriptions.len());
        for subscription in subscriptions {
            let secrets = self
                .plane
                .list_subscription_secrets(scope, &subscription.name)
                .await?;
            info!(
                index = keys.len(),
                subscription = %subscription.name,
                "Retrieved key for subscription"
            );
            keys.push(SubscriptionKey {
                name: subscription.name,
                primary_key: secrets.primary_key,
            });
        }
        Ok(keys)
    }

    /// Resolve the first API whose path contains `path_filter`.
    ///
    /// The service descriptor is fetched again rather than taken from
    /// initialization, and the endpoint is built from that fresh gateway URL.
    /// A successful call replaces any previously discovered API.
    #[instrument(skip(self))]
    pub async fn discover_api(&mut self, path_filter: &str) -> QueryOutcome<ApiDescriptor> {
        let scope = match self.scope() {
            Ok(scope) => scope,
            Err(e) => return QueryOutcome::Failed(e),
        };

        let service = match self.plane.get_service(&scope).await {
            Ok(service) => service,
            Err(e) => return QueryOutcome::Failed(e),
        };
        let apis = match self.plane.list_apis(&scope).await {
            Ok(apis) => apis,
            Err(e) => return QueryOutcome::Failed(e),
        };

        let Some(api) = apis.into_iter().find(|api| api.path.contains(path_filter)) else {
            return QueryOutcome::NotFound(format!("API with path filter `{path_filter}`"));
        };
        info!(api_id = %api.id, path = %api.path, "Found API");

        let endpoint = public_endpoint(&service.gateway_url, &api.path, path_filter);
        info!(endpoint = %endpoint, "Azure endpoint with APIM");

        let descriptor = ApiDescriptor {
            id: api.id,
            name: api.name,
            path: api.path,
            endpoint,
        };
        self.api = Some(descriptor.clone());
        QueryOutcome::Found(descriptor)
    }

    /// Issue short-lived tracing credentials for the discovered API.
    ///
    /// A failed call yields [`QueryOutcome::Failed`], a successful call
    /// without a token yields [`QueryOutcome::NotFound`].
    #[instrument(skip(self))]
    pub async fn get_debug_credentials(&self, expire_after: &str) -> QueryOutcome<DebugCredential> {
        let Some(service) = &self.service else {
            return QueryOutcome::Failed(ApimError::NotInitialized);
        };
        let Some(api) = &self.api else {
            return QueryOutcome::Failed(ApimError::ApiNotDiscovered);
        };

        let request =
            DebugCredentialsRequest::tracing(expire_after, format!("{}/apis/{}", service.id, api.name));

        match self.plane.list_debug_credentials(&service.id, &request).await {
            Ok(Some(token)) => {
                info!("Retrieved APIM debug credentials");
                QueryOutcome::Found(DebugCredential {
                    token: SecretValue::new(token),
                    expire_after: expire_after.to_owned(),
                })
            }
            Ok(None) => {
                warn!("APIM debug credentials response carried no token");
                QueryOutcome::NotFound(format!("debug credentials for API `{}`", api.name))
            }
            Err(e) => {
                warn!(error = %e, "Failed to get the APIM debug credentials");
                QueryOutcome::Failed(e)
            }
        }
    }

    /// Fetch the trace recorded under `trace_id`.
    #[instrument(skip(self))]
    pub async fn get_trace(&self, trace_id: &str) -> QueryOutcome<TraceRecord> {
        let Some(service) = &self.service else {
            return QueryOutcome::Failed(ApimError::NotInitialized);
        };

        match self.plane.list_trace(&service.id, trace_id).await {
            Ok(Some(payload)) if !dto::is_blank(&payload) => {
                info!("Retrieved trace details");
                QueryOutcome::Found(TraceRecord {
                    trace_id: trace_id.to_owned(),
                    payload,
                })
            }
            Ok(_) => QueryOutcome::NotFound(format!("trace `{trace_id}`")),
            Err(e) => {
                warn!(error = %e, "Failed to get the trace details");
                QueryOutcome::Failed(e)
            }
        }
    }

    /// Read a policy fragment and scrape its supported model names.
    ///
    /// With `debug` set the raw body is logged between separator lines
    /// before extraction. A missing fragment yields
    /// [`QueryOutcome::NotFound`]; every other failure is wrapped in
    /// [`ApimError::PolicyFragment`].
    #[instrument(skip(self, debug))]
    pub async fn get_policy_fragment_supported_models(
        &self,
        fragment_name: &str,
        debug: bool,
    ) -> QueryOutcome<Vec<String>> {
        let scope = match self.scope() {
            Ok(scope) => scope,
            Err(e) => return QueryOutcome::Failed(ApimError::policy_fragment(fragment_name, e)),
        };

        let fragment = match self.plane.get_policy_fragment(&scope, fragment_name).await {
            Ok(fragment) => fragment,
            Err(e) if e.is_not_found() => {
                return QueryOutcome::NotFound(format!("policy fragment `{fragment_name}`"));
            }
            Err(e) => return QueryOutcome::Failed(ApimError::policy_fragment(fragment_name, e)),
        };

        let Some(body) = fragment.value else {
            return QueryOutcome::Failed(ApimError::policy_fragment(
                fragment_name,
                ApimError::InvalidResponse("policy fragment has no body".to_owned()),
            ));
        };
        info!(fragment = %fragment_name, "Retrieved policy fragment");

        if debug {
            let rule = "=".repeat(SEPARATOR_WIDTH);
            info!("{rule}");
            info!("RAW POLICY XML:");
            info!("{rule}");
            info!("{body}");
            info!("{rule}");
        }

        let models = self.extractor.extract(&body);
        info!(count = models.len(), "Found unique supported models");
        QueryOutcome::Found(models)
    }

    fn scope(&self) -> Result<ServiceScope, ApimError> {
        self.identity
            .as_ref()
            .map(SessionIdentity::scope)
            .ok_or(ApimError::NotInitialized)
    }
}

/// Join the gateway URL with the API path after removing `path_filter`.
#[must_use]
pub fn public_endpoint(gateway_url: &str, api_path: &str, path_filter: &str) -> String {
    let remainder = if path_filter.is_empty() {
        api_path.to_owned()
    } else {
        api_path.replace(path_filter, "")
    };
    format!(
        "{}/{}",
        gateway_url.trim_end_matches('/'),
        remainder.trim_start_matches('/')
    )
}
