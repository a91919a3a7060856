//! Domain models for the APIM gateway helper.

use serde::Serialize;

use crate::secret::SecretValue;

/// ARM resource type of an API Management service.
pub const APIM_RESOURCE_TYPE: &str = "Microsoft.ApiManagement/service";

/// Addresses one APIM service inside a subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceScope {
    pub subscription_id: String,
    pub resource_group: String,
    pub service_name: String,
}

impl ServiceScope {
    #[must_use]
    pub fn new(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: resource_group.into(),
            service_name: service_name.into(),
        }
    }

    /// ARM resource path of the service, without host or query.
    #[must_use]
    pub fn service_path(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/{APIM_RESOURCE_TYPE}/{}",
            self.subscription_id, self.resource_group, self.service_name
        )
    }
}

/// The signed-in principal and its active subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountIdentity {
    /// Principal name (user or service principal).
    pub user_name: String,
    pub tenant_id: String,
    pub subscription_id: String,
}

/// Identity of an initialized session. Immutable once resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub resource_group: String,
    /// Either supplied by the caller or discovered in the resource group.
    pub service_name: String,
    pub account: AccountIdentity,
}

impl SessionIdentity {
    #[must_use]
    pub fn scope(&self) -> ServiceScope {
        ServiceScope::new(
            self.account.subscription_id.clone(),
            self.resource_group.clone(),
            self.service_name.clone(),
        )
    }
}

/// Generic ARM resource returned by a resource-group listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResource {
    pub id: String,
    pub name: String,
    pub resource_type: String,
}

/// The APIM service itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescriptor {
    /// Full ARM resource id.
    pub id: String,
    pub name: String,
    /// Public gateway base URL, e.g. `https://apim-ai.azure-api.net`.
    pub gateway_url: String,
}

/// A subscription as returned by the listing call (no secrets).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionContract {
    pub id: String,
    pub name: String,
    pub display_name: Option<String>,
    pub state: Option<String>,
}

/// Keys of one subscription.
#[derive(Debug, Clone)]
pub struct SubscriptionSecrets {
    pub primary_key: SecretValue,
    pub secondary_key: Option<SecretValue>,
}

/// Harvested (subscription name, primary key) pair.
#[derive(Debug, Clone)]
pub struct SubscriptionKey {
    pub name: String,
    pub primary_key: SecretValue,
}

/// An API as returned by the listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiContract {
    /// Full ARM resource id.
    pub id: String,
    /// API identifier inside the service.
    pub name: String,
    /// URL suffix the gateway exposes the API under.
    pub path: String,
    pub display_name: Option<String>,
}

/// The API resolved by `discover_api`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDescriptor {
    pub id: String,
    pub name: String,
    pub path: String,
    /// Gateway URL joined with the matched path minus the filter.
    pub endpoint: String,
}

/// A reusable policy fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyFragment {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Policy body in the format the service returned it.
    pub value: Option<String>,
}

/// Body of the managed gateway `listDebugCredentials` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugCredentialsRequest {
    /// Expiry in the format the gateway accepts (ISO-8601 duration, e.g. `PT1H`).
    pub credentials_expire_after: String,
    /// Full resource id of the API to trace.
    pub api_id: String,
    pub purposes: Vec<String>,
}

impl DebugCredentialsRequest {
    /// Request tracing credentials for one API.
    #[must_use]
    pub fn tracing(expire_after: impl Into<String>, api_id: impl Into<String>) -> Self {
        Self {
            credentials_expire_after: expire_after.into(),
            api_id: api_id.into(),
            purposes: vec!["tracing".to_owned()],
        }
    }
}

/// Short-lived token authorizing request tracing.
#[derive(Debug, Clone)]
pub struct DebugCredential {
    pub token: SecretValue,
    pub expire_after: String,
}

/// Processing record of one gateway request.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceRecord {
    pub trace_id: String,
    /// Raw response structure as returned by the gateway.
    pub payload: serde_json::Value,
}

/// Bearer token for the management endpoint.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: SecretValue,
}
