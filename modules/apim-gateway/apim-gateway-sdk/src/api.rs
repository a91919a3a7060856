//! Capability traits consumed by the gateway session.
//!
//! Each trait hides one external collaborator so that the session can be
//! driven by the real Azure tooling or by fakes in tests.

use async_trait::async_trait;

use crate::error::ApimError;
use crate::models::{
    AccessToken, AccountIdentity, ApiContract, DebugCredentialsRequest, PolicyFragment,
    ServiceDescriptor, ServiceResource, ServiceScope, SubscriptionContract, SubscriptionSecrets,
};

/// Control-plane operations against an APIM service.
///
/// Implementations may use a typed REST client or shell out to a generic
/// REST tool; callers do not know which transport serves which call. Every
/// method issues its request(s) once, without retries.
#[async_trait]
pub trait ManagementPlane: Send + Sync {
    /// List resources of type [`APIM_RESOURCE_TYPE`](crate::APIM_RESOURCE_TYPE)
    /// in a resource group, in listing order.
    async fn list_service_resources(
        &self,
        subscription_id: &str,
        resource_group: &str,
    ) -> Result<Vec<ServiceResource>, ApimError>;

    /// Fetch the service descriptor.
    async fn get_service(&self, scope: &ServiceScope) -> Result<ServiceDescriptor, ApimError>;

    /// List all subscriptions on the service, in listing order.
    async fn list_subscriptions(
        &self,
        scope: &ServiceScope,
    ) -> Result<Vec<SubscriptionContract>, ApimError>;

    /// Fetch the keys of one subscription.
    async fn list_subscription_secrets(
        &self,
        scope: &ServiceScope,
        subscription_name: &str,
    ) -> Result<SubscriptionSecrets, ApimError>;

    /// List all APIs on the service, in listing order.
    async fn list_apis(&self, scope: &ServiceScope) -> Result<Vec<ApiContract>, ApimError>;

    /// Fetch a policy fragment by identifier.
    ///
    /// # Errors
    ///
    /// A missing fragment surfaces as an error for which
    /// [`ApimError::is_not_found`] is `true`.
    async fn get_policy_fragment(
        &self,
        scope: &ServiceScope,
        fragment_id: &str,
    ) -> Result<PolicyFragment, ApimError>;

    /// Issue debug credentials on the managed gateway.
    ///
    /// Returns `Ok(None)` when the call succeeded but carried no token.
    async fn list_debug_credentials(
        &self,
        service_id: &str,
        request: &DebugCredentialsRequest,
    ) -> Result<Option<String>, ApimError>;

    /// Fetch a request trace from the managed gateway.
    ///
    /// Returns `Ok(None)` when the call succeeded but carried no payload.
    async fn list_trace(
        &self,
        service_id: &str,
        trace_id: &str,
    ) -> Result<Option<serde_json::Value>, ApimError>;
}

/// Resolves the signed-in principal, tenant and subscription.
#[async_trait]
pub trait AccountProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ApimError::AccountUnavailable`] when no usable identity can
    /// be resolved.
    async fn current_account(&self) -> Result<AccountIdentity, ApimError>;
}

/// Source of bearer tokens for the management endpoint.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Obtain a token for `resource` (e.g. `https://management.azure.com/`).
    ///
    /// # Errors
    ///
    /// Returns [`ApimError::Credential`] when no token can be issued.
    async fn access_token(&self, resource: &str) -> Result<AccessToken, ApimError>;
}

/// Recovers supported model names from a policy fragment body.
pub trait ModelExtractor: Send + Sync {
    /// Returns a deduplicated, lexicographically sorted list (possibly empty).
    fn extract(&self, policy_body: &str) -> Vec<String>;
}
