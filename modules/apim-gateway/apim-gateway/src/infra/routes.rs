//! ARM URL construction.

use apim_gateway_sdk::{APIM_RESOURCE_TYPE, ApimError, ServiceScope};
use url::Url;

/// Builds management-plane URLs for one ARM endpoint and set of API versions.
#[derive(Debug, Clone)]
pub struct ArmRoutes {
    endpoint: String,
    api_version: String,
    gateway_api_version: String,
    resources_api_version: String,
}

impl ArmRoutes {
    #[must_use]
    pub fn new(
        endpoint: &str,
        api_version: impl Into<String>,
        gateway_api_version: impl Into<String>,
        resources_api_version: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            api_version: api_version.into(),
            gateway_api_version: gateway_api_version.into(),
            resources_api_version: resources_api_version.into(),
        }
    }

    /// Token audience for the endpoint, e.g. `https://management.azure.com/`.
    #[must_use]
    pub fn token_resource(&self) -> String {
        format!("{}/", self.endpoint)
    }

    pub fn service_resources(
        &self,
        subscription_id: &str,
        resource_group: &str,
    ) -> Result<Url, ApimError> {
        let filter = format!("resourceType eq '{APIM_RESOURCE_TYPE}'");
        self.build(
            &format!("/subscriptions/{subscription_id}/resourceGroups/{resource_group}/resources"),
            &self.resources_api_version,
            &[("$filter", filter.as_str())],
        )
    }

    pub fn service(&self, scope: &ServiceScope) -> Result<Url, ApimError> {
        self.build(&scope.service_path(), &self.api_version, &[])
    }

    pub fn subscriptions(&self, scope: &ServiceScope) -> Result<Url, ApimError> {
        self.build(
            &format!("{}/subscriptions", scope.service_path()),
            &self.api_version,
            &[],
        )
    }

    pub fn subscription_secrets(
        &self,
        scope: &ServiceScope,
        subscription_name: &str,
    ) -> Result<Url, ApimError> {
        self.build(
            &format!(
                "{}/subscriptions/{subscription_name}/listSecrets",
                scope.service_path()
            ),
            &self.api_version,
            &[],
        )
    }

    pub fn apis(&self, scope: &ServiceScope) -> Result<Url, ApimError> {
        self.build(&format!("{}/apis", scope.service_path()), &self.api_version, &[])
    }

    pub fn policy_fragment(
        &self,
        scope: &ServiceScope,
        fragment_id: &str,
    ) -> Result<Url, ApimError> {
        self.build(
            &format!("{}/policyFragments/{fragment_id}", scope.service_path()),
            &self.api_version,
            &[],
        )
    }

    pub fn debug_credentials(&self, service_id: &str) -> Result<Url, ApimError> {
        self.build(
            &format!("{service_id}/gateways/managed/listDebugCredentials"),
            &self.gateway_api_version,
            &[],
        )
    }

    pub fn trace(&self, service_id: &str) -> Result<Url, ApimError> {
        self.build(
            &format!("{service_id}/gateways/managed/listTrace"),
            &self.gateway_api_version,
            &[],
        )
    }

    fn build(&self, path: &str, api_version: &str, extra: &[(&str, &str)]) -> Result<Url, ApimError> {
        let mut url = Url::parse(&format!("{}{path}", self.endpoint))
            .map_err(|e| ApimError::Config(format!("invalid ARM URL for `{path}`: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api-version", api_version);
            for (key, value) in extra {
                query.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

/// Parse a `nextLink` returned by a collection page.
pub fn next_link(link: &str) -> Result<Url, ApimError> {
    Url::parse(link).map_err(|e| ApimError::InvalidResponse(format!("invalid nextLink: {e}")))
}
