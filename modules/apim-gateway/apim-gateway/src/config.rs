//! Layered configuration for the gateway session.
//!
//! Sources, lowest precedence first:
//! 1. [`ApimConfig::default`]
//! 2. an optional YAML file
//! 3. `APIM__*` environment variables, nested keys separated by `__`
//!    (e.g. `APIM__ACCOUNT__KIND=static`)
//!
//! Callers may merge further providers (CLI flags) on top of [`ApimConfig::figment`].

use std::path::Path;

use apim_gateway_sdk::{AccountIdentity, ApimError, SecretValue};
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::Deserialize;
use url::Url;

pub const ENV_PREFIX: &str = "APIM__";

/// Which [`ManagementPlane`](apim_gateway_sdk::ManagementPlane) implementation serves requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Typed REST over HTTPS with a bearer token.
    #[default]
    Arm,
    /// `az rest` / `az resource list`.
    AzCli,
}

/// Where the subscription and tenant come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccountSource {
    /// `az account show`.
    #[default]
    AzCli,
    Static {
        subscription_id: String,
        #[serde(default)]
        tenant_id: String,
        #[serde(default)]
        user_name: String,
    },
}

impl AccountSource {
    /// Identity for the static variant.
    #[must_use]
    pub fn static_identity(&self) -> Option<AccountIdentity> {
        match self {
            Self::AzCli => None,
            Self::Static {
                subscription_id,
                tenant_id,
                user_name,
            } => Some(AccountIdentity {
                user_name: user_name.clone(),
                tenant_id: tenant_id.clone(),
                subscription_id: subscription_id.clone(),
            }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApimConfig {
    pub resource_group: String,
    /// Explicit service name; when absent the first APIM resource in the group is used.
    pub service_name: Option<String>,
    pub transport: TransportKind,
    pub account: AccountSource,
    pub arm_endpoint: String,
    pub api_version: String,
    pub gateway_api_version: String,
    pub resources_api_version: String,
    pub az_path: String,
    pub request_timeout_ms: u64,
    /// Pre-issued bearer token. When set, the `az` CLI is not asked for tokens.
    pub access_token: Option<SecretValue>,
}

impl Default for ApimConfig {
    fn default() -> Self {
        Self {
            resource_group: String::new(),
            service_name: None,
            transport: TransportKind::Arm,
            account: AccountSource::AzCli,
            arm_endpoint: "https://management.azure.com".to_owned(),
            api_version: "2022-08-01".to_owned(),
            gateway_api_version: "2023-05-01-preview".to_owned(),
            resources_api_version: "2021-04-01".to_owned(),
            az_path: "az".to_owned(),
            request_timeout_ms: 30_000,
            access_token: None,
        }
    }
}

impl ApimConfig {
    /// Base figment: optional YAML file, then environment.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate a config from any figment.
    ///
    /// # Errors
    ///
    /// Returns [`ApimError::Config`] on parse or validation failure.
    pub fn from_figment(figment: &Figment) -> Result<Self, ApimError> {
        let config: Self = figment
            .extract()
            .map_err(|e| ApimError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional YAML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ApimError::Config`] on parse or validation failure.
    pub fn load(path: Option<&Path>) -> Result<Self, ApimError> {
        Self::from_figment(&Self::figment(path))
    }

    /// # Errors
    ///
    /// Returns [`ApimError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<(), ApimError> {
        if self.resource_group.trim().is_empty() {
            return Err(ApimError::Config("resource_group must be set".to_owned()));
        }
        Url::parse(&self.arm_endpoint)
            .map_err(|e| ApimError::Config(format!("arm_endpoint is not a valid URL: {e}")))?;
        if self.request_timeout_ms == 0 {
            return Err(ApimError::Config(
                "request_timeout_ms must be greater than zero".to_owned(),
            ));
        }
        if let AccountSource::Static {
            subscription_id, ..
        } = &self.account
            && subscription_id.trim().is_empty()
        {
            return Err(ApimError::Config(
                "account.subscription_id must be set for a static account".to_owned(),
            ));
        }
        Ok(())
    }
}
