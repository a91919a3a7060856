//! Assembly of a [`GatewaySession`] from configuration.

use std::sync::Arc;
use std::time::Duration;

use apim_gateway_sdk::{AccountProvider, ApimError, CredentialProvider, ManagementPlane};
use tracing::debug;

use crate::config::{ApimConfig, TransportKind};
use crate::domain::session::{GatewaySession, SessionTarget};
use crate::infra::account::{AzCliAccountProvider, StaticAccountProvider};
use crate::infra::arm::ArmManagementClient;
use crate::infra::az_rest::AzRestManagementClient;
use crate::infra::cli::{AzCli, CommandRunner};
use crate::infra::credential::{AzCliCredential, StaticTokenCredential};
use crate::infra::routes::ArmRoutes;

/// Credential provider implied by the config: the configured token when
/// present, otherwise `az account get-access-token`.
#[must_use]
pub fn credential_from_config(config: &ApimConfig) -> Arc<dyn CredentialProvider> {
    match &config.access_token {
        Some(token) => Arc::new(StaticTokenCredential::new(token.clone())),
        None => Arc::new(AzCliCredential::new(runner(config))),
    }
}

fn runner(config: &ApimConfig) -> Arc<dyn CommandRunner> {
    Arc::new(AzCli::new(&config.az_path))
}

impl GatewaySession {
    /// Build an uninitialized session with the transport and account source
    /// selected by `config`.
    ///
    /// `credential` is used by the ARM transport only; the CLI transport
    /// relies on the `az` login.
    ///
    /// # Errors
    ///
    /// Returns [`ApimError::Config`] for an invalid config and
    /// [`ApimError::Transport`] if the HTTP client cannot be built.
    pub fn from_config(
        config: &ApimConfig,
        credential: Arc<dyn CredentialProvider>,
    ) -> Result<Self, ApimError> {
        config.validate()?;

        let routes = ArmRoutes::new(
            &config.arm_endpoint,
            config.api_version.as_str(),
            config.gateway_api_version.as_str(),
            config.resources_api_version.as_str(),
        );

        let plane: Arc<dyn ManagementPlane> = match config.transport {
            TransportKind::Arm => Arc::new(ArmManagementClient::new(
                routes,
                credential,
                Duration::from_millis(config.request_timeout_ms),
            )?),
            TransportKind::AzCli => Arc::new(AzRestManagementClient::new(runner(config), routes)),
        };

        let account: Arc<dyn AccountProvider> = match config.account.static_identity() {
            Some(identity) => Arc::new(StaticAccountProvider::new(identity)),
            None => Arc::new(AzCliAccountProvider::new(runner(config))),
        };

        debug!(
            transport = ?config.transport,
            resource_group = %config.resource_group,
            "Built gateway session"
        );
        Ok(Self::new(
            SessionTarget::new(config.resource_group.clone(), config.service_name.clone()),
            account,
            plane,
        ))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::config::AccountSource;

    #[test]
    fn rejects_invalid_config() {
        let config = ApimConfig::default();
        let result = GatewaySession::from_config(&config, credential_from_config(&config));
        assert!(matches!(result, Err(ApimError::Config(_))));
    }

    #[test]
    fn builds_cli_session_with_static_account() {
        let config = ApimConfig {
            resource_group: "rg-ai".to_owned(),
            service_name: Some("apim-ai".to_owned()),
            transport: TransportKind::AzCli,
            account: AccountSource::Static {
                subscription_id: "sub-1".to_owned(),
                tenant_id: String::new(),
                user_name: String::new(),
            },
            ..ApimConfig::default()
        };
        let session = GatewaySession::from_config(&config, credential_from_config(&config)).unwrap();
        assert_eq!(session.target().service_name.as_deref(), Some("apim-ai"));
        assert!(session.identity().is_none());
    }
}
