//! Account resolution.

use std::sync::Arc;

use apim_gateway_sdk::{AccountIdentity, AccountProvider, ApimError};
use async_trait::async_trait;
use serde::Deserialize;

use super::cli::{CommandRunner, args};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountShowDto {
    id: String,
    tenant_id: String,
    #[serde(default)]
    user: AccountUserDto,
}

#[derive(Debug, Default, Deserialize)]
struct AccountUserDto {
    #[serde(default)]
    name: String,
}

/// Reads the current account from `az account show`.
pub struct AzCliAccountProvider {
    runner: Arc<dyn CommandRunner>,
}

impl AzCliAccountProvider {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl AccountProvider for AzCliAccountProvider {
    async fn current_account(&self) -> Result<AccountIdentity, ApimError> {
        let output = self
            .runner
            .run(&args(["account", "show", "--output", "json"]))
            .await
            .map_err(|e| ApimError::AccountUnavailable(e.to_string()))?;
        if !output.success {
            return Err(ApimError::AccountUnavailable(output.error_message()));
        }
        let value = output.json().ok_or_else(|| {
            ApimError::AccountUnavailable("`account show` returned no JSON".to_owned())
        })?;
        let account: AccountShowDto = serde_json::from_value(value)
            .map_err(|e| ApimError::AccountUnavailable(format!("unexpected account shape: {e}")))?;

        Ok(AccountIdentity {
            user_name: account.user.name,
            tenant_id: account.tenant_id,
            subscription_id: account.id,
        })
    }
}

/// Fixed identity, for non-interactive runs where the subscription is known.
#[derive(Debug, Clone)]
pub struct StaticAccountProvider {
    identity: AccountIdentity,
}

impl StaticAccountProvider {
    #[must_use]
    pub fn new(identity: AccountIdentity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl AccountProvider for StaticAccountProvider {
    async fn current_account(&self) -> Result<AccountIdentity, ApimError> {
        if self.identity.subscription_id.is_empty() {
            return Err(ApimError::AccountUnavailable(
                "static account has no subscription id".to_owned(),
            ));
        }
        Ok(self.identity.clone())
    }
}
