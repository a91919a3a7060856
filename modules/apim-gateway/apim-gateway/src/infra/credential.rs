//! Bearer tokens for the ARM transport.

use std::sync::Arc;

use apim_gateway_sdk::{AccessToken, ApimError, CredentialProvider, SecretValue};
use async_trait::async_trait;
use serde::Deserialize;

use super::cli::{CommandRunner, args};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenDto {
    access_token: Option<SecretValue>,
}

/// Obtains tokens from `az account get-access-token`.
///
/// Tokens are not cached; every request asks the CLI again.
pub struct AzCliCredential {
    runner: Arc<dyn CommandRunner>,
}

impl AzCliCredential {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl CredentialProvider for AzCliCredential {
    async fn access_token(&self, resource: &str) -> Result<AccessToken, ApimError> {
        let output = self
            .runner
            .run(&args([
                "account",
                "get-access-token",
                "--resource",
                resource,
                "--output",
                "json",
            ]))
            .await
            .map_err(|e| ApimError::Credential(e.to_string()))?;
        if !output.success {
            return Err(ApimError::Credential(output.error_message()));
        }

        let dto: AccessTokenDto = output
            .json()
            .and_then(|v| serde_json::from_value(v).ok())
            .ok_or_else(|| ApimError::Credential("unexpected get-access-token output".to_owned()))?;
        match dto.access_token {
            Some(token) if !token.is_empty() => Ok(AccessToken { token }),
            _ => Err(ApimError::Credential(
                "get-access-token returned no token".to_owned(),
            )),
        }
    }
}

/// A pre-issued token, e.g. from configuration.
#[derive(Clone)]
pub struct StaticTokenCredential {
    token: SecretValue,
}

impl StaticTokenCredential {
    #[must_use]
    pub fn new(token: SecretValue) -> Self {
        Self { token }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenCredential {
    async fn access_token(&self, _resource: &str) -> Result<AccessToken, ApimError> {
        if self.token.is_empty() {
            return Err(ApimError::Credential("configured access token is empty".to_owned()));
        }
        Ok(AccessToken {
            token: self.token.clone(),
        })
    }
}
