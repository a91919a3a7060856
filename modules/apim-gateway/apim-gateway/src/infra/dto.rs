//! ARM wire shapes shared by the REST and CLI transports.

use apim_gateway_sdk::{
    ApiContract, ApimError, PolicyFragment, SecretValue, ServiceDescriptor, ServiceResource,
    SubscriptionContract, SubscriptionSecrets,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;

/// One page of an ARM collection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmPage<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
    pub next_link: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceDto {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub resource_type: String,
}

impl From<ResourceDto> for ServiceResource {
    fn from(dto: ResourceDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            resource_type: dto.resource_type,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ServiceDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: ServicePropertiesDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePropertiesDto {
    pub gateway_url: Option<String>,
}

impl TryFrom<ServiceDto> for ServiceDescriptor {
    type Error = ApimError;

    fn try_from(dto: ServiceDto) -> Result<Self, Self::Error> {
        let gateway_url = dto.properties.gateway_url.ok_or_else(|| {
            ApimError::InvalidResponse(format!("service `{}` has no gateway URL", dto.name))
        })?;
        Ok(Self {
            id: dto.id,
            name: dto.name,
            gateway_url,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: SubscriptionPropertiesDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPropertiesDto {
    pub display_name: Option<String>,
    pub state: Option<String>,
}

impl From<SubscriptionDto> for SubscriptionContract {
    fn from(dto: SubscriptionDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            display_name: dto.properties.display_name,
            state: dto.properties.state,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionSecretsDto {
    pub primary_key: Option<SecretValue>,
    pub secondary_key: Option<SecretValue>,
}

impl SubscriptionSecretsDto {
    pub fn into_secrets(self, subscription_name: &str) -> Result<SubscriptionSecrets, ApimError> {
        let primary_key = self.primary_key.ok_or_else(|| {
            ApimError::InvalidResponse(format!(
                "subscription `{subscription_name}` returned no primary key"
            ))
        })?;
        Ok(SubscriptionSecrets {
            primary_key,
            secondary_key: self.secondary_key,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: ApiPropertiesDto,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPropertiesDto {
    #[serde(default)]
    pub path: String,
    pub display_name: Option<String>,
}

impl From<ApiDto> for ApiContract {
    fn from(dto: ApiDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            path: dto.properties.path,
            display_name: dto.properties.display_name,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PolicyFragmentDto {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: PolicyFragmentPropertiesDto,
}

#[derive(Debug, Default, Deserialize)]
pub struct PolicyFragmentPropertiesDto {
    pub description: Option<String>,
    pub value: Option<String>,
}

impl From<PolicyFragmentDto> for PolicyFragment {
    fn from(dto: PolicyFragmentDto) -> Self {
        Self {
            id: dto.id,
            name: dto.name,
            description: dto.properties.description,
            value: dto.properties.value,
        }
    }
}

#[derive(Deserialize)]
pub struct DebugCredentialsDto {
    pub token: Option<String>,
}

/// Decode a JSON value into a wire shape, naming the operation on failure.
pub fn decode<T: DeserializeOwned>(value: serde_json::Value, operation: &str) -> Result<T, ApimError> {
    serde_json::from_value(value)
        .map_err(|e| ApimError::InvalidResponse(format!("{operation}: {e}")))
}

/// Whether a response payload carries nothing: `null`, `{}`, `[]` or `""`.
#[must_use]
pub fn is_blank(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        serde_json::Value::String(s) => s.is_empty(),
        serde_json::Value::Bool(_) | serde_json::Value::Number(_) => false,
    }
}

/// `None` for a blank payload.
#[must_use]
pub fn present(value: serde_json::Value) -> Option<serde_json::Value> {
    (!is_blank(&value)).then_some(value)
}

/// Pull the token out of a `listDebugCredentials` response.
pub fn debug_token(value: Option<serde_json::Value>) -> Result<Option<String>, ApimError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let dto: DebugCredentialsDto = decode(value, "list debug credentials")?;
    Ok(dto.token.filter(|t| !t.is_empty()))
}
