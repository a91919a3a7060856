#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! APIM gateway session.
//!
//! Locates an Azure API Management service, harvests its subscription keys,
//! discovers an API by path, issues debug-tracing credentials, fetches traces
//! and scrapes supported model names from a policy fragment.
//!
//! ```ignore
//! use apim_gateway::{ApimConfig, GatewaySession, credential_from_config};
//!
//! let config = ApimConfig::load(Some(path))?;
//! let mut session = GatewaySession::from_config(&config, credential_from_config(&config))?;
//! session.initialize().await?;
//! let api = session.discover_api("/openai").await.into_result()?;
//! ```

pub mod config;
pub mod domain;
pub mod infra;
mod wiring;

pub use config::{AccountSource, ApimConfig, TransportKind};
pub use domain::extractor::{RegexModelExtractor, extract_supported_models};
pub use domain::session::{
    DEFAULT_API_PATH_FILTER, DEFAULT_POLICY_FRAGMENT, GatewaySession, SessionTarget,
    public_endpoint,
};
pub use infra::account::{AzCliAccountProvider, StaticAccountProvider};
pub use infra::arm::ArmManagementClient;
pub use infra::az_rest::AzRestManagementClient;
pub use infra::cli::{AzCli, CliOutput, CommandRunner};
pub use infra::credential::{AzCliCredential, StaticTokenCredential};
pub use infra::routes::ArmRoutes;
pub use wiring::credential_from_config;
