#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! APIM Gateway SDK
//!
//! This crate provides the public contract for the APIM gateway helper:
//!
//! - [`ManagementPlane`] - Control-plane operations against an APIM service
//! - [`AccountProvider`] - Resolution of the signed-in principal and subscription
//! - [`CredentialProvider`] - Bearer tokens for the management endpoint
//! - [`ModelExtractor`] - Supported-model scraping from policy fragment bodies
//! - [`QueryOutcome`] - Found / not-found / failed result of a query operation
//! - [`ApimError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use apim_gateway_sdk::{ManagementPlane, ServiceScope};
//!
//! let scope = ServiceScope::new(subscription_id, "rg-ai", "apim-ai");
//! let service = plane.get_service(&scope).await?;
//! let apis = plane.list_apis(&scope).await?;
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod outcome;
pub mod secret;

pub use api::{AccountProvider, CredentialProvider, ManagementPlane, ModelExtractor};
pub use error::ApimError;
pub use models::{
    APIM_RESOURCE_TYPE, AccessToken, AccountIdentity, ApiContract, ApiDescriptor,
    DebugCredential, DebugCredentialsRequest, PolicyFragment, ServiceDescriptor, ServiceResource,
    ServiceScope, SessionIdentity, SubscriptionContract, SubscriptionKey, SubscriptionSecrets,
    TraceRecord,
};
pub use outcome::QueryOutcome;
pub use secret::SecretValue;
