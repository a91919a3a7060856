//! Error types for the APIM gateway helper.

use thiserror::Error;

/// Errors that can occur while talking to an APIM service.
///
/// Secret material (subscription keys, access tokens) never appears in the
/// rendered messages.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApimError {
    /// The signed-in account could not be resolved.
    #[error("account unavailable: {0}")]
    AccountUnavailable(String),

    /// No APIM service resource exists in the resource group.
    #[error("APIM resource not found in resource group {resource_group}")]
    ServiceNotFound {
        /// Resource group that was searched.
        resource_group: String,
    },

    /// A management-plane resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// `initialize` was called on a session that is already initialized.
    #[error("session is already initialized")]
    AlreadyInitialized,

    /// A query needs the service descriptor but the session is not initialized.
    #[error("session is not initialized")]
    NotInitialized,

    /// A query needs a resolved API but `discover_api` has not succeeded.
    #[error("no API has been discovered on this session")]
    ApiNotDiscovered,

    /// Fetching or parsing a policy fragment failed.
    #[error("failed to retrieve or parse policy fragment `{name}`: {source}")]
    PolicyFragment {
        /// Fragment identifier.
        name: String,
        /// Underlying cause.
        #[source]
        source: Box<ApimError>,
    },

    /// A bearer token could not be obtained.
    #[error("credential error: {0}")]
    Credential(String),

    /// A command-line invocation failed.
    #[error("`{command}` failed: {message}")]
    Cli {
        /// The invoked command, without secrets.
        command: String,
        /// Trimmed stderr of the tool, or the spawn error.
        message: String,
    },

    /// The management endpoint answered with a non-success status.
    ///
    /// Only the status code is kept; response bodies may carry diagnostics
    /// that should not end up in logs.
    #[error("{operation} HTTP {status}")]
    Http {
        /// Logical operation name, e.g. `get service`.
        operation: String,
        /// HTTP status code.
        status: u16,
    },

    /// Network-level failure before a response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be decoded into the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration is invalid.
    #[error("config error: {0}")]
    Config(String),
}

impl ApimError {
    /// Wrap any error raised while handling a policy fragment.
    #[must_use]
    pub fn policy_fragment(name: impl Into<String>, source: ApimError) -> Self {
        Self::PolicyFragment {
            name: name.into(),
            source: Box::new(source),
        }
    }

    /// Create a CLI error.
    #[must_use]
    pub fn cli(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cli {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error.
    #[must_use]
    pub fn http(operation: impl Into<String>, status: u16) -> Self {
        Self::Http {
            operation: operation.into(),
            status,
        }
    }

    /// Whether this error reports a missing resource.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::ServiceNotFound { .. } | Self::Http { status: 404, .. }
        )
    }
}
