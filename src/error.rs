//! Error taxonomy for utilization requests.

use crate::azure::ArmOperation;
use crate::models::SkuScope;
use std::time::Duration;
use thiserror::Error;

/// The result of a utilization-related operation.
pub type UtilizationResult<T> = Result<T, UtilizationError>;

/// An error raised while gathering compute utilization.
///
/// Every variant is terminal for the request that produced it. There are no
/// retries and no partial results.
#[derive(Debug, Error)]
pub enum UtilizationError {
    /// An expected JSON property was absent from a provider response.
    #[error("property {property} not found in {context} response")]
    MissingProperty {
        context: &'static str,
        property: String,
    },

    /// A JSON property was present but its value could not be used.
    #[error("invalid value for {property}: {value}")]
    InvalidProperty { property: String, value: String },

    /// An outbound call returned a non-success status.
    #[error("{operation} failed with status {status}: {body}")]
    UpstreamFailure {
        operation: ArmOperation,
        status: u16,
        body: String,
    },

    /// The SKU name is not part of the catalog for the scope.
    #[error("sku {sku} not found in catalog for {scope}")]
    SkuNotFound { sku: String, scope: SkuScope },

    /// A response did not match the expected shape.
    #[error("error parsing {context} response at path={path}: {message}")]
    Parse {
        context: &'static str,
        path: String,
        message: String,
    },

    /// A caller-provided value was rejected.
    #[error("invalid request: {0}")]
    InvalidInput(String),

    /// The request deadline elapsed before all sub-operations finished.
    #[error("utilization request timed out after {0:?}")]
    Timeout(Duration),

    /// An error that occurred during an HTTP request.
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The bearer token could not be obtained.
    #[error("credential error: {0}")]
    Credential(String),

    /// An external command failed.
    #[error("command failed: {0}")]
    Command(String),

    /// An I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl UtilizationError {
    /// Short machine-readable kind, used as the `code` of error responses.
    pub fn code(&self) -> &'static str {
        match self {
            UtilizationError::MissingProperty { .. } => "MissingProperty",
            UtilizationError::InvalidProperty { .. } => "InvalidProperty",
            UtilizationError::UpstreamFailure { .. } => "UpstreamFailure",
            UtilizationError::SkuNotFound { .. } => "SkuNotFound",
            UtilizationError::Parse { .. } => "ParseError",
            UtilizationError::InvalidInput(_) => "InvalidInput",
            UtilizationError::Timeout(_) => "Timeout",
            UtilizationError::Http(_) => "HttpError",
            UtilizationError::Credential(_) => "CredentialError",
            UtilizationError::Command(_) => "CommandError",
            UtilizationError::Io(_) => "IoError",
            UtilizationError::Config(_) => "ConfigError",
        }
    }

    /// Wrap a `serde_path_to_error` failure with the response it came from.
    pub fn parse(context: &'static str, e: serde_path_to_error::Error<serde_json::Error>) -> Self {
        UtilizationError::Parse {
            context,
            path: e.path().to_string(),
            message: e.into_inner().to_string(),
        }
    }
}
