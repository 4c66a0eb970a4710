//! Bearer token acquisition.
//!
//! The token is obtained once at startup and reused for every outbound call.

use super::cli;
use crate::config;
use crate::error::{UtilizationError, UtilizationResult};
use azure_core::auth::TokenCredential;
use azure_identity::{DefaultAzureCredential, DefaultAzureCredentialBuilder};
use std::fmt;

/// Where the management bearer token comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// The azure_identity default credential chain (environment, managed identity, az cli).
    Identity,
    /// `az account get-access-token` of the logged in cli session.
    AzCli,
    /// A token supplied through configuration.
    Static(String),
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Identity => f.write_str("Identity"),
            TokenSource::AzCli => f.write_str("AzCli"),
            TokenSource::Static(_) => f.write_str("Static(<redacted>)"),
        }
    }
}

/// Obtain a bearer token for Azure Resource Manager.
pub async fn acquire_token(
    source: &TokenSource,
    tenant_id: Option<&str>,
) -> UtilizationResult<String> {
    log::info!("Acquiring management token from {source:?}");
    let token = match source {
        TokenSource::Identity => identity_token().await?,
        TokenSource::AzCli => {
            let tenant_id = tenant_id.map(str::to_string);
            tokio::task::spawn_blocking(move || cli::az_access_token(tenant_id.as_deref()))
                .await
                .map_err(|e| UtilizationError::Command(format!("az cli task failed: {e}")))??
        }
        TokenSource::Static(token) => token.clone(),
    };

    if token.trim().is_empty() {
        return Err(UtilizationError::Credential(
            "received an empty access token".to_string(),
        ));
    }
    Ok(token)
}

/// The default credential chain. Building it does not contact Azure.
fn default_credential() -> UtilizationResult<DefaultAzureCredential> {
    Ok(DefaultAzureCredentialBuilder::new().build())
}

async fn identity_token() -> UtilizationResult<String> {
    let credential = default_credential()?;
    let token = credential
        .get_token(&[config::MANAGEMENT_SCOPE])
        .await
        .map_err(|e| UtilizationError::Credential(e.to_string()))?;
    Ok(token.token.secret().to_string())
}
