//! Runtime configuration and Azure API constants.
//!
//! Values are read from the process environment after `dotenv` has loaded an
//! optional `.env` file.

use crate::azure::TokenSource;
use crate::error::{UtilizationError, UtilizationResult};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Azure Resource Manager endpoint.
pub const MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";
/// OAuth scope requested for the management bearer token.
pub const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";

pub const SERVICE_LIMITS_API_VERSION: &str = "2020-10-25";
pub const RESOURCE_GRAPH_API_VERSION: &str = "2022-10-01";
pub const SKUS_API_VERSION: &str = "2021-07-01";
pub const RESERVATIONS_API_VERSION: &str = "2022-11-01";

/// Rows requested per Resource Graph page.
pub const GRAPH_PAGE_SIZE: u32 = 1000;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:7071";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Settings for the server and the outbound Azure client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server listens on.
    pub bind_addr: SocketAddr,
    /// Base URL of Azure Resource Manager, without trailing slash.
    pub management_endpoint: String,
    /// Tenant used when the token comes from the az cli.
    pub tenant_id: Option<String>,
    /// Where the bearer token comes from.
    pub token_source: TokenSource,
    /// Deadline for one complete utilization request.
    pub request_timeout: Duration,
    /// Timeout applied to every single outbound call.
    pub http_timeout: Duration,
    /// Serve recorded responses from this directory instead of calling Azure.
    pub replay_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 7071)),
            management_endpoint: MANAGEMENT_ENDPOINT.to_string(),
            tenant_id: None,
            token_source: TokenSource::Identity,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            replay_dir: None,
        }
    }
}

impl Config {
    /// Build the configuration from the process environment.
    pub fn from_env() -> UtilizationResult<Config> {
        Config::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> UtilizationResult<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = lookup("UTILIZATION_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr.parse().map_err(|e| {
            UtilizationError::Config(format!("UTILIZATION_BIND_ADDR={bind_addr}: {e}"))
        })?;

        let management_endpoint = lookup("AZURE_MANAGEMENT_ENDPOINT")
            .unwrap_or_else(|| MANAGEMENT_ENDPOINT.to_string())
            .trim_end_matches('/')
            .to_string();

        let token_source = match lookup("UTILIZATION_TOKEN_SOURCE")
            .unwrap_or_else(|| "identity".to_string())
            .to_ascii_lowercase()
            .as_str()
        {
            "identity" => TokenSource::Identity,
            "cli" => TokenSource::AzCli,
            "static" => {
                let token = lookup("AZURE_ACCESS_TOKEN").ok_or_else(|| {
                    UtilizationError::Config(
                        "AZURE_ACCESS_TOKEN must be set when UTILIZATION_TOKEN_SOURCE=static"
                            .to_string(),
                    )
                })?;
                TokenSource::Static(token)
            }
            other => {
                return Err(UtilizationError::Config(format!(
                    "unknown UTILIZATION_TOKEN_SOURCE '{other}', expected identity, cli or static"
                )))
            }
        };

        Ok(Config {
            bind_addr,
            management_endpoint,
            tenant_id: lookup("AZURE_TENANT_ID").filter(|t| !t.is_empty()),
            token_source,
            request_timeout: secs(
                &lookup,
                "UTILIZATION_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?,
            http_timeout: secs(&lookup, "UTILIZATION_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
            replay_dir: lookup("UTILIZATION_REPLAY_DIR").map(PathBuf::from),
        })
    }
}

fn secs<F>(lookup: &F, key: &str, default: u64) -> UtilizationResult<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(Duration::from_secs(default)),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| UtilizationError::Config(format!("{key}={raw}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).expect("default config");
        assert_eq!(config.bind_addr.port(), 7071);
        assert_eq!(config.management_endpoint, MANAGEMENT_ENDPOINT);
        assert_eq!(config.token_source, TokenSource::Identity);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert!(config.replay_dir.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("UTILIZATION_BIND_ADDR", "127.0.0.1:8080"),
            ("AZURE_MANAGEMENT_ENDPOINT", "http://localhost:9000/"),
            ("UTILIZATION_TOKEN_SOURCE", "CLI"),
            ("AZURE_TENANT_ID", "16b3c013-d300-468d-ac64-7eda0820b6d3"),
            ("UTILIZATION_REQUEST_TIMEOUT_SECS", "5"),
            ("UTILIZATION_REPLAY_DIR", "src/tests/test_data"),
        ]))
        .expect("config with overrides");
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.management_endpoint, "http://localhost:9000");
        assert_eq!(config.token_source, TokenSource::AzCli);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(
            config.replay_dir,
            Some(PathBuf::from("src/tests/test_data"))
        );
    }

    #[test]
    fn test_static_token_requires_value() {
        let err = Config::from_lookup(lookup_from(&[("UTILIZATION_TOKEN_SOURCE", "static")]))
            .expect_err("missing token should fail");
        assert!(matches!(err, UtilizationError::Config(_)));

        let config = Config::from_lookup(lookup_from(&[
            ("UTILIZATION_TOKEN_SOURCE", "static"),
            ("AZURE_ACCESS_TOKEN", "abc"),
        ]))
        .expect("static token config");
        assert_eq!(config.token_source, TokenSource::Static("abc".to_string()));
    }

    #[test]
    fn test_bad_timeout() {
        let err = Config::from_lookup(lookup_from(&[("UTILIZATION_HTTP_TIMEOUT_SECS", "soon")]))
            .expect_err("non numeric timeout");
        assert!(err.to_string().contains("UTILIZATION_HTTP_TIMEOUT_SECS"));
    }
}
