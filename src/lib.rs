//! Compute capacity utilization for Azure VM families.
//!
//! Joins the core quota of a VM family with the cores reserved for it and the
//! cores of its running instances, for one subscription and location.

pub mod azure;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod processing;
pub mod server;

#[cfg(test)]
mod test_support;

use azure::{acquire_token, ArmApi, ArmTransport, HttpTransport, ReplayTransport};
use config::Config;
use error::UtilizationResult;
use processing::UtilizationAggregator;
use std::sync::Arc;

pub use error::UtilizationError;
pub use models::{ComputeUtilizationResponse, UsageLimit, Utilization};

/// Build the aggregator described by the configuration.
///
/// With a replay directory no token is acquired and no call leaves the host.
pub async fn build_aggregator(config: &Config) -> UtilizationResult<UtilizationAggregator> {
    let transport: Arc<dyn ArmTransport> = match &config.replay_dir {
        Some(dir) => Arc::new(ReplayTransport::new(dir.clone())?),
        None => {
            let token = acquire_token(&config.token_source, config.tenant_id.as_deref()).await?;
            Arc::new(HttpTransport::new(&token, config.http_timeout)?)
        }
    };
    let api = ArmApi::new(transport, &config.management_endpoint);
    Ok(UtilizationAggregator::new(api, config.request_timeout))
}
