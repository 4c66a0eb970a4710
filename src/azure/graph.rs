//! Azure Resource Graph query execution.
//!
//! Counts running, non-spot instances per SKU size in a location across
//! scale sets and standalone virtual machines.

use super::api::{take_property, validate_location, ArmApi};
use super::transport::{ArmOperation, ArmRequest};
use crate::config;
use crate::error::{UtilizationError, UtilizationResult};
use crate::models::UsageQueryResult;
use serde_json::{json, Value};

/// Query template. `{location}` is substituted after validation.
const RUNNING_INSTANCES_QUERY: &str = r#"(
    resources
    | where type =~ 'microsoft.compute/virtualmachinescalesets'
    | where properties.virtualMachineProfile.priority != 'Spot'
    | project Size = tostring(sku.name), Capacity = toint(sku.capacity), Location = location
    | union (
        resources
        | where type =~ 'microsoft.compute/virtualmachines'
        | where properties.extended.instanceView.powerState.code != 'PowerState/deallocated'
        | where properties.priority != 'Spot'
        | project Size = tostring(properties.hardwareProfile.vmSize), Capacity = 1, Location = location
    )
)
| where Location =~ '{location}'
| summarize Capacity = sum(Capacity) by Size, Location
| order by Capacity desc"#;

/// The running instances query for one location.
pub fn running_instances_query(location: &str) -> String {
    RUNNING_INSTANCES_QUERY.replace("{location}", location)
}

/// Request body for one page of a Resource Graph query.
pub fn query_body(query: &str, skip_token: Option<&str>) -> Value {
    let mut options = json!({
        "resultFormat": "objectArray",
        "$top": config::GRAPH_PAGE_SIZE,
    });
    if let Some(token) = skip_token {
        options["$skipToken"] = Value::String(token.to_string());
    }
    json!({ "query": query, "options": options })
}

impl ArmApi {
    /// Running instance counts per SKU size in the location, largest first.
    ///
    /// The query is not filtered by VM family. Pages are followed through
    /// `$skipToken`.
    pub async fn query_running_instances(
        &self,
        location: &str,
    ) -> UtilizationResult<Vec<UsageQueryResult>> {
        validate_location(location)?;
        let query = running_instances_query(location);

        let mut results: Vec<UsageQueryResult> = Vec::new();
        let mut skip_token: Option<String> = None;
        let mut count_blocks_returned = 0;

        loop {
            let request = ArmRequest::post(
                ArmOperation::ResourceGraph,
                self.resource_graph_url(),
                query_body(&query, skip_token.as_deref()),
            )
            .with_location(location);
            let mut response = self.send(&request).await?;

            let data = take_property(&mut response, ArmOperation::ResourceGraph, "data")?;
            let block: Vec<UsageQueryResult> = serde_path_to_error::deserialize(data)
                .map_err(|e| UtilizationError::parse(ArmOperation::ResourceGraph.context(), e))?;

            log::debug!(
                "got block#{count_blocks_returned:2} record_count=+{count:3} => {total:3}",
                count = block.len(),
                total = results.len() + block.len(),
            );
            results.extend(block);

            let skip_token_new = match response.get("$skipToken").and_then(Value::as_str) {
                Some(token) if !token.is_empty() => token.to_string(),
                _ => break,
            };
            if skip_token.as_deref() == Some(skip_token_new.as_str()) {
                return Err(UtilizationError::InvalidProperty {
                    property: "$skipToken".to_string(),
                    value: "skip token not unique - possible infinite loop".to_string(),
                });
            }
            skip_token = Some(skip_token_new);
            count_blocks_returned += 1;
        }

        log::info!(
            "Got {count} sku sizes from resource graph in {location}",
            count = results.len()
        );
        Ok(results)
    }
}
