//! Current core usage from running instances.

use super::sku_cache::SkuCatalogCache;
use crate::azure::ArmApi;
use crate::error::{UtilizationError, UtilizationResult};
use crate::models::UsageQueryResult;
use std::sync::Arc;

/// Sum of `capacity * cores_per_machine` over results of the VM family.
///
/// # Arguments
/// * `results` - Query results with family and cores per machine filled in
/// * `vm_type` - VM family, compared case-insensitively
///
/// # Returns
/// The core count, or `InvalidProperty` if it does not fit in an `i64`
pub fn family_cores(results: &[UsageQueryResult], vm_type: &str) -> UtilizationResult<i64> {
    results
        .iter()
        .filter(|r| r.family.eq_ignore_ascii_case(vm_type))
        .try_fold(0i64, |total, r| {
            let cores = r.total_cores()?;
            total
                .checked_add(cores)
                .ok_or_else(|| UtilizationError::InvalidProperty {
                    property: "Capacity".to_string(),
                    value: format!("{vm_type} total above {}", i64::MAX),
                })
        })
}

/// Counts the cores of running instances through Resource Graph.
pub struct UsageQueryClient {
    api: ArmApi,
    skus: Arc<SkuCatalogCache>,
}

impl UsageQueryClient {
    pub fn new(api: ArmApi, skus: Arc<SkuCatalogCache>) -> UsageQueryClient {
        UsageQueryClient { api, skus }
    }

    /// Running instances per SKU size in the location, with family and cores
    /// per machine resolved from the subscription's SKU catalog.
    ///
    /// A size missing from the catalog fails the whole query.
    pub async fn query_running_instances(
        &self,
        subscription_id: &str,
        location: &str,
    ) -> UtilizationResult<Vec<UsageQueryResult>> {
        let mut results = self.api.query_running_instances(location).await?;
        if results.is_empty() {
            return Ok(results);
        }

        let catalog = self.skus.ensure_loaded(subscription_id, location).await?;
        for result in results.iter_mut() {
            let record = catalog.record(&result.size)?;
            result.family = record.family;
            result.cores_per_machine = record.cores_per_machine;
        }
        Ok(results)
    }

    /// Cores currently used by running instances of the VM family.
    pub async fn current_usage(
        &self,
        vm_type: &str,
        location: &str,
        subscription_id: &str,
    ) -> UtilizationResult<i64> {
        let results = self
            .query_running_instances(subscription_id, location)
            .await?;
        let cores = family_cores(&results, vm_type)?;
        log::info!(
            "Current usage {vm_type} in {location}: {cores} cores over {count} sizes",
            count = results.len()
        );
        Ok(cores)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::azure::ArmOperation;
    use crate::config;
    use crate::test_support::StaticTransport;
    use serde_json::json;

    const SUB: &str = "00000000-0000-0000-0000-000000000001";

    fn client(transport: Arc<StaticTransport>) -> UsageQueryClient {
        let api = ArmApi::new(transport, config::MANAGEMENT_ENDPOINT);
        let skus = Arc::new(SkuCatalogCache::new(api.clone()));
        UsageQueryClient::new(api, skus)
    }

    fn dv5_ev5_catalog() -> serde_json::Value {
        json!({"value": [
            {"name": "Dv5_v5", "family": "Dv5", "capabilities": [{"name": "vCPUs", "value": "4"}]},
            {"name": "Ev5_v5", "family": "Ev5", "capabilities": [{"name": "vCPUs", "value": "8"}]}
        ]})
    }

    #[tokio::test]
    async fn test_usage_counts_only_requested_family() {
        let transport = StaticTransport::new()
            .respond(ArmOperation::SkuCatalog, dv5_ev5_catalog())
            .respond(
                ArmOperation::ResourceGraph,
                json!({"data": [
                    {"size": "Dv5_v5", "location": "westeurope", "capacity": 3},
                    {"size": "Ev5_v5", "location": "westeurope", "capacity": 2}
                ]}),
            );
        let client = client(Arc::new(transport));

        let usage = client
            .current_usage("Dv5", "westeurope", SUB)
            .await
            .expect("usage");
        assert_eq!(usage, 12);
    }

    #[tokio::test]
    async fn test_results_are_enriched() {
        let transport = StaticTransport::new()
            .respond(ArmOperation::SkuCatalog, dv5_ev5_catalog())
            .respond(
                ArmOperation::ResourceGraph,
                json!({"data": [{"Size": "Ev5_v5", "Location": "westeurope", "Capacity": 2}]}),
            );
        let client = client(Arc::new(transport));

        let results = client
            .query_running_instances(SUB, "westeurope")
            .await
            .expect("results");
        assert_eq!(results[0].family, "Ev5");
        assert_eq!(results[0].cores_per_machine, 8);
        assert_eq!(results[0].total_cores().expect("cores"), 16);
    }

    #[tokio::test]
    async fn test_unknown_size_fails_query() {
        let transport = StaticTransport::new()
            .respond(ArmOperation::SkuCatalog, dv5_ev5_catalog())
            .respond(
                ArmOperation::ResourceGraph,
                json!({"data": [
                    {"Size": "Dv5_v5", "Location": "westeurope", "Capacity": 3},
                    {"Size": "Mystery_v1", "Location": "westeurope", "Capacity": 1}
                ]}),
            );
        let client = client(Arc::new(transport));

        let err = client
            .current_usage("Dv5", "westeurope", SUB)
            .await
            .expect_err("unknown sku");
        match err {
            UtilizationError::SkuNotFound { sku, .. } => assert_eq!(sku, "Mystery_v1"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_instances_skips_catalog() {
        let transport = Arc::new(
            StaticTransport::new().respond(ArmOperation::ResourceGraph, json!({"data": []})),
        );
        let client = client(transport.clone());

        assert_eq!(
            client
                .current_usage("Dv5", "westeurope", SUB)
                .await
                .expect("usage"),
            0
        );
        assert_eq!(transport.calls(ArmOperation::SkuCatalog), 0);
    }

    #[test]
    fn test_family_cores_is_case_insensitive() {
        let results = vec![
            UsageQueryResult {
                size: "Standard_D4s_v5".to_string(),
                location: "westeurope".to_string(),
                capacity: 3,
                cores_per_machine: 4,
                family: "standardDSv5Family".to_string(),
            },
            UsageQueryResult {
                size: "Standard_E8s_v5".to_string(),
                location: "westeurope".to_string(),
                capacity: 2,
                cores_per_machine: 8,
                family: "standardESv5Family".to_string(),
            },
        ];
        assert_eq!(family_cores(&results, "STANDARDDSV5FAMILY").expect("dsv5"), 12);
        assert_eq!(family_cores(&results, "standardFSv2Family").expect("fsv2"), 0);
    }

    #[test]
    fn test_family_cores_overflow() {
        let row = UsageQueryResult {
            size: "Standard_D4s_v5".to_string(),
            capacity: i64::MAX / 4,
            cores_per_machine: 4,
            family: "standardDSv5Family".to_string(),
            ..Default::default()
        };
        let err = family_cores(&[row.clone(), row], "standardDSv5Family").expect_err("overflow");
        assert!(matches!(err, UtilizationError::InvalidProperty { .. }));
    }
}
