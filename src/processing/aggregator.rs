//! Utilization aggregation.
//!
//! Fans out to the quota, reservation and usage lookups concurrently and joins
//! them into one [`Utilization`]. The first failure aborts the request.

use super::reservation::ReservationClient;
use super::sku_cache::SkuCatalogCache;
use super::usage::UsageQueryClient;
use crate::azure::{validate_location, validate_vm_type, ArmApi};
use crate::error::{UtilizationError, UtilizationResult};
use crate::models::{ComputeUtilizationResponse, UsageLimit, Utilization};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Produces quota, reservation and usage figures for a VM family.
pub struct UtilizationAggregator {
    api: ArmApi,
    skus: Arc<SkuCatalogCache>,
    usage: UsageQueryClient,
    reservations: ReservationClient,
    request_timeout: Duration,
}

impl UtilizationAggregator {
    /// Build an aggregator with its own SKU cache.
    pub fn new(api: ArmApi, request_timeout: Duration) -> UtilizationAggregator {
        let skus = Arc::new(SkuCatalogCache::new(api.clone()));
        UtilizationAggregator {
            usage: UsageQueryClient::new(api.clone(), Arc::clone(&skus)),
            reservations: ReservationClient::new(api.clone(), Arc::clone(&skus)),
            api,
            skus,
            request_timeout,
        }
    }

    pub fn sku_cache(&self) -> &Arc<SkuCatalogCache> {
        &self.skus
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Core quota as stated by the service-limits API.
    pub async fn core_quota(
        &self,
        vm_type: &str,
        subscription_id: &str,
        location: &str,
    ) -> UtilizationResult<UsageLimit> {
        self.api.core_quota(vm_type, subscription_id, location).await
    }

    /// Reserved cores as limit, running cores as usage.
    pub async fn reservation_usage(
        &self,
        vm_type: &str,
        subscription_id: &str,
        location: &str,
    ) -> UtilizationResult<UsageLimit> {
        let (limit, usage) = futures::try_join!(
            self.reservations
                .reserved_cores_for_family(vm_type, location, subscription_id),
            self.usage.current_usage(vm_type, location, subscription_id),
        )?;
        Ok(UsageLimit { limit, usage })
    }

    /// Quota and reservation usage of the VM family, within the request deadline.
    ///
    /// # Arguments
    /// * `vm_type` - VM family name
    /// * `subscription_id` - Subscription to report on
    /// * `location` - Azure region
    ///
    /// # Returns
    /// The utilization, or the first error of any lookup. `Timeout` when the
    /// deadline passes first.
    pub async fn get_utilization(
        &self,
        vm_type: &str,
        subscription_id: &str,
        location: &str,
    ) -> UtilizationResult<Utilization> {
        validate_vm_type(vm_type)?;
        validate_location(location)?;

        let work = async {
            let (quota, reservation) = futures::try_join!(
                self.core_quota(vm_type, subscription_id, location),
                self.reservation_usage(vm_type, subscription_id, location),
            )?;
            Ok::<_, UtilizationError>(Utilization { quota, reservation })
        };

        match tokio::time::timeout(self.request_timeout, work).await {
            Ok(result) => result,
            Err(_) => {
                log::warn!(
                    "Utilization {vm_type} in {location} exceeded {:?}",
                    self.request_timeout
                );
                Err(UtilizationError::Timeout(self.request_timeout))
            }
        }
    }

    /// The full endpoint response for one (subscription, location, family).
    pub async fn compute_utilization(
        &self,
        subscription_id: Uuid,
        location: &str,
        vm_type: &str,
    ) -> UtilizationResult<ComputeUtilizationResponse> {
        let utilization = self
            .get_utilization(vm_type, &subscription_id.to_string(), location)
            .await?;
        Ok(ComputeUtilizationResponse {
            name: vm_type.to_string(),
            location: location.to_string(),
            subscription_id,
            utilization,
        })
    }
}
