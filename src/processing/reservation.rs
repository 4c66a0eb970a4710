//! Reserved cores from reservation-backed commitments.

use super::sku_cache::SkuCatalogCache;
use crate::azure::ArmApi;
use crate::error::{UtilizationError, UtilizationResult};
use crate::models::Reservation;
use std::sync::Arc;

/// Sum of `quantity * cores_per_machine` over reservations of the VM family.
pub fn family_reserved_cores(
    reservations: &[Reservation],
    vm_type: &str,
) -> UtilizationResult<i64> {
    reservations
        .iter()
        .filter(|r| r.sku.family.eq_ignore_ascii_case(vm_type))
        .try_fold(0i64, |total, r| {
            let cores = r.reserved_cores()?;
            total
                .checked_add(cores)
                .ok_or_else(|| UtilizationError::InvalidProperty {
                    property: "properties.quantity".to_string(),
                    value: format!("{vm_type} total above {}", i64::MAX),
                })
        })
}

/// Resolves reservations of the caller into reserved cores per family.
pub struct ReservationClient {
    api: ArmApi,
    skus: Arc<SkuCatalogCache>,
}

impl ReservationClient {
    pub fn new(api: ArmApi, skus: Arc<SkuCatalogCache>) -> ReservationClient {
        ReservationClient { api, skus }
    }

    /// Every reservation visible to the caller, unfiltered.
    pub async fn list_reservations(&self) -> UtilizationResult<Vec<Reservation>> {
        self.api.list_reservations().await
    }

    /// Cores reserved for the VM family in the location.
    ///
    /// Location and family are compared case-insensitively. Reservations for
    /// other resource types or in an inactive state are skipped before their
    /// SKU is resolved.
    pub async fn reserved_cores_for_family(
        &self,
        vm_type: &str,
        location: &str,
        subscription_id: &str,
    ) -> UtilizationResult<i64> {
        let reservations = self.list_reservations().await?;
        let total = reservations.len();

        let mut in_location: Vec<Reservation> = reservations
            .into_iter()
            .filter(|r| r.location.eq_ignore_ascii_case(location))
            .collect();
        let located = in_location.len();
        in_location.retain(Reservation::is_active_vm_reservation);
        log::debug!(
            "reservations: {total} total, {located} in {location}, {active} active for virtual machines",
            active = in_location.len()
        );

        if !in_location.is_empty() {
            let catalog = self.skus.ensure_loaded(subscription_id, location).await?;
            for reservation in in_location.iter_mut() {
                let record = catalog.record(&reservation.sku.name)?;
                reservation.sku.family = record.family;
                reservation.cores_per_machine = record.cores_per_machine;
            }
        }

        let cores = family_reserved_cores(&in_location, vm_type)?;
        log::info!("Reserved cores {vm_type} in {location}: {cores}");
        Ok(cores)
    }
}
