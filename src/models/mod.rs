//! Domain models for compute utilization.
//!
//! This module contains the data structures shared by the Azure wire layer and
//! the processing logic:
//! - [`UsageLimit`], [`Utilization`] and [`ComputeUtilizationResponse`] - the response
//! - [`ResourceSku`], [`SkuCatalog`] and [`SkuRecord`] - the SKU catalog
//! - [`UsageQueryResult`] - running instance counts from Resource Graph
//! - [`Reservation`] - reservation-backed capacity commitments

mod reservation;
mod sku;
mod usage;
mod usage_query;

// Re-export public types
pub use reservation::{Reservation, ReservationSku};
pub use sku::{ResourceSku, SkuCapability, SkuCatalog, SkuRecord, SkuScope, VCPUS_CAPABILITY};
pub use usage::{ComputeUtilizationResponse, LimitValue, QuotaProperties, UsageLimit, Utilization};
pub use usage_query::UsageQueryResult;
