//! Utilization processing logic.
//!
//! This module contains the business logic on top of the Azure APIs:
//! - [`sku_cache`] - Per-scope SKU catalog cache
//! - [`usage`] - Current core usage of running instances
//! - [`reservation`] - Reserved cores per family
//! - [`aggregator`] - Joins quota, reservations and usage

mod aggregator;
mod reservation;
mod sku_cache;
mod usage;

// Re-export public types and functions
pub use aggregator::UtilizationAggregator;
pub use reservation::{family_reserved_cores, ReservationClient};
pub use sku_cache::SkuCatalogCache;
pub use usage::{family_cores, UsageQueryClient};
