//! SKU catalog cache.
//!
//! Catalogs are cached per (subscription, location) for the lifetime of the
//! cache. Each scope is loaded at most once even when many requests ask for it
//! at the same time; a failed load leaves the scope empty so the next request
//! tries again.

use crate::azure::ArmApi;
use crate::error::{UtilizationError, UtilizationResult};
use crate::models::{SkuCatalog, SkuRecord, SkuScope};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

type CatalogCell = Arc<OnceCell<Arc<SkuCatalog>>>;

/// Lazily loaded SKU catalogs keyed by scope.
pub struct SkuCatalogCache {
    api: ArmApi,
    scopes: Mutex<HashMap<SkuScope, CatalogCell>>,
}

impl SkuCatalogCache {
    pub fn new(api: ArmApi) -> SkuCatalogCache {
        SkuCatalogCache {
            api,
            scopes: Mutex::new(HashMap::new()),
        }
    }

    async fn cell(&self, scope: &SkuScope) -> CatalogCell {
        let mut scopes = self.scopes.lock().await;
        scopes.entry(scope.clone()).or_default().clone()
    }

    /// The catalog of the scope, fetching it on first use.
    ///
    /// # Arguments
    /// * `subscription_id` - Subscription whose SKUs are listed
    /// * `location` - Azure region, matched case-insensitively
    ///
    /// # Returns
    /// The shared catalog. Concurrent callers for the same scope share one fetch.
    pub async fn ensure_loaded(
        &self,
        subscription_id: &str,
        location: &str,
    ) -> UtilizationResult<Arc<SkuCatalog>> {
        let scope = SkuScope::new(subscription_id, location);
        let cell = self.cell(&scope).await;
        let api = &self.api;

        let catalog = cell
            .get_or_try_init(|| async move {
                log::info!("Sku cache miss for {scope}, fetching catalog");
                let skus = api.list_skus(subscription_id, location).await?;
                Ok::<_, UtilizationError>(Arc::new(SkuCatalog::new(scope, skus)))
            })
            .await?;
        Ok(Arc::clone(catalog))
    }

    pub async fn resolve_family(
        &self,
        subscription_id: &str,
        location: &str,
        sku: &str,
    ) -> UtilizationResult<String> {
        self.ensure_loaded(subscription_id, location)
            .await?
            .family(sku)
    }

    pub async fn resolve_core_count(
        &self,
        subscription_id: &str,
        location: &str,
        sku: &str,
    ) -> UtilizationResult<i64> {
        self.ensure_loaded(subscription_id, location)
            .await?
            .core_count(sku)
    }

    /// Family and core count of a SKU in one lookup.
    pub async fn resolve(
        &self,
        subscription_id: &str,
        location: &str,
        sku: &str,
    ) -> UtilizationResult<SkuRecord> {
        self.ensure_loaded(subscription_id, location)
            .await?
            .record(sku)
    }

    /// Drop the catalog of one scope. Returns whether it was cached.
    pub async fn invalidate(&self, subscription_id: &str, location: &str) -> bool {
        let scope = SkuScope::new(subscription_id, location);
        let removed = self.scopes.lock().await.remove(&scope);
        let was_loaded = removed.map_or(false, |cell| cell.initialized());
        if was_loaded {
            log::info!("Invalidated sku catalog for {scope}");
        }
        was_loaded
    }

    /// Drop every cached catalog.
    pub async fn reset(&self) {
        let mut scopes = self.scopes.lock().await;
        log::info!("Resetting sku cache ({} scopes)", scopes.len());
        scopes.clear();
    }

    /// Scopes whose catalog is loaded, sorted.
    pub async fn loaded_scopes(&self) -> Vec<SkuScope> {
        let scopes = self.scopes.lock().await;
        let mut loaded: Vec<SkuScope> = scopes
            .iter()
            .filter(|(_, cell)| cell.initialized())
            .map(|(scope, _)| scope.clone())
            .collect();
        loaded.sort();
        loaded
    }
}
