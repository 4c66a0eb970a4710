//! Compute SKU catalog model.

use crate::error::{UtilizationError, UtilizationResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Capability holding the number of virtual CPUs of a SKU.
pub const VCPUS_CAPABILITY: &str = "vCPUs";

const VIRTUAL_MACHINES: &str = "virtualMachines";

/// The (subscription, location) pair a SKU catalog belongs to.
///
/// Both parts are lower-cased so `WestEurope` and `westeurope` share a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SkuScope {
    pub subscription_id: String,
    pub location: String,
}

impl SkuScope {
    pub fn new(subscription_id: &str, location: &str) -> SkuScope {
        SkuScope {
            subscription_id: subscription_id.to_ascii_lowercase(),
            location: location.to_ascii_lowercase(),
        }
    }
}

impl fmt::Display for SkuScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription {} in {}", self.subscription_id, self.location)
    }
}

/// A single name/value capability of a SKU.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SkuCapability {
    pub name: String,
    pub value: String,
}

/// A catalog entry as listed by the compute SKUs API.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSku {
    #[serde(default)]
    pub resource_type: Option<String>,
    pub name: String,
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<SkuCapability>,
}

impl ResourceSku {
    fn is_virtual_machine(&self) -> bool {
        self.resource_type
            .as_deref()
            .map_or(false, |t| t.eq_ignore_ascii_case(VIRTUAL_MACHINES))
    }
}

/// Family and core count of one SKU.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SkuRecord {
    pub name: String,
    pub family: String,
    pub cores_per_machine: i64,
}

/// All SKUs available to one subscription in one location, indexed by name.
#[derive(Debug, Clone)]
pub struct SkuCatalog {
    scope: SkuScope,
    skus: HashMap<String, ResourceSku>,
}

impl SkuCatalog {
    /// Index a SKU listing.
    ///
    /// The listing covers every resource type of the location. When a name is
    /// listed more than once the `virtualMachines` entry wins, otherwise the
    /// first one listed.
    pub fn new(scope: SkuScope, listing: Vec<ResourceSku>) -> SkuCatalog {
        let mut skus: HashMap<String, ResourceSku> = HashMap::with_capacity(listing.len());
        for sku in listing {
            match skus.get(&sku.name) {
                Some(existing) if existing.is_virtual_machine() || !sku.is_virtual_machine() => {}
                _ => {
                    skus.insert(sku.name.clone(), sku);
                }
            }
        }
        SkuCatalog { scope, skus }
    }

    pub fn scope(&self) -> &SkuScope {
        &self.scope
    }

    pub fn len(&self) -> usize {
        self.skus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skus.is_empty()
    }

    /// Look up a SKU by its exact name.
    pub fn get(&self, sku: &str) -> UtilizationResult<&ResourceSku> {
        self.skus.get(sku).ok_or_else(|| UtilizationError::SkuNotFound {
            sku: sku.to_string(),
            scope: self.scope.clone(),
        })
    }

    /// Family of the SKU. Fails when the entry carries no family.
    pub fn family(&self, sku: &str) -> UtilizationResult<String> {
        self.get(sku)?
            .family
            .clone()
            .ok_or_else(|| UtilizationError::MissingProperty {
                context: "sku catalog",
                property: format!("{sku}.family"),
            })
    }

    /// Virtual CPUs per machine, 0 when the SKU has no `vCPUs` capability.
    pub fn core_count(&self, sku: &str) -> UtilizationResult<i64> {
        let entry = self.get(sku)?;
        match entry
            .capabilities
            .iter()
            .find(|c| c.name == VCPUS_CAPABILITY)
        {
            None => Ok(0),
            Some(capability) => capability.value.trim().parse::<i64>().map_err(|_| {
                UtilizationError::InvalidProperty {
                    property: format!("{sku}.{VCPUS_CAPABILITY}"),
                    value: capability.value.clone(),
                }
            }),
        }
    }

    pub fn record(&self, sku: &str) -> UtilizationResult<SkuRecord> {
        Ok(SkuRecord {
            name: sku.to_string(),
            family: self.family(sku)?,
            cores_per_machine: self.core_count(sku)?,
        })
    }
}
