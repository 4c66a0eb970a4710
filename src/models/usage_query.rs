//! Running instance counts returned by the Resource Graph usage query.

use crate::error::{UtilizationError, UtilizationResult};
use serde::{Deserialize, Serialize};

/// Instances of one SKU running in one location.
///
/// `size`, `location` and `capacity` come from the query. `family` and
/// `cores_per_machine` are filled in from the SKU catalog afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageQueryResult {
    #[serde(rename = "Size", alias = "size")]
    pub size: String,
    #[serde(rename = "Location", alias = "location", default)]
    pub location: String,
    #[serde(rename = "Capacity", alias = "capacity")]
    pub capacity: i64,
    #[serde(rename = "CoresPerMachine", alias = "coresPerMachine", default)]
    pub cores_per_machine: i64,
    #[serde(rename = "Family", alias = "family", default)]
    pub family: String,
}

impl UsageQueryResult {
    pub fn total_cores(&self) -> UtilizationResult<i64> {
        self.capacity
            .checked_mul(self.cores_per_machine)
            .ok_or_else(|| UtilizationError::InvalidProperty {
                property: "Capacity".to_string(),
                value: format!("{} x {} cores of {}", self.capacity, self.cores_per_machine, self.size),
            })
    }
}
