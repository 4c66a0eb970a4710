//! Usage limits and the utilization response.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A ceiling together with how much of it is consumed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageLimit {
    pub limit: i64,
    pub usage: i64,
}

/// Core utilization of one VM family.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Utilization {
    /// Provider quota. `usage` here is the number reported by the quota service.
    pub quota: UsageLimit,
    /// Reserved cores as `limit`, cores of running instances as `usage`.
    pub reservation: UsageLimit,
}

/// Body returned by the utilization endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComputeUtilizationResponse {
    /// The requested VM family.
    pub name: String,
    pub location: String,
    pub subscription_id: Uuid,
    pub utilization: Utilization,
}

/// The `properties` block of a service-limit response.
///
/// The limit arrives either as a plain count or as a limit object carrying a
/// `value`; the consumed amount is named `usage` or `currentValue`.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct QuotaProperties {
    pub limit: LimitValue,
    #[serde(default, alias = "currentValue")]
    pub usage: Option<i64>,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(untagged)]
pub enum LimitValue {
    Count(i64),
    Object { value: i64 },
}

impl LimitValue {
    pub fn value(self) -> i64 {
        match self {
            LimitValue::Count(v) | LimitValue::Object { value: v } => v,
        }
    }
}

impl From<QuotaProperties> for UsageLimit {
    fn from(p: QuotaProperties) -> Self {
        UsageLimit {
            limit: p.limit.value(),
            usage: p.usage.unwrap_or(0),
        }
    }
}
