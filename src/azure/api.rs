//! Typed access to the Azure APIs used for utilization.
//!
//! [`ArmApi`] builds the request URLs, follows pagination and turns the JSON
//! responses into model types. The Resource Graph query lives in
//! [`super::graph`].

use super::transport::{ArmOperation, ArmRequest, ArmTransport};
use crate::config;
use crate::error::{UtilizationError, UtilizationResult};
use crate::models::{QuotaProperties, Reservation, ResourceSku, UsageLimit};
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

static LOCATION_REGEX: OnceLock<Regex> = OnceLock::new();
static VM_TYPE_REGEX: OnceLock<Regex> = OnceLock::new();

fn get_location_regex() -> &'static Regex {
    LOCATION_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9]+$").expect("Invalid Regex"))
}

fn get_vm_type_regex() -> &'static Regex {
    VM_TYPE_REGEX.get_or_init(|| Regex::new(r"^[A-Za-z0-9_\-]+$").expect("Invalid Regex"))
}

/// Reject locations that could break out of a URL or query string.
pub fn validate_location(location: &str) -> UtilizationResult<()> {
    if get_location_regex().is_match(location) {
        Ok(())
    } else {
        Err(UtilizationError::InvalidInput(format!(
            "location '{location}' must be alphanumeric"
        )))
    }
}

/// Reject VM family names that could break out of a URL.
pub fn validate_vm_type(vm_type: &str) -> UtilizationResult<()> {
    if get_vm_type_regex().is_match(vm_type) {
        Ok(())
    } else {
        Err(UtilizationError::InvalidInput(format!(
            "vm type '{vm_type}' may only contain letters, digits, '_' and '-'"
        )))
    }
}

/// Remove a top level property from a response object.
pub fn take_property(
    value: &mut Value,
    operation: ArmOperation,
    property: &str,
) -> UtilizationResult<Value> {
    match value.as_object_mut().and_then(|o| o.remove(property)) {
        Some(Value::Null) | None => Err(UtilizationError::MissingProperty {
            context: operation.context(),
            property: property.to_string(),
        }),
        Some(v) => Ok(v),
    }
}

/// Client for Azure Resource Manager on top of an [`ArmTransport`].
#[derive(Clone)]
pub struct ArmApi {
    transport: Arc<dyn ArmTransport>,
    endpoint: String,
}

impl ArmApi {
    pub fn new(transport: Arc<dyn ArmTransport>, endpoint: &str) -> ArmApi {
        ArmApi {
            transport,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) async fn send(&self, request: &ArmRequest) -> UtilizationResult<Value> {
        self.transport.send(request).await
    }

    pub fn service_limit_url(&self, subscription_id: &str, location: &str, vm_type: &str) -> String {
        format!(
            "{endpoint}/subscriptions/{subscription_id}/providers/Microsoft.Capacity/resourceProviders/Microsoft.Compute/locations/{location}/serviceLimits/{vm_type}?api-version={version}",
            endpoint = self.endpoint,
            version = config::SERVICE_LIMITS_API_VERSION
        )
    }

    pub fn skus_url(&self, subscription_id: &str, location: &str) -> String {
        format!(
            "{endpoint}/subscriptions/{subscription_id}/providers/Microsoft.Compute/skus?api-version={version}&$filter=location%20eq%20'{location}'",
            endpoint = self.endpoint,
            version = config::SKUS_API_VERSION
        )
    }

    pub fn reservations_url(&self) -> String {
        format!(
            "{endpoint}/providers/Microsoft.Capacity/reservations?api-version={version}",
            endpoint = self.endpoint,
            version = config::RESERVATIONS_API_VERSION
        )
    }

    pub fn resource_graph_url(&self) -> String {
        format!(
            "{endpoint}/providers/Microsoft.ResourceGraph/resources?api-version={version}",
            endpoint = self.endpoint,
            version = config::RESOURCE_GRAPH_API_VERSION
        )
    }

    /// Core quota of a VM family as stated by the service-limits API.
    ///
    /// # Arguments
    /// * `vm_type` - VM family name, e.g. `standardDSv5Family`
    /// * `subscription_id` - Subscription the quota belongs to
    /// * `location` - Azure region, e.g. `westeurope`
    ///
    /// # Returns
    /// The quota limit and the usage the quota service reports
    pub async fn core_quota(
        &self,
        vm_type: &str,
        subscription_id: &str,
        location: &str,
    ) -> UtilizationResult<UsageLimit> {
        validate_vm_type(vm_type)?;
        validate_location(location)?;

        let request = ArmRequest::get(
            ArmOperation::ServiceLimit,
            self.service_limit_url(subscription_id, location, vm_type),
        )
        .with_location(location);
        let mut response = self.send(&request).await?;

        let properties = take_property(&mut response, ArmOperation::ServiceLimit, "properties")?;
        if properties.get("limit").map_or(true, Value::is_null) {
            return Err(UtilizationError::MissingProperty {
                context: ArmOperation::ServiceLimit.context(),
                property: "properties.limit".to_string(),
            });
        }
        let properties: QuotaProperties = serde_path_to_error::deserialize(properties)
            .map_err(|e| UtilizationError::parse(ArmOperation::ServiceLimit.context(), e))?;

        let quota = UsageLimit::from(properties);
        log::debug!("quota {vm_type} in {location}: {quota:?}");
        Ok(quota)
    }

    /// Every SKU listed for the subscription in the location.
    pub async fn list_skus(
        &self,
        subscription_id: &str,
        location: &str,
    ) -> UtilizationResult<Vec<ResourceSku>> {
        validate_location(location)?;

        let request = ArmRequest::get(
            ArmOperation::SkuCatalog,
            self.skus_url(subscription_id, location),
        )
        .with_location(location);
        let entries = self.collect_pages(request).await?;

        let skus: Vec<ResourceSku> = serde_path_to_error::deserialize(Value::Array(entries))
            .map_err(|e| UtilizationError::parse(ArmOperation::SkuCatalog.context(), e))?;
        log::info!(
            "Fetched {count} skus for subscription {subscription_id} in {location}",
            count = skus.len()
        );
        Ok(skus)
    }

    /// Every reservation visible to the caller.
    pub async fn list_reservations(&self) -> UtilizationResult<Vec<Reservation>> {
        let request = ArmRequest::get(ArmOperation::Reservations, self.reservations_url());
        let entries = self.collect_pages(request).await?;

        let reservations = entries
            .iter()
            .map(Reservation::from_value)
            .collect::<UtilizationResult<Vec<Reservation>>>()?;
        log::info!("Fetched {} reservations", reservations.len());
        Ok(reservations)
    }

    /// Follow `nextLink` and concatenate the `value` arrays of all pages.
    async fn collect_pages(&self, first: ArmRequest) -> UtilizationResult<Vec<Value>> {
        let operation = first.operation;
        let mut entries: Vec<Value> = Vec::new();
        let mut seen_links: HashSet<String> = HashSet::new();
        let mut request = first;
        let mut page = 0;

        loop {
            let mut response = self.send(&request).await?;
            let value = take_property(&mut response, operation, "value")?;
            match value {
                Value::Array(items) => {
                    log::debug!("{operation} page#{page} +{count}", count = items.len());
                    entries.extend(items);
                }
                other => {
                    return Err(UtilizationError::InvalidProperty {
                        property: "value".to_string(),
                        value: format!("expected array in {operation} response, got {other}"),
                    })
                }
            }

            let next_link = match response.get("nextLink").and_then(Value::as_str) {
                Some(link) if !link.is_empty() => link.to_string(),
                _ => break,
            };
            if !seen_links.insert(next_link.clone()) {
                return Err(UtilizationError::InvalidProperty {
                    property: "nextLink".to_string(),
                    value: format!("{next_link} repeated - possible infinite loop"),
                });
            }

            let mut next = ArmRequest::get(operation, next_link);
            next.location = request.location.take();
            request = next;
            page += 1;
        }

        Ok(entries)
    }
}
