//! Reservation model.
//!
//! The reservations API reports the reserved instance count under the nested
//! `properties` object rather than on the reservation itself. Parsing is done in
//! two explicit steps: the first-class fields are deserialized, then the
//! quantity is read from [`QUANTITY_POINTER`].

use crate::error::{UtilizationError, UtilizationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON pointer of the reserved instance count inside a reservation.
pub const QUANTITY_POINTER: &str = "/properties/quantity";
const RESOURCE_TYPE_POINTER: &str = "/properties/reservedResourceType";
const PROVISIONING_STATE_POINTER: &str = "/properties/provisioningState";
const DISPLAY_STATE_POINTER: &str = "/properties/displayProvisioningState";

const VIRTUAL_MACHINES: &str = "VirtualMachines";
const INACTIVE_STATES: [&str; 3] = ["Cancelled", "Expired", "Failed"];

/// SKU of a reservation. `family` is filled in from the SKU catalog.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationSku {
    pub name: String,
    #[serde(default)]
    pub family: String,
}

/// A reservation-backed capacity commitment.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    #[serde(default)]
    pub id: String,
    /// Empty for reservations not tied to a region.
    #[serde(default)]
    pub location: String,
    #[serde(skip)]
    pub quantity: i64,
    #[serde(skip)]
    pub cores_per_machine: i64,
    pub sku: ReservationSku,
    #[serde(skip)]
    pub reserved_resource_type: Option<String>,
    #[serde(skip)]
    pub provisioning_state: Option<String>,
}

impl Reservation {
    /// Parse one element of the reservations listing.
    ///
    /// A reservation without `properties.quantity` has a quantity of 0.
    pub fn from_value(value: &Value) -> UtilizationResult<Reservation> {
        let mut reservation: Reservation = serde_path_to_error::deserialize(value)
            .map_err(|e| UtilizationError::parse("reservation", e))?;

        reservation.quantity = match value.pointer(QUANTITY_POINTER) {
            None | Some(Value::Null) => 0,
            Some(quantity) => quantity_value(quantity)?,
        };
        reservation.reserved_resource_type = string_at(value, RESOURCE_TYPE_POINTER);
        reservation.provisioning_state = string_at(value, DISPLAY_STATE_POINTER)
            .or_else(|| string_at(value, PROVISIONING_STATE_POINTER));

        Ok(reservation)
    }

    /// Whether this reservation can back virtual machine cores.
    ///
    /// Reservations that do not state a resource type or a state are kept.
    pub fn is_active_vm_reservation(&self) -> bool {
        let vm = self
            .reserved_resource_type
            .as_deref()
            .map_or(true, |t| t.eq_ignore_ascii_case(VIRTUAL_MACHINES));
        let active = self.provisioning_state.as_deref().map_or(true, |state| {
            !INACTIVE_STATES
                .iter()
                .any(|inactive| state.eq_ignore_ascii_case(inactive))
        });
        vm && active
    }

    pub fn reserved_cores(&self) -> UtilizationResult<i64> {
        self.quantity
            .checked_mul(self.cores_per_machine)
            .ok_or_else(|| UtilizationError::InvalidProperty {
                property: "properties.quantity".to_string(),
                value: format!("{} x {} cores", self.quantity, self.cores_per_machine),
            })
    }
}

fn quantity_value(quantity: &Value) -> UtilizationResult<i64> {
    let parsed = match quantity {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| UtilizationError::InvalidProperty {
        property: "properties.quantity".to_string(),
        value: quantity.to_string(),
    })
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quantity_comes_from_properties() {
        let value = json!({
            "id": "/providers/microsoft.capacity/reservationOrders/o1/reservations/r1",
            "name": "o1/r1",
            "location": "westeurope",
            "quantity": 99,
            "sku": {"name": "Standard_D4s_v5"},
            "properties": {
                "quantity": 2,
                "reservedResourceType": "VirtualMachines",
                "provisioningState": "Succeeded"
            }
        });
        let reservation = Reservation::from_value(&value).expect("reservation");
        assert_eq!(reservation.quantity, 2);
        assert_eq!(reservation.sku.name, "Standard_D4s_v5");
        assert_eq!(reservation.location, "westeurope");
        assert!(reservation.is_active_vm_reservation());
    }

    #[test]
    fn test_missing_quantity_is_zero() {
        let value = json!({
            "id": "r2",
            "location": "eastus",
            "sku": {"name": "Standard_E8s_v5"}
        });
        let reservation = Reservation::from_value(&value).expect("reservation");
        assert_eq!(reservation.quantity, 0);
        assert!(reservation.is_active_vm_reservation());
    }

    #[test]
    fn test_string_quantity() {
        let value = json!({
            "location": "eastus",
            "sku": {"name": "Standard_E8s_v5"},
            "properties": {"quantity": "3"}
        });
        assert_eq!(Reservation::from_value(&value).expect("reservation").quantity, 3);
    }

    #[test]
    fn test_bad_quantity() {
        let value = json!({
            "location": "eastus",
            "sku": {"name": "Standard_E8s_v5"},
            "properties": {"quantity": {"n": 1}}
        });
        let err = Reservation::from_value(&value).expect_err("object quantity");
        assert!(matches!(err, UtilizationError::InvalidProperty { .. }));
    }

    #[test]
    fn test_missing_sku_is_parse_error() {
        let value = json!({"id": "r3", "location": "eastus"});
        let err = Reservation::from_value(&value).expect_err("no sku");
        assert!(matches!(err, UtilizationError::Parse { .. }));
    }

    #[test]
    fn test_inactive_and_non_vm_reservations() {
        let expired = Reservation::from_value(&json!({
            "location": "eastus",
            "sku": {"name": "Standard_E8s_v5"},
            "properties": {"quantity": 1, "displayProvisioningState": "Expired", "provisioningState": "Succeeded"}
        }))
        .expect("expired reservation");
        assert!(!expired.is_active_vm_reservation());

        let sql = Reservation::from_value(&json!({
            "location": "eastus",
            "sku": {"name": "SQLDB_GP_Compute_Gen5"},
            "properties": {"quantity": 8, "reservedResourceType": "SqlDatabases"}
        }))
        .expect("sql reservation");
        assert!(!sql.is_active_vm_reservation());
    }

    #[test]
    fn test_reserved_cores() {
        let reservation = Reservation {
            quantity: 2,
            cores_per_machine: 4,
            ..Default::default()
        };
        assert_eq!(reservation.reserved_cores().expect("cores"), 8);
    }

    #[test]
    fn test_reserved_cores_overflow() {
        let reservation = Reservation {
            quantity: i64::MAX,
            cores_per_machine: 4,
            ..Default::default()
        };
        let err = reservation.reserved_cores().expect_err("overflow");
        assert!(matches!(err, UtilizationError::InvalidProperty { .. }));
    }

    #[test]
    fn test_missing_location_is_empty() {
        let value = json!({
            "id": "r4",
            "sku": {"name": "SUSE_Linux"},
            "properties": {"quantity": 1, "reservedResourceType": "SuseLinux"}
        });
        let reservation = Reservation::from_value(&value).expect("reservation without location");
        assert!(reservation.location.is_empty());
        assert!(!reservation.is_active_vm_reservation());
    }
}
