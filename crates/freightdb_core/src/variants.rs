//! Typed values for the built-in record variants.

use crate::collection::RecordType;
use crate::error::CoreResult;
use crate::record::{FieldMap, Record};
use crate::schema::{builtin, RecordSchema};
use serde::{Deserialize, Serialize};

/// A carrier rate contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    /// Contract identifier.
    pub contract_number: String,
    /// Carrier name.
    pub carrier: String,
    /// Origin location.
    pub origin: String,
    /// Destination location.
    pub destination: String,
    /// Service level.
    pub service: String,
    /// Equipment type.
    pub equipment_type: String,
    /// Base rate.
    pub base_rate: String,
    /// Accessorial rate.
    pub accessorial_rate: String,
    /// Tender expiry date.
    pub tender_expiry: String,
}

impl Contract {
    /// A contract with its mandatory fields set and the rest empty.
    pub fn new(
        contract_number: impl Into<String>,
        carrier: impl Into<String>,
        origin: impl Into<String>,
    ) -> Self {
        Self {
            contract_number: contract_number.into(),
            carrier: carrier.into(),
            origin: origin.into(),
            ..Self::default()
        }
    }
}

/// A shipment load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Load {
    /// Load identifier.
    pub name: String,
    /// Carrier name.
    pub carrier: String,
    /// Ship date.
    pub ship_date: String,
    /// Delivery date.
    pub delivery_date: String,
    /// Shipment status.
    pub status: String,
    /// Equipment type.
    pub equipment_type: String,
    /// Amount billed.
    pub amount_billed: String,
    /// Amount paid.
    pub amount_paid: String,
    /// Mileage.
    pub mileage: String,
    /// Weight.
    pub weight: String,
}

impl Load {
    /// A load with its mandatory fields set and the rest empty.
    pub fn new(
        name: impl Into<String>,
        carrier: impl Into<String>,
        ship_date: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            carrier: carrier.into(),
            ship_date: ship_date.into(),
            ..Self::default()
        }
    }
}

fn fields<const N: usize>(pairs: [(&str, &String); N]) -> FieldMap {
    pairs
        .into_iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

fn take(fields: &mut FieldMap, name: &str) -> String {
    fields.remove(name).unwrap_or_default()
}

impl RecordType for Contract {
    fn schema() -> RecordSchema {
        builtin::contract()
    }

    fn record_id(&self) -> &str {
        &self.contract_number
    }

    fn to_fields(&self) -> FieldMap {
        fields([
            ("carrier", &self.carrier),
            ("origin", &self.origin),
            ("destination", &self.destination),
            ("service", &self.service),
            ("equipmentType", &self.equipment_type),
            ("baseRate", &self.base_rate),
            ("accessorialRate", &self.accessorial_rate),
            ("tenderExpiry", &self.tender_expiry),
        ])
    }

    fn from_record(record: Record) -> CoreResult<Self> {
        let contract_number = record.id().to_string();
        let mut f = record.into_fields();
        Ok(Self {
            contract_number,
            carrier: take(&mut f, "carrier"),
            origin: take(&mut f, "origin"),
            destination: take(&mut f, "destination"),
            service: take(&mut f, "service"),
            equipment_type: take(&mut f, "equipmentType"),
            base_rate: take(&mut f, "baseRate"),
            accessorial_rate: take(&mut f, "accessorialRate"),
            tender_expiry: take(&mut f, "tenderExpiry"),
        })
    }
}

impl RecordType for Load {
    fn schema() -> RecordSchema {
        builtin::load()
    }

    fn record_id(&self) -> &str {
        &self.name
    }

    fn to_fields(&self) -> FieldMap {
        fields([
            ("carrier", &self.carrier),
            ("shipDate", &self.ship_date),
            ("deliveryDate", &self.delivery_date),
            ("status", &self.status),
            ("equipmentType", &self.equipment_type),
            ("amountBilled", &self.amount_billed),
            ("amountPaid", &self.amount_paid),
            ("mileage", &self.mileage),
            ("weight", &self.weight),
        ])
    }

    fn from_record(record: Record) -> CoreResult<Self> {
        let name = record.id().to_string();
        let mut f = record.into_fields();
        Ok(Self {
            name,
            carrier: take(&mut f, "carrier"),
            ship_date: take(&mut f, "shipDate"),
            delivery_date: take(&mut f, "deliveryDate"),
            status: take(&mut f, "status"),
            equipment_type: take(&mut f, "equipmentType"),
            amount_billed: take(&mut f, "amountBilled"),
            amount_paid: take(&mut f, "amountPaid"),
            mileage: take(&mut f, "mileage"),
            weight: take(&mut f, "weight"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_maps_cover_schemas() {
        let contract = Contract::new("C-1", "ACME", "Memphis").to_fields();
        for field in Contract::schema().fields() {
            assert!(contract.contains_key(field.name()));
        }
        assert_eq!(contract.len(), Contract::schema().fields().len());

        let load = Load::new("L1", "ACME", "2024-03-01").to_fields();
        assert_eq!(load.len(), Load::schema().fields().len());
    }

    #[test]
    fn record_conversion() {
        let mut load = Load::new("L1", "ACME", "2024-03-01");
        load.weight = "42000".into();

        let record = load.to_record().unwrap();
        assert_eq!(record.field("shipDate"), Some("2024-03-01"));
        assert_eq!(Load::from_record(record).unwrap(), load);
    }

    #[test]
    fn json_uses_payload_field_names() {
        let contract = Contract::new("C-1", "ACME", "Memphis");
        let json = serde_json::to_value(&contract).unwrap();
        assert_eq!(json["contractNumber"], "C-1");
        assert_eq!(json["equipmentType"], "");
    }
}
