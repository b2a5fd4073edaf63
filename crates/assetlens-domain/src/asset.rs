//! Persisted inventory asset

use crate::attribute::{AttributeField, AttributeSet};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of an asset row
pub type AssetId = Uuid;

/// An inventory asset as stored in the `asset` table
///
/// Only the attribute fields (see [`AttributeField`]) are ever changed by the
/// pipeline; everything else is carried through for export enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Unique identifier
    pub id: AssetId,
    /// Human-facing asset number
    pub asset_number: String,
    /// Owning organization
    pub organization_id: Uuid,
    /// Assigned collaborator, if any
    pub assignee_id: Option<Uuid>,
    /// Asset type reference
    pub asset_type_id: Uuid,
    /// Free-text model description, the extraction input
    pub model: Option<String>,
    /// Device color
    pub color: Option<String>,
    /// Display size
    pub display_size: Option<String>,
    /// Keyboard layout
    pub keyboard: Option<String>,
    /// Manufacturer
    pub make: Option<String>,
    /// Installed memory
    pub memory: Option<String>,
    /// Manufacturer model number
    pub model_number: Option<String>,
    /// Operating system
    pub operating_system: Option<String>,
    /// Processor
    pub processor: Option<String>,
    /// Processor frequency
    pub processor_frequency: Option<String>,
    /// Storage capacity
    pub storage: Option<String>,
    /// Storage technology
    pub storage_type: Option<String>,
    /// Serial number
    pub serial_number: Option<String>,
    /// Lifecycle status
    pub status: String,
    /// Cosmetic condition grade
    pub cosmetic_condition: Option<String>,
    /// Technical functionality grade
    pub technical_functionality: Option<String>,
    /// Free-text note left by the customer
    pub customer_note: Option<String>,
    /// IMEI for cellular devices
    pub imei_number: Option<String>,
    /// Whether a charger is included
    pub has_charger: bool,
    /// Purchase date
    pub purchase_date: Option<DateTime<Utc>>,
    /// Warranty expiration
    pub warranty_expiration: Option<DateTime<Utc>>,
    /// Device release date
    pub release_date: Option<DateTime<Utc>>,
    /// Row creation time, used as the pagination cursor
    pub created_at: DateTime<Utc>,
}

impl AssetRecord {
    /// Create a record with only the required references populated
    pub fn new(
        id: AssetId,
        asset_number: impl Into<String>,
        organization_id: Uuid,
        asset_type_id: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            asset_number: asset_number.into(),
            organization_id,
            assignee_id: None,
            asset_type_id,
            model: None,
            color: None,
            display_size: None,
            keyboard: None,
            make: None,
            memory: None,
            model_number: None,
            operating_system: None,
            processor: None,
            processor_frequency: None,
            storage: None,
            storage_type: None,
            serial_number: None,
            status: String::new(),
            cosmetic_condition: None,
            technical_functionality: None,
            customer_note: None,
            imei_number: None,
            has_charger: false,
            purchase_date: None,
            warranty_expiration: None,
            release_date: None,
            created_at,
        }
    }

    /// Set the model text (builder style, mostly for fixtures)
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set an attribute (builder style)
    pub fn with_attribute(mut self, field: AttributeField, value: impl Into<String>) -> Self {
        self.set_attribute(field, Some(value.into()));
        self
    }

    fn slot(&self, field: AttributeField) -> &Option<String> {
        match field {
            AttributeField::Color => &self.color,
            AttributeField::DisplaySize => &self.display_size,
            AttributeField::Keyboard => &self.keyboard,
            AttributeField::Make => &self.make,
            AttributeField::Model => &self.model,
            AttributeField::Memory => &self.memory,
            AttributeField::ModelNumber => &self.model_number,
            AttributeField::OperatingSystem => &self.operating_system,
            AttributeField::Processor => &self.processor,
            AttributeField::ProcessorFrequency => &self.processor_frequency,
            AttributeField::Storage => &self.storage,
            AttributeField::StorageType => &self.storage_type,
        }
    }

    fn slot_mut(&mut self, field: AttributeField) -> &mut Option<String> {
        match field {
            AttributeField::Color => &mut self.color,
            AttributeField::DisplaySize => &mut self.display_size,
            AttributeField::Keyboard => &mut self.keyboard,
            AttributeField::Make => &mut self.make,
            AttributeField::Model => &mut self.model,
            AttributeField::Memory => &mut self.memory,
            AttributeField::ModelNumber => &mut self.model_number,
            AttributeField::OperatingSystem => &mut self.operating_system,
            AttributeField::Processor => &mut self.processor,
            AttributeField::ProcessorFrequency => &mut self.processor_frequency,
            AttributeField::Storage => &mut self.storage,
            AttributeField::StorageType => &mut self.storage_type,
        }
    }

    /// Attribute value, treating empty strings as absent
    pub fn attribute(&self, field: AttributeField) -> Option<&str> {
        self.slot(field).as_deref().filter(|v| !v.is_empty())
    }

    /// Overwrite an attribute value
    pub fn set_attribute(&mut self, field: AttributeField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    /// The model text to submit for extraction, if there is any
    pub fn model_text(&self) -> Option<&str> {
        self.attribute(AttributeField::Model)
    }

    /// All populated attributes
    pub fn attributes(&self) -> AttributeSet {
        AttributeField::ALL
            .iter()
            .filter_map(|f| self.attribute(*f).map(|v| (*f, v.to_string())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AssetRecord {
        AssetRecord::new(
            Uuid::new_v4(),
            "A-0001",
            Uuid::new_v4(),
            Uuid::new_v4(),
            Utc::now(),
        )
    }

    #[test]
    fn test_empty_strings_read_as_absent() {
        let mut asset = record();
        asset.color = Some(String::new());
        assert_eq!(asset.attribute(AttributeField::Color), None);
    }

    #[test]
    fn test_model_text() {
        assert_eq!(record().model_text(), None);
        let asset = record().with_model("MacBook Pro 14\" M1 Pro");
        assert_eq!(asset.model_text(), Some("MacBook Pro 14\" M1 Pro"));
    }

    #[test]
    fn test_attributes_collects_populated_fields() {
        let asset = record()
            .with_model("Latitude 5420")
            .with_attribute(AttributeField::Make, "Dell")
            .with_attribute(AttributeField::StorageType, "SSD");

        let attrs = asset.attributes();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.get(AttributeField::Make), Some("Dell"));
    }
}
