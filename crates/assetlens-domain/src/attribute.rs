//! The fixed attribute field set
//!
//! Every stage of the pipeline (extraction, merge, update statements, reports)
//! refers to attributes through [`AttributeField`]. The key ↔ column table
//! below is the only place where the camelCase attribute key and the
//! snake_case storage column are related; nothing derives one from the other.

use crate::error::DomainError;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A device attribute that can be extracted from a model description
///
/// Variant order is the canonical field order used for update statements and
/// report columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeField {
    /// Device color
    Color,
    /// Display size, e.g. `13.3"`
    DisplaySize,
    /// Keyboard layout
    Keyboard,
    /// Manufacturer
    Make,
    /// Model name (also the extraction input)
    Model,
    /// Installed memory
    Memory,
    /// Manufacturer model number
    ModelNumber,
    /// Operating system
    OperatingSystem,
    /// Processor name
    Processor,
    /// Processor clock frequency
    ProcessorFrequency,
    /// Storage capacity
    Storage,
    /// Storage technology (SSD, HDD, ...)
    StorageType,
}

/// (field, attribute key, storage column)
static FIELD_TABLE: [(AttributeField, &str, &str); 12] = [
    (AttributeField::Color, "color", "color"),
    (AttributeField::DisplaySize, "displaySize", "display_size"),
    (AttributeField::Keyboard, "keyboard", "keyboard"),
    (AttributeField::Make, "make", "make"),
    (AttributeField::Model, "model", "model"),
    (AttributeField::Memory, "memory", "memory"),
    (AttributeField::ModelNumber, "modelNumber", "model_number"),
    (AttributeField::OperatingSystem, "operatingSystem", "operating_system"),
    (AttributeField::Processor, "processor", "processor"),
    (AttributeField::ProcessorFrequency, "processorFrequency", "processor_frequency"),
    (AttributeField::Storage, "storage", "storage"),
    (AttributeField::StorageType, "storageType", "storage_type"),
];

impl AttributeField {
    /// All fields in canonical order
    pub const ALL: [AttributeField; 12] = [
        AttributeField::Color,
        AttributeField::DisplaySize,
        AttributeField::Keyboard,
        AttributeField::Make,
        AttributeField::Model,
        AttributeField::Memory,
        AttributeField::ModelNumber,
        AttributeField::OperatingSystem,
        AttributeField::Processor,
        AttributeField::ProcessorFrequency,
        AttributeField::Storage,
        AttributeField::StorageType,
    ];

    fn entry(self) -> &'static (AttributeField, &'static str, &'static str) {
        // FIELD_TABLE is laid out in variant order
        &FIELD_TABLE[self as usize]
    }

    /// camelCase attribute key used by the extraction service and reports
    pub fn key(self) -> &'static str {
        self.entry().1
    }

    /// snake_case column name in the asset table
    pub fn column(self) -> &'static str {
        self.entry().2
    }

    /// Look up a field by its attribute key
    pub fn from_key(key: &str) -> Result<Self, DomainError> {
        FIELD_TABLE
            .iter()
            .find(|(_, k, _)| *k == key)
            .map(|(field, _, _)| *field)
            .ok_or_else(|| DomainError::UnknownAttribute(key.to_string()))
    }

    /// Look up a field by its storage column name
    pub fn from_column(column: &str) -> Result<Self, DomainError> {
        FIELD_TABLE
            .iter()
            .find(|(_, _, c)| *c == column)
            .map(|(field, _, _)| *field)
            .ok_or_else(|| DomainError::UnknownAttribute(column.to_string()))
    }
}

impl fmt::Display for AttributeField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AttributeField {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

/// A partial mapping from attribute fields to non-empty values
///
/// Iteration follows canonical field order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSet {
    values: BTreeMap<AttributeField, String>,
}

/// The set of fields whose value changed between two records
pub type AttributeDelta = AttributeSet;

impl AttributeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from `(attribute key, value)` pairs
    ///
    /// Fails on the first key that is not in the field table.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut set = Self::new();
        for (key, value) in pairs {
            let field = AttributeField::from_key(key.as_ref())?;
            set.insert(field, value);
        }
        Ok(set)
    }

    /// Insert a value; empty strings are ignored
    pub fn insert(&mut self, field: AttributeField, value: impl Into<String>) {
        let value = value.into();
        if value.is_empty() {
            self.values.remove(&field);
        } else {
            self.values.insert(field, value);
        }
    }

    /// Get the value for a field, if present
    pub fn get(&self, field: AttributeField) -> Option<&str> {
        self.values.get(&field).map(String::as_str)
    }

    /// Whether the field has a value
    pub fn contains(&self, field: AttributeField) -> bool {
        self.values.contains_key(&field)
    }

    /// Remove a field
    pub fn remove(&mut self, field: AttributeField) -> Option<String> {
        self.values.remove(&field)
    }

    /// Number of fields with a value
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field has a value
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(field, value)` in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (AttributeField, &str)> {
        self.values.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

impl FromIterator<(AttributeField, String)> for AttributeSet {
    fn from_iter<T: IntoIterator<Item = (AttributeField, String)>>(iter: T) -> Self {
        let mut set = Self::new();
        for (field, value) in iter {
            set.insert(field, value);
        }
        set
    }
}
