//! Per-asset outcomes of an extraction run

use crate::asset::{AssetId, AssetRecord};
use crate::attribute::{AttributeField, AttributeSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Attributes guessed by the extraction service for one input text
///
/// `attributes` only ever holds values the service actually returned; an
/// absent field means "no value found".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedAttributes {
    /// The raw text that was submitted
    pub input: String,
    /// Extracted values, including the model candidate
    pub attributes: AttributeSet,
}

impl ExtractedAttributes {
    /// Create a result for the given input
    pub fn new(input: impl Into<String>, attributes: AttributeSet) -> Self {
        Self {
            input: input.into(),
            attributes,
        }
    }

    /// Value for a field
    pub fn get(&self, field: AttributeField) -> Option<&str> {
        self.attributes.get(field)
    }

    /// The make, which the selector uses as a confidence signal
    pub fn make(&self) -> Option<&str> {
        self.get(AttributeField::Make)
    }

    /// The model candidate (normalized or the original input)
    pub fn model(&self) -> Option<&str> {
        self.get(AttributeField::Model)
    }
}

/// Latest extraction result for one asset, with provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AffectedAssetEntry {
    /// Asset number of the source row
    pub asset_number: String,
    /// Asset id
    pub id: AssetId,
    /// Text that was submitted
    pub input: String,
    /// What came back
    pub extracted: ExtractedAttributes,
}

impl AffectedAssetEntry {
    /// Build an entry for an asset and its extraction result
    pub fn new(asset: &AssetRecord, extracted: ExtractedAttributes) -> Self {
        Self {
            asset_number: asset.asset_number.clone(),
            id: asset.id,
            input: extracted.input.clone(),
            extracted,
        }
    }
}

/// Classification of a per-asset failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A referenced organization, assignee or asset type is missing
    NotFound,
    /// The extraction service answered without a parseable JSON object
    MalformedResponse,
    /// The extraction job did not finish within the poll budget
    Timeout,
    /// Writing the reconciled values failed
    Persistence,
    /// The extraction service rejected or failed the request
    Service,
}

impl FailureKind {
    /// Short tag used in reports
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::NotFound => "not_found",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::Timeout => "timeout",
            FailureKind::Persistence => "persistence",
            FailureKind::Service => "service",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recorded per-asset failure
///
/// Several entries may exist for the same asset across passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorEntry {
    /// Asset number of the source row
    pub asset_number: String,
    /// Asset id
    pub id: AssetId,
    /// Text that was submitted, or the model text at the time of failure
    pub input: String,
    /// Failure classification
    pub kind: FailureKind,
    /// Rendered error message
    pub message: String,
}

impl ErrorEntry {
    /// Build an entry for an asset
    pub fn new(asset: &AssetRecord, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            asset_number: asset.asset_number.clone(),
            id: asset.id,
            input: asset.model.clone().unwrap_or_default(),
            kind,
            message: message.into(),
        }
    }
}
