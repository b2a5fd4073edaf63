//! Combining stored values with extracted ones

use crate::affected::AffectedAssets;
use assetlens_domain::{
    AffectedAssetEntry, AssetRecord, AttributeDelta, AttributeField, ExtractedAttributes,
};

/// Rules applied when merging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergePolicy {
    /// Let the extracted model replace the stored one
    pub normalize_model: bool,
}

/// Fill the empty attributes of `existing` from `extracted`
///
/// Populated values are never overwritten. `model` is the exception: it takes
/// the extracted model when the policy normalizes models.
pub fn merge(
    existing: &AssetRecord,
    extracted: &ExtractedAttributes,
    policy: MergePolicy,
) -> AssetRecord {
    let mut merged = existing.clone();

    for field in AttributeField::ALL {
        let Some(value) = extracted.get(field) else {
            continue;
        };
        let replace = match field {
            AttributeField::Model => policy.normalize_model,
            _ => existing.attribute(field).is_none(),
        };
        if replace {
            merged.set_attribute(field, Some(value.to_string()));
        }
    }
    merged
}

/// Attributes whose value differs between `original` and `reconciled`
///
/// Fields come out in canonical order; only values present in `reconciled`
/// are reported.
pub fn diff(original: &AssetRecord, reconciled: &AssetRecord) -> AttributeDelta {
    let mut delta = AttributeDelta::new();
    for field in AttributeField::ALL {
        if let Some(value) = reconciled.attribute(field) {
            if original.attribute(field) != Some(value) {
                delta.insert(field, value);
            }
        }
    }
    delta
}

/// A fetched asset paired with its merged form
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledAsset {
    /// Row as fetched
    pub original: AssetRecord,
    /// Row after merging the extraction result
    pub reconciled: AssetRecord,
    /// The extraction entry that was merged
    pub entry: AffectedAssetEntry,
}

impl ReconciledAsset {
    /// Changed attributes
    pub fn delta(&self) -> AttributeDelta {
        diff(&self.original, &self.reconciled)
    }
}

/// Pair every fetched asset that has an extraction entry with its merged form
///
/// Output follows fetch order.
pub fn build_reconciled_set(
    assets: &[AssetRecord],
    affected: &AffectedAssets,
    policy: MergePolicy,
) -> Vec<ReconciledAsset> {
    assets
        .iter()
        .filter_map(|asset| {
            affected.get(&asset.id).map(|entry| ReconciledAsset {
                original: asset.clone(),
                reconciled: merge(asset, &entry.extracted, policy),
                entry: entry.clone(),
            })
        })
        .collect()
}
