//! Latest extraction result per asset, in first-seen order

use assetlens_domain::{AffectedAssetEntry, AssetId};
use std::collections::HashMap;

/// Insertion-ordered map from asset id to its latest extraction entry
///
/// Recording an asset again replaces its entry but keeps its original
/// position.
#[derive(Debug, Clone, Default)]
pub struct AffectedAssets {
    entries: Vec<AffectedAssetEntry>,
    index: HashMap<AssetId, usize>,
}

impl AffectedAssets {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest entry for an asset, returning the one it replaced
    pub fn record(&mut self, entry: AffectedAssetEntry) -> Option<AffectedAssetEntry> {
        match self.index.get(&entry.id) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position], entry)),
            None => {
                self.index.insert(entry.id, self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    /// Entry for an asset
    pub fn get(&self, id: &AssetId) -> Option<&AffectedAssetEntry> {
        self.index.get(id).map(|&position| &self.entries[position])
    }

    /// Whether an asset has an entry
    pub fn contains(&self, id: &AssetId) -> bool {
        self.index.contains_key(id)
    }

    /// Number of assets with an entry
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no asset has an entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = &AffectedAssetEntry> {
        self.entries.iter()
    }
}
