//! Which assets to submit in a pass

use crate::affected::AffectedAssets;
use assetlens_domain::AssetRecord;
use tracing::info;

/// Maximum number of extraction passes per run
pub const MAX_PASSES: u32 = 2;

/// Inputs longer than this are retried when their result has no make
pub const RETRAIN_MIN_INPUT_LEN: usize = 20;

/// Whether an asset should be submitted in the current pass
///
/// True when the asset has no entry yet, or its entry came from a long input
/// and still lacks a make.
pub fn is_trainable(
    asset: &AssetRecord,
    affected: &AffectedAssets,
    retrain_min_input_len: usize,
) -> bool {
    match affected.get(&asset.id) {
        None => true,
        Some(entry) => {
            entry.input.chars().count() > retrain_min_input_len
                && entry.extracted.make().is_none()
        }
    }
}

/// Assets to submit in the current pass, in fetch order
///
/// Assets without model text are logged and left out.
pub fn select_trainable<'a>(
    assets: &'a [AssetRecord],
    affected: &AffectedAssets,
    retrain_min_input_len: usize,
) -> Vec<&'a AssetRecord> {
    assets
        .iter()
        .filter(|asset| is_trainable(asset, affected, retrain_min_input_len))
        .filter(|asset| {
            if asset.model_text().is_none() {
                info!("Skipping asset {}, no model value", asset.asset_number);
                return false;
            }
            true
        })
        .collect()
}
