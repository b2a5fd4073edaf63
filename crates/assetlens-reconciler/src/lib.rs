//! assetlens Reconciler
//!
//! Decides which assets to submit in each pass and how extracted values
//! combine with what is already stored.
//!
//! - [`select_trainable`]: eligibility per pass (at most [`MAX_PASSES`])
//! - [`merge`]: fill empty attributes, never overwrite populated ones
//! - [`diff`]: the attributes that actually changed
//! - [`build_reconciled_set`]: fetched assets paired with their merged form

#![warn(missing_docs)]

mod affected;
mod merge;
mod select;

pub use affected::AffectedAssets;
pub use merge::{build_reconciled_set, diff, merge, MergePolicy, ReconciledAsset};
pub use select::{is_trainable, select_trainable, MAX_PASSES, RETRAIN_MIN_INPUT_LEN};
