//! assetlens Domain Layer
//!
//! Core data model shared by every stage of the attribute pipeline.
//!
//! ## Key Concepts
//!
//! - **AttributeField**: the fixed set of device attributes, with the single
//!   authoritative mapping between attribute keys and storage columns
//! - **AssetRecord**: a persisted inventory asset
//! - **ExtractedAttributes**: one extraction result for one free-text input
//! - **AffectedAssetEntry / ErrorEntry**: per-asset outcomes of a run
//! - **Reference**: organization, assignee and asset-type lookups used to
//!   enrich export rows
//!
//! This crate holds no I/O. Storage and extraction transports live in
//! `assetlens-store` and `assetlens-llm`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asset;
pub mod attribute;
pub mod error;
pub mod outcome;
pub mod reference;

// Re-exports for convenience
pub use asset::{AssetId, AssetRecord};
pub use attribute::{AttributeDelta, AttributeField, AttributeSet};
pub use error::DomainError;
pub use outcome::{AffectedAssetEntry, ErrorEntry, ExtractedAttributes, FailureKind};
pub use reference::{AssetType, Assignee, Organization, Reference, ReferenceKind};
