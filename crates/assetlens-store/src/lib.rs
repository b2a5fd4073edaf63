//! assetlens Storage Layer
//!
//! Reads candidate assets, applies attribute updates and resolves the
//! references used to enrich export rows.
//!
//! # Backends
//!
//! - [`PgAssetRepository`]: the asset database, through a pooled `sqlx`
//!   connection. Each call acquires a connection and returns it on drop.
//! - [`SqliteAssetRepository`]: a local SQLite file or `:memory:` database
//!   with the same schema, used for offline runs and tests.
//!
//! # Examples
//!
//! ```no_run
//! use assetlens_store::{AssetRepository, CandidateFilter, SqliteAssetRepository};
//!
//! # async fn example() -> Result<(), assetlens_store::StoreError> {
//! let repo = SqliteAssetRepository::new(":memory:")?;
//! let assets = repo.fetch_candidates(&CandidateFilter::default()).await?;
//! println!("{} candidates", assets.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod postgres;
mod sqlite;
pub mod statement;

use assetlens_domain::{AssetId, AssetRecord, AttributeDelta, Reference, ReferenceKind};
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use postgres::{PgAssetRepository, PgSettings};
pub use sqlite::SqliteAssetRepository;
pub use statement::{CandidateFilter, UpdateStatement, ASSET_TABLE, PAGE_SIZE};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite driver error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Postgres driver error
    #[error("Database error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// A referenced row does not exist
    #[error("{kind} not found: {id}")]
    NotFound {
        /// What was looked up
        kind: ReferenceKind,
        /// The missing id
        id: Uuid,
    },

    /// An update could not be written
    #[error("Failed to update asset {asset_id}: {reason}")]
    Persistence {
        /// Target asset
        asset_id: AssetId,
        /// Driver message
        reason: String,
    },

    /// A row could not be mapped into a domain value
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The connection could not be acquired
    #[error("Connection unavailable: {0}")]
    Connection(String),
}

impl StoreError {
    /// Whether this error is a reference lookup miss
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Access to the asset table and its references
///
/// Implementations are stateless per call: nothing is cached between calls and
/// connections are released before each method returns.
#[async_trait]
pub trait AssetRepository: Send + Sync {
    /// Fetch one page (at most [`PAGE_SIZE`]) of non-deleted assets, newest first
    ///
    /// This is a pagination boundary, not a full scan. Callers continue from
    /// the oldest `created_at` they received.
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<AssetRecord>, StoreError>;

    /// Set exactly the columns in `delta` on one asset
    async fn apply_update(
        &self,
        asset_id: AssetId,
        delta: &AttributeDelta,
    ) -> Result<(), StoreError>;

    /// Look up an organization, assignee or asset type
    async fn resolve_reference(
        &self,
        kind: ReferenceKind,
        id: Uuid,
    ) -> Result<Reference, StoreError>;
}
