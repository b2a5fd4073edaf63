//! Persisting reconciled values

use crate::config::PersistMode;
use assetlens_domain::{
    AssetType, Assignee, ErrorEntry, FailureKind, Organization, Reference, ReferenceKind,
};
use assetlens_reconciler::ReconciledAsset;
use assetlens_report::{UploadRow, UploadWriter};
use assetlens_store::{AssetRepository, StoreError};
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// What persistence did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistOutcome {
    /// Rows updated in `direct` mode
    pub updated: usize,
    /// Assets with nothing to change
    pub unchanged: usize,
    /// Rows written to the export in `upload` mode
    pub upload_rows: usize,
    /// Export file, when one was written
    pub upload_file: Option<PathBuf>,
    /// Per-asset failures
    pub errors: Vec<ErrorEntry>,
}

fn failure_kind(error: &StoreError) -> FailureKind {
    if error.is_not_found() {
        FailureKind::NotFound
    } else {
        FailureKind::Persistence
    }
}

fn unexpected(kind: ReferenceKind, id: Uuid, got: &Reference) -> StoreError {
    StoreError::InvalidData(format!("{} {} resolved to a {}", kind, id, got.kind()))
}

/// Sends reconciled assets to their destination
pub struct PersistenceRouter {
    repository: Arc<dyn AssetRepository>,
    mode: PersistMode,
    update_concurrency: usize,
    upload: UploadWriter,
}

impl PersistenceRouter {
    /// Create a router for one run
    pub fn new(
        repository: Arc<dyn AssetRepository>,
        mode: PersistMode,
        update_concurrency: usize,
        upload: UploadWriter,
    ) -> Self {
        Self {
            repository,
            mode,
            update_concurrency: update_concurrency.max(1),
            upload,
        }
    }

    /// Persist according to the configured mode
    ///
    /// Failures never abort the run; they become error entries.
    pub async fn persist(&self, assets: &[ReconciledAsset]) -> PersistOutcome {
        match self.mode {
            PersistMode::None => {
                info!(
                    "Persistence disabled, {} reconciled assets left untouched",
                    assets.len()
                );
                PersistOutcome::default()
            }
            PersistMode::Direct => self.persist_direct(assets).await,
            PersistMode::Upload => self.persist_upload(assets).await,
        }
    }

    async fn persist_direct(&self, assets: &[ReconciledAsset]) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();

        let changes: Vec<_> = assets
            .iter()
            .filter_map(|asset| {
                let delta = asset.delta();
                if delta.is_empty() {
                    debug!("Asset {} has nothing to update", asset.original.asset_number);
                    None
                } else {
                    Some((asset, delta))
                }
            })
            .collect();
        outcome.unchanged = assets.len() - changes.len();

        let repository = &self.repository;
        let results: Vec<_> = stream::iter(changes)
            .map(|(asset, delta)| async move {
                let result = repository.apply_update(asset.original.id, &delta).await;
                (asset, result)
            })
            .buffer_unordered(self.update_concurrency)
            .collect()
            .await;

        for (asset, result) in results {
            match result {
                Ok(()) => outcome.updated += 1,
                Err(e) => {
                    error!("Failed to update asset {}: {}", asset.original.asset_number, e);
                    let kind = failure_kind(&e);
                    outcome
                        .errors
                        .push(ErrorEntry::new(&asset.original, kind, e.to_string()));
                }
            }
        }

        info!("Updated {} assets ({} unchanged)", outcome.updated, outcome.unchanged);
        outcome
    }

    async fn persist_upload(&self, assets: &[ReconciledAsset]) -> PersistOutcome {
        let mut outcome = PersistOutcome::default();
        let mut exported = Vec::with_capacity(assets.len());
        let mut rows = Vec::with_capacity(assets.len());

        for asset in assets {
            match self.upload_row(asset).await {
                Ok(row) => {
                    exported.push(asset);
                    rows.push(row);
                }
                Err(e) => {
                    error!(
                        "Failed to create asset upload for asset number: {}: {}",
                        asset.original.asset_number, e
                    );
                    let kind = failure_kind(&e);
                    outcome
                        .errors
                        .push(ErrorEntry::new(&asset.original, kind, e.to_string()));
                }
            }
        }

        match self.upload.write(&rows) {
            Ok(file) => {
                outcome.upload_rows = rows.len();
                outcome.upload_file = file;
            }
            Err(e) => {
                error!("Failed to write asset upload: {}", e);
                let message = e.to_string();
                for asset in exported {
                    outcome.errors.push(ErrorEntry::new(
                        &asset.original,
                        FailureKind::Persistence,
                        message.as_str(),
                    ));
                }
            }
        }
        outcome
    }

    async fn upload_row(&self, asset: &ReconciledAsset) -> Result<UploadRow, StoreError> {
        let record = &asset.reconciled;
        let organization = self.organization(record.organization_id).await?;
        let asset_type = self.asset_type(record.asset_type_id).await?;
        let assignee = match record.assignee_id {
            Some(id) => Some(self.assignee(id).await?),
            None => None,
        };

        Ok(UploadRow::new(record, &organization, &asset_type, assignee.as_ref()))
    }

    async fn organization(&self, id: Uuid) -> Result<Organization, StoreError> {
        match self.repository.resolve_reference(ReferenceKind::Organization, id).await? {
            Reference::Organization(organization) => Ok(organization),
            other => Err(unexpected(ReferenceKind::Organization, id, &other)),
        }
    }

    async fn asset_type(&self, id: Uuid) -> Result<AssetType, StoreError> {
        match self.repository.resolve_reference(ReferenceKind::AssetType, id).await? {
            Reference::AssetType(asset_type) => Ok(asset_type),
            other => Err(unexpected(ReferenceKind::AssetType, id, &other)),
        }
    }

    async fn assignee(&self, id: Uuid) -> Result<Assignee, StoreError> {
        match self.repository.resolve_reference(ReferenceKind::Assignee, id).await? {
            Reference::Assignee(assignee) => Ok(assignee),
            other => Err(unexpected(ReferenceKind::Assignee, id, &other)),
        }
    }
}
