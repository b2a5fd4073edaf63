//! End-to-end run orchestration

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::router::{PersistOutcome, PersistenceRouter};
use assetlens_domain::{AffectedAssetEntry, ErrorEntry};
use assetlens_extractor::{ExtractionClient, ExtractionQueue};
use assetlens_llm::AssistantApi;
use assetlens_reconciler::{build_reconciled_set, select_trainable, AffectedAssets, MergePolicy};
use assetlens_report::{run_timestamp, ReportPaths, ReportSink, UploadWriter};
use assetlens_store::AssetRepository;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info};

/// Totals of a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Candidate assets fetched
    pub fetched: usize,
    /// Passes that submitted at least one asset
    pub passes: u32,
    /// Queries sent to the extraction service
    pub queries: usize,
    /// Assets with an extraction result
    pub extracted: usize,
    /// Per-asset failures, extraction and persistence combined
    pub errors: Vec<ErrorEntry>,
    /// What persistence did
    pub persisted: PersistOutcome,
    /// Report files
    pub reports: ReportPaths,
}

/// One extraction, reconciliation and persistence run
pub struct Pipeline<A> {
    repository: Arc<dyn AssetRepository>,
    client: ExtractionClient<A>,
    config: PipelineConfig,
}

impl<A: AssistantApi + 'static> Pipeline<A> {
    /// Assemble a run
    pub fn new(
        repository: Arc<dyn AssetRepository>,
        client: ExtractionClient<A>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            repository,
            client,
            config,
        }
    }

    /// Run now
    pub async fn run(self) -> Result<RunSummary, PipelineError> {
        self.run_at(Utc::now()).await
    }

    /// Run with `started_at` as the timestamp of every file written
    pub async fn run_at(self, started_at: DateTime<Utc>) -> Result<RunSummary, PipelineError> {
        self.config.validate().map_err(PipelineError::Config)?;
        let Self {
            repository,
            client,
            config,
        } = self;
        let timestamp = run_timestamp(started_at);
        let policy = MergePolicy {
            normalize_model: config.extractor.normalize_model,
        };

        let queue = ExtractionQueue::start(client).await.map_err(PipelineError::Session)?;

        info!("Loading assets...");
        let assets = repository
            .fetch_candidates(&config.run.candidate_filter())
            .await
            .map_err(PipelineError::Fetch)?;
        info!("Fetched {} candidate assets", assets.len());

        let mut affected = AffectedAssets::new();
        let mut errors = Vec::new();
        let mut passes = 0;

        for pass in 1..=config.run.passes {
            let trainable = select_trainable(&assets, &affected, config.run.retrain_min_input_len);
            if trainable.is_empty() {
                info!("Pass {}: nothing left to parse", pass);
                break;
            }
            info!("Pass {}: parsing {} assets", pass, trainable.len());
            passes = pass;

            for asset in trainable {
                let Some(input) = asset.model_text() else {
                    continue;
                };
                info!("Parsing model field for asset: {}", asset.asset_number);

                match queue.extract(input).await {
                    Ok(extracted) => {
                        affected.record(AffectedAssetEntry::new(asset, extracted));
                    }
                    Err(e) => {
                        error!("Asset {}: {}", asset.asset_number, e);
                        errors.push(ErrorEntry::new(asset, e.failure_kind(), e.to_string()));
                    }
                }
            }
        }
        let queries = queue.shutdown().await;

        let reconciled = build_reconciled_set(&assets, &affected, policy);
        let router = PersistenceRouter::new(
            repository,
            config.run.persist,
            config.run.update_concurrency,
            UploadWriter::new(&config.run.output_dir, &timestamp),
        );
        let persisted = router.persist(&reconciled).await;
        errors.extend(persisted.errors.iter().cloned());

        let successes: Vec<AffectedAssetEntry> = affected.iter().cloned().collect();
        let reports =
            ReportSink::new(&config.run.output_dir, &timestamp).emit(&successes, &errors)?;

        info!(
            "Run finished: {} fetched, {} extracted, {} errors",
            assets.len(),
            successes.len(),
            errors.len()
        );

        Ok(RunSummary {
            fetched: assets.len(),
            passes,
            queries,
            extracted: successes.len(),
            errors,
            persisted,
            reports,
        })
    }
}
