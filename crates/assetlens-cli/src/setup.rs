//! Wiring configuration to concrete backends

use assetlens_extractor::{ExtractionClient, ExtractionError};
use assetlens_llm::OpenAiAssistants;
use assetlens_pipeline::{DatabaseBackend, PipelineConfig, PipelineError, SecretSource};
use assetlens_store::{AssetRepository, PgAssetRepository, SqliteAssetRepository};
use std::sync::Arc;
use tracing::info;

/// Open the configured asset repository
pub async fn connect_repository(
    config: &PipelineConfig,
    secrets: &dyn SecretSource,
) -> Result<Arc<dyn AssetRepository>, PipelineError> {
    match config.database.backend {
        DatabaseBackend::Postgres => {
            let settings = config.database.pg_settings(secrets)?;
            info!(
                "Connecting to {}:{}/{}",
                settings.host, settings.port, settings.database
            );
            let repository = PgAssetRepository::connect(&settings)
                .await
                .map_err(PipelineError::Connect)?;
            Ok(Arc::new(repository))
        }
        DatabaseBackend::Sqlite => {
            let path = config
                .database
                .sqlite_path
                .as_ref()
                .ok_or_else(|| PipelineError::Config("sqlite_path is not set".to_string()))?;
            info!("Opening {}", path.display());
            let repository = SqliteAssetRepository::new(path).map_err(PipelineError::Connect)?;
            Ok(Arc::new(repository))
        }
    }
}

/// Build the extraction client against the hosted assistant
pub fn extraction_client(
    config: &PipelineConfig,
    secrets: &dyn SecretSource,
) -> Result<ExtractionClient<OpenAiAssistants>, PipelineError> {
    let extractor = &config.extractor;
    if extractor.assistant_id.is_empty() {
        return Err(PipelineError::Config(
            "extractor.assistant_id must be set".to_string(),
        ));
    }

    let api_key = secrets.get(&extractor.api_key_secret)?;
    let mut assistants = OpenAiAssistants::new(api_key, extractor.assistant_id.clone())
        .map_err(|e| PipelineError::Session(ExtractionError::Service(e)))?;
    if let Some(project) = &extractor.project {
        assistants = assistants.with_project(project.clone());
    }

    Ok(ExtractionClient::new(assistants, extractor.clone()))
}
