//! End-to-end runs against an in-memory SQLite repository and a scripted
//! assistant

use assetlens_domain::{
    AssetId, AssetRecord, AssetType, Assignee, AttributeDelta, AttributeField, FailureKind,
    Organization, Reference, ReferenceKind,
};
use assetlens_extractor::{ExtractionClient, InstantSleeper};
use assetlens_llm::MockAssistant;
use assetlens_pipeline::{PersistMode, Pipeline, PipelineConfig, PipelineError};
use assetlens_store::{AssetRepository, CandidateFilter, SqliteAssetRepository, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

const MACBOOK: &str = "MacBook Pro 13\" M1 16GB 512GB Space Gray";
const LATITUDE: &str = "Dell Latitude 5420";
const MYSTERY: &str = "Mystery device 9000 with no brand at all";

fn started_at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

struct Fixture {
    repo: Arc<SqliteAssetRepository>,
    organization: Organization,
    laptop: Uuid,
    dir: TempDir,
    minutes: i64,
}

impl Fixture {
    fn new() -> Self {
        let repo = Arc::new(SqliteAssetRepository::new(":memory:").unwrap());
        let organization = Organization {
            id: Uuid::new_v4(),
            name: "Acme".to_string(),
        };
        let laptop = Uuid::new_v4();
        repo.insert_organization(&organization).unwrap();
        repo.insert_asset_type(laptop, &AssetType { name: "Laptop".to_string() }).unwrap();

        Self {
            repo,
            organization,
            laptop,
            dir: TempDir::new().unwrap(),
            minutes: 0,
        }
    }

    /// Insert an asset; later inserts are newer and come first in the fetch
    fn add(&mut self, number: &str, model: Option<&str>, make: Option<&str>) -> AssetRecord {
        self.minutes += 1;
        let mut asset = AssetRecord::new(
            Uuid::new_v4(),
            number,
            self.organization.id,
            self.laptop,
            started_at() - Duration::days(1) + Duration::minutes(self.minutes),
        );
        asset.model = model.map(String::from);
        asset.make = make.map(String::from);
        asset.status = "deployed".to_string();
        self.repo.insert_asset(&asset).unwrap();
        asset
    }

    fn config(&self, persist: PersistMode) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.run.output_dir = self.dir.path().to_path_buf();
        config.run.persist = persist;
        config
    }

    fn pipeline(
        &self,
        assistant: &MockAssistant,
        config: PipelineConfig,
    ) -> Pipeline<MockAssistant> {
        self.pipeline_on(self.repo.clone(), assistant, config)
    }

    fn pipeline_on(
        &self,
        repository: Arc<dyn AssetRepository>,
        assistant: &MockAssistant,
        config: PipelineConfig,
    ) -> Pipeline<MockAssistant> {
        let client = ExtractionClient::new(assistant.clone(), config.extractor.clone())
            .with_sleeper(Arc::new(InstantSleeper::new()));
        Pipeline::new(repository, client, config)
    }
}

/// Delegates to SQLite but rejects updates of one asset
struct RejectingUpdates {
    inner: Arc<SqliteAssetRepository>,
    rejected: AssetId,
}

#[async_trait]
impl AssetRepository for RejectingUpdates {
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        self.inner.fetch_candidates(filter).await
    }

    async fn apply_update(
        &self,
        asset_id: AssetId,
        delta: &AttributeDelta,
    ) -> Result<(), StoreError> {
        if asset_id == self.rejected {
            return Err(StoreError::Persistence {
                asset_id,
                reason: "row is locked".to_string(),
            });
        }
        self.inner.apply_update(asset_id, delta).await
    }

    async fn resolve_reference(
        &self,
        kind: ReferenceKind,
        id: Uuid,
    ) -> Result<Reference, StoreError> {
        self.inner.resolve_reference(kind, id).await
    }
}

fn scripted() -> MockAssistant {
    let mut assistant = MockAssistant::new("{}");
    assistant.add_reply(
        "MacBook",
        r#"Here you go: {"make": "Apple", "color": "Space Gray", "displaySize": "13.3\"",
        "memory": "16GB"}"#,
    );
    assistant.add_reply("Latitude", r#"{"make": "Dell", "model": "Latitude 5420"}"#);
    assistant.add_stall("Mystery");
    assistant
}

fn data_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .skip(4)
        .map(String::from)
        .collect()
}

#[tokio::test]
async fn test_timeout_for_one_asset_while_others_succeed() {
    let mut fixture = Fixture::new();
    let mystery = fixture.add("A-1", Some(MYSTERY), None);
    fixture.add("A-2", Some(LATITUDE), None);
    fixture.add("A-3", Some(MACBOOK), None);

    let assistant = scripted();
    let summary = fixture
        .pipeline(&assistant, fixture.config(PersistMode::None))
        .run_at(started_at())
        .await
        .unwrap();

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.extracted, 2);
    assert_eq!(summary.passes, 2);

    // The stalled asset is retried in the second pass and fails again
    assert_eq!(summary.errors.len(), 2);
    assert!(summary
        .errors
        .iter()
        .all(|e| e.id == mystery.id && e.kind == FailureKind::Timeout));
    assert_eq!(assistant.call_count(), 4);
    assert_eq!(assistant.max_active_runs(), 1);
    assert_eq!(assistant.thread_count(), 1);

    let successes = data_lines(&summary.reports.success);
    assert_eq!(successes.len(), 2);
    assert!(successes[0].starts_with("A-3,"));
    assert!(successes[1].starts_with("A-2,"));
    assert!(summary
        .reports
        .success
        .ends_with("model-attribute-mapping-2_20240601120000_success.csv"));

    let errors = data_lines(&summary.reports.error);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains(",timeout,"));
}

#[tokio::test]
async fn test_none_mode_leaves_rows_untouched() {
    let mut fixture = Fixture::new();
    let asset = fixture.add("A-1", Some(MACBOOK), None);

    let assistant = scripted();
    fixture
        .pipeline(&assistant, fixture.config(PersistMode::None))
        .run_at(started_at())
        .await
        .unwrap();

    let stored = fixture.repo.get_asset(asset.id).unwrap().unwrap();
    assert_eq!(stored.attributes(), asset.attributes());
    assert_eq!(stored.model, asset.model);
}

#[tokio::test]
async fn test_direct_mode_fills_only_empty_fields() {
    let mut fixture = Fixture::new();
    let macbook = fixture.add("A-1", Some(MACBOOK), Some("Apple"));
    let latitude = fixture.add("A-2", Some(LATITUDE), None);
    let thinkpad = fixture.add("A-3", Some("ThinkPad X1"), Some("Lenovo"));

    let mut assistant = scripted();
    assistant.add_reply("ThinkPad", r#"{"make": "Lenovo"}"#);
    let mut config = fixture.config(PersistMode::Direct);
    config.run.update_concurrency = 2;

    let summary = fixture
        .pipeline(&assistant, config)
        .run_at(started_at())
        .await
        .unwrap();

    assert_eq!(summary.persisted.updated, 2);
    assert_eq!(summary.persisted.unchanged, 1);
    assert!(summary.errors.is_empty());

    let stored = fixture.repo.get_asset(macbook.id).unwrap().unwrap();
    assert_eq!(stored.color.as_deref(), Some("Space Gray"));
    assert_eq!(stored.display_size.as_deref(), Some("13.3\""));
    assert_eq!(stored.memory.as_deref(), Some("16GB"));
    assert_eq!(stored.make.as_deref(), Some("Apple"));
    assert_eq!(stored.model.as_deref(), Some(MACBOOK));

    // Model stays as entered without normalization
    let stored = fixture.repo.get_asset(latitude.id).unwrap().unwrap();
    assert_eq!(stored.make.as_deref(), Some("Dell"));
    assert_eq!(stored.model.as_deref(), Some(LATITUDE));

    let stored = fixture.repo.get_asset(thinkpad.id).unwrap().unwrap();
    assert_eq!(stored.attributes(), thinkpad.attributes());
}

#[tokio::test]
async fn test_direct_mode_with_model_normalization() {
    let mut fixture = Fixture::new();
    let latitude = fixture.add("A-1", Some(LATITUDE), None);

    let assistant = scripted();
    let mut config = fixture.config(PersistMode::Direct);
    config.extractor.normalize_model = true;

    fixture
        .pipeline(&assistant, config)
        .run_at(started_at())
        .await
        .unwrap();

    let stored = fixture.repo.get_asset(latitude.id).unwrap().unwrap();
    assert_eq!(stored.model.as_deref(), Some("Latitude 5420"));
    assert_eq!(stored.attribute(AttributeField::Make), Some("Dell"));
}

#[tokio::test]
async fn test_assets_without_model_are_never_submitted() {
    let mut fixture = Fixture::new();
    fixture.add("A-1", None, None);
    fixture.add("A-2", Some(""), None);
    fixture.add("A-3", Some(LATITUDE), None);

    let assistant = scripted();
    let summary = fixture
        .pipeline(&assistant, fixture.config(PersistMode::None))
        .run_at(started_at())
        .await
        .unwrap();

    assert_eq!(assistant.call_count(), 1);
    assert_eq!(summary.extracted, 1);
    assert!(summary.errors.is_empty());

    let successes = data_lines(&summary.reports.success);
    assert_eq!(successes.len(), 1);
    assert!(successes[0].starts_with("A-3,"));
}

#[tokio::test]
async fn test_second_pass_retries_only_long_inputs_without_make() {
    let mut fixture = Fixture::new();
    fixture.add("A-1", Some("Unbranded grey laptop 15 inch 8GB"), None);
    fixture.add("A-2", Some("X1 Yoga"), None);
    fixture.add("A-3", Some(MACBOOK), None);

    let assistant = scripted();
    let summary = fixture
        .pipeline(&assistant, fixture.config(PersistMode::None))
        .run_at(started_at())
        .await
        .unwrap();

    // A-1 (long, no make) twice; A-2 (short) and A-3 (has make) once each
    assert_eq!(assistant.call_count(), 4);
    assert_eq!(summary.passes, 2);
    assert_eq!(summary.extracted, 3);
}

#[tokio::test]
async fn test_single_pass_configuration() {
    let mut fixture = Fixture::new();
    fixture.add("A-1", Some("Unbranded grey laptop 15 inch 8GB"), None);

    let assistant = scripted();
    let mut config = fixture.config(PersistMode::None);
    config.run.passes = 1;

    let summary = fixture.pipeline(&assistant, config).run_at(started_at()).await.unwrap();
    assert_eq!(assistant.call_count(), 1);
    assert_eq!(summary.passes, 1);
}

#[tokio::test]
async fn test_upload_mode_writes_export_and_degrades_missing_references() {
    let mut fixture = Fixture::new();
    let assignee_id = Uuid::new_v4();
    fixture
        .repo
        .insert_assignee(
            assignee_id,
            &Assignee {
                first_name: Some("Ada".to_string()),
                last_name: Some("Lovelace".to_string()),
                email: Some("ada@example.com".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let mut assigned = AssetRecord::new(
        Uuid::new_v4(),
        "A-1",
        fixture.organization.id,
        fixture.laptop,
        started_at() - Duration::hours(2),
    )
    .with_model(MACBOOK);
    assigned.assignee_id = Some(assignee_id);
    assigned.has_charger = true;
    fixture.repo.insert_asset(&assigned).unwrap();

    let orphan = AssetRecord::new(
        Uuid::new_v4(),
        "A-2",
        fixture.organization.id,
        Uuid::new_v4(),
        started_at() - Duration::hours(1),
    )
    .with_model(LATITUDE);
    fixture.repo.insert_asset(&orphan).unwrap();

    let assistant = scripted();
    let summary = fixture
        .pipeline(&assistant, fixture.config(PersistMode::Upload))
        .run_at(started_at())
        .await
        .unwrap();

    assert_eq!(summary.persisted.upload_rows, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].id, orphan.id);
    assert_eq!(summary.errors[0].kind, FailureKind::NotFound);

    let export = summary.persisted.upload_file.clone().unwrap();
    assert!(export.ends_with("asset-upload-Acme-1_20240601120000.csv"));

    let contents = fs::read_to_string(&export).unwrap();
    let lines: Vec<_> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("ASSET NUMBER,ORGANIZATION,ORGANIZATION ID"));
    assert!(lines[1].starts_with(&format!(
        "A-1,Acme,{},Ada,Lovelace,ada@example.com,ada@example.com",
        fixture.organization.id
    )));
    assert!(lines[1].contains("Space Gray"));
    assert!(lines[1].ends_with(",TRUE,,,FALSE"));

    // Upload mode never writes to the rows
    let stored = fixture.repo.get_asset(assigned.id).unwrap().unwrap();
    assert_eq!(stored.color, None);
}

#[tokio::test]
async fn test_upload_mode_without_rows_writes_no_export() {
    let mut fixture = Fixture::new();
    fixture.add("A-1", Some(MYSTERY), None);

    let assistant = scripted();
    let summary = fixture
        .pipeline(&assistant, fixture.config(PersistMode::Upload))
        .run_at(started_at())
        .await
        .unwrap();

    assert_eq!(summary.persisted.upload_file, None);
    let exports = fs::read_dir(fixture.dir.path())
        .unwrap()
        .filter(|e| {
            e.as_ref()
                .map(|e| e.file_name().to_string_lossy().starts_with("asset-upload"))
                .unwrap_or(false)
        })
        .count();
    assert_eq!(exports, 0);
}

#[tokio::test]
async fn test_session_failure_aborts_run() {
    let mut fixture = Fixture::new();
    fixture.add("A-1", Some(LATITUDE), None);

    let mut assistant = scripted();
    assistant.fail_thread_creation();
    let result = fixture
        .pipeline(&assistant, fixture.config(PersistMode::None))
        .run_at(started_at())
        .await;

    assert!(matches!(result, Err(PipelineError::Session(_))));
    assert_eq!(fs::read_dir(fixture.dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn test_cursor_and_organization_filters_apply() {
    let mut fixture = Fixture::new();
    let older = fixture.add("A-1", Some(LATITUDE), None);
    let newer = fixture.add("A-2", Some(MACBOOK), None);

    let assistant = scripted();
    let mut config = fixture.config(PersistMode::None);
    config.run.organization_id = Some(fixture.organization.id);
    config.run.created_before = Some(newer.created_at);

    let summary = fixture.pipeline(&assistant, config).run_at(started_at()).await.unwrap();
    assert_eq!(summary.fetched, 1);

    let successes = data_lines(&summary.reports.success);
    assert!(successes[0].contains(&older.id.to_string()));
}

#[tokio::test]
async fn test_direct_mode_failed_update_does_not_block_others() {
    let mut fixture = Fixture::new();
    let macbook = fixture.add("A-1", Some(MACBOOK), None);
    let latitude = fixture.add("A-2", Some(LATITUDE), None);

    let repository = Arc::new(RejectingUpdates {
        inner: fixture.repo.clone(),
        rejected: latitude.id,
    });
    let assistant = scripted();
    let summary = fixture
        .pipeline_on(repository, &assistant, fixture.config(PersistMode::Direct))
        .run_at(started_at())
        .await
        .unwrap();

    assert_eq!(summary.persisted.updated, 1);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].id, latitude.id);
    assert_eq!(summary.errors[0].kind, FailureKind::Persistence);

    let stored = fixture.repo.get_asset(macbook.id).unwrap().unwrap();
    assert_eq!(stored.color.as_deref(), Some("Space Gray"));
    let stored = fixture.repo.get_asset(latitude.id).unwrap().unwrap();
    assert_eq!(stored.make, None);

    // Both assets were extracted; the rejected one is also in the error report
    assert_eq!(data_lines(&summary.reports.success).len(), 2);
    let errors = data_lines(&summary.reports.error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("A-2,"));
    assert!(errors[0].contains(",persistence,"));
}

#[tokio::test]
async fn test_unwritable_export_still_writes_reports() {
    let mut fixture = Fixture::new();
    let macbook = fixture.add("A-1", Some(MACBOOK), None);

    // A directory where the export file would go
    let blocked = fixture
        .dir
        .path()
        .join("asset-upload-Acme-1_20240601120000.csv");
    fs::create_dir(&blocked).unwrap();

    let assistant = scripted();
    let summary = fixture
        .pipeline(&assistant, fixture.config(PersistMode::Upload))
        .run_at(started_at())
        .await
        .unwrap();

    assert_eq!(summary.persisted.upload_file, None);
    assert_eq!(summary.persisted.upload_rows, 0);
    assert_eq!(summary.errors.len(), 1);
    assert_eq!(summary.errors[0].id, macbook.id);
    assert_eq!(summary.errors[0].kind, FailureKind::Persistence);

    assert!(summary.reports.success.is_file());
    assert!(summary.reports.error.is_file());
    assert_eq!(data_lines(&summary.reports.success).len(), 1);
    let errors = data_lines(&summary.reports.error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("A-1,"));
    assert!(errors[0].contains(",persistence,"));
}
