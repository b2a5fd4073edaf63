//! Postgres-backed repository

use crate::statement::{CandidateFilter, UpdateStatement, ASSET_COLUMNS, ASSET_TABLE};
use crate::{AssetRepository, StoreError};
use assetlens_domain::{
    AssetId, AssetRecord, AssetType, Assignee, AttributeDelta, Organization, Reference,
    ReferenceKind,
};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

/// Connection settings for the asset database
#[derive(Debug, Clone)]
pub struct PgSettings {
    /// Host name (usually `localhost` behind a tunnel)
    pub host: String,
    /// Port
    pub port: u16,
    /// Database name
    pub database: String,
    /// User name
    pub username: String,
    /// Password
    pub password: String,
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// How long to wait for a free connection
    pub acquire_timeout: Duration,
}

/// Postgres implementation of [`AssetRepository`]
///
/// Connections come from a pool and go back to it when each query finishes,
/// on success and on error alike.
#[derive(Clone)]
pub struct PgAssetRepository {
    pool: PgPool,
}

impl PgAssetRepository {
    /// Connect to the database and build the pool
    pub async fn connect(settings: &PgSettings) -> Result<Self, StoreError> {
        let options = PgConnectOptions::new()
            .host(&settings.host)
            .port(settings.port)
            .database(&settings.database)
            .username(&settings.username)
            .password(&settings.password);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(settings.acquire_timeout)
            .connect_with(options)
            .await?;

        info!(
            "Connected to {}:{}/{} (max {} connections)",
            settings.host, settings.port, settings.database, settings.max_connections
        );

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Select list with the casts needed to decode every column uniformly
fn pg_select_list() -> String {
    ASSET_COLUMNS
        .iter()
        .map(|col| match *col {
            "purchase_date" | "warranty_expiration" | "release_date" | "created_at" => {
                format!("{col}::timestamptz AS {col}")
            }
            "has_charger" => format!("COALESCE({col}, false) AS {col}"),
            "status" => format!("COALESCE({col}::text, '') AS {col}"),
            "cosmetic_condition" | "technical_functionality" => format!("{col}::text AS {col}"),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn asset_from_row(row: &PgRow) -> Result<AssetRecord, sqlx::Error> {
    Ok(AssetRecord {
        id: row.try_get("id")?,
        asset_number: row.try_get("asset_number")?,
        organization_id: row.try_get("organization_id")?,
        assignee_id: row.try_get("assignee_id")?,
        asset_type_id: row.try_get("asset_type_id")?,
        model: row.try_get("model")?,
        color: row.try_get("color")?,
        display_size: row.try_get("display_size")?,
        keyboard: row.try_get("keyboard")?,
        make: row.try_get("make")?,
        memory: row.try_get("memory")?,
        model_number: row.try_get("model_number")?,
        operating_system: row.try_get("operating_system")?,
        processor: row.try_get("processor")?,
        processor_frequency: row.try_get("processor_frequency")?,
        storage: row.try_get("storage")?,
        storage_type: row.try_get("storage_type")?,
        serial_number: row.try_get("serial_number")?,
        status: row.try_get("status")?,
        cosmetic_condition: row.try_get("cosmetic_condition")?,
        technical_functionality: row.try_get("technical_functionality")?,
        customer_note: row.try_get("customer_note")?,
        imei_number: row.try_get("imei_number")?,
        has_charger: row.try_get("has_charger")?,
        purchase_date: row.try_get("purchase_date")?,
        warranty_expiration: row.try_get("warranty_expiration")?,
        release_date: row.try_get("release_date")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AssetRepository for PgAssetRepository {
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        let sql = filter.to_sql(ASSET_TABLE, &pg_select_list());
        info!("Loading assets...");

        let mut query = sqlx::query(&sql);
        if let Some(organization_id) = filter.organization_id {
            query = query.bind(organization_id);
        }
        if let Some(created_before) = filter.created_before {
            query = query.bind(created_before);
        }

        let rows = query.fetch_all(&self.pool).await?;
        let assets = rows
            .iter()
            .map(asset_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StoreError::InvalidData(e.to_string()))?;

        debug!("Fetched {} candidate assets", assets.len());
        Ok(assets)
    }

    async fn apply_update(
        &self,
        asset_id: AssetId,
        delta: &AttributeDelta,
    ) -> Result<(), StoreError> {
        if delta.is_empty() {
            debug!("Nothing to update for asset {}", asset_id);
            return Ok(());
        }

        let stmt = UpdateStatement::build(ASSET_TABLE, delta, asset_id);
        debug!("{}", stmt.sql);

        let mut query = sqlx::query(&stmt.sql);
        for value in &stmt.values {
            query = query.bind(value);
        }
        query = query.bind(stmt.id);

        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Persistence {
                asset_id,
                reason: e.to_string(),
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Persistence {
                asset_id,
                reason: "no matching row".to_string(),
            });
        }
        Ok(())
    }

    async fn resolve_reference(
        &self,
        kind: ReferenceKind,
        id: Uuid,
    ) -> Result<Reference, StoreError> {
        let reference = match kind {
            ReferenceKind::Organization => {
                sqlx::query("SELECT id, name FROM organization WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(|row| -> Result<Reference, sqlx::Error> {
                        Ok(Reference::Organization(Organization {
                            id: row.try_get("id")?,
                            name: row.try_get("name")?,
                        }))
                    })
                    .transpose()?
            }
            ReferenceKind::Assignee => {
                sqlx::query(
                    "SELECT first_name, last_name, personal_email, work_email, email
                     FROM collaborator WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
                .map(|row| -> Result<Reference, sqlx::Error> {
                    Ok(Reference::Assignee(Assignee {
                        first_name: row.try_get("first_name")?,
                        last_name: row.try_get("last_name")?,
                        personal_email: row.try_get("personal_email")?,
                        work_email: row.try_get("work_email")?,
                        email: row.try_get("email")?,
                    }))
                })
                .transpose()?
            }
            ReferenceKind::AssetType => {
                sqlx::query("SELECT name FROM asset_type WHERE id = $1")
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
                    .map(|row| -> Result<Reference, sqlx::Error> {
                        Ok(Reference::AssetType(AssetType {
                            name: row.try_get("name")?,
                        }))
                    })
                    .transpose()?
            }
        };

        reference.ok_or(StoreError::NotFound { kind, id })
    }
}
