//! SQLite-backed repository

use crate::statement::{CandidateFilter, UpdateStatement, ASSET_COLUMNS, ASSET_TABLE};
use crate::{AssetRepository, StoreError};
use assetlens_domain::{
    AssetId, AssetRecord, AssetType, Assignee, AttributeDelta, Organization, Reference,
    ReferenceKind,
};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;
use uuid::Uuid;

/// SQLite implementation of [`AssetRepository`]
///
/// Use `:memory:` for an in-memory database (useful for testing).
///
/// # Thread Safety
///
/// The connection is guarded by a mutex; calls are serialized.
pub struct SqliteAssetRepository {
    conn: Mutex<Connection>,
}

impl SqliteAssetRepository {
    /// Open (or create) a database and make sure the schema exists
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Connection(format!("Store lock error: {}", e)))
    }

    /// Insert an asset row (seeding)
    pub fn insert_asset(&self, asset: &AssetRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;
        let placeholders: Vec<String> = (1..=ASSET_COLUMNS.len())
            .map(|i| format!("${}", i))
            .collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            ASSET_TABLE,
            ASSET_COLUMNS.join(", "),
            placeholders.join(", ")
        );
        conn.execute(
            &sql,
            params![
                asset.id,
                asset.asset_number,
                asset.organization_id,
                asset.assignee_id,
                asset.asset_type_id,
                asset.model,
                asset.color,
                asset.display_size,
                asset.keyboard,
                asset.make,
                asset.memory,
                asset.model_number,
                asset.operating_system,
                asset.processor,
                asset.processor_frequency,
                asset.storage,
                asset.storage_type,
                asset.serial_number,
                asset.status,
                asset.cosmetic_condition,
                asset.technical_functionality,
                asset.customer_note,
                asset.imei_number,
                asset.has_charger,
                asset.purchase_date,
                asset.warranty_expiration,
                asset.release_date,
                asset.created_at,
            ],
        )?;
        Ok(())
    }

    /// Mark an asset as deleted (seeding)
    pub fn soft_delete(&self, id: AssetId) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE asset SET deleted_at = CURRENT_TIMESTAMP WHERE id = $1",
            params![id],
        )?;
        Ok(())
    }

    /// Insert an organization row (seeding)
    pub fn insert_organization(&self, organization: &Organization) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO organization (id, name) VALUES ($1, $2)",
            params![organization.id, organization.name],
        )?;
        Ok(())
    }

    /// Insert a collaborator row (seeding)
    pub fn insert_assignee(&self, id: Uuid, assignee: &Assignee) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO collaborator (id, first_name, last_name, personal_email, work_email, email)
             VALUES ($1, $2, $3, $4, $5, $6)",
            params![
                id,
                assignee.first_name,
                assignee.last_name,
                assignee.personal_email,
                assignee.work_email,
                assignee.email,
            ],
        )?;
        Ok(())
    }

    /// Insert an asset type row (seeding)
    pub fn insert_asset_type(&self, id: Uuid, asset_type: &AssetType) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO asset_type (id, name) VALUES ($1, $2)",
            params![id, asset_type.name],
        )?;
        Ok(())
    }

    /// Read a single asset, deleted or not
    pub fn get_asset(&self, id: AssetId) -> Result<Option<AssetRecord>, StoreError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            ASSET_COLUMNS.join(", "),
            ASSET_TABLE
        );
        let asset = conn.query_row(&sql, params![id], asset_from_row).optional()?;
        Ok(asset)
    }
}

fn asset_from_row(row: &Row<'_>) -> rusqlite::Result<AssetRecord> {
    Ok(AssetRecord {
        id: row.get("id")?,
        asset_number: row.get("asset_number")?,
        organization_id: row.get("organization_id")?,
        assignee_id: row.get("assignee_id")?,
        asset_type_id: row.get("asset_type_id")?,
        model: row.get("model")?,
        color: row.get("color")?,
        display_size: row.get("display_size")?,
        keyboard: row.get("keyboard")?,
        make: row.get("make")?,
        memory: row.get("memory")?,
        model_number: row.get("model_number")?,
        operating_system: row.get("operating_system")?,
        processor: row.get("processor")?,
        processor_frequency: row.get("processor_frequency")?,
        storage: row.get("storage")?,
        storage_type: row.get("storage_type")?,
        serial_number: row.get("serial_number")?,
        status: row.get("status")?,
        cosmetic_condition: row.get("cosmetic_condition")?,
        technical_functionality: row.get("technical_functionality")?,
        customer_note: row.get("customer_note")?,
        imei_number: row.get("imei_number")?,
        has_charger: row.get("has_charger")?,
        purchase_date: row.get("purchase_date")?,
        warranty_expiration: row.get("warranty_expiration")?,
        release_date: row.get("release_date")?,
        created_at: row.get("created_at")?,
    })
}

#[async_trait]
impl AssetRepository for SqliteAssetRepository {
    async fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
    ) -> Result<Vec<AssetRecord>, StoreError> {
        let sql = filter.to_sql(ASSET_TABLE, &ASSET_COLUMNS.join(", "));
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(organization_id) = filter.organization_id {
            params.push(Box::new(organization_id));
        }
        if let Some(created_before) = filter.created_before {
            params.push(Box::new(created_before));
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let assets = stmt
            .query_map(&param_refs[..], asset_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

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

        let mut params: Vec<&dyn ToSql> = stmt.values.iter().map(|v| v as &dyn ToSql).collect();
        params.push(&stmt.id);

        let conn = self.lock()?;
        let changed = conn
            .execute(&stmt.sql, &params[..])
            .map_err(|e| StoreError::Persistence {
                asset_id,
                reason: e.to_string(),
            })?;

        if changed == 0 {
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
        let conn = self.lock()?;

        let reference = match kind {
            ReferenceKind::Organization => conn
                .query_row(
                    "SELECT id, name FROM organization WHERE id = $1",
                    params![id],
                    |row| {
                        Ok(Reference::Organization(Organization {
                            id: row.get(0)?,
                            name: row.get(1)?,
                        }))
                    },
                )
                .optional()?,
            ReferenceKind::Assignee => conn
                .query_row(
                    "SELECT first_name, last_name, personal_email, work_email, email
                     FROM collaborator WHERE id = $1",
                    params![id],
                    |row| {
                        Ok(Reference::Assignee(Assignee {
                            first_name: row.get(0)?,
                            last_name: row.get(1)?,
                            personal_email: row.get(2)?,
                            work_email: row.get(3)?,
                            email: row.get(4)?,
                        }))
                    },
                )
                .optional()?,
            ReferenceKind::AssetType => conn
                .query_row(
                    "SELECT name FROM asset_type WHERE id = $1",
                    params![id],
                    |row| Ok(Reference::AssetType(AssetType { name: row.get(0)? })),
                )
                .optional()?,
        };

        reference.ok_or(StoreError::NotFound { kind, id })
    }
}
