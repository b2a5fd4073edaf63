//! Command-line arguments

use assetlens_pipeline::{DatabaseBackend, PersistMode, PipelineConfig};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use uuid::Uuid;

/// Extract asset attributes from model text and reconcile them with the
/// asset records
#[derive(Debug, Parser)]
#[command(name = "assetlens")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Replace the stored model text with the normalized model
    #[arg(short, long)]
    pub cleanup: bool,

    /// Local port of the database tunnel
    #[arg(short, long, env = "ASSETLENS_DB_PORT")]
    pub port: Option<u16>,

    /// Persist reconciled values (direct or upload)
    #[arg(short, long, value_name = "MODE")]
    pub save: Option<PersistMode>,

    /// Only process assets of this organization
    #[arg(short, long)]
    pub organization: Option<Uuid>,

    /// Only process assets created before this instant (RFC 3339)
    #[arg(short, long, value_name = "TIMESTAMP")]
    pub last_created_at: Option<DateTime<Utc>>,

    /// Configuration file path
    #[arg(long, env = "ASSETLENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory for reports and exports
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Use a SQLite database file instead of Postgres
    #[arg(long, value_name = "PATH")]
    pub sqlite: Option<PathBuf>,
}

impl Cli {
    /// Apply flag overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut PipelineConfig) {
        if self.cleanup {
            config.extractor.normalize_model = true;
        }
        if let Some(port) = self.port {
            config.database.port = port;
        }
        if let Some(mode) = self.save {
            config.run.persist = mode;
        }
        if self.organization.is_some() {
            config.run.organization_id = self.organization;
        }
        if self.last_created_at.is_some() {
            config.run.created_before = self.last_created_at;
        }
        if let Some(dir) = &self.output_dir {
            config.run.output_dir = dir.clone();
        }
        if let Some(path) = &self.sqlite {
            config.database.backend = DatabaseBackend::Sqlite;
            config.database.sqlite_path = Some(path.clone());
        }
    }
}
