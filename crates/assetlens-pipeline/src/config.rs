//! Configuration for a pipeline run

use crate::error::PipelineError;
use crate::secrets::SecretSource;
use assetlens_domain::DomainError;
use assetlens_extractor::ExtractorConfig;
use assetlens_reconciler::{MAX_PASSES, RETRAIN_MIN_INPUT_LEN};
use assetlens_store::{CandidateFilter, PgSettings};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// What happens to reconciled values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Report only
    #[default]
    None,
    /// Update the asset rows in place
    Direct,
    /// Write a bulk-upload export file
    Upload,
}

impl PersistMode {
    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            PersistMode::None => "none",
            PersistMode::Direct => "direct",
            PersistMode::Upload => "upload",
        }
    }
}

impl fmt::Display for PersistMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PersistMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "none" => Ok(PersistMode::None),
            "direct" => Ok(PersistMode::Direct),
            "upload" => Ok(PersistMode::Upload),
            other => Err(DomainError::InvalidValue {
                what: "persist mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Per-run settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Extraction passes (1 or 2)
    pub passes: u32,

    /// Inputs longer than this are retried when no make was found
    pub retrain_min_input_len: usize,

    /// Persistence mode
    pub persist: PersistMode,

    /// Only process assets of this organization
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,

    /// Only process assets created strictly before this instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateTime<Utc>>,

    /// Directory for reports and exports
    pub output_dir: PathBuf,

    /// Maximum concurrent row updates in `direct` mode
    pub update_concurrency: usize,
}

impl RunConfig {
    /// Candidate filter for the fetch
    pub fn candidate_filter(&self) -> CandidateFilter {
        CandidateFilter {
            organization_id: self.organization_id,
            created_before: self.created_before,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            passes: MAX_PASSES,
            retrain_min_input_len: RETRAIN_MIN_INPUT_LEN,
            persist: PersistMode::None,
            organization_id: None,
            created_before: None,
            output_dir: PathBuf::from("."),
            update_concurrency: 8,
        }
    }
}

/// Which repository implementation to use
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// Postgres over a local tunnel
    #[default]
    Postgres,
    /// SQLite file
    Sqlite,
}

/// Asset database settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Backend
    pub backend: DatabaseBackend,

    /// Host (Postgres)
    pub host: String,

    /// Local tunnel port (Postgres)
    pub port: u16,

    /// Database name (Postgres)
    pub database: String,

    /// Secret holding the user name (Postgres)
    pub username_secret: String,

    /// Secret holding the password (Postgres)
    pub password_secret: String,

    /// Maximum pooled connections (Postgres)
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection (Postgres)
    pub acquire_timeout_secs: u64,

    /// Database file (SQLite)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlite_path: Option<PathBuf>,
}

impl DatabaseConfig {
    /// Postgres settings with credentials read from `secrets`
    pub fn pg_settings(&self, secrets: &dyn SecretSource) -> Result<PgSettings, PipelineError> {
        Ok(PgSettings {
            host: self.host.clone(),
            port: self.port,
            database: self.database.clone(),
            username: secrets.get(&self.username_secret)?,
            password: secrets.get(&self.password_secret)?,
            max_connections: self.max_connections,
            acquire_timeout: Duration::from_secs(self.acquire_timeout_secs),
        })
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::Postgres,
            host: "localhost".to_string(),
            port: 43346,
            database: "postgres".to_string(),
            username_secret: "/operator/DB_USERNAME".to_string(),
            password_secret: "/operator/DB_PASSWORD".to_string(),
            max_connections: 8,
            acquire_timeout_secs: 30,
            sqlite_path: None,
        }
    }
}

/// Complete configuration of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Extraction client settings
    pub extractor: ExtractorConfig,
    /// Run settings
    pub run: RunConfig,
    /// Database settings
    pub database: DatabaseConfig,
}

impl PipelineConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.extractor.validate()?;

        if self.run.passes == 0 || self.run.passes > MAX_PASSES {
            return Err(format!("passes must be between 1 and {}", MAX_PASSES));
        }
        if self.run.update_concurrency == 0 {
            return Err("update_concurrency must be greater than 0".to_string());
        }
        match self.database.backend {
            DatabaseBackend::Postgres if self.database.max_connections == 0 => {
                Err("max_connections must be greater than 0".to_string())
            }
            DatabaseBackend::Sqlite if self.database.sqlite_path.is_none() => {
                Err("sqlite_path is required for the sqlite backend".to_string())
            }
            _ => Ok(()),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Load and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, PipelineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| PipelineError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        let config = Self::from_toml(&contents).map_err(PipelineError::Config)?;
        config.validate().map_err(PipelineError::Config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.run.passes, 2);
        assert_eq!(config.run.persist, PersistMode::None);
        assert_eq!(config.database.port, 43346);
    }

    #[test]
    fn test_invalid_passes() {
        let mut config = PipelineConfig::default();
        config.run.passes = 3;
        assert!(config.validate().is_err());
        config.run.passes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sqlite_requires_path() {
        let mut config = PipelineConfig::default();
        config.database.backend = DatabaseBackend::Sqlite;
        assert!(config.validate().is_err());

        config.database.sqlite_path = Some(PathBuf::from("assets.db"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = PipelineConfig::default();
        config.run.persist = PersistMode::Upload;
        config.run.organization_id = Some(Uuid::new_v4());
        config.extractor.normalize_model = true;

        let toml_str = config.to_toml().unwrap();
        let parsed = PipelineConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
            [run]
            persist = "direct"
            created_before = "2024-05-01T00:00:00Z"

            [extractor]
            assistant_id = "asst_123"
            "#,
        )
        .unwrap();

        assert_eq!(config.run.persist, PersistMode::Direct);
        assert!(config.run.created_before.is_some());
        assert_eq!(config.run.passes, 2);
        assert_eq!(config.extractor.assistant_id, "asst_123");
        assert_eq!(config.extractor.max_poll_attempts, 10);
    }

    #[test]
    fn test_persist_mode_parsing() {
        assert_eq!("direct".parse::<PersistMode>().unwrap(), PersistMode::Direct);
        assert_eq!("upload".parse::<PersistMode>().unwrap(), PersistMode::Upload);
        assert_eq!("".parse::<PersistMode>().unwrap(), PersistMode::None);
        assert!("both".parse::<PersistMode>().is_err());
    }
}
