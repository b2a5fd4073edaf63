//! Fatal errors of a run

use assetlens_extractor::ExtractionError;
use assetlens_report::ReportError;
use assetlens_store::StoreError;
use thiserror::Error;

/// Errors that abort a run
///
/// Per-asset failures never surface here; they are recorded as error
/// entries and reported.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// A secret could not be read
    #[error("Secret {name} unavailable: {reason}")]
    Secret {
        /// Secret name
        name: String,
        /// Why it could not be read
        reason: String,
    },

    /// No extraction session could be opened
    #[error("Failed to open extraction session: {0}")]
    Session(#[source] ExtractionError),

    /// The database could not be reached
    #[error("Failed to connect to the asset database: {0}")]
    Connect(#[source] StoreError),

    /// Candidate assets could not be fetched
    #[error("Failed to fetch candidate assets: {0}")]
    Fetch(#[source] StoreError),

    /// Report or export files could not be written
    #[error("Failed to write reports: {0}")]
    Report(#[from] ReportError),
}
