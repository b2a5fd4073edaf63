//! Error types for the extraction client

use assetlens_domain::FailureKind;
use assetlens_llm::{LlmError, RunStatus};
use thiserror::Error;

/// Errors that can occur while extracting attributes for one input
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// The run did not complete within the poll budget
    #[error("Run {run} did not complete in time: {input}")]
    Timeout {
        /// Run identifier
        run: String,
        /// Submitted text
        input: String,
    },

    /// The reply held no parseable JSON object
    #[error("Unexpected value returned by extraction service: {raw}")]
    MalformedResponse {
        /// Full reply text
        raw: String,
    },

    /// The run ended without an answer
    #[error("Run {run} ended with status {status}")]
    RunFailed {
        /// Run identifier
        run: String,
        /// Terminal status reported by the service
        status: RunStatus,
    },

    /// Transport or API error
    #[error("Extraction service error: {0}")]
    Service(#[from] LlmError),

    /// No session could be opened, or the session worker is gone
    #[error("Extraction session unavailable: {0}")]
    SessionUnavailable(String),
}

impl ExtractionError {
    /// Classification recorded in the error report
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ExtractionError::Timeout { .. } => FailureKind::Timeout,
            ExtractionError::MalformedResponse { .. } => FailureKind::MalformedResponse,
            ExtractionError::RunFailed { .. }
            | ExtractionError::Service(_)
            | ExtractionError::SessionUnavailable(_) => FailureKind::Service,
        }
    }
}
