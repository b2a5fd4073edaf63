//! assetlens Reports
//!
//! CSV output of a run:
//!
//! - [`ReportSink`]: the success and error reports written after every run
//! - [`UploadWriter`]: the bulk-upload export used by the `upload` mode
//!
//! All files of one run share a timestamp from [`run_timestamp`].

#![warn(missing_docs)]

mod sink;
mod upload;

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use thiserror::Error;

pub use sink::{ReportPaths, ReportSink, ERROR_COLUMNS, PLACEHOLDER_LINE, REPORT_BASE_NAME};
pub use upload::{UploadRow, UploadWriter, UPLOAD_COLUMNS};

/// Errors that can occur while writing report files
#[derive(Error, Debug)]
pub enum ReportError {
    /// File could not be created or written
    #[error("Failed to write {path}: {source}")]
    Io {
        /// Target file
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// CSV encoding failed
    #[error("Failed to write CSV {path}: {source}")]
    Csv {
        /// Target file
        path: PathBuf,
        /// Underlying error
        source: csv::Error,
    },
}

/// Timestamp embedded in file names (UTC, `YYYYMMDDHHMMSS`)
pub fn run_timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}
