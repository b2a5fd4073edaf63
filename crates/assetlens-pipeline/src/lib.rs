//! assetlens Pipeline
//!
//! Runs the whole job: fetch candidate assets, extract attributes from their
//! model text over up to two passes, reconcile with stored values, persist
//! and report.
//!
//! # Architecture
//!
//! ```text
//! AssetRepository → select_trainable → ExtractionQueue → AffectedAssets
//!                                                         │
//!                         ReportSink ← PersistenceRouter ← build_reconciled_set
//! ```
//!
//! Per-asset failures are collected as error entries and never stop the
//! run. Setup failures surface as [`PipelineError`].

#![warn(missing_docs)]

mod config;
mod error;
mod pipeline;
mod router;
mod secrets;

pub use config::{DatabaseBackend, DatabaseConfig, PersistMode, PipelineConfig, RunConfig};
pub use error::PipelineError;
pub use pipeline::{Pipeline, RunSummary};
pub use router::{PersistOutcome, PersistenceRouter};
pub use secrets::{EnvSecretSource, SecretSource};
