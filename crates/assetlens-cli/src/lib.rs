//! assetlens command-line front-end.
//!
//! Parses flags, layers them over the optional configuration file and wires
//! the configured database and extraction service into a pipeline run.

pub mod cli;
pub mod output;
pub mod setup;

pub use cli::Cli;
pub use output::format_summary;
pub use setup::{connect_repository, extraction_client};
