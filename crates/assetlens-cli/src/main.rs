//! assetlens - extract and reconcile asset attributes

use anyhow::Context;
use assetlens_cli::{connect_repository, extraction_client, format_summary, Cli};
use assetlens_pipeline::{EnvSecretSource, Pipeline, PipelineConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Log to stderr; stdout carries the summary
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    cli.apply(&mut config);
    config.validate().map_err(anyhow::Error::msg).context("Invalid configuration")?;

    let secrets = EnvSecretSource;
    let repository = connect_repository(&config, &secrets).await?;
    let client = extraction_client(&config, &secrets)?;

    let mode = config.run.persist;
    info!("Starting run (persist: {})", mode);
    let summary = Pipeline::new(repository, client, config).run().await?;

    println!("{}", format_summary(&summary, mode));
    Ok(())
}
