use anyhow::{Context, Result};
use price_reconciler::config::{DEFAULT_CONFIG_PATH, PipelineConfig};
use price_reconciler::pipeline;
use std::env;
use std::path::Path;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = if Path::new(&config_path).exists() {
        PipelineConfig::from_file(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path))?
    } else {
        warn!("Config file not found at {}, using defaults", config_path);
        PipelineConfig::default()
    };

    info!(
        "Starting price reconciliation: {} against {}",
        config.api.name,
        config.reference.path.display()
    );

    let report = pipeline::run(&config)
        .await
        .context("Price reconciliation failed")?;

    println!("{}", report);

    info!(
        "Reconciliation finished at {} ({} fetched, {} reference rows)",
        report.generated_at, report.fetched, report.reference_rows
    );

    Ok(())
}
