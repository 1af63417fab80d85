use anyhow::{Context, Result};
use price_reconciler::config::{DEFAULT_CONFIG_PATH, PipelineConfig};
use price_reconciler::storage::{ReferenceLoader, load_frame};
use std::collections::BTreeMap;
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== REFERENCE DATA INSPECTION ===\n");

    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let config = if Path::new(&config_path).exists() {
        PipelineConfig::from_file(&config_path)?
    } else {
        println!("No config at {}, using defaults", config_path);
        PipelineConfig::default()
    };

    let path = &config.reference.path;
    println!("Reference file: {}", path.display());

    let df = load_frame(path)
        .with_context(|| format!("Failed to read reference table {}", path.display()))?;

    println!("Rows: {}", df.height());
    println!("Columns:");
    for column in df.get_columns() {
        println!(
            "  - {} ({:?}, {} nulls)",
            column.name(),
            column.dtype(),
            column.null_count()
        );
    }

    let records = ReferenceLoader::from_config(&config.reference).records_from_frame(&df)?;

    // How many rows carry each number of decimal places
    let mut precision: BTreeMap<u32, usize> = BTreeMap::new();
    for record in &records {
        *precision.entry(record.decimal_places()).or_insert(0) += 1;
    }

    println!("\n=== {} PRECISION ===", config.reference.price_column.to_uppercase());
    for (places, count) in &precision {
        println!("  {} decimal places: {} rows", places, count);
    }

    println!("\n=== SAMPLE ROWS ===");
    for (i, record) in records.iter().take(5).enumerate() {
        println!(
            "{}. ID {}: {} ({})",
            i + 1,
            record.id,
            record.final_price_text,
            record.final_price
        );
    }

    Ok(())
}
