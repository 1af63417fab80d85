use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::ReferenceSection;
use crate::error::{ReconcileError, ReconcileResult};
use crate::models::ReferenceRecord;

// Zero as a float column renders it
const FLOAT_FILL: &str = "0.0";

/// Reads the expected-results table. Missing numeric cells are treated as 0.
pub struct ReferenceLoader {
    path: PathBuf,
    id_column: String,
    price_column: String,
}

impl ReferenceLoader {
    pub fn new(path: impl Into<PathBuf>, id_column: &str, price_column: &str) -> Self {
        ReferenceLoader {
            path: path.into(),
            id_column: id_column.to_string(),
            price_column: price_column.to_string(),
        }
    }

    pub fn from_config(config: &ReferenceSection) -> Self {
        Self::new(&config.path, &config.id_column, &config.price_column)
    }

    pub fn load(&self) -> ReconcileResult<Vec<ReferenceRecord>> {
        let df = load_frame(&self.path)?;
        info!(
            "Loaded reference table {} with {} rows",
            self.path.display(),
            df.height()
        );

        self.records_from_frame(&df)
    }

    /// Extracts id and final price from an already loaded table.
    pub fn records_from_frame(&self, df: &DataFrame) -> ReconcileResult<Vec<ReferenceRecord>> {
        let ids = id_values(self.column(df, &self.id_column)?)?;
        let prices = price_values(self.column(df, &self.price_column)?)?;

        let records: Vec<ReferenceRecord> = ids
            .into_iter()
            .zip(prices)
            .map(|(id, (text, value))| ReferenceRecord::new(id, text, value))
            .collect();

        Ok(records)
    }

    fn column<'a>(&self, df: &'a DataFrame, name: &str) -> ReconcileResult<&'a Column> {
        df.column(name).map_err(|_| {
            ReconcileError::Format(format!(
                "column '{}' not found in {} (available: {:?})",
                name,
                self.path.display(),
                df.get_column_names()
            ))
        })
    }
}

/// Reads a parquet or CSV file into a DataFrame, picking the reader by extension.
///
/// CSV columns are all read as text so prices keep the precision they were written with.
pub fn load_frame(path: &Path) -> ReconcileResult<DataFrame> {
    if !path.exists() {
        return Err(ReconcileError::ResourceNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("parquet") => {
            let file = File::open(path).map_err(|e| {
                ReconcileError::Format(format!("failed to open {}: {}", path.display(), e))
            })?;
            Ok(ParquetReader::new(file).finish()?)
        }
        Some("csv") => {
            let df = CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(0))
                .try_into_reader_with_file_path(Some(path.to_path_buf()))?
                .finish()?;
            Ok(df)
        }
        other => Err(ReconcileError::Format(format!(
            "unsupported reference file type {:?} for {}",
            other.unwrap_or(""),
            path.display()
        ))),
    }
}

fn id_values(column: &Column) -> ReconcileResult<Vec<i64>> {
    let mut filled = 0;

    let ids = if column.dtype() == &DataType::String {
        let mut ids = Vec::with_capacity(column.len());
        for (row, value) in column.str()?.into_iter().enumerate() {
            match value.map(str::trim).filter(|v| !v.is_empty()) {
                Some(text) => ids.push(text.parse::<i64>().map_err(|e| {
                    ReconcileError::Format(format!("invalid id '{}' at row {}: {}", text, row, e))
                })?),
                None => {
                    filled += 1;
                    ids.push(0);
                }
            }
        }
        ids
    } else {
        let casted = column.cast(&DataType::Int64)?;
        casted
            .i64()?
            .into_iter()
            .map(|value| {
                value.unwrap_or_else(|| {
                    filled += 1;
                    0
                })
            })
            .collect()
    };

    if filled > 0 {
        warn!("Filled {} missing ids with 0", filled);
    }

    Ok(ids)
}

/// Returns `(text, value)` per row; the text is what decides comparison precision.
///
/// Floats render with a trailing `.0` when whole (`90.0`), integers without (`90`).
/// Nulls and NaN count as missing and become 0 in the column's own rendering.
fn price_values(column: &Column) -> ReconcileResult<Vec<(String, f64)>> {
    let mut filled = 0;
    let mut prices = Vec::with_capacity(column.len());

    match column.dtype() {
        DataType::String => {
            for (row, value) in column.str()?.into_iter().enumerate() {
                match value.map(str::trim).filter(|v| !v.is_empty()) {
                    Some(text) => {
                        let parsed = text.parse::<f64>().map_err(|e| {
                            ReconcileError::Format(format!(
                                "invalid price '{}' at row {}: {}",
                                text, row, e
                            ))
                        })?;
                        prices.push((text.to_string(), parsed));
                    }
                    None => {
                        filled += 1;
                        prices.push((FLOAT_FILL.to_string(), 0.0));
                    }
                }
            }
        }
        dtype if dtype.is_integer() => {
            let casted = column.cast(&DataType::Int64)?;
            for value in casted.i64()?.into_iter() {
                match value {
                    Some(value) => prices.push((value.to_string(), value as f64)),
                    None => {
                        filled += 1;
                        prices.push(("0".to_string(), 0.0));
                    }
                }
            }
        }
        DataType::Float32 => {
            for value in column.f32()?.into_iter() {
                match value.filter(|v| !v.is_nan()) {
                    Some(value) => prices.push((format!("{:?}", value), value as f64)),
                    None => {
                        filled += 1;
                        prices.push((FLOAT_FILL.to_string(), 0.0));
                    }
                }
            }
        }
        _ => {
            let casted = column.cast(&DataType::Float64)?;
            for value in casted.f64()?.into_iter() {
                match value.filter(|v| !v.is_nan()) {
                    Some(value) => prices.push((format!("{:?}", value), value)),
                    None => {
                        filled += 1;
                        prices.push((FLOAT_FILL.to_string(), 0.0));
                    }
                }
            }
        }
    }

    if filled > 0 {
        warn!("Filled {} missing prices with 0", filled);
    }

    Ok(prices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::prices_match;
    use uuid::Uuid;

    fn temp_path(extension: &str) -> PathBuf {
        std::env::temp_dir().join(format!("reference-{}.{}", Uuid::new_v4(), extension))
    }

    fn write_parquet(df: &mut DataFrame) -> PathBuf {
        let path = temp_path("parquet");
        let mut file = File::create(&path).unwrap();
        ParquetWriter::new(&mut file).finish(df).unwrap();
        path
    }

    #[test]
    fn test_load_parquet_fills_nulls() {
        let mut df = df!(
            "id" => [Some(1i64), Some(2), None],
            "title" => ["Phone", "Case", "Cable"],
            "final_price" => [Some(90.0f64), None, Some(12.5)]
        )
        .unwrap();
        let path = write_parquet(&mut df);

        let records = ReferenceLoader::new(&path, "id", "final_price").load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0], ReferenceRecord::new(1, "90.0", 90.0));
        assert_eq!(records[1], ReferenceRecord::new(2, "0.0", 0.0));
        assert_eq!(records[2].id, 0);
        assert_eq!(records[2].final_price_text, "12.5");
        assert_eq!(records[2].decimal_places(), 1);
    }

    #[test]
    fn test_load_csv_keeps_textual_precision() {
        let path = temp_path("csv");
        std::fs::write(&path, "id,title,final_price\n1,Phone,90.00\n2,Case,\n3,Cable,12.50\n")
            .unwrap();

        let records = ReferenceLoader::new(&path, "id", "final_price").load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].final_price_text, "90.00");
        assert_eq!(records[0].decimal_places(), 2);
        assert_eq!(records[1], ReferenceRecord::new(2, "0.0", 0.0));
        assert_eq!(records[2].final_price, 12.5);
        assert_eq!(records[2].decimal_places(), 2);
    }

    #[test]
    fn test_custom_column_names() {
        let mut df = df!(
            "product_id" => [5i64, 6],
            "expected" => [1.25f64, 3.0]
        )
        .unwrap();
        let path = write_parquet(&mut df);

        let records = ReferenceLoader::new(&path, "product_id", "expected").load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records[0].id, 5);
        assert_eq!(records[1].final_price_text, "3.0");
    }

    #[test]
    fn test_whole_float_prices_compare_at_one_decimal() {
        let mut df = df!(
            "id" => [1i64, 2],
            "final_price" => [Some(90.0f64), None]
        )
        .unwrap();
        let path = write_parquet(&mut df);

        let records = ReferenceLoader::new(&path, "id", "final_price").load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records[0].decimal_places(), 1);
        assert!(prices_match(90.0, &records[0]));
        assert!(!prices_match(90.4, &records[0]));
        assert!(prices_match(0.0, &records[1]));
        assert!(!prices_match(0.4, &records[1]));
    }

    #[test]
    fn test_nan_price_is_filled() {
        let mut df = df!(
            "id" => [1i64, 2],
            "final_price" => [f64::NAN, 4.25]
        )
        .unwrap();
        let path = write_parquet(&mut df);

        let records = ReferenceLoader::new(&path, "id", "final_price").load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records[0], ReferenceRecord::new(1, "0.0", 0.0));
        assert_eq!(records[1].final_price_text, "4.25");
    }

    #[test]
    fn test_integer_prices_render_without_fraction() {
        let mut df = df!(
            "id" => [1i64, 2],
            "final_price" => [Some(90i64), None]
        )
        .unwrap();
        let path = write_parquet(&mut df);

        let records = ReferenceLoader::new(&path, "id", "final_price").load().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records[0], ReferenceRecord::new(1, "90", 90.0));
        assert_eq!(records[1], ReferenceRecord::new(2, "0", 0.0));
        assert!(prices_match(89.6, &records[0]));
    }

    #[test]
    fn test_missing_file() {
        let err = ReferenceLoader::new(temp_path("parquet"), "id", "final_price")
            .load()
            .unwrap_err();
        assert!(matches!(err, ReconcileError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_missing_column_is_format_error() {
        let mut df = df!("id" => [1i64], "price" => [2.0f64]).unwrap();
        let path = write_parquet(&mut df);

        let err = ReferenceLoader::new(&path, "id", "final_price").load().unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ReconcileError::Format(_)));
    }

    #[test]
    fn test_unparsable_file_is_format_error() {
        let path = temp_path("parquet");
        std::fs::write(&path, "definitely not parquet").unwrap();

        let err = ReferenceLoader::new(&path, "id", "final_price").load().unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ReconcileError::Format(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let path = temp_path("xlsx");
        std::fs::write(&path, "id,final_price\n1,2.0\n").unwrap();

        let err = load_frame(&path).unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ReconcileError::Format(_)));
    }

    #[test]
    fn test_invalid_csv_price() {
        let path = temp_path("csv");
        std::fs::write(&path, "id,final_price\n1,twelve\n").unwrap();

        let err = ReferenceLoader::new(&path, "id", "final_price").load().unwrap_err();
        std::fs::remove_file(&path).ok();

        assert!(matches!(err, ReconcileError::Format(_)));
    }
}
