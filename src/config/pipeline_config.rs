use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "src/configs/reconcile.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub api: ApiSection,
    pub reference: ReferenceSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSection {
    pub name: String,
    pub base_url: String,
    #[serde(default = "default_limit_param")]
    pub limit_param: String,
    pub limit: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceSection {
    pub path: PathBuf,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_price_column")]
    pub price_column: String,
}

fn default_limit_param() -> String {
    "limit".to_string()
}

fn default_id_column() -> String {
    "id".to_string()
}

fn default_price_column() -> String {
    "final_price".to_string()
}

impl PipelineConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pipeline config file: {}", path))?;

        let config: PipelineConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse pipeline config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.is_empty() {
            return Err(anyhow!("API base URL cannot be empty"));
        }

        if self.api.limit == 0 {
            return Err(anyhow!("API page limit must be a positive integer"));
        }

        if self.reference.path.as_os_str().is_empty() {
            return Err(anyhow!("Reference data path cannot be empty"));
        }

        if self.reference.id_column.is_empty() || self.reference.price_column.is_empty() {
            return Err(anyhow!("Reference column names cannot be empty"));
        }

        Ok(())
    }

    pub fn products_url(&self) -> String {
        let separator = if self.api.base_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}{}={}",
            self.api.base_url, separator, self.api.limit_param, self.api.limit
        )
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api: ApiSection {
                name: "dummyjson".to_string(),
                base_url: "https://dummyjson.com/products".to_string(),
                limit_param: default_limit_param(),
                limit: 200,
            },
            reference: ReferenceSection {
                path: PathBuf::from("data/product_prices_calculated.parquet"),
                id_column: default_id_column(),
                price_column: default_price_column(),
            },
        }
    }
}
