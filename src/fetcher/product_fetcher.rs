use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

use crate::config::PipelineConfig;
use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{Product, ProductsResponse};

pub struct ProductFetcher {
    client: Client,
    config: PipelineConfig,
}

impl ProductFetcher {
    pub fn new(config: PipelineConfig) -> ReconcileResult<Self> {
        let client = Client::builder()
            .emulation(Emulation::Firefox136)
            .build()?;

        Ok(ProductFetcher { client, config })
    }

    /// Performs a single GET against the catalog and returns at most `limit` products.
    pub async fn fetch_products(&self) -> ReconcileResult<Vec<Product>> {
        let url = self.config.products_url();
        info!("Fetching products from {} ({})", self.config.api.name, url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!("Received {} bytes with status {}", body.len(), status);

        let products = parse_products_response(status, &body, self.config.api.limit as usize)?;
        info!("Fetched {} products from {}", products.len(), self.config.api.name);

        Ok(products)
    }
}

/// Turns a raw HTTP status and body into products, keeping at most `limit` of them.
pub fn parse_products_response(
    status: u16,
    body: &str,
    limit: usize,
) -> ReconcileResult<Vec<Product>> {
    if !(200..300).contains(&status) {
        return Err(ReconcileError::Transport(format!("HTTP error: {}", status)));
    }

    let decoded: ProductsResponse =
        serde_json::from_str(body).map_err(|source| ReconcileError::Decode {
            status,
            body: body.to_string(),
            source,
        })?;

    let mut products = decoded.products;
    if products.len() > limit {
        warn!(
            "API returned {} products for a limit of {}, truncating",
            products.len(),
            limit
        );
        products.truncate(limit);
    }

    Ok(products)
}
