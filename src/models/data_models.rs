use serde::{Deserialize, Serialize};

/// A product as returned by the catalog API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub price: f64,
    #[serde(rename = "discountPercentage", default)]
    pub discount_percentage: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProductsResponse {
    pub products: Vec<Product>,
}

/// A fetched product with its discounted price. `final_price` is never rounded here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculatedProduct {
    pub id: i64,
    pub title: String,
    pub price: f64,
    pub discount_percentage: Option<f64>,
    pub final_price: f64,
}

/// One row of the expected-results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceRecord {
    pub id: i64,
    pub final_price: f64,
    /// Textual form of `final_price` as stored, used to derive comparison precision.
    pub final_price_text: String,
}

impl ReferenceRecord {
    pub fn new(id: i64, final_price_text: impl Into<String>, final_price: f64) -> Self {
        Self {
            id,
            final_price,
            final_price_text: final_price_text.into(),
        }
    }

    /// Number of digits after the decimal point in the stored text (0 when there is none).
    pub fn decimal_places(&self) -> u32 {
        self.final_price_text
            .trim()
            .split_once('.')
            .map(|(_, fraction)| fraction.len() as u32)
            .unwrap_or(0)
    }
}
