use tracing::debug;

use crate::models::{CalculatedProduct, Product};

pub struct PriceCalculator;

impl PriceCalculator {
    /// Maps every product to its discounted counterpart, preserving order and ids.
    pub fn calculate(&self, products: &[Product]) -> Vec<CalculatedProduct> {
        let calculated: Vec<CalculatedProduct> = products
            .iter()
            .map(|product| CalculatedProduct {
                id: product.id,
                title: product.title.clone(),
                price: product.price,
                discount_percentage: product.discount_percentage,
                final_price: final_price(product.price, product.discount_percentage),
            })
            .collect();

        debug!("Calculated final prices for {} products", calculated.len());
        calculated
    }
}

/// `price - price * discount / 100`; an absent or zero discount leaves the price untouched.
pub fn final_price(price: f64, discount_percentage: Option<f64>) -> f64 {
    match discount_percentage {
        Some(discount) if discount != 0.0 => price - (price * discount / 100.0),
        _ => price,
    }
}
