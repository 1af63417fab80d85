use chrono::{DateTime, Utc};
use std::fmt;
use tracing::info;

use crate::config::PipelineConfig;
use crate::error::ReconcileResult;
use crate::fetcher::ProductFetcher;
use crate::models::{CalculatedProduct, Product, ReferenceRecord};
use crate::processor::{PriceCalculator, Reconciler};
use crate::storage::ReferenceLoader;

const SEPARATOR_WIDTH: usize = 40;

#[derive(Debug, Clone)]
pub struct ReconciliationReport {
    pub generated_at: DateTime<Utc>,
    pub fetched: usize,
    pub reference_rows: usize,
    pub most_expensive: CalculatedProduct,
    pub missing: Vec<CalculatedProduct>,
    pub compared: usize,
    pub matched: usize,
}

/// Fetches live products, loads the reference table and reconciles them.
pub async fn run(config: &PipelineConfig) -> ReconcileResult<ReconciliationReport> {
    let fetcher = ProductFetcher::new(config.clone())?;
    let products = fetcher.fetch_products().await?;

    let reference = ReferenceLoader::from_config(&config.reference).load()?;

    reconcile(&products, &reference)
}

/// Every step after the fetch. Nothing is reported unless all three values are computed.
pub fn reconcile(
    products: &[Product],
    reference: &[ReferenceRecord],
) -> ReconcileResult<ReconciliationReport> {
    let calculated = PriceCalculator.calculate(products);
    let reconciler = Reconciler;

    let most_expensive = reconciler.most_expensive(&calculated)?.clone();
    let missing: Vec<CalculatedProduct> = reconciler
        .missing_in_reference(&calculated, reference)
        .into_iter()
        .cloned()
        .collect();
    let summary = reconciler.match_prices(&calculated, reference);

    info!(
        "Reconciled {} products against {} reference rows: {} missing, {} matched",
        calculated.len(),
        reference.len(),
        missing.len(),
        summary.matched
    );

    Ok(ReconciliationReport {
        generated_at: Utc::now(),
        fetched: calculated.len(),
        reference_rows: reference.len(),
        most_expensive,
        missing,
        compared: summary.compared,
        matched: summary.matched,
    })
}

impl fmt::Display for ReconciliationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        let best = &self.most_expensive;

        writeln!(
            f,
            "Most expensive product by final price: id={} title={:?} price={} final_price={}",
            best.id, best.title, best.price, best.final_price
        )?;
        writeln!(f, "{}", separator)?;

        if self.missing.is_empty() {
            writeln!(f, "Products missing in expected data: none missing")?;
        } else {
            let listed: Vec<String> = self
                .missing
                .iter()
                .map(|p| format!("id={} title={:?} final_price={}", p.id, p.title, p.final_price))
                .collect();
            writeln!(
                f,
                "Products missing in expected data ({}): [{}]",
                self.missing.len(),
                listed.join(", ")
            )?;
        }
        writeln!(f, "{}", separator)?;

        write!(
            f,
            "Rows where expected final price matches calculated price: {} (of {} joined by id)",
            self.matched, self.compared
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReconcileError;

    fn product(id: i64, price: f64, discount: f64) -> Product {
        Product {
            id,
            title: format!("product-{id}"),
            price,
            discount_percentage: Some(discount),
        }
    }

    #[test]
    fn test_end_to_end_scenario() {
        let products = vec![product(1, 100.0, 10.0), product(2, 50.0, 0.0)];
        let reference = vec![ReferenceRecord::new(1, "90.0", 90.0)];

        let report = reconcile(&products, &reference).unwrap();

        assert_eq!(report.most_expensive.id, 1);
        assert_eq!(report.most_expensive.final_price, 90.0);
        assert_eq!(report.missing.len(), 1);
        assert_eq!(report.missing[0].id, 2);
        assert_eq!(report.matched, 1);
        assert_eq!(report.compared, 1);
        assert_eq!(report.fetched, 2);
    }

    #[test]
    fn test_empty_fetch_aborts() {
        let reference = vec![ReferenceRecord::new(1, "90.0", 90.0)];
        let err = reconcile(&[], &reference).unwrap_err();
        assert!(matches!(err, ReconcileError::EmptyInput));
    }

    #[test]
    fn test_report_lines() {
        let products = vec![product(1, 100.0, 10.0)];
        let reference = vec![ReferenceRecord::new(1, "90.0", 90.0)];

        let rendered = reconcile(&products, &reference).unwrap().to_string();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 5);
        assert!(lines[0].contains("id=1"));
        assert!(lines[2].contains("none missing"));
        assert!(lines[4].contains(": 1 (of 1"));
    }
}
