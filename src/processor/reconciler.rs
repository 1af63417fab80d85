use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{ReconcileError, ReconcileResult};
use crate::models::{CalculatedProduct, ReferenceRecord};

// Largest scale a Decimal can carry.
const MAX_DECIMAL_PLACES: u32 = 28;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchSummary {
    /// Calculated rows that found a reference row with the same id.
    pub compared: usize,
    pub matched: usize,
}

/// Compares calculated prices with the expected-results table.
///
/// Every operation is stateless and reads both collections without modifying them.
pub struct Reconciler;

impl Reconciler {
    /// First product carrying the highest final price, in input order.
    pub fn most_expensive<'a>(
        &self,
        calculated: &'a [CalculatedProduct],
    ) -> ReconcileResult<&'a CalculatedProduct> {
        let mut iter = calculated.iter();
        let mut best = iter.next().ok_or(ReconcileError::EmptyInput)?;

        for product in iter {
            if product.final_price > best.final_price {
                best = product;
            }
        }

        debug!("Most expensive product: {} ({})", best.id, best.final_price);
        Ok(best)
    }

    /// Calculated products whose id has no row in the reference table.
    pub fn missing_in_reference<'a>(
        &self,
        calculated: &'a [CalculatedProduct],
        reference: &[ReferenceRecord],
    ) -> Vec<&'a CalculatedProduct> {
        let reference_ids: HashSet<i64> = reference.iter().map(|record| record.id).collect();

        calculated
            .iter()
            .filter(|product| !reference_ids.contains(&product.id))
            .collect()
    }

    /// Joins on id and counts rows whose final price matches at the reference's precision.
    ///
    /// Duplicate reference ids resolve to the first row; duplicate calculated ids are
    /// each compared on their own.
    pub fn match_prices(
        &self,
        calculated: &[CalculatedProduct],
        reference: &[ReferenceRecord],
    ) -> MatchSummary {
        let mut by_id: HashMap<i64, &ReferenceRecord> = HashMap::with_capacity(reference.len());
        for record in reference {
            by_id.entry(record.id).or_insert(record);
        }

        let mut summary = MatchSummary::default();
        for product in calculated {
            if let Some(record) = by_id.get(&product.id) {
                summary.compared += 1;
                if prices_match(product.final_price, record) {
                    summary.matched += 1;
                }
            }
        }

        info!(
            "Price match: {} of {} joined rows",
            summary.matched, summary.compared
        );
        summary
    }
}

/// Rounds `calculated` to as many decimals as the reference text shows and compares exactly.
pub fn prices_match(calculated: f64, reference: &ReferenceRecord) -> bool {
    let Some(value) = to_decimal(calculated) else {
        return false;
    };

    let expected = Decimal::from_str(reference.final_price_text.trim())
        .ok()
        .or_else(|| to_decimal(reference.final_price));
    let Some(expected) = expected else {
        return false;
    };

    let places = reference.decimal_places().min(MAX_DECIMAL_PLACES);
    value.round_dp(places) == expected
}

fn to_decimal(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }

    // Display yields the shortest text that round-trips, so 12.495 stays 12.495
    Decimal::from_str(&value.to_string())
        .ok()
        .or_else(|| Decimal::from_f64(value))
}
