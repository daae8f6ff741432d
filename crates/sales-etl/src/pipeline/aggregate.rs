//! Two-dimensional sales aggregation

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::error::RowValidationError;
use super::record::{RowSchema, SaleRow};
use super::source::SourceRow;

/// Running totals keyed by one dimension
///
/// Keys are compared byte-for-byte; iteration is in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SalesAggregate {
    totals: BTreeMap<String, f64>,
}

impl SalesAggregate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str, amount: f64) {
        match self.totals.get_mut(key) {
            Some(total) => *total += amount,
            None => {
                self.totals.insert(key.to_string(), amount);
            },
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.totals.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.totals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.totals.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.totals.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for SalesAggregate {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut aggregate = SalesAggregate::new();
        for (key, amount) in iter {
            aggregate.add(&key.into(), amount);
        }
        aggregate
    }
}

/// Result of aggregating one export
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    pub by_product: SalesAggregate,
    pub by_country: SalesAggregate,
    pub accepted: usize,
    pub rejected: Vec<RowValidationError>,
}

/// Accumulate per-product and per-country totals
///
/// Rows that fail to decode are left out of both aggregates and reported in
/// [`Aggregation::rejected`].
pub fn aggregate<'a>(
    rows: impl IntoIterator<Item = &'a SourceRow>,
    schema: &RowSchema,
) -> Aggregation {
    let mut result = Aggregation::default();

    for row in rows {
        match SaleRow::decode(&row.record, row.line, schema) {
            Ok(sale) => {
                let sales = sale.sales();
                result.by_product.add(&sale.product_id, sales);
                result.by_country.add(&sale.country, sales);
                result.accepted += 1;
            },
            Err(e) => {
                warn!(line = e.line, field = e.field, value = %e.value, "Skipping row: {}", e.reason);
                result.rejected.push(e);
            },
        }
    }

    debug!(
        accepted = result.accepted,
        rejected = result.rejected.len(),
        products = result.by_product.len(),
        countries = result.by_country.len(),
        "Aggregation finished"
    );

    result
}
