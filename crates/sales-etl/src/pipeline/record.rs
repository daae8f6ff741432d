//! Typed decoding of raw export rows
//!
//! The export is a flat CSV whose business fields sit at fixed column
//! positions. [`RowSchema`] names those positions and [`SaleRow::decode`]
//! turns a raw record into typed fields or a [`RowValidationError`].

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use super::error::RowValidationError;

/// Column positions of the business fields in a raw record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowSchema {
    pub product_id: usize,
    pub quantity: usize,
    pub unit_price: usize,
    pub country: usize,
}

impl Default for RowSchema {
    fn default() -> Self {
        Self {
            product_id: 1,
            quantity: 3,
            unit_price: 5,
            country: 7,
        }
    }
}

/// One accepted sale
#[derive(Debug, Clone, PartialEq)]
pub struct SaleRow {
    pub product_id: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub country: String,
}

impl SaleRow {
    /// Decode `record` found at source line `line`
    ///
    /// Product id and country are kept verbatim. Quantity and unit price must
    /// parse as finite decimal numbers.
    pub fn decode(
        record: &StringRecord,
        line: u64,
        schema: &RowSchema,
    ) -> Result<Self, RowValidationError> {
        let product_id = field(record, line, schema.product_id, "product_id")?;
        let quantity = number(record, line, schema.quantity, "quantity")?;
        let unit_price = number(record, line, schema.unit_price, "unit_price")?;
        let country = field(record, line, schema.country, "country")?;

        Ok(Self {
            product_id: product_id.to_string(),
            quantity,
            unit_price,
            country: country.to_string(),
        })
    }

    pub fn sales(&self) -> f64 {
        self.quantity * self.unit_price
    }
}

fn field<'r>(
    record: &'r StringRecord,
    line: u64,
    index: usize,
    name: &'static str,
) -> Result<&'r str, RowValidationError> {
    record.get(index).ok_or_else(|| RowValidationError {
        line,
        field: name,
        value: String::new(),
        reason: format!("missing column {} (row has {} fields)", index, record.len()),
    })
}

fn number(
    record: &StringRecord,
    line: u64,
    index: usize,
    name: &'static str,
) -> Result<f64, RowValidationError> {
    let raw = field(record, line, index, name)?;
    let invalid = |reason: String| RowValidationError {
        line,
        field: name,
        value: raw.to_string(),
        reason,
    };

    let value: f64 = raw.parse().map_err(|e: std::num::ParseFloatError| invalid(e.to_string()))?;
    if !value.is_finite() {
        return Err(invalid("value is not a finite number".to_string()));
    }

    Ok(value)
}
