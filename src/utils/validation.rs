//! Validation utilities

use bigdecimal::BigDecimal;
use std::str::FromStr;

use crate::types::*;

/// Validate that an amount is positive
pub fn validate_positive_amount(amount: &BigDecimal) -> ConversionResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(ConversionError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )))
    } else {
        Ok(())
    }
}

/// Parse a ledger amount cell
///
/// Thousands separators and dollar signs are ignored. A blank cell is zero.
/// Negative or non-numeric values are rejected, and so is exponent notation,
/// which bank exports never use.
pub fn parse_amount(raw: &str) -> ConversionResult<BigDecimal> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '$')
        .collect();

    if cleaned.is_empty() {
        return Ok(BigDecimal::from(0));
    }

    if cleaned.contains(|c: char| c == 'e' || c == 'E') {
        return Err(ConversionError::InvalidAmount(format!(
            "'{}' uses exponent notation",
            raw.trim()
        )));
    }

    let amount = BigDecimal::from_str(&cleaned)
        .map_err(|_| ConversionError::InvalidAmount(format!("'{}' is not a number", raw.trim())))?;

    if amount < BigDecimal::from(0) {
        return Err(ConversionError::InvalidAmount(format!(
            "'{}' is negative",
            raw.trim()
        )));
    }

    Ok(amount)
}

/// Check that every required column is present in the header row
pub fn validate_required_columns<S: AsRef<str>>(
    headers: &[S],
    required: &[&str],
) -> ConversionResult<()> {
    let missing: Vec<String> = required
        .iter()
        .filter(|name| !headers.iter().any(|h| h.as_ref().trim() == **name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConversionError::MissingColumns(missing))
    }
}
