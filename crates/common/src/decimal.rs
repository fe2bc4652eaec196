use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_traits::ToPrimitive;

use crate::{Result, SalesError};

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹'];

/// Convert a `BigDecimal` to `f64`.
///
/// Returns `InvalidInput` if the value cannot be represented as a finite f64.
pub fn decimal_to_f64(value: &BigDecimal) -> Result<f64> {
    value
        .to_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| SalesError::InvalidInput(format!("Cannot convert BigDecimal to f64: {value}")))
}

/// Parse a spreadsheet-style amount such as `"$1,234.50"`, `"(12.5)"` or
/// `" 42 "` into an exact decimal.
///
/// Currency symbols, surrounding whitespace and thousands separators are
/// stripped; accounting-style parentheses denote a negative amount.
pub fn parse_decimal_text(raw: &str) -> Result<BigDecimal> {
    let trimmed = raw.trim();
    let (negated, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };

    let cleaned: String = body
        .chars()
        .filter(|c| !CURRENCY_SYMBOLS.contains(c) && *c != ',' && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return Err(SalesError::InvalidInput(format!("Not a number: {raw:?}")));
    }

    let value = BigDecimal::from_str(&cleaned)
        .map_err(|e| SalesError::InvalidInput(format!("Not a number: {raw:?} ({e})")))?;

    Ok(if negated { -value } else { value })
}

/// Parse text straight to `f64` through the exact decimal representation.
pub fn parse_amount(raw: &str) -> Result<f64> {
    decimal_to_f64(&parse_decimal_text(raw)?)
}
