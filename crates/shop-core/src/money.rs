//! Decimal money helpers.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{CoreError, Result};

/// VAT multiplier applied to catalog prices (20%).
///
/// Stored prices are VAT-exclusive while shoppers filter with VAT-inclusive
/// bounds.
pub const TAX_MULTIPLIER: Decimal = Decimal::from_parts(120, 0, 0, false, 2);

/// Parse a decimal amount such as `"33.33"` or `" 10 "`.
///
/// # Errors
///
/// Returns `CoreError::InvalidAmount` if the string is not a decimal number.
pub fn parse_amount(value: &str) -> Result<Decimal> {
    let trimmed = value.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| CoreError::InvalidAmount(value.to_string()))
}

/// Parse an amount, treating missing or malformed values as zero.
#[must_use]
pub fn parse_amount_or_zero(value: Option<&str>) -> Decimal {
    value
        .and_then(|v| parse_amount(v).ok())
        .unwrap_or(Decimal::ZERO)
}

/// Round to cents, half away from zero.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Render an amount with exactly two decimals.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    let mut rounded = round_money(amount);
    rounded.rescale(2);
    rounded.to_string()
}

/// Convert a major-unit amount to integer minor units (cents).
///
/// # Errors
///
/// Returns `CoreError::AmountOutOfRange` if the result does not fit in `i64`.
pub fn to_minor_units(amount: Decimal) -> Result<i64> {
    let cents = (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    cents
        .to_i64()
        .ok_or_else(|| CoreError::AmountOutOfRange(amount.to_string()))
}

/// Convert a VAT-inclusive amount to its VAT-exclusive equivalent.
#[must_use]
pub fn strip_tax(inclusive: Decimal) -> Decimal {
    inclusive / TAX_MULTIPLIER
}
