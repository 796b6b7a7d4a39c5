//! Boundary checks applied before a request reaches the ledger

use common::decimal::{precision, Amount};
use common::error::{Error, Result};
use uuid::Uuid;

/// Reject empty or whitespace-only strings
pub fn require_non_empty<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidArgument(format!("{} must not be empty", field)));
    }
    Ok(trimmed)
}

/// Parse a well-formed UUID
pub fn parse_id(field: &str, value: &str) -> Result<Uuid> {
    let value = require_non_empty(field, value)?;
    Uuid::parse_str(value).map_err(|_| Error::InvalidArgument(format!("{} is not a valid UUID: {}", field, value)))
}

/// Reject amounts the balance column cannot hold exactly
pub fn require_representable(field: &str, amount: Amount) -> Result<Amount> {
    if !precision::fits_precision(amount) {
        return Err(Error::InvalidArgument(format!(
            "{} has more than {} decimal places",
            field,
            precision::AMOUNT_PRECISION
        )));
    }
    if !precision::within_range(amount) {
        return Err(Error::InvalidArgument(format!(
            "{} must be smaller than {} in magnitude",
            field,
            precision::AMOUNT_LIMIT
        )));
    }
    Ok(amount)
}

/// Reject negative amounts
pub fn require_non_negative(field: &str, amount: Amount) -> Result<Amount> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::InvalidArgument(format!("{} must not be negative", field)));
    }
    require_representable(field, amount)
}
