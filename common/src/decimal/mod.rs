//! Decimal type utilities for precise monetary calculations

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Monetary amount with exact decimal arithmetic
pub type Amount = Decimal;

/// Precision helpers for common operations
pub mod precision {
    use super::*;

    /// Scale of the `balances.balance` column
    pub const AMOUNT_PRECISION: u32 = 8;

    /// Round an amount to the stored precision
    pub fn round_amount(amount: Amount) -> Amount {
        amount.round_dp(AMOUNT_PRECISION)
    }

    /// Exclusive bound on the magnitude of a stored amount (`NUMERIC(28,8)`)
    pub const AMOUNT_LIMIT: Amount = dec!(100000000000000000000);

    /// Whether an amount has no more than [`AMOUNT_PRECISION`] decimal places
    pub fn fits_precision(amount: Amount) -> bool {
        amount.scale() <= AMOUNT_PRECISION || round_amount(amount) == amount
    }

    /// Whether an amount is small enough for the balance column
    pub fn within_range(amount: Amount) -> bool {
        amount.abs() < AMOUNT_LIMIT
    }

}
