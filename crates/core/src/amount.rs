//! Quantity and money arithmetic.
//!
//! Prices and values are integers in the smallest currency unit (e.g. cents).
//! Quantities are whole units. All arithmetic is checked; overflow is reported
//! as a validation failure instead of wrapping.

use crate::error::{DomainError, DomainResult};

/// Value of `quantity` units at `unit_price`.
pub fn line_value(quantity: i64, unit_price: i64) -> DomainResult<i64> {
    quantity
        .checked_mul(unit_price)
        .ok_or_else(|| DomainError::validation("line value overflows"))
}

/// Add a signed delta to a running amount.
pub fn checked_add(current: i64, delta: i64) -> DomainResult<i64> {
    current
        .checked_add(delta)
        .ok_or_else(|| DomainError::validation("amount overflows"))
}

/// Require a strictly positive quantity.
pub fn ensure_positive_quantity(quantity: i64) -> DomainResult<()> {
    if quantity <= 0 {
        return Err(DomainError::validation(format!(
            "quantity must be positive (got {quantity})"
        )));
    }
    Ok(())
}

/// Require a non-negative price.
pub fn ensure_price(price: i64) -> DomainResult<()> {
    if price < 0 {
        return Err(DomainError::validation(format!(
            "price cannot be negative (got {price})"
        )));
    }
    Ok(())
}
