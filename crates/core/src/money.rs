//! # Money Module
//!
//! Amount validation for a single two-decimal currency. Balances and
//! ledger amounts are `rust_decimal::Decimal`; this module is the one
//! place that decides what an acceptable movement amount looks like.

use crate::error::{CoreError, CoreResult};
use rust_decimal::Decimal;

/// Currency precision: two decimal places.
pub const CURRENCY_SCALE: u32 = 2;

/// Validates a movement amount: strictly positive, at most two decimal
/// places. Returns the amount normalized to two decimal places.
///
/// Lifecycle ledger rows (OPEN_ACCOUNT / CLOSE_ACCOUNT) carry amount 0
/// and do not pass through here.
///
/// # Examples
/// ```
/// use rust_decimal::Decimal;
/// use vaultx_core::validate_amount;
///
/// assert!(validate_amount(Decimal::new(3000, 2)).is_ok()); // 30.00
/// assert!(validate_amount(Decimal::ZERO).is_err());
/// ```
pub fn validate_amount(amount: Decimal) -> CoreResult<Decimal> {
    if amount <= Decimal::ZERO {
        return Err(CoreError::InvalidAmount(format!(
            "amount must be positive: {}",
            amount
        )));
    }
    if amount.normalize().scale() > CURRENCY_SCALE {
        return Err(CoreError::InvalidAmount(format!(
            "amount has more than {} decimal places: {}",
            CURRENCY_SCALE, amount
        )));
    }
    let mut normalized = amount;
    normalized.rescale(CURRENCY_SCALE);
    Ok(normalized)
}

/// Formats a balance with the fixed currency scale ("70.00", not "70").
pub fn format_amount(amount: Decimal) -> String {
    let mut amount = amount;
    amount.rescale(CURRENCY_SCALE);
    amount.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_positive_amount_accepted() {
        assert_eq!(validate_amount(dec!(30.00)).unwrap(), dec!(30.00));
        assert_eq!(validate_amount(dec!(0.01)).unwrap(), dec!(0.01));
        assert_eq!(validate_amount(dec!(100)).unwrap(), dec!(100.00));
    }

    #[test]
    fn test_zero_and_negative_rejected() {
        assert!(validate_amount(dec!(0)).is_err());
        assert!(validate_amount(dec!(-5.00)).is_err());
    }

    #[test]
    fn test_sub_cent_precision_rejected() {
        assert!(validate_amount(dec!(0.001)).is_err());
        assert!(validate_amount(dec!(10.005)).is_err());
    }

    #[test]
    fn test_trailing_zeros_do_not_reject() {
        // 30.0000 is still a two-decimal value
        assert_eq!(validate_amount(dec!(30.0000)).unwrap(), dec!(30.00));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(dec!(70)), "70.00");
        assert_eq!(format_amount(dec!(0.5)), "0.50");
    }
}
