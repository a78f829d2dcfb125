use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;

use crate::error::LeaseError;
use crate::types::{Money, Rate};
use crate::LeaseResult;

/// Present value of an ordinary annuity (payments at period end).
///
/// PV = pmt * (1 - (1 + r)^-n) / r
///
/// A zero rate has no discounting, so the result is the undiscounted sum
/// `pmt * n`. When `(1 + r)^n` is too large for a 96-bit decimal the
/// discount term `(1 + r)^-n` is below the representable precision and the
/// perpetuity limit `pmt / r` is returned.
pub fn annuity_present_value(
    payment_per_period: Money,
    rate_per_period: Rate,
    number_of_payments: u32,
) -> LeaseResult<Money> {
    if rate_per_period < Decimal::ZERO {
        return Err(LeaseError::InvalidRate {
            field: "rate_per_period".into(),
            value: rate_per_period,
        });
    }

    if rate_per_period.is_zero() {
        return payment_per_period
            .checked_mul(Decimal::from(number_of_payments))
            .ok_or_else(|| LeaseError::overflow("payment_amount"));
    }

    let one_plus_r = Decimal::ONE + rate_per_period;
    let annuity_factor = match one_plus_r.checked_powu(u64::from(number_of_payments)) {
        Some(factor) => (Decimal::ONE - Decimal::ONE / factor) / rate_per_period,
        None => Decimal::ONE / rate_per_period,
    };

    payment_per_period
        .checked_mul(annuity_factor)
        .ok_or_else(|| LeaseError::overflow("payment_amount"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_annuity_pv_monthly_one_percent() {
        // 1000 * (1 - 1.01^-12) / 0.01 = 11255.0775...
        let result = annuity_present_value(dec!(1000), dec!(0.01), 12).unwrap();
        assert!(
            (result - dec!(11255.08)).abs() < dec!(0.01),
            "Expected ~11255.08, got {result}"
        );
    }

    #[test]
    fn test_annuity_pv_zero_rate_is_undiscounted_sum() {
        let result = annuity_present_value(dec!(5000), Decimal::ZERO, 2).unwrap();
        assert_eq!(result, dec!(10000));
    }

    #[test]
    fn test_annuity_pv_zero_payments() {
        assert_eq!(
            annuity_present_value(dec!(1000), dec!(0.05), 0).unwrap(),
            Decimal::ZERO
        );
        assert_eq!(
            annuity_present_value(dec!(1000), Decimal::ZERO, 0).unwrap(),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_annuity_pv_zero_payment_amount() {
        let result = annuity_present_value(Decimal::ZERO, dec!(0.01), 60).unwrap();
        assert_eq!(result, Decimal::ZERO);
    }

    #[test]
    fn test_annuity_pv_overflowing_factor_uses_perpetuity_limit() {
        // 2^4000 is far beyond the decimal range
        let result = annuity_present_value(dec!(100), Decimal::ONE, 4000).unwrap();
        assert_eq!(result, dec!(100));
    }

    #[test]
    fn test_annuity_pv_negative_rate_rejected() {
        let result = annuity_present_value(dec!(1000), dec!(-0.01), 12);
        assert!(matches!(result, Err(LeaseError::InvalidRate { .. })));
    }

    #[test]
    fn test_annuity_pv_zero_rate_sum_out_of_range() {
        let result = annuity_present_value(Decimal::MAX / dec!(10), Decimal::ZERO, 1200);
        match result {
            Err(LeaseError::InvalidInput { field, .. }) => assert_eq!(field, "payment_amount"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_annuity_pv_discounted_sum_out_of_range() {
        // annuity factor ~11.26 pushes the product past Decimal::MAX
        let result = annuity_present_value(Decimal::MAX, dec!(0.01), 12);
        assert!(matches!(result, Err(LeaseError::InvalidInput { .. })));
    }

    #[test]
    fn test_annuity_pv_single_payment() {
        // One payment discounted one period: 1100 / 1.1 = 1000
        let result = annuity_present_value(dec!(1100), dec!(0.1), 1).unwrap();
        assert!((result - dec!(1000)).abs() < dec!(0.0000001));
    }
}
