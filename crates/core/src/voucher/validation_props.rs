//! Property-based tests for entry amount rules.
//!
//! Entry exclusivity: a line is accepted iff exactly one side is strictly
//! positive and neither side is negative.

use ledgerline_shared::types::Money;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::validation::check_amounts;
use crate::error::LedgerError;

/// Strategy to generate a valid positive amount (> 0).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    // 0.01 to 1,000,000.00
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate a negative amount.
fn negative_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(-cents, 2))
}

/// Any amount, zero included, at mixed scales.
fn any_amount() -> impl Strategy<Value = Decimal> {
    prop_oneof![
        Just(Decimal::ZERO),
        Just(Decimal::new(0, 4)),
        positive_amount(),
        negative_amount(),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A single positive side is always accepted.
    #[test]
    fn prop_one_positive_side_accepted(amount in positive_amount(), debit_side in any::<bool>()) {
        let (debit, credit) = if debit_side {
            (amount, Decimal::ZERO)
        } else {
            (Decimal::ZERO, amount)
        };
        prop_assert!(check_amounts(1, Money::new(debit), Money::new(credit)).is_ok());
    }

    /// Two positive sides are rejected as invalid.
    #[test]
    fn prop_both_sides_rejected(debit in positive_amount(), credit in positive_amount()) {
        prop_assert_eq!(
            check_amounts(3, Money::new(debit), Money::new(credit)),
            Err(LedgerError::EntryInvalidAmount { line_no: 3 })
        );
    }

    /// A negative side is rejected no matter what the other side holds.
    #[test]
    fn prop_negative_rejected(negative in negative_amount(), other in any_amount(), debit_side in any::<bool>()) {
        let (debit, credit) = if debit_side { (negative, other) } else { (other, negative) };
        prop_assert_eq!(
            check_amounts(2, Money::new(debit), Money::new(credit)),
            Err(LedgerError::EntryZeroAmount { line_no: 2 })
        );
    }

    /// Acceptance matches the exclusivity rule exactly.
    #[test]
    fn prop_exclusivity_rule(debit in any_amount(), credit in any_amount()) {
        let accepted = check_amounts(1, Money::new(debit), Money::new(credit)).is_ok();
        let expected = debit >= Decimal::ZERO
            && credit >= Decimal::ZERO
            && ((debit > Decimal::ZERO) ^ (credit > Decimal::ZERO));
        prop_assert_eq!(accepted, expected);
    }
}
