//! Money amounts shared by prices, line snapshots and order totals.
//!
//! Every amount is stored as `NUMERIC(12, 2)`, so both stores hold cents
//! between zero and [`max_amount`].

use rust_decimal::{Decimal, RoundingStrategy};

/// Largest amount a `NUMERIC(12, 2)` column holds
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999, 2)
}

/// Round to cents, half away from zero like Postgres numeric rounding
pub fn to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Cents value of `amount` when it fits the stored range
pub fn checked_amount(amount: Decimal) -> Option<Decimal> {
    let cents = to_cents(amount);
    (cents >= Decimal::ZERO && cents <= max_amount()).then_some(cents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(to_cents(Decimal::new(1005, 3)), Decimal::new(101, 2));
        assert_eq!(to_cents(Decimal::new(1004, 3)), Decimal::new(100, 2));
    }

    #[test]
    fn range_is_zero_to_numeric_12_2() {
        assert_eq!(checked_amount(Decimal::ZERO), Some(Decimal::ZERO));
        assert_eq!(checked_amount(max_amount()), Some(max_amount()));
        assert_eq!(checked_amount(max_amount() + Decimal::new(1, 2)), None);
        assert_eq!(checked_amount(Decimal::new(-1, 2)), None);
    }

    #[test]
    fn sub_cent_excess_rounds_back_into_range() {
        let just_over = max_amount() + Decimal::new(4, 3);
        assert_eq!(checked_amount(just_over), Some(max_amount()));
    }
}
