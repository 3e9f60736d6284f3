//! Fixed-point currency amounts.
//!
//! Every amount is a `Decimal` with exactly two fraction digits. Values are
//! rounded half away from zero whenever they enter a `Money`.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

const SCALE: u32 = 2;

/// A currency amount with two decimal places.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Rounds `value` to two decimal places, half away from zero.
    ///
    /// `2.345` becomes `2.35` and `-2.345` becomes `-2.35`.
    pub fn round(value: Decimal) -> Self {
        let mut rounded = value.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(SCALE);
        Money(rounded)
    }

    /// Largest magnitude accepted for an expense amount or split value.
    /// Sums of such amounts stay far inside `Decimal`'s range.
    pub fn max_amount() -> Decimal {
        Decimal::new(1_000_000_000_000_000, 0)
    }

    /// Truncates `value` toward zero at two decimal places.
    pub fn truncate(value: Decimal) -> Self {
        let mut truncated = value.round_dp_with_strategy(SCALE, RoundingStrategy::ToZero);
        truncated.rescale(SCALE);
        Money(truncated)
    }

    /// The number of cents, when it fits in an `i64`.
    pub fn cents(&self) -> Option<i64> {
        self.0.checked_mul(Decimal::ONE_HUNDRED)?.trunc().to_i64()
    }

    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money::round)
    }

    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money::round)
    }

    /// The smallest representable amount (one cent).
    pub fn cent() -> Self {
        Money(Decimal::new(1, SCALE))
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, SCALE))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::round(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer).map(Money::round)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money::round(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Money {
        Money::round(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        *self = *self - rhs;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Money {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round_half_away_from_zero() {
        assert_eq!(Money::round(dec!(2.345)).amount(), dec!(2.35));
        assert_eq!(Money::round(dec!(-2.345)).amount(), dec!(-2.35));
        assert_eq!(Money::round(dec!(2.344)).amount(), dec!(2.34));
        // banker's rounding would give 0.12 here
        assert_eq!(Money::round(dec!(0.125)).amount(), dec!(0.13));
    }

    #[test]
    fn test_display_always_two_digits() {
        assert_eq!(Money::round(dec!(200)).to_string(), "200.00");
        assert_eq!(Money::round(dec!(33.3)).to_string(), "33.30");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_arithmetic_is_exact() {
        let a = Money::round(dec!(0.10));
        let b = Money::round(dec!(0.20));
        assert_eq!(a + b, Money::round(dec!(0.30)));
        assert_eq!(b - a - a, Money::ZERO);
        assert_eq!(-a, Money::from_cents(-10));
    }

    #[test]
    fn test_truncate_toward_zero() {
        assert_eq!(Money::truncate(dec!(2.349)), Money::from_cents(234));
        assert_eq!(Money::truncate(dec!(-2.349)), Money::from_cents(-234));
        assert_eq!(Money::from_cents(1234).cents(), Some(1234));
    }

    #[test]
    fn test_checked_ops_report_overflow() {
        let huge = Money(Decimal::MAX);
        assert_eq!(huge.checked_add(huge), None);
        assert_eq!(Money::from_cents(5).checked_sub(Money::from_cents(7)), Some(Money::from_cents(-2)));
    }

    #[test]
    fn test_sum() {
        let parts = vec![Money::from_cents(3333), Money::from_cents(3333), Money::from_cents(3334)];
        assert_eq!(parts.iter().sum::<Money>(), Money::round(dec!(100)));
    }

    #[test]
    fn test_serde_string_and_number() {
        let m: Money = serde_json::from_str("\"12.345\"").unwrap();
        assert_eq!(m, Money::from_cents(1235));
        let m: Money = serde_json::from_str("40").unwrap();
        assert_eq!(m, Money::from_cents(4000));
        assert_eq!(serde_json::to_string(&Money::from_cents(4000)).unwrap(), "\"40.00\"");
    }
}
