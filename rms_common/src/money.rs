use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of minor units (cents) in one currency unit. Money is always held at 2 decimal places.
pub const MINOR_UNITS_PER_UNIT: i64 = 100;

const BPS_DENOMINATOR: i128 = 10_000;

//--------------------------------------        Money          ---------------------------------------------------------
/// An exact currency amount, stored as a whole number of minor units.
#[derive(Debug, Clone, Copy, Default, Type, Hash, PartialEq, Eq, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Money(i64);

op!(binary Money, Add, add);
op!(binary Money, Sub, sub);
op!(inplace Money, AddAssign, add_assign);
op!(inplace Money, SubAssign, sub_assign);
op!(unary Money, Neg, neg);

impl Mul<i64> for Money {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Value cannot be represented as a money amount: {0}")]
pub struct MoneyConversionError(String);

impl From<i64> for Money {
    fn from(cents: i64) -> Self {
        Self(cents)
    }
}

impl TryFrom<u64> for Money {
    type Error = MoneyConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        i64::try_from(value)
            .map(Self)
            .map_err(|_| MoneyConversionError(format!("Value {value} is too large to convert to Money")))
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_unit = MINOR_UNITS_PER_UNIT.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / per_unit, abs % per_unit)
    }
}

impl FromStr for Money {
    type Err = MoneyConversionError;

    /// Parses amounts of the form `12`, `12.3` or `-12.34`. More than two decimal places is an error rather than a
    /// silent rounding.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || MoneyConversionError(format!("'{s}' is not a valid amount"));
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (units, fraction) = match digits.split_once('.') {
            Some((u, f)) => (u, f),
            None => (digits, ""),
        };
        if units.is_empty() || !units.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        if fraction.len() > 2 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }
        let units = units.parse::<i64>().map_err(|_| err())?;
        let cents = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| err())? * 10,
            _ => fraction.parse::<i64>().map_err(|_| err())?,
        };
        let value = units.checked_mul(MINOR_UNITS_PER_UNIT).and_then(|v| v.checked_add(cents)).ok_or_else(err)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Money {
    /// The amount in minor units (cents).
    pub fn value(&self) -> i64 {
        self.0
    }

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount from whole currency units, e.g. `Money::from_units(25)` is `25.00`.
    pub fn from_units(units: i64) -> Self {
        Self(units * MINOR_UNITS_PER_UNIT)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies the amount by a rate given in basis points (1/100th of a percent), rounding half away from zero to
    /// the nearest minor unit. `Money::from_cents(5).apply_rate_bps(1_000)` is `0.01`, since 0.5c rounds up.
    pub fn apply_rate_bps(&self, bps: i64) -> Self {
        let product = i128::from(self.0) * i128::from(bps);
        let half = BPS_DENOMINATOR / 2;
        let rounded = if product >= 0 {
            (product + half) / BPS_DENOMINATOR
        } else {
            -((-product + half) / BPS_DENOMINATOR)
        };
        #[allow(clippy::cast_possible_truncation)]
        Self(rounded as i64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_uses_two_decimal_places() {
        assert_eq!(Money::from_units(25_000).to_string(), "25000.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1_234).to_string(), "-12.34");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn parse_amounts() {
        assert_eq!("12".parse::<Money>().unwrap(), Money::from_cents(1_200));
        assert_eq!("12.3".parse::<Money>().unwrap(), Money::from_cents(1_230));
        assert_eq!(" 0.07 ".parse::<Money>().unwrap(), Money::from_cents(7));
        assert_eq!("-3.50".parse::<Money>().unwrap(), Money::from_cents(-350));
        assert!("12.345".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
        assert!("1.2x".parse::<Money>().is_err());
    }

    #[test]
    fn rate_rounds_half_up() {
        // 8% of 0.06 is 0.0048, which rounds to 0.00
        assert_eq!(Money::from_cents(6).apply_rate_bps(800), Money::zero());
        // 8% of 0.07 is 0.0056, which rounds to 0.01
        assert_eq!(Money::from_cents(7).apply_rate_bps(800), Money::from_cents(1));
        // exactly half a cent rounds up
        assert_eq!(Money::from_cents(5).apply_rate_bps(1_000), Money::from_cents(1));
        assert_eq!(Money::from_cents(-5).apply_rate_bps(1_000), Money::from_cents(-1));
        assert_eq!(Money::from_units(50_000).apply_rate_bps(800), Money::from_units(4_000));
    }

    #[test]
    fn arithmetic() {
        let mut a = Money::from_units(10);
        a += Money::from_cents(50);
        assert_eq!(a, Money::from_cents(1_050));
        a -= Money::from_units(1);
        assert_eq!(a * 2, Money::from_cents(1_900));
        assert_eq!(-a, Money::from_cents(-950));
        let total: Money = vec![Money::from_units(1), Money::from_units(2), Money::from_cents(3)].into_iter().sum();
        assert_eq!(total, Money::from_cents(303));
        assert!(Money::try_from(u64::MAX).is_err());
    }

    #[test]
    fn serializes_as_minor_units() {
        let json = serde_json::to_string(&Money::from_cents(1_234)).unwrap();
        assert_eq!(json, "1234");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(1_234));
    }
}
