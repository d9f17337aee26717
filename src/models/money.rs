//! A fixed-point representation for monetary amounts.
//!
//! All amounts in the application are Ethiopian birr with two fractional
//! digits. Amounts are stored and summed as integer cents so that the
//! persistence layer never loses precision to binary floating point; values
//! are converted to doubles only at the JSON boundary.

use std::fmt::Display;
use std::ops::{Add, Sub};

use rust_decimal::{
    prelude::{FromPrimitive, ToPrimitive},
    Decimal, RoundingStrategy,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// The error returned when a number cannot be converted into [Money].
#[derive(Debug, Error, PartialEq)]
#[error("{0} is not a representable amount of money")]
pub struct MoneyError(pub f64);

/// An amount of money with two-decimal fixed-point semantics.
///
/// Internally an integer number of cents. Serializes to a JSON number
/// (e.g. `1234.56`) and deserializes from one, rounding to two decimal
/// places half-away-from-zero, the rounding a SQL `DECIMAL(12, 2)` column
/// applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Money(i64);

impl Money {
    /// Zero birr.
    pub const ZERO: Money = Money(0);

    /// Create an amount from a whole number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create an amount from a float, rounding to two decimal places.
    ///
    /// # Errors
    ///
    /// Returns a [MoneyError] if `value` is not finite or does not fit the
    /// fixed-point range.
    pub fn try_from_f64(value: f64) -> Result<Self, MoneyError> {
        let decimal = Decimal::from_f64(value).ok_or(MoneyError(value))?;
        let cents = (decimal.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
            * Decimal::ONE_HUNDRED)
            .to_i64()
            .ok_or(MoneyError(value))?;

        Ok(Self(cents))
    }

    /// The amount as a whole number of cents.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// The amount as a double, for the JSON boundary.
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whether the amount is strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Decimal renders the exact two-decimal form, e.g. "1234.56".
        write!(f, "{}", Decimal::new(self.0, 2))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl Serialize for Money {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;

        Money::try_from_f64(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod money_tests {
    use super::{Money, MoneyError};

    #[test]
    fn try_from_f64_rounds_to_two_decimal_places() {
        assert_eq!(Money::try_from_f64(12.345), Ok(Money::from_cents(1235)));
        assert_eq!(Money::try_from_f64(12.344), Ok(Money::from_cents(1234)));
    }

    #[test]
    fn try_from_f64_fails_on_non_finite_values() {
        assert!(matches!(Money::try_from_f64(f64::NAN), Err(MoneyError(_))));
        assert!(matches!(
            Money::try_from_f64(f64::INFINITY),
            Err(MoneyError(_))
        ));
    }

    #[test]
    fn arithmetic_is_exact_over_cents() {
        // 0.1 + 0.2 famously does not equal 0.3 in binary floating point.
        let total = Money::try_from_f64(0.1).unwrap() + Money::try_from_f64(0.2).unwrap();

        assert_eq!(total, Money::from_cents(30));
    }

    #[test]
    fn serializes_as_json_number() {
        let amount = Money::from_cents(123456);

        assert_eq!(serde_json::to_string(&amount).unwrap(), "1234.56");
    }

    #[test]
    fn deserializes_from_integer_and_float_literals() {
        assert_eq!(
            serde_json::from_str::<Money>("1000").unwrap(),
            Money::from_cents(100_000)
        );
        assert_eq!(
            serde_json::from_str::<Money>("49.99").unwrap(),
            Money::from_cents(4999)
        );
    }

    #[test]
    fn displays_with_two_decimal_places() {
        assert_eq!(Money::from_cents(5000).to_string(), "50.00");
        assert_eq!(Money::from_cents(105).to_string(), "1.05");
    }
}
