/// Non-negative decimal used for book prices and level quantities.
///
/// Book levels can never carry a negative price or size, so the invariant is
/// checked once at the decode boundary. Ordering and equality ignore scale:
/// `"100.0"` and `"100.00"` name the same level.
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::GeminiError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UnsignedDecimal(Decimal);

impl UnsignedDecimal {
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Fails with [`GeminiError::DecodeError`] for values below zero.
    pub fn new(value: Decimal) -> Result<Self, GeminiError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(GeminiError::DecodeError(format!(
                "Book amount must not be negative: {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn into_inner(self) -> Decimal {
        self.0
    }
}

impl fmt::Display for UnsignedDecimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for UnsignedDecimal {
    type Err = GeminiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = Decimal::from_str(s.trim())
            .map_err(|e| GeminiError::DecodeError(format!("Invalid decimal '{s}': {e}")))?;
        Self::new(value)
    }
}

impl TryFrom<Decimal> for UnsignedDecimal {
    type Error = GeminiError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<u32> for UnsignedDecimal {
    fn from(v: u32) -> Self {
        Self(Decimal::from(v))
    }
}

impl From<UnsignedDecimal> for Decimal {
    fn from(v: UnsignedDecimal) -> Self {
        v.0
    }
}

impl Add for UnsignedDecimal {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sum for UnsignedDecimal {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl Serialize for UnsignedDecimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

struct UnsignedDecimalVisitor;

impl<'de> Visitor<'de> for UnsignedDecimalVisitor {
    type Value = UnsignedDecimal;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative decimal string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(UnsignedDecimal(Decimal::from(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        UnsignedDecimal::new(Decimal::from(v)).map_err(E::custom)
    }
}

/// Accepts the exchange's quoted decimals and bare integers. Floats are
/// rejected rather than rounded.
impl<'de> Deserialize<'de> for UnsignedDecimal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(UnsignedDecimalVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_negative_amounts_rejected() {
        assert!(UnsignedDecimal::new(dec!(-0.5)).is_err());
        assert!("-1".parse::<UnsignedDecimal>().is_err());
        assert!(serde_json::from_str::<UnsignedDecimal>("-3").is_err());
    }

    #[test]
    fn test_decode_quoted_and_integer_forms() {
        let quoted: UnsignedDecimal = serde_json::from_str("\"10.50\"").unwrap();
        let integer: UnsignedDecimal = serde_json::from_str("7").unwrap();
        assert_eq!(quoted.into_inner(), dec!(10.5));
        assert_eq!(integer.into_inner(), dec!(7));
        assert!(serde_json::from_str::<UnsignedDecimal>("\"abc\"").is_err());
        assert!(serde_json::from_str::<UnsignedDecimal>("1.5").is_err());
    }

    #[test]
    fn test_scale_does_not_affect_identity() {
        let a: UnsignedDecimal = "100.0".parse().unwrap();
        let b: UnsignedDecimal = "100.00".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a.cmp(&b), std::cmp::Ordering::Equal);
    }

    #[test]
    fn test_sum_of_levels() {
        let a: UnsignedDecimal = "3".parse().unwrap();
        let b: UnsignedDecimal = "1.25".parse().unwrap();
        let total: UnsignedDecimal = [a, b].into_iter().sum();
        assert_eq!(total.into_inner(), dec!(4.25));
    }
}
