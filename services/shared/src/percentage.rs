//! Bounded percentages and decay factors

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::PROBABILITY_SCALE;
use crate::errors::{DomainError, Result};
use crate::money::parse_decimal;

/// A percentage in `[0, 100]`
///
/// Values are normalized (trailing zeros stripped) so that `25` and `25.00`
/// compare and hash equal. Arithmetic saturates at the bounds instead of
/// failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Percentage(Decimal);

impl Percentage {
    pub const ZERO: Percentage = Percentage(Decimal::ZERO);
    pub const HUNDRED: Percentage = Percentage(Decimal::ONE_HUNDRED);

    pub fn new(value: Decimal) -> Result<Self> {
        if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
            return Err(DomainError::InvalidPercentage(format!(
                "value must be in [0,100], got {}",
                value
            )));
        }
        Ok(Self(value.normalize()))
    }

    pub fn of(value: &str) -> Result<Self> {
        let parsed = parse_decimal(value)
            .ok_or_else(|| DomainError::InvalidPercentage(format!("not a decimal: {:?}", value)))?;
        Self::new(parsed)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// `value / 100`, truncated to eight decimal places
    pub fn fractional_value(&self) -> Decimal {
        (self.0 / Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(PROBABILITY_SCALE, RoundingStrategy::ToZero)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_hundred(&self) -> bool {
        *self == Self::HUNDRED
    }

    pub fn plus(&self, other: Percentage) -> Percentage {
        Self::clamped(self.0 + other.0)
    }

    pub fn minus(&self, other: Percentage) -> Percentage {
        Self::clamped(self.0 - other.0)
    }

    /// Scale by a non-negative factor, saturating at 100
    pub fn times(&self, factor: Decimal) -> Result<Percentage> {
        if factor < Decimal::ZERO {
            return Err(DomainError::InvalidPercentage(format!(
                "factor must be >= 0, got {}",
                factor
            )));
        }
        Ok(self
            .0
            .checked_mul(factor)
            .map(Self::clamped)
            .unwrap_or(Self::HUNDRED))
    }

    fn clamped(value: Decimal) -> Percentage {
        Self(value.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED).normalize())
    }
}

impl TryFrom<Decimal> for Percentage {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Percentage> for Decimal {
    fn from(percentage: Percentage) -> Self {
        percentage.0
    }
}

impl fmt::Display for Percentage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Strictly positive multiplier applied to pool growth by the variable
/// contribution strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct DecayFactor(Decimal);

impl DecayFactor {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(DomainError::InvalidDecayFactor(format!(
                "value must be > 0, got {}",
                value
            )));
        }
        Ok(Self(value.normalize()))
    }

    pub fn of(value: &str) -> Result<Self> {
        let parsed = parse_decimal(value)
            .ok_or_else(|| DomainError::InvalidDecayFactor(format!("not a decimal: {:?}", value)))?;
        Self::new(parsed)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for DecayFactor {
    type Error = DomainError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<DecayFactor> for Decimal {
    fn from(factor: DecayFactor) -> Self {
        factor.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn pct(value: &str) -> Percentage {
        Percentage::of(value).unwrap()
    }

    #[test]
    fn test_range_is_enforced() {
        assert!(Percentage::of("150").is_err());
        assert!(Percentage::of("-0.01").is_err());
        assert!(Percentage::of("100.0001").is_err());
        assert!(Percentage::of("abc").is_err());
        assert_eq!(pct("0"), Percentage::ZERO);
        assert_eq!(pct("100"), Percentage::HUNDRED);
    }

    #[test]
    fn test_trailing_zeros_do_not_affect_equality() {
        assert_eq!(pct("25.000"), pct("25"));
        assert_eq!(pct("100.00"), Percentage::HUNDRED);
        assert!(pct("100.00").is_hundred());
        assert_eq!(pct("12.50").value().to_string(), "12.5");
    }

    #[test]
    fn test_fractional_value_truncates() {
        assert_eq!(pct("25").fractional_value(), dec!(0.25));
        assert_eq!(pct("12.5").fractional_value(), dec!(0.125));
        // 33.333333339 / 100 = 0.33333333339 which must not round up.
        assert_eq!(pct("33.333333339").fractional_value(), dec!(0.33333333));
        assert_eq!(pct("0.000000019").fractional_value(), dec!(0.00000000));
    }

    #[test]
    fn test_arithmetic_clamps() {
        assert_eq!(pct("100").plus(pct("1")), Percentage::HUNDRED);
        assert_eq!(pct("60").plus(pct("30")), pct("90"));
        assert_eq!(pct("5").minus(pct("10")), Percentage::ZERO);
        assert_eq!(pct("50").times(dec!(3)).unwrap(), Percentage::HUNDRED);
        assert_eq!(pct("20").times(dec!(0.5)).unwrap(), pct("10"));
    }

    #[test]
    fn test_negative_factor_rejected() {
        assert!(matches!(
            pct("20").times(dec!(-1)),
            Err(DomainError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn test_ordering() {
        assert!(pct("10") < pct("10.5"));
        assert!(Percentage::ZERO < Percentage::HUNDRED);
    }

    #[test]
    fn test_decay_factor_must_be_positive() {
        assert!(DecayFactor::of("0").is_err());
        assert!(DecayFactor::of("-0.5").is_err());
        assert_eq!(DecayFactor::of("0.0100").unwrap().value(), dec!(0.01));
        // No upper bound.
        assert!(DecayFactor::of("1000").is_ok());
    }

    #[test]
    fn test_percentage_accepts_string_and_number_json() {
        let from_string: Percentage = serde_json::from_str("\"12.5\"").unwrap();
        let from_number: Percentage = serde_json::from_str("12.5").unwrap();
        assert_eq!(from_string, from_number);
        assert!(serde_json::from_str::<Percentage>("\"101\"").is_err());
    }
}
