//! Exact currency amounts
//!
//! `Money` always holds its amount at two decimal places, rounded half-up at
//! construction. Every operation that combines two amounts checks that they
//! share a currency and fails with `DomainError::CurrencyMismatch` otherwise.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::constants::{CURRENCY_CODE_LENGTH, MONEY_SCALE};
use crate::errors::{DomainError, Result};

/// ISO-4217 alphabetic currency code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Currency([u8; CURRENCY_CODE_LENGTH]);

impl Currency {
    pub fn new(code: &str) -> Result<Self> {
        let bytes = code.as_bytes();
        if bytes.len() != CURRENCY_CODE_LENGTH || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(DomainError::InvalidCurrency(code.to_string()));
        }
        Ok(Self([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn as_str(&self) -> &str {
        // Only ASCII letters pass `new`.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for Currency {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Currency> for String {
    fn from(currency: Currency) -> Self {
        currency.as_str().to_string()
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An amount of money in a single currency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawMoney")]
pub struct Money {
    amount: Decimal,
    currency: Currency,
}

#[derive(Deserialize)]
struct RawMoney {
    amount: Decimal,
    currency: String,
}

impl TryFrom<RawMoney> for Money {
    type Error = DomainError;

    fn try_from(raw: RawMoney) -> Result<Self> {
        Money::new(raw.amount, Currency::new(&raw.currency)?)
    }
}

impl Money {
    /// Create an amount, rounding it half-up to two decimal places
    ///
    /// Fails with `InvalidAmount` when the value is too large to carry two
    /// decimal places.
    pub fn new(amount: Decimal, currency: Currency) -> Result<Self> {
        let mut amount =
            amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
        // `rescale` keeps the old scale when the mantissa has no room.
        amount.rescale(MONEY_SCALE);
        if amount.scale() != MONEY_SCALE {
            return Err(DomainError::InvalidAmount(format!(
                "{amount} does not fit with {MONEY_SCALE} decimal places"
            )));
        }
        Ok(Self { amount, currency })
    }

    /// Parse an amount from its decimal string form and a currency code
    pub fn of(amount: &str, currency_code: &str) -> Result<Self> {
        let amount = parse_decimal(amount).ok_or_else(|| DomainError::InvalidAmount(amount.to_string()))?;
        Self::new(amount, Currency::new(currency_code)?)
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn is_positive(&self) -> bool {
        self.amount > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    pub fn has_same_currency_as(&self, other: &Money) -> bool {
        self.currency == other.currency
    }

    /// Compare two amounts of the same currency
    pub fn checked_cmp(&self, other: &Money) -> Result<Ordering> {
        self.require_same_currency(other)?;
        Ok(self.amount.cmp(&other.amount))
    }

    pub fn is_greater_than(&self, other: &Money) -> Result<bool> {
        Ok(self.checked_cmp(other)? == Ordering::Greater)
    }

    pub fn is_greater_than_or_equal(&self, other: &Money) -> Result<bool> {
        Ok(self.checked_cmp(other)? != Ordering::Less)
    }

    pub fn is_less_than(&self, other: &Money) -> Result<bool> {
        Ok(self.checked_cmp(other)? == Ordering::Less)
    }

    pub fn is_less_than_or_equal(&self, other: &Money) -> Result<bool> {
        Ok(self.checked_cmp(other)? != Ordering::Greater)
    }

    pub fn plus(&self, other: &Money) -> Result<Money> {
        self.require_same_currency(other)?;
        let sum = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| DomainError::InvalidAmount(format!("{} + {} overflows", self, other)))?;
        Money::new(sum, self.currency)
    }

    pub fn minus(&self, other: &Money) -> Result<Money> {
        self.require_same_currency(other)?;
        let difference = self
            .amount
            .checked_sub(other.amount)
            .ok_or_else(|| DomainError::InvalidAmount(format!("{} - {} overflows", self, other)))?;
        Money::new(difference, self.currency)
    }

    /// Multiply by a factor, rounding the product half-up to two decimals
    pub fn times(&self, factor: Decimal) -> Result<Money> {
        let product = self
            .amount
            .checked_mul(factor)
            .ok_or_else(|| DomainError::InvalidAmount(format!("{} x {} overflows", self, factor)))?;
        Money::new(product, self.currency)
    }

    pub fn divide(&self, divisor: Decimal) -> Result<Money> {
        if divisor <= Decimal::ZERO {
            return Err(DomainError::validation("divisor must be greater than zero"));
        }
        let quotient = self
            .amount
            .checked_div(divisor)
            .ok_or_else(|| DomainError::InvalidAmount(format!("{} / {} overflows", self, divisor)))?;
        Money::new(quotient, self.currency)
    }

    fn require_same_currency(&self, other: &Money) -> Result<()> {
        if !self.has_same_currency_as(other) {
            return Err(DomainError::CurrencyMismatch {
                left: self.currency.to_string(),
                right: other.currency.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}

/// Parse a plain or scientific decimal literal
pub(crate) fn parse_decimal(value: &str) -> Option<Decimal> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed != value {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}
