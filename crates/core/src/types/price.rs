//! Rouble prices using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize, Serializer, ser::Error as _};

/// Errors produced when parsing a price typed by the user.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input was blank.
    #[error("Введите цену.")]
    Missing,
    /// The input is not a number.
    #[error("Цена должна быть числом.")]
    NotANumber,
    /// Zero or negative.
    #[error("Цена должна быть больше нуля.")]
    NotPositive,
}

/// A price in roubles.
///
/// Serialized as a JSON number (`199`, `150.5`); deserialized from a number or
/// a numeric string. Displayed with the rouble sign and without trailing
/// zeros (`199 ₽`, `205.5 ₽`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Wrap a decimal amount.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Whole roubles.
    #[must_use]
    pub fn from_roubles(roubles: i64) -> Self {
        Self(Decimal::from(roubles))
    }

    /// The underlying amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Parse a target price typed into a form: must be present and strictly positive.
    ///
    /// Accepts a comma as the decimal separator.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError`] when the input is blank, not numeric or not positive.
    pub fn parse_positive(raw: &str) -> Result<Self, PriceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Missing);
        }
        let amount =
            Decimal::from_str(&trimmed.replace(',', ".")).map_err(|_| PriceError::NotANumber)?;
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        Ok(Self(amount))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ₽", self.0.normalize())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let amount = self.0.normalize();
        if amount.scale() == 0
            && let Some(whole) = amount.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        match amount.to_f64() {
            Some(value) => serializer.serialize_f64(value),
            None => Err(S::Error::custom(format!("price {amount} is out of range"))),
        }
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}
