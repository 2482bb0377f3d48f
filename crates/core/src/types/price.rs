//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are stored as `NUMERIC` and carried as [`Decimal`] so that a value
//! read back from the database is exactly the value that was written. On the
//! wire a price is a plain JSON number (`9.99`).

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when building a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price must be greater than or equal to 0")]
    Negative,
    /// The number cannot be represented as a decimal.
    #[error("not a valid number: {0}")]
    NotANumber(String),
}

/// A non-negative product price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(Decimal);

impl Price {
    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative);
        }
        Ok(Self(amount.normalize()))
    }

    /// Parse a price from the textual form of a JSON number.
    ///
    /// Accepts plain (`9.99`) and scientific (`1e3`) notation. Amounts with
    /// more than 28 fractional digits are rounded half away from zero to 28
    /// places, so `1e-29` parses as zero.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::NotANumber`] if the text is not a decimal number
    /// that fits in 96 bits, or [`PriceError::Negative`] for amounts below zero.
    pub fn parse(text: &str) -> Result<Self, PriceError> {
        let amount = Decimal::from_str_exact(text)
            .or_else(|_| Decimal::from_scientific(text))
            .ok()
            .or_else(|| parse_rounded(text))
            .ok_or_else(|| PriceError::NotANumber(text.to_owned()))?;
        Self::new(amount)
    }

    /// Returns the decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

/// Largest scale a [`Decimal`] can carry.
const MAX_SCALE: u32 = 28;

/// Parse `text` rounded to [`MAX_SCALE`] fractional digits.
fn parse_rounded(text: &str) -> Option<Decimal> {
    let Some((mantissa, exponent)) = text.split_once(['e', 'E']) else {
        // Plain notation: `from_str` rounds excess fractional digits.
        return Decimal::from_str(text).ok();
    };

    let mantissa = Decimal::from_str(mantissa).ok()?;
    let exponent: i64 = exponent.parse().ok()?;
    let scale = i64::from(mantissa.scale()).checked_sub(exponent)?;
    let excess = u32::try_from(scale - i64::from(MAX_SCALE)).ok()?;
    if excess == 0 {
        return None;
    }

    let unscaled = mantissa.mantissa();
    // |unscaled| < 2^96, so dropping more than 38 digits always leaves zero.
    let rounded = if excess > 38 {
        0
    } else {
        let divisor = 10_i128.pow(excess);
        let half = divisor / 2;
        if unscaled >= 0 {
            (unscaled + half) / divisor
        } else {
            (unscaled - half) / divisor
        }
    };
    Decimal::try_from_i128_with_scale(rounded, MAX_SCALE).ok()
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.0.to_f64().unwrap_or_default())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::parse(&value.to_string()).map_err(serde::de::Error::custom)
    }
}
