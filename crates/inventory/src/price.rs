//! Non-negative decimal price stored as integer minor units (cents).

use core::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

use storefront_core::DomainError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price must be non-negative")]
    Negative,

    #[error("price '{0}' is not a decimal number")]
    NotANumber(String),

    #[error("price '{0}' has more than two decimal places")]
    TooPrecise(String),

    #[error("price '{0}' is too large")]
    Overflow(String),
}

impl From<PriceError> for DomainError {
    fn from(value: PriceError) -> Self {
        DomainError::validation(value.to_string())
    }
}

/// A price with two decimal places, e.g. `25.00`.
///
/// Negative prices are unrepresentable; parsing `"-1"` fails with
/// [`PriceError::Negative`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(u64);

impl Price {
    pub const ZERO: Price = Price(0);

    pub fn from_minor_units(cents: u64) -> Self {
        Self(cents)
    }

    pub fn minor_units(self) -> u64 {
        self.0
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.starts_with('-') {
            return Err(PriceError::Negative);
        }
        let unsigned = raw.strip_prefix('+').unwrap_or(raw);

        let (whole, frac) = match unsigned.split_once('.') {
            Some((w, f)) => (w, f),
            None => (unsigned, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(frac) {
            return Err(PriceError::NotANumber(s.to_string()));
        }
        if frac.len() > 2 {
            // Trailing zeros beyond the cents are harmless ("1.500").
            if frac[2..].bytes().any(|b| b != b'0') {
                return Err(PriceError::TooPrecise(s.to_string()));
            }
        }

        let overflow = || PriceError::Overflow(s.to_string());
        let whole: u64 = whole.parse().map_err(|_| overflow())?;
        let cents: u64 = match frac.len() {
            0 => 0,
            1 => u64::from(frac.as_bytes()[0] - b'0') * 10,
            _ => u64::from(frac.as_bytes()[0] - b'0') * 10 + u64::from(frac.as_bytes()[1] - b'0'),
        };

        whole
            .checked_mul(100)
            .and_then(|w| w.checked_add(cents))
            .map(Price)
            .ok_or_else(overflow)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
