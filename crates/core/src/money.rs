//! Monetary amounts in the smallest currency unit.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// Monetary amount stored as cents (2-decimal precision).
///
/// Conversions from decimal text or floats round **up** to the next cent.
/// Never undercharge: `123.455` becomes `123.46`, not `123.45`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Convert a raw decimal value to cents, rounding up (ceiling).
    pub fn from_f64_ceil(value: f64) -> DomainResult<Self> {
        if !value.is_finite() {
            return Err(DomainError::validation("amount must be a finite number"));
        }
        if value < 0.0 {
            return Err(DomainError::validation("amount must not be negative"));
        }
        Ok(Self((value * 100.0).ceil() as i64))
    }

    /// Parse decimal text into cents, rounding up.
    ///
    /// Accepts a decimal comma (`123,45`) or a decimal point (`123.45`).
    pub fn parse_decimal(text: &str) -> DomainResult<Self> {
        let normalized = text.trim().replace(',', ".");
        let value: f64 = normalized
            .parse()
            .map_err(|_| DomainError::validation(format!("invalid decimal amount: {text:?}")))?;
        Self::from_f64_ceil(value)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}
