//! Naira amounts using decimal arithmetic.
//!
//! Catalog prices, shipping fees, and order totals are whole-unit naira
//! decimals. The payment provider works in kobo (1 naira = 100 kobo), so the
//! only conversion this crate performs is [`Naira::to_kobo`].

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, Mul};

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// ISO 4217 code for the Nigerian naira.
pub const CURRENCY_CODE: &str = "NGN";

/// Errors that can occur when converting money amounts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is negative.
    #[error("amount cannot be negative")]
    Negative,
    /// The amount does not fit into an integer number of kobo.
    #[error("amount is too large to charge")]
    Overflow,
}

/// An amount of Nigerian naira.
///
/// Serialized as a decimal string (e.g. `"30500"`), which keeps JSON
/// consumers from losing precision.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Naira(Decimal);

impl Naira {
    /// Zero naira.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from a whole number of naira.
    #[must_use]
    pub fn from_whole(amount: i64) -> Self {
        Self(Decimal::from(amount))
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Convert to integer kobo for the payment provider.
    ///
    /// Fractions of a kobo are rounded half-away-from-zero.
    ///
    /// # Errors
    ///
    /// Returns [`MoneyError::Negative`] for negative amounts and
    /// [`MoneyError::Overflow`] if the value cannot be represented as `i64`.
    pub fn to_kobo(&self) -> Result<i64, MoneyError> {
        if self.0.is_sign_negative() && !self.0.is_zero() {
            return Err(MoneyError::Negative);
        }
        let kobo = self
            .0
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::Overflow)?
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        kobo.to_i64().ok_or(MoneyError::Overflow)
    }
}

impl Add for Naira {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Mul<u32> for Naira {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        Self(self.0 * Decimal::from(rhs))
    }
}

impl Sum for Naira {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Naira {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Naira {
    /// Formats as `₦30,500.00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.0.round_dp(2);
        let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };
        let abs = rounded.abs();
        let whole = abs.trunc();
        let fraction = ((abs - whole) * Decimal::ONE_HUNDRED)
            .to_u32()
            .unwrap_or_default();

        let digits = whole.to_u128().unwrap_or_default().to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{sign}₦{grouped}.{fraction:02}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_kobo() {
        assert_eq!(Naira::from_whole(30_500).to_kobo(), Ok(3_050_000));
        assert_eq!(Naira::new(Decimal::new(1999, 2)).to_kobo(), Ok(1999));
        assert_eq!(Naira::ZERO.to_kobo(), Ok(0));
    }

    #[test]
    fn test_to_kobo_rounds_sub_kobo_fractions() {
        // 10.005 naira -> 1000.5 kobo -> 1001
        assert_eq!(Naira::new(Decimal::new(10_005, 3)).to_kobo(), Ok(1001));
    }

    #[test]
    fn test_to_kobo_rejects_negative() {
        assert_eq!(Naira::from_whole(-1).to_kobo(), Err(MoneyError::Negative));
    }

    #[test]
    fn test_arithmetic() {
        let line = Naira::from_whole(10_000) * 2;
        let total: Naira = [line, Naira::from_whole(5_000), Naira::from_whole(5_500)]
            .into_iter()
            .sum();
        assert_eq!(total, Naira::from_whole(30_500));
    }

    #[test]
    fn test_display() {
        assert_eq!(Naira::from_whole(30_500).to_string(), "₦30,500.00");
        assert_eq!(Naira::from_whole(999).to_string(), "₦999.00");
        assert_eq!(Naira::from_whole(1_000_000).to_string(), "₦1,000,000.00");
        assert_eq!(Naira::new(Decimal::new(12_345, 2)).to_string(), "₦123.45");
    }

    #[test]
    fn test_serde_uses_decimal_string() {
        let json = serde_json::to_string(&Naira::from_whole(5_500)).unwrap();
        assert_eq!(json, "\"5500\"");

        let from_number: Naira = serde_json::from_str("10000").unwrap();
        assert_eq!(from_number, Naira::from_whole(10_000));
    }
}
