//! # Money Module
//!
//! Integer-cents money used for cart totals.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  Persisted prices are JSON numbers (f64) and must stay that way for    │
//! │  compatibility. Totals are computed by rounding each unit price to     │
//! │  cents ONCE, then doing all arithmetic on i64.                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use gomarket_core::money::Money;
//!
//! let price = Money::from_major(10.99);
//! assert_eq!(price.cents(), 1099);
//! assert_eq!(price.multiply_quantity(3).cents(), 3297);
//! assert_eq!(price.to_string(), "10.99");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use ts_rs::TS;

/// A monetary value in the smallest currency unit (cents).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Creates a Money value from a major-unit amount such as a catalog price.
    ///
    /// Rounds half away from zero to the nearest cent. Non-finite input
    /// yields zero.
    ///
    /// ```rust
    /// use gomarket_core::money::Money;
    ///
    /// assert_eq!(Money::from_major(0.1 + 0.2).cents(), 30);
    /// assert_eq!(Money::from_major(2.675).cents(), 268);
    /// assert_eq!(Money::from_major(f64::NAN).cents(), 0);
    /// ```
    pub fn from_major(amount: f64) -> Self {
        if !amount.is_finite() {
            return Money::zero();
        }
        // 1e-9 nudges values like 2.675 (stored as 2.67499999...) back over the half
        let scaled = amount * 100.0;
        let nudged = scaled + scaled.signum() * 1e-9;
        Money(nudged.round() as i64)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion.
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion (always 0-99).
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Zero.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Multiplies a unit price by a quantity, saturating on overflow.
    #[inline]
    pub const fn multiply_quantity(&self, qty: u32) -> Self {
        Money(self.0.saturating_mul(qty as i64))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        *self = *self + rhs;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), Add::add)
    }
}

/// Formats as `major.minor` with two decimals and no currency symbol;
/// currency presentation belongs to the UI.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_major_rounds_to_cents() {
        assert_eq!(Money::from_major(10.0).cents(), 1000);
        assert_eq!(Money::from_major(9.99).cents(), 999);
        assert_eq!(Money::from_major(0.005).cents(), 1);
        assert_eq!(Money::from_major(-5.5).cents(), -550);
    }

    #[test]
    fn test_from_major_rejects_non_finite() {
        assert!(Money::from_major(f64::INFINITY).is_zero());
        assert!(Money::from_major(f64::NEG_INFINITY).is_zero());
    }

    #[test]
    fn test_sum_and_multiply() {
        let total: Money = [Money::from_cents(299), Money::from_cents(201)]
            .into_iter()
            .sum();
        assert_eq!(total.cents(), 500);
        assert_eq!(Money::from_cents(299).multiply_quantity(3).cents(), 897);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_add_saturates() {
        let near_max = Money::from_cents(i64::MAX - 1);
        assert_eq!((near_max + Money::from_cents(10)).cents(), i64::MAX);
    }
}
