//! # Money Module
//!
//! Provides the `Money` type for ledger costs.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  FRACTIONAL QUANTITIES, WHOLE CENTS                                     │
//! │                                                                         │
//! │  Stock moves in fractions: 0.5915 bottles, 2.25 lb, 0.0625 cases.      │
//! │  Cost does not: the ledger posts whole cents.                          │
//! │                                                                         │
//! │    0.59147 bottles × 2000 ¢/bottle = 1182.94 ¢  →  1183 ¢ ($11.83)     │
//! │                                                                         │
//! │  Each ledger line is rounded once, and totals are sums of the rounded  │
//! │  lines, so a result's total always equals the sum of its rows.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use stockline_core::money::Money;
//!
//! let per_bottle = Money::from_cents(2000); // $20.00
//! let cost = per_bottle.multiply_fractional(0.5);
//! assert_eq!(cost.cents(), 1000);
//!
//! let consumed = -cost; // ledger rows are signed
//! assert_eq!(consumed.to_string(), "-$10.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: ledger consumption rows carry negative costs
/// - **Single field tuple struct**: Zero-cost abstraction over i64
///
/// ## Where Money is Used
/// ```text
/// Product.cost_per_unit_cents ──► Conversion.cost ──► DeductedIngredient.cost
///                                                          │
///                                      DeductionResult.total_cost ◄──┤
///                                                          │
///                                 InventoryTransaction.cost_cents (negated)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// let price = Money::from_cents(250); // Represents $2.50
    /// assert_eq!(price.cents(), 250);
    /// ```
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents (smallest currency unit).
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit (dollars) portion.
    #[inline]
    pub const fn dollars(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit (cents) portion (always 0-99).
    #[inline]
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Multiplies a per-unit cost by a fractional quantity.
    ///
    /// Rounds to the nearest cent, halves away from zero. This is the only
    /// place a float meets money, and it happens once per ledger line.
    ///
    /// ## Example
    /// ```rust
    /// use stockline_core::money::Money;
    ///
    /// let per_can = Money::from_cents(250); // $2.50
    /// assert_eq!(per_can.multiply_fractional(7.0).cents(), 1750);
    ///
    /// let per_bottle = Money::from_cents(2000);
    /// assert_eq!(per_bottle.multiply_fractional(0.59147).cents(), 1183);
    /// ```
    pub fn multiply_fractional(&self, quantity: f64) -> Money {
        let cents = (self.0 as f64 * quantity).round();
        if !cents.is_finite() {
            return Money::zero();
        }
        Money(cents as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows money in a human-readable format.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}${}.{:02}",
            sign,
            self.dollars().abs(),
            self.cents_part()
        )
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

/// Negation, used to post consumption as a negative ledger cost.
impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
