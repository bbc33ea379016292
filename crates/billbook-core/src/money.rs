//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Two Representations, One Rule
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHERE EACH REPRESENTATION LIVES                                        │
//! │                                                                         │
//! │  Money (i64 paise)          Decimal (full precision, rupees)            │
//! │  ──────────────────         ─────────────────────────────────           │
//! │  Catalog prices             Line amounts after discount                 │
//! │  Stored invoice totals      CGST/SGST halves, IGST                      │
//! │  Displayed / exported       Running totals while aggregating            │
//! │                                                                         │
//! │  RULE: accumulate in Decimal, round to paise ONCE, at the edge.         │
//! │    18% of ₹0.05 = ₹0.009 → halves of ₹0.0045 each                       │
//! │    Rounding every half first would drift across a long bill.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use billbook_core::money::Money;
//! use rust_decimal::Decimal;
//!
//! let rate = Money::from_paise(129_950); // ₹1299.50
//! assert_eq!(rate.to_decimal(), Decimal::new(129_950, 2));
//!
//! let shown = Money::from_decimal_rounded(Decimal::new(20_255, 3)); // 20.255
//! assert_eq!(shown.paise(), 2026); // half away from zero
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

/// Number of minor units (paise) in one rupee.
pub const PAISE_PER_RUPEE: i64 = 100;

/// Decimal places used whenever a full-precision amount is shown or stored.
pub const DISPLAY_DECIMALS: u32 = 2;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paise (the smallest INR unit).
///
/// ## Design Decisions
/// - **i64 (signed)**: differences and refunds can go negative
/// - **Single field tuple struct**: zero-cost abstraction over i64
/// - **No float constructor**: prices enter through [`crate::parse`]
///
/// ```text
/// Product.price ──► LineItem.unit_rate ──► line_amount (Decimal)
///                                               │
///                                   TotalsResult (Decimal)
///                                               │
///                                   DisplayTotals (Money) ──► invoice row
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paise.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::money::Money;
    ///
    /// let price = Money::from_paise(4999); // ₹49.99
    /// assert_eq!(price.paise(), 4999);
    /// ```
    #[inline]
    pub const fn from_paise(paise: i64) -> Self {
        Money(paise)
    }

    /// Creates a Money value from whole rupees.
    #[inline]
    pub const fn from_rupees(rupees: i64) -> Self {
        Money(rupees * PAISE_PER_RUPEE)
    }

    /// Creates a Money value from rupees and paise.
    ///
    /// For negative amounts, only the rupee part should be negative:
    /// `from_rupees_paise(-5, 50)` is -₹5.50.
    #[inline]
    pub const fn from_rupees_paise(rupees: i64, paise: i64) -> Self {
        if rupees < 0 {
            Money(rupees * PAISE_PER_RUPEE - paise)
        } else {
            Money(rupees * PAISE_PER_RUPEE + paise)
        }
    }

    /// Returns the value in paise.
    #[inline]
    pub const fn paise(&self) -> i64 {
        self.0
    }

    /// Returns the whole-rupee portion (truncated toward zero).
    #[inline]
    pub const fn rupees(&self) -> i64 {
        self.0 / PAISE_PER_RUPEE
    }

    /// Returns the paise portion (always 0-99).
    #[inline]
    pub const fn paise_part(&self) -> i64 {
        (self.0 % PAISE_PER_RUPEE).abs()
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

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Exact conversion to a rupee-denominated `Decimal`.
    ///
    /// ## Example
    /// ```rust
    /// use billbook_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// assert_eq!(Money::from_paise(45_000).to_decimal(), Decimal::from(450));
    /// ```
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, DISPLAY_DECIMALS)
    }

    /// Rounds a full-precision rupee amount to paise.
    ///
    /// Uses round-half-away-from-zero at two decimal places, the convention
    /// printed on GST invoices. Values beyond the i64 paise range saturate.
    pub fn from_decimal_rounded(amount: Decimal) -> Money {
        let rounded =
            amount.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero);
        let paise = rounded * Decimal::from(PAISE_PER_RUPEE);
        let paise = paise.to_i64().unwrap_or(if paise.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        });
        Money(paise)
    }

    /// Multiplies money by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-oriented rendering (`₹12.50`). Locale-aware grouping such as
/// `₹1,23,456.00` belongs to the front end.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}₹{}.{:02}", sign, self.rupees().abs(), self.paise_part())
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

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
