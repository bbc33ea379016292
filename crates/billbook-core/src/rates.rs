//! # Rates and Jurisdiction
//!
//! Percentages are carried as basis points so that `12.5%` is the integer
//! `1250`, never a float.
//!
//! ```text
//! 1 bps = 0.01%        1800 bps = 18%        10000 bps = 100%
//! ```
//!
//! [`TaxJurisdiction`] decides how a line's GST is split. It is a property of
//! the whole cart, not of a line.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::error::{CoreResult, ValidationError};

/// Basis points in 100%.
pub const BPS_PER_WHOLE: u32 = 10_000;

// =============================================================================
// Tax Rate
// =============================================================================

/// GST rate in basis points (1800 = 18%).
///
/// Non-negative by construction. Rates above 100% are accepted here because
/// cess-inclusive rates exist; the parsing boundary caps user input at 100%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Exempt goods (fresh produce, unbranded staples).
    pub const EXEMPT: TaxRate = TaxRate(0);
    /// 5% slab.
    pub const GST_5: TaxRate = TaxRate(500);
    /// 12% slab.
    pub const GST_12: TaxRate = TaxRate(1200);
    /// 18% slab, the default for most services.
    pub const GST_18: TaxRate = TaxRate(1800);
    /// 28% slab.
    pub const GST_28: TaxRate = TaxRate(2800);

    /// The standard slabs, lowest first.
    pub const SLABS: [TaxRate; 5] = [
        Self::EXEMPT,
        Self::GST_5,
        Self::GST_12,
        Self::GST_18,
        Self::GST_28,
    ];

    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The rate as a fraction: 1800 bps → `0.18`.
    pub fn to_fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    /// The rate as a percentage: 1250 bps → `12.5`.
    pub fn percent(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2).normalize()
    }

    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

// =============================================================================
// Discount Rate
// =============================================================================

/// Line discount in basis points, always within 0..=10000.
///
/// ## Example
/// ```rust
/// use billbook_core::rates::DiscountRate;
///
/// let ten = DiscountRate::from_bps(1000).unwrap();
/// assert_eq!(ten.bps(), 1000);
/// assert!(DiscountRate::from_bps(10_001).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(try_from = "u32", into = "u32")]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// No discount.
    pub const NONE: DiscountRate = DiscountRate(0);

    /// Creates a discount from basis points, rejecting anything above 100%.
    pub fn from_bps(bps: u32) -> CoreResult<Self> {
        if bps > BPS_PER_WHOLE {
            return Err(ValidationError::out_of_range("discount", 0, 100).into());
        }
        Ok(DiscountRate(bps))
    }

    /// Creates a discount from a whole-number percentage.
    pub fn from_percent(percent: i64) -> CoreResult<Self> {
        if !(0..=100).contains(&percent) {
            return Err(ValidationError::out_of_range("discount", 0, 100).into());
        }
        // Range checked above.
        Ok(DiscountRate(percent as u32 * 100))
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// The discount as a fraction: 1000 bps → `0.10`.
    pub fn to_fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    /// The discount as a percentage: 1250 bps → `12.5`.
    pub fn percent(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 2).normalize()
    }

    /// Multiplier left after the discount: 1000 bps → `0.90`.
    pub fn remaining_fraction(&self) -> Decimal {
        Decimal::ONE - self.to_fraction()
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::NONE
    }
}

impl TryFrom<u32> for DiscountRate {
    type Error = crate::error::CoreError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        DiscountRate::from_bps(bps)
    }
}

impl From<DiscountRate> for u32 {
    fn from(rate: DiscountRate) -> u32 {
        rate.0
    }
}

// =============================================================================
// Tax Jurisdiction
// =============================================================================

/// Whether the sale stays within the store's state.
///
/// ```text
/// store 29 (Karnataka) ── customer 29 ──► SameState      → CGST + SGST
/// store 29 (Karnataka) ── customer 27 ──► DifferentState → IGST
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TaxJurisdiction {
    /// Intra-state supply: tax splits evenly into CGST and SGST.
    SameState,
    /// Inter-state supply: the whole tax is IGST.
    DifferentState,
}

impl TaxJurisdiction {
    /// Derives the jurisdiction from two GST state codes.
    ///
    /// An unknown customer state is treated as a local walk-in sale.
    pub fn between(store_state: &str, customer_state: Option<&str>) -> Self {
        match customer_state.map(str::trim) {
            Some(code) if !code.is_empty() && code != store_state.trim() => {
                TaxJurisdiction::DifferentState
            }
            _ => TaxJurisdiction::SameState,
        }
    }

    /// Storage/wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            TaxJurisdiction::SameState => "same_state",
            TaxJurisdiction::DifferentState => "different_state",
        }
    }

    /// Parses the storage/wire name. Also accepts `SAME_STATE` style.
    pub fn parse(value: &str) -> CoreResult<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "same_state" | "intra_state" => Ok(TaxJurisdiction::SameState),
            "different_state" | "inter_state" => Ok(TaxJurisdiction::DifferentState),
            _ => Err(ValidationError::NotAllowed {
                field: "jurisdiction".to_string(),
                allowed: vec!["same_state".to_string(), "different_state".to_string()],
            }
            .into()),
        }
    }
}

impl Default for TaxJurisdiction {
    fn default() -> Self {
        TaxJurisdiction::SameState
    }
}

impl fmt::Display for TaxJurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
