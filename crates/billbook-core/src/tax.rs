//! # GST Split
//!
//! ```text
//! tax = line_amount × rate
//!
//!   SameState       ──► CGST = tax / 2, SGST = tax / 2, IGST = 0
//!   DifferentState  ──► CGST = 0,       SGST = 0,       IGST = tax
//! ```
//!
//! No rounding happens here. Halves of odd paise stay fractional until the
//! totals are rounded for display.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};

use crate::rates::{TaxJurisdiction, TaxRate};

/// Tax on one line (or an accumulation of lines), by component.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSplit {
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
}

impl TaxSplit {
    /// Sum of the three components.
    pub fn total(&self) -> Decimal {
        self.cgst + self.sgst + self.igst
    }
}

impl Add for TaxSplit {
    type Output = TaxSplit;

    fn add(self, other: TaxSplit) -> TaxSplit {
        TaxSplit {
            cgst: self.cgst + other.cgst,
            sgst: self.sgst + other.sgst,
            igst: self.igst + other.igst,
        }
    }
}

impl AddAssign for TaxSplit {
    fn add_assign(&mut self, other: TaxSplit) {
        *self = *self + other;
    }
}

/// Splits the tax on `line_amount` according to `jurisdiction`.
///
/// ## Example
/// ```rust
/// use billbook_core::rates::{TaxJurisdiction, TaxRate};
/// use billbook_core::tax::split_tax;
/// use rust_decimal::Decimal;
///
/// let split = split_tax(Decimal::from(200), TaxRate::GST_18, TaxJurisdiction::SameState);
/// assert_eq!(split.cgst, Decimal::from(18));
/// assert_eq!(split.sgst, Decimal::from(18));
/// assert!(split.igst.is_zero());
/// ```
pub fn split_tax(line_amount: Decimal, rate: TaxRate, jurisdiction: TaxJurisdiction) -> TaxSplit {
    let tax = line_amount * rate.to_fraction();

    match jurisdiction {
        TaxJurisdiction::SameState => {
            let half = tax / Decimal::TWO;
            TaxSplit {
                cgst: half,
                sgst: half,
                igst: Decimal::ZERO,
            }
        }
        TaxJurisdiction::DifferentState => TaxSplit {
            cgst: Decimal::ZERO,
            sgst: Decimal::ZERO,
            igst: tax,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inter_state_is_all_igst() {
        let split = split_tax(Decimal::from(200), TaxRate::GST_18, TaxJurisdiction::DifferentState);
        assert_eq!(split.igst, Decimal::from(36));
        assert!(split.cgst.is_zero() && split.sgst.is_zero());
    }

    #[test]
    fn test_split_is_a_partition() {
        let amounts = [
            Decimal::ZERO,
            Decimal::new(5, 2),
            Decimal::from(450),
            Decimal::new(1_234_567, 3),
        ];
        for amount in amounts {
            for rate in TaxRate::SLABS {
                let expected = amount * rate.to_fraction();
                let same = split_tax(amount, rate, TaxJurisdiction::SameState);
                let diff = split_tax(amount, rate, TaxJurisdiction::DifferentState);

                assert_eq!(same.total(), expected);
                assert_eq!(same.cgst, same.sgst);
                assert!(same.igst.is_zero());

                assert_eq!(diff.total(), expected);
                assert!((diff.cgst + diff.sgst).is_zero());
            }
        }
    }

    #[test]
    fn test_halves_are_not_rounded() {
        // 18% of ₹0.05 = 0.009, halves of 0.0045
        let split = split_tax(Decimal::new(5, 2), TaxRate::GST_18, TaxJurisdiction::SameState);
        assert_eq!(split.cgst, Decimal::new(45, 4));
    }

    #[test]
    fn test_accumulate() {
        let mut acc = TaxSplit::default();
        acc += split_tax(Decimal::from(450), TaxRate::GST_5, TaxJurisdiction::SameState);
        acc += split_tax(Decimal::from(150), TaxRate::GST_12, TaxJurisdiction::SameState);
        assert_eq!(acc.cgst, Decimal::new(2025, 2));
        assert_eq!(acc.total(), Decimal::new(405, 1));
    }
}
