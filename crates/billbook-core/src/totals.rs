//! # Totals Aggregator
//!
//! Derives the bill from a cart. Nothing is cached: the totals are a pure
//! function of the cart and are recomputed after every mutation.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  for each LineItem (insertion order)                                    │
//! │      line_amount ──► sub_total += line_amount                           │
//! │           │                                                             │
//! │           └──► split_tax(line_amount, tax_rate, jurisdiction)           │
//! │                     │                                                   │
//! │                     └──► cgst / sgst / igst += split                    │
//! │                                                                         │
//! │  total_tax   = cgst + sgst + igst                                       │
//! │  grand_total = sub_total + total_tax                                    │
//! │  redemption  = loyalty rule(available, grand_total, requested)          │
//! │                                                                         │
//! │  TotalsResult (Decimal) ──rounded()──► DisplayTotals (Money, paise)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::Cart;
use crate::loyalty;
use crate::money::Money;
use crate::tax::{split_tax, TaxSplit};

// =============================================================================
// Result Types
// =============================================================================

/// Full-precision bill totals, in rupees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsResult {
    pub sub_total: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub total_tax: Decimal,
    pub grand_total: Decimal,
    pub loyalty_points_redeemed: i64,
    pub payable_after_redemption: Decimal,
}

impl TotalsResult {
    /// Rounds every amount to paise for display and export.
    ///
    /// Each field is rounded on its own, so the rounded components may differ
    /// from the rounded total by a paisa.
    pub fn rounded(&self) -> DisplayTotals {
        DisplayTotals {
            sub_total: Money::from_decimal_rounded(self.sub_total),
            cgst: Money::from_decimal_rounded(self.cgst),
            sgst: Money::from_decimal_rounded(self.sgst),
            igst: Money::from_decimal_rounded(self.igst),
            total_tax: Money::from_decimal_rounded(self.total_tax),
            grand_total: Money::from_decimal_rounded(self.grand_total),
            loyalty_points_redeemed: self.loyalty_points_redeemed,
            payable_after_redemption: Money::from_decimal_rounded(self.payable_after_redemption),
        }
    }
}

/// Bill totals rounded to paise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DisplayTotals {
    pub sub_total: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total_tax: Money,
    pub grand_total: Money,
    pub loyalty_points_redeemed: i64,
    pub payable_after_redemption: Money,
}

/// Per-line amounts for invoice rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineBreakdown {
    pub item_id: String,
    pub line_amount: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
}

// =============================================================================
// Aggregation
// =============================================================================

/// Computes the totals of `cart`. An empty cart yields all zeros.
///
/// ## Example
/// ```rust
/// use billbook_core::cart::Cart;
/// use billbook_core::totals::compute_totals;
///
/// let totals = compute_totals(&Cart::new());
/// assert!(totals.grand_total.is_zero());
/// ```
pub fn compute_totals(cart: &Cart) -> TotalsResult {
    let mut sub_total = Decimal::ZERO;
    let mut tax = TaxSplit::default();

    for item in &cart.items {
        let amount = item.line_amount();
        sub_total += amount;
        tax += split_tax(amount, item.tax_rate, cart.jurisdiction);
    }

    let total_tax = tax.total();
    let grand_total = sub_total + total_tax;
    let redemption = loyalty::apply(
        cart.loyalty_points_available,
        grand_total,
        cart.loyalty_points_requested,
    );

    TotalsResult {
        sub_total,
        cgst: tax.cgst,
        sgst: tax.sgst,
        igst: tax.igst,
        total_tax,
        grand_total,
        loyalty_points_redeemed: redemption.redeemed,
        payable_after_redemption: redemption.payable_after_redemption,
    }
}

/// Computes each row's taxable amount and tax split, in cart order.
pub fn compute_line_breakdown(cart: &Cart) -> Vec<LineBreakdown> {
    cart.items
        .iter()
        .map(|item| {
            let line_amount = item.line_amount();
            let split = split_tax(line_amount, item.tax_rate, cart.jurisdiction);
            LineBreakdown {
                item_id: item.id.clone(),
                line_amount,
                cgst: split.cgst,
                sgst: split.sgst,
                igst: split.igst,
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
