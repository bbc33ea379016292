//! # Invoice Snapshot
//!
//! Freezes a cart into the rows and totals printed on a GST invoice. The
//! snapshot is what the invoice store persists; the cart itself is discarded
//! after checkout.
//!
//! ```text
//! Cart ──InvoiceDraft::from_cart──► InvoiceDraft ──InvoiceStore::finalize──► Invoice
//!                                    (rounded)        (atomic, deducts points)
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreResult, ValidationError};
use crate::money::Money;
use crate::rates::{DiscountRate, TaxJurisdiction, TaxRate};
use crate::totals::{compute_line_breakdown, compute_totals, DisplayTotals};

// =============================================================================
// Invoice Rows
// =============================================================================

/// One printed invoice row. Amounts are rounded to paise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    /// 1-based position on the invoice.
    pub line_no: i64,
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_rate: Money,
    pub discount: DiscountRate,
    pub tax_rate: TaxRate,
    /// Taxable value after discount.
    pub line_amount: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
}

/// An invoice ready to be finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    pub id: String,
    /// `INV-YYYYMMDD-XXXXXX`
    pub receipt_number: String,
    pub customer_id: Option<String>,
    pub cashier_id: String,
    pub jurisdiction: TaxJurisdiction,
    pub lines: Vec<InvoiceLine>,
    /// Includes the points redeemed against this bill.
    pub totals: DisplayTotals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl InvoiceDraft {
    /// Snapshots `cart` into an invoice draft.
    ///
    /// ## Errors
    /// - `InvalidArgument` if the cart has no rows
    pub fn from_cart(cart: &Cart, cashier_id: &str) -> CoreResult<Self> {
        if cart.is_empty() {
            return Err(ValidationError::required("items").into());
        }

        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let breakdown = compute_line_breakdown(cart);

        let lines = cart
            .items
            .iter()
            .zip(breakdown)
            .zip(1i64..)
            .map(|((item, split), line_no)| InvoiceLine {
                line_no,
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                quantity: item.quantity,
                unit_rate: item.unit_rate,
                discount: item.discount,
                tax_rate: item.tax_rate,
                line_amount: Money::from_decimal_rounded(split.line_amount),
                cgst: Money::from_decimal_rounded(split.cgst),
                sgst: Money::from_decimal_rounded(split.sgst),
                igst: Money::from_decimal_rounded(split.igst),
            })
            .collect();

        Ok(InvoiceDraft {
            id: id.to_string(),
            receipt_number: receipt_number(&id, created_at),
            customer_id: cart.customer_id.clone(),
            cashier_id: cashier_id.to_string(),
            jurisdiction: cart.jurisdiction,
            lines,
            totals: compute_totals(cart).rounded(),
            created_at,
        })
    }

    /// Points to deduct from the customer when this invoice is finalized.
    pub fn loyalty_points_redeemed(&self) -> i64 {
        self.totals.loyalty_points_redeemed
    }
}

/// Builds a receipt number from the invoice id and its date.
pub fn receipt_number(id: &Uuid, created_at: DateTime<Utc>) -> String {
    let suffix: String = id.simple().to_string().chars().take(6).collect();
    format!(
        "INV-{}-{}",
        created_at.format("%Y%m%d"),
        suffix.to_ascii_uppercase()
    )
}

// =============================================================================
// Stored Invoice
// =============================================================================

/// A finalized invoice as read back from the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub receipt_number: String,
    pub customer_id: Option<String>,
    pub cashier_id: String,
    pub jurisdiction: TaxJurisdiction,
    pub lines: Vec<InvoiceLine>,
    pub totals: DisplayTotals,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl From<InvoiceDraft> for Invoice {
    fn from(draft: InvoiceDraft) -> Self {
        Invoice {
            id: draft.id,
            receipt_number: draft.receipt_number,
            customer_id: draft.customer_id,
            cashier_id: draft.cashier_id,
            jurisdiction: draft.jurisdiction,
            lines: draft.lines,
            totals: draft.totals,
            created_at: draft.created_at,
        }
    }
}

/// Header-only view for invoice lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceSummary {
    pub id: String,
    pub receipt_number: String,
    pub customer_id: Option<String>,
    pub grand_total: Money,
    pub payable_after_redemption: Money,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Tax Report
// =============================================================================

/// GST collected for one rate slab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxSlabSummary {
    pub tax_rate: TaxRate,
    pub taxable_value: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
}

/// GST collected over a date range, inclusive of both ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    #[ts(as = "String")]
    pub from: NaiveDate,
    #[ts(as = "String")]
    pub to: NaiveDate,
    pub invoice_count: i64,
    pub taxable_value: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
    pub total_tax: Money,
    pub slabs: Vec<TaxSlabSummary>,
}

impl TaxSummary {
    /// Builds a summary whose totals are the sum of `slabs`.
    pub fn from_slabs(from: NaiveDate, to: NaiveDate, invoice_count: i64, slabs: Vec<TaxSlabSummary>) -> Self {
        let mut summary = TaxSummary {
            from,
            to,
            invoice_count,
            taxable_value: Money::zero(),
            cgst: Money::zero(),
            sgst: Money::zero(),
            igst: Money::zero(),
            total_tax: Money::zero(),
            slabs: Vec::new(),
        };
        for slab in &slabs {
            summary.taxable_value += slab.taxable_value;
            summary.cgst += slab.cgst;
            summary.sgst += slab.sgst;
            summary.igst += slab.igst;
        }
        summary.total_tax = summary.cgst + summary.sgst + summary.igst;
        summary.slabs = slabs;
        summary
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
