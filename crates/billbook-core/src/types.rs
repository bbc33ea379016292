//! # Domain Types
//!
//! Catalog, customer and staff records shared by every layer.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │   StaffMember   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  phone (unique) │   │  phone (login)  │       │
//! │  │  name           │   │  state_code     │   │  role           │       │
//! │  │  price_paise    │   │  loyalty_points │   │  is_active      │       │
//! │  │  tax_rate_bps   │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                                                    │
//! │          │                       │                                      │
//! │          ▼                       ▼                                      │
//! │     LineItem (cart)        Cart.customer_id / loyalty balance           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4, immutable, used for database relations
//! - Business ID: (sku, phone) - human-readable, potentially mutable

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::access::Role;
use crate::money::Money;
use crate::rates::TaxRate;

// =============================================================================
// Product
// =============================================================================

/// A product or service available for billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier.
    pub sku: String,

    /// Display name shown to the cashier and on the invoice.
    pub name: String,

    /// Free-form grouping ("Hair", "Beverages").
    pub category: Option<String>,

    /// HSN/SAC code printed on GST invoices.
    pub hsn_code: Option<String>,

    /// Unit rate in paise.
    pub price_paise: i64,

    /// GST rate in basis points (1800 = 18%).
    pub tax_rate_bps: u32,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit rate as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    /// Returns the tax rate.
    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer profile with a loyalty balance.
///
/// The balance is only ever decremented by invoice finalization in the
/// invoice store; cart-side redemption is a request, not a deduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// 10-digit mobile number, normalized without the `+91` prefix.
    pub phone: String,
    pub email: Option<String>,
    /// Two-digit GST state code ("29" = Karnataka). `None` = walk-in, local.
    pub state_code: Option<String>,
    /// GSTIN for B2B invoices.
    pub gstin: Option<String>,
    /// Redeemable points; 1 point = ₹1.
    pub loyalty_points: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Staff
// =============================================================================

/// Someone who can sign in and operate the till.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
