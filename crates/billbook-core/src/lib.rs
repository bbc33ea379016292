//! # billbook-core: Pure Billing Logic for Billbook
//!
//! This crate is the **heart** of Billbook. It contains the billing
//! calculation engine as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billbook Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    billbook-api (axum)                          │   │
//! │  │    /sessions ──► /items ──► /redemption ──► /checkout          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ billbook-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   cart    │  │    tax    │  │  totals   │  │  loyalty  │  │   │
//! │  │   │ LineItem  │  │ CGST/SGST │  │ sub/grand │  │ redeem    │  │   │
//! │  │   │   Cart    │  │   IGST    │  │  rounding │  │  bound    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   parse   │  │  access   │  │  invoice  │  │   ports   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ implements ports                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    billbook-db (Database Layer)                 │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type in paise, with Decimal conversion and rounding
//! - [`rates`] - TaxRate, DiscountRate, TaxJurisdiction
//! - [`types`] - Product, Customer, StaffMember
//! - [`cart`] - LineItem and Cart with their mutations
//! - [`tax`] - CGST/SGST vs IGST split
//! - [`totals`] - Totals aggregator
//! - [`loyalty`] - Loyalty redemption rule
//! - [`parse`] - Text → typed value boundary
//! - [`validation`] - Field validators
//! - [`access`] - Roles and capabilities
//! - [`invoice`] - Invoice snapshot and tax report types
//! - [`ports`] - Repository traits
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same cart in, same totals out
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Round Once**: amounts accumulate in `Decimal`, become paise only for display
//! 4. **Explicit Errors**: InvalidArgument / NotFound / Forbidden, never silent no-ops
//!
//! ## Example Usage
//!
//! ```rust
//! use billbook_core::cart::Cart;
//! use billbook_core::rates::TaxJurisdiction;
//! use billbook_core::totals::compute_totals;
//! use billbook_core::types::Product;
//! use rust_decimal::Decimal;
//!
//! let now = chrono::Utc::now();
//! let haircut = Product {
//!     id: "p-1".into(),
//!     sku: "HAIR-001".into(),
//!     name: "Haircut".into(),
//!     category: None,
//!     hsn_code: None,
//!     price_paise: 10_000, // ₹100.00
//!     tax_rate_bps: 1800,  // 18%
//!     is_active: true,
//!     created_at: now,
//!     updated_at: now,
//! };
//!
//! let mut cart = Cart::new();
//! let row = cart.add_or_increment(&haircut).unwrap();
//! cart.set_quantity(&row, 2).unwrap();
//! cart.set_jurisdiction(TaxJurisdiction::SameState);
//!
//! let totals = compute_totals(&cart);
//! assert_eq!(totals.cgst, Decimal::from(18));
//! assert_eq!(totals.grand_total, Decimal::from(236));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod access;
pub mod cart;
pub mod error;
pub mod invoice;
pub mod loyalty;
pub mod money;
pub mod parse;
pub mod ports;
pub mod rates;
pub mod tax;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use billbook_core::Money` instead of
// `use billbook_core::money::Money`

pub use access::{Capability, Role};
pub use cart::{Cart, LineItem};
pub use error::{CoreError, CoreResult, ErrorKind, RepoError, RepoResult, ValidationError};
pub use money::Money;
pub use rates::{DiscountRate, TaxJurisdiction, TaxRate};
pub use totals::{compute_line_breakdown, compute_totals, DisplayTotals, TotalsResult};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single row.
///
/// ## Business Reason
/// Catches typos at the till (1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// GST state code used when none is configured (29 = Karnataka).
pub const DEFAULT_STORE_STATE_CODE: &str = "29";
