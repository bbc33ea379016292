//! # Cart and Line Items
//!
//! The cart is the aggregate root of a billing session. Every mutation goes
//! through a method on [`Cart`]; totals are never stored, only derived (see
//! [`crate::totals`]).
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Operations                                 │
//! │                                                                         │
//! │  Action                   Method                   Effect               │
//! │  ──────                   ──────                   ──────               │
//! │  Pick product ──────────► add_or_increment() ────► push or qty += 1     │
//! │  Edit quantity ─────────► set_quantity() ────────► qty = n (0 removes)  │
//! │  Edit discount ─────────► set_discount() ────────► discount = d         │
//! │  Remove row ────────────► remove() ──────────────► items.remove(i)      │
//! │  Select customer ───────► attach_customer() ─────► points, jurisdiction │
//! │  Redeem points ─────────► request_redemption() ──► requested = p        │
//! │                                                                         │
//! │  Rows are unique by product_id and kept in insertion order.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::rates::{DiscountRate, TaxJurisdiction, TaxRate};
use crate::types::{Customer, Product};
use crate::MAX_ITEM_QUANTITY;

// =============================================================================
// Line Item
// =============================================================================

/// One row of a cart: a quantity of a single product at a frozen rate.
///
/// ## Price Freezing
/// `unit_rate` and `tax_rate` are copied from the product when the row is
/// created. Later catalog edits do not reach rows already in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Row identifier, unique within the cart.
    pub id: String,
    pub product_id: String,
    pub name: String,
    /// Always at least 1 while the row exists.
    pub quantity: i64,
    pub unit_rate: Money,
    pub discount: DiscountRate,
    pub tax_rate: TaxRate,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl LineItem {
    /// Creates a row with quantity 1 from a catalog product.
    pub fn from_product(product: &Product) -> Self {
        LineItem {
            id: Uuid::new_v4().to_string(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: 1,
            unit_rate: product.price(),
            discount: DiscountRate::NONE,
            tax_rate: product.tax_rate(),
            added_at: Utc::now(),
        }
    }

    /// Taxable base of the row, in rupees, at full precision.
    ///
    /// `quantity × unit_rate × (1 − discount/100)`
    ///
    /// ## Example
    /// ```text
    /// qty 1, rate ₹500.00, discount 10%  →  450
    /// qty 3, rate ₹50.00,  discount 0%   →  150
    /// ```
    pub fn line_amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_rate.to_decimal() * self.discount.remaining_fraction()
    }

    /// Gross value before discount.
    pub fn gross_amount(&self) -> Decimal {
        Decimal::from(self.quantity) * self.unit_rate.to_decimal()
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A billing cart.
///
/// ## Invariants
/// - Rows are unique by `product_id`
/// - Every row has `quantity >= 1`; setting 0 removes the row
/// - Every discount is within 0..=100%
/// - `loyalty_points_available` and `loyalty_points_requested` are never negative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    pub items: Vec<LineItem>,
    pub jurisdiction: TaxJurisdiction,
    /// Balance of the attached customer, 0 for walk-ins.
    pub loyalty_points_available: i64,
    /// Points the cashier asked to redeem. Clamped when totals are computed.
    pub loyalty_points_requested: i64,
    pub customer_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates an empty intra-state cart.
    pub fn new() -> Self {
        Cart {
            id: Uuid::new_v4().to_string(),
            items: Vec::new(),
            jurisdiction: TaxJurisdiction::SameState,
            loyalty_points_available: 0,
            loyalty_points_requested: 0,
            customer_id: None,
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of `product`, or bumps the existing row for it.
    ///
    /// Returns the id of the row that was created or incremented.
    ///
    /// ## Errors
    /// - `InvalidArgument` if the row is already at [`MAX_ITEM_QUANTITY`];
    ///   the row is left unchanged
    pub fn add_or_increment(&mut self, product: &Product) -> CoreResult<String> {
        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product.id) {
            if item.quantity >= MAX_ITEM_QUANTITY {
                return Err(ValidationError::out_of_range("quantity", 0, MAX_ITEM_QUANTITY).into());
            }
            item.quantity += 1;
            return Ok(item.id.clone());
        }

        let item = LineItem::from_product(product);
        let id = item.id.clone();
        self.items.push(item);
        Ok(id)
    }

    /// Sets a row's quantity.
    ///
    /// ## Behavior
    /// - `0` removes the row
    /// - negative → `InvalidArgument`
    /// - unknown row → `NotFound`
    pub fn set_quantity(&mut self, item_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity < 0 {
            return Err(ValidationError::negative("quantity").into());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(ValidationError::out_of_range("quantity", 0, MAX_ITEM_QUANTITY).into());
        }

        let index = self.position(item_id)?;
        if quantity == 0 {
            self.items.remove(index);
        } else {
            self.items[index].quantity = quantity;
        }
        Ok(())
    }

    /// Sets a row's discount percentage.
    ///
    /// Values outside 0..=100 or finer than 0.01% are rejected, not clamped.
    pub fn set_discount(&mut self, item_id: &str, discount_percent: Decimal) -> CoreResult<()> {
        let discount = discount_from_percent(discount_percent)?;

        let index = self.position(item_id)?;
        self.items[index].discount = discount;
        Ok(())
    }

    /// Removes a row. Returns whether anything was removed.
    pub fn remove(&mut self, item_id: &str) -> bool {
        let initial_len = self.items.len();
        self.items.retain(|i| i.id != item_id);
        self.items.len() != initial_len
    }

    /// Looks up a row by id.
    pub fn item(&self, item_id: &str) -> Option<&LineItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    /// Removes every row and any redemption request. The customer stays attached.
    pub fn clear(&mut self) {
        self.items.clear();
        self.loyalty_points_requested = 0;
    }

    /// Number of distinct rows.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across rows.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn set_jurisdiction(&mut self, jurisdiction: TaxJurisdiction) {
        self.jurisdiction = jurisdiction;
    }

    /// Attaches a customer: loads their balance and derives the jurisdiction
    /// from the store's and the customer's GST state codes.
    pub fn attach_customer(&mut self, customer: &Customer, store_state: &str) {
        self.customer_id = Some(customer.id.clone());
        self.loyalty_points_available = customer.loyalty_points.max(0);
        self.jurisdiction = TaxJurisdiction::between(store_state, customer.state_code.as_deref());
    }

    /// Back to a walk-in sale: no balance, no redemption, intra-state.
    pub fn detach_customer(&mut self) {
        self.customer_id = None;
        self.loyalty_points_available = 0;
        self.loyalty_points_requested = 0;
        self.jurisdiction = TaxJurisdiction::SameState;
    }

    /// Records how many points the customer wants to redeem.
    ///
    /// The request is kept as given; [`crate::loyalty::redeem`] bounds it by
    /// the balance and the bill when totals are computed.
    pub fn request_redemption(&mut self, points: i64) -> CoreResult<()> {
        if points < 0 {
            return Err(ValidationError::negative("points").into());
        }
        self.loyalty_points_requested = points;
        Ok(())
    }

    fn position(&self, item_id: &str) -> CoreResult<usize> {
        self.items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| CoreError::not_found("Line item", item_id))
    }
}

fn discount_from_percent(percent: Decimal) -> CoreResult<DiscountRate> {
    let out_of_range = || CoreError::from(ValidationError::out_of_range("discount", 0, 100));

    if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(out_of_range());
    }

    let bps = percent * Decimal::ONE_HUNDRED;
    if bps.fract() != Decimal::ZERO {
        return Err(ValidationError::invalid_format("discount", "at most 2 decimal places").into());
    }

    let bps = bps.to_u32().ok_or_else(out_of_range)?;
    DiscountRate::from_bps(bps)
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
