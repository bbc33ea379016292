//! # Billing Session Routes
//!
//! A session is one live cart at the till. Every mutation returns the whole
//! cart with freshly computed totals, so the client never does tax math.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  POST /sessions ──► ┌──────────┐  items / quantity / discount          │
//! │                     │   Open   │  jurisdiction / customer / redemption │
//! │                     └────┬─────┘                                        │
//! │             ┌────────────┼──────────────┬─────────────────┐            │
//! │        /hold│     /checkout│        DELETE│                 │            │
//! │             ▼              ▼              ▼                 │            │
//! │      ┌──────────┐   ┌──────────┐   ┌──────────┐            │            │
//! │      │   Held   │   │ Invoice  │   │Discarded │            │            │
//! │      │CartStore │   │ (points  │   └──────────┘            │            │
//! │      └────┬─────┘   │ deducted)│                           │            │
//! │           │         └──────────┘                           │            │
//! │           └── /sessions/held/{id}/resume ──────────────────┘            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use billbook_core::invoice::{Invoice, InvoiceDraft};
use billbook_core::parse::{parse_discount, parse_points, parse_quantity, NumericInput};
use billbook_core::ports::HeldCartSummary;
use billbook_core::{
    compute_line_breakdown, compute_totals, Capability, Cart, CoreError, DisplayTotals, Money,
    RepoError, TaxJurisdiction,
};

use crate::auth::AuthUser;
use crate::error::{ApiError, ErrorCode};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sessions", post(open))
        .route("/sessions/held", get(list_held))
        .route("/sessions/held/{id}/resume", post(resume))
        .route("/sessions/{id}", get(get_session).delete(discard))
        .route("/sessions/{id}/items", post(add_item))
        .route("/sessions/{id}/items/{item_id}", delete(remove_item))
        .route("/sessions/{id}/items/{item_id}/quantity", put(set_quantity))
        .route("/sessions/{id}/items/{item_id}/discount", put(set_discount))
        .route("/sessions/{id}/jurisdiction", put(set_jurisdiction))
        .route(
            "/sessions/{id}/customer",
            put(attach_customer).delete(detach_customer),
        )
        .route("/sessions/{id}/redemption", put(request_redemption))
        .route("/sessions/{id}/hold", post(hold))
        .route("/sessions/{id}/checkout", post(checkout))
}

// =============================================================================
// Views
// =============================================================================

/// One row's taxable amount and tax, rounded to paise.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineView {
    pub item_id: String,
    pub line_amount: Money,
    pub cgst: Money,
    pub sgst: Money,
    pub igst: Money,
}

/// Cart plus everything the till displays for it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: String,
    pub cart: Cart,
    pub totals: DisplayTotals,
    pub lines: Vec<LineView>,
}

impl From<&Cart> for SessionView {
    fn from(cart: &Cart) -> Self {
        let lines = compute_line_breakdown(cart)
            .into_iter()
            .map(|line| LineView {
                item_id: line.item_id,
                line_amount: Money::from_decimal_rounded(line.line_amount),
                cgst: Money::from_decimal_rounded(line.cgst),
                sgst: Money::from_decimal_rounded(line.sgst),
                igst: Money::from_decimal_rounded(line.igst),
            })
            .collect();

        SessionView {
            session_id: cart.id.clone(),
            cart: cart.clone(),
            totals: compute_totals(cart).rounded(),
            lines,
        }
    }
}

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub quantity: NumericInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountRequest {
    pub discount_percent: NumericInput,
}

#[derive(Debug, Deserialize)]
pub struct JurisdictionRequest {
    pub jurisdiction: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachCustomerRequest {
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
pub struct RedemptionRequest {
    pub points: NumericInput,
}

// =============================================================================
// Helpers
// =============================================================================

/// Applies `f` to the session's cart under its lock and returns the new view.
async fn mutate<F>(state: &AppState, id: &str, f: F) -> Result<Json<SessionView>, ApiError>
where
    F: FnOnce(&mut Cart) -> Result<(), ApiError>,
{
    let mut cart = state.sessions.lock(id).await?;
    f(&mut cart)?;
    Ok(Json(SessionView::from(&*cart)))
}

/// Reloads the attached customer's balance. A customer deleted meanwhile is
/// detached.
async fn refresh_balance(state: &AppState, cart: &mut Cart) -> Result<(), ApiError> {
    let Some(customer_id) = cart.customer_id.clone() else {
        return Ok(());
    };

    match state.customers.get(&customer_id).await {
        Ok(customer) => {
            cart.loyalty_points_available = customer.loyalty_points.max(0);
            Ok(())
        }
        Err(RepoError::NotFound { .. }) => {
            warn!(customer_id = %customer_id, "Attached customer no longer exists");
            cart.detach_customer();
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Handlers
// =============================================================================

async fn open(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    user.require(Capability::Billing)?;

    let (id, shared) = state.sessions.open().await;
    info!(session_id = %id, staff_id = %user.staff_id, "Billing session opened");

    let cart = shared.lock().await;
    Ok((StatusCode::CREATED, Json(SessionView::from(&*cart))))
}

async fn get_session(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;
    mutate(&state, &id, |_| Ok(())).await
}

async fn discard(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Capability::Billing)?;

    state
        .sessions
        .remove(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Session", &id))?;
    info!(session_id = %id, staff_id = %user.staff_id, "Billing session discarded");

    Ok(StatusCode::NO_CONTENT)
}

/// Adds one unit of a product, or bumps its existing row.
///
/// The product's current price and GST rate are frozen onto a new row;
/// later catalog edits do not change it.
async fn add_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;
    debug!(session_id = %id, product_id = %body.product_id, "add_item request");

    let product = state.catalog.get(&body.product_id).await?;
    if !product.is_active {
        return Err(ApiError::validation("Product is not available for sale"));
    }

    mutate(&state, &id, |cart| {
        cart.add_or_increment(&product)?;
        Ok(())
    })
    .await
}

/// `0` removes the row.
async fn set_quantity(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(String, String)>,
    Json(body): Json<QuantityRequest>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;
    let quantity = parse_quantity(&body.quantity.as_text())?;
    debug!(session_id = %id, item_id = %item_id, quantity, "set_quantity request");

    mutate(&state, &id, |cart| Ok(cart.set_quantity(&item_id, quantity)?)).await
}

async fn set_discount(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(String, String)>,
    Json(body): Json<DiscountRequest>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;
    let discount = parse_discount(&body.discount_percent.as_text())?;
    debug!(session_id = %id, item_id = %item_id, discount = %discount.percent(), "set_discount request");

    mutate(&state, &id, |cart| {
        Ok(cart.set_discount(&item_id, discount.percent())?)
    })
    .await
}

async fn remove_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;

    mutate(&state, &id, |cart| {
        if cart.remove(&item_id) {
            Ok(())
        } else {
            Err(CoreError::not_found("Line item", &item_id).into())
        }
    })
    .await
}

/// Manual override of the derived jurisdiction.
async fn set_jurisdiction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<JurisdictionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;
    let jurisdiction = TaxJurisdiction::parse(&body.jurisdiction)?;

    mutate(&state, &id, |cart| {
        cart.set_jurisdiction(jurisdiction);
        Ok(())
    })
    .await
}

/// Loads the customer's balance and derives CGST/SGST vs IGST from their
/// state code.
async fn attach_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<AttachCustomerRequest>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;

    let customer = state.customers.get(&body.customer_id).await?;
    let store_state = state.config.store_state_code.clone();
    debug!(session_id = %id, customer_id = %customer.id, "attach_customer request");

    mutate(&state, &id, |cart| {
        cart.attach_customer(&customer, &store_state);
        Ok(())
    })
    .await
}

async fn detach_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;

    mutate(&state, &id, |cart| {
        cart.detach_customer();
        Ok(())
    })
    .await
}

/// Records the points to redeem. Totals clamp the request to the balance
/// and to the bill.
async fn request_redemption(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<RedemptionRequest>,
) -> Result<Json<SessionView>, ApiError> {
    user.require(Capability::Billing)?;
    let points = parse_points(&body.points.as_text())?;

    mutate(&state, &id, |cart| {
        if points > 0 && cart.customer_id.is_none() {
            return Err(ApiError::validation("Attach a customer before redeeming points"));
        }
        Ok(cart.request_redemption(points)?)
    })
    .await
}

/// Parks the cart in the cart store and closes the session.
async fn hold(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<HeldCartSummary>, ApiError> {
    user.require(Capability::Billing)?;

    let cart = state.sessions.lock(&id).await?;
    if cart.is_empty() {
        return Err(ApiError::validation("Cannot hold an empty cart"));
    }

    state.carts.save(&cart).await?;
    state.sessions.remove(&id).await;
    info!(session_id = %id, items = cart.item_count(), "Cart held");

    Ok(Json(HeldCartSummary {
        id: cart.id.clone(),
        customer_id: cart.customer_id.clone(),
        item_count: cart.item_count() as i64,
        held_at: Utc::now(),
    }))
}

async fn list_held(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<HeldCartSummary>>, ApiError> {
    user.require(Capability::Billing)?;
    Ok(Json(state.carts.list_held().await?))
}

/// Reopens a held cart as a live session, with the customer's current
/// balance.
async fn resume(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    user.require(Capability::Billing)?;

    let mut cart = state.carts.load(&id).await?;
    refresh_balance(&state, &mut cart).await?;

    // Only one resume may claim the held cart
    if !state.carts.delete(&id).await? {
        return Err(ApiError::not_found("Held cart", &id));
    }

    let (session_id, shared) = state.sessions.insert(cart).await;
    info!(session_id = %session_id, staff_id = %user.staff_id, "Held cart resumed");

    let cart = shared.lock().await;
    Ok((StatusCode::CREATED, Json(SessionView::from(&*cart))))
}

/// Finalizes the cart into an invoice and closes the session.
///
/// ## Flow
/// ```text
/// lock cart ──► InvoiceDraft::from_cart ──► InvoiceStore::finalize
///                (rounded rows/totals)        (one transaction:
///                                              header + rows + points)
///    │
///    ├── Ok        ──► session closed, 201 Invoice
///    └── Conflict  ──► balance reloaded into the cart, 409
///                      (another till spent the points first)
/// ```
async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<Invoice>), ApiError> {
    user.require(Capability::Billing)?;

    let mut cart = state.sessions.lock(&id).await?;

    let draft = InvoiceDraft::from_cart(&cart, &user.staff_id)?;
    let invoice = match state.invoices.finalize(&draft).await {
        Ok(invoice) => invoice,
        Err(RepoError::Conflict(message)) => {
            warn!(session_id = %id, message = %message, "Checkout conflict");
            refresh_balance(&state, &mut cart).await?;
            return Err(ApiError::new(ErrorCode::Conflict, message));
        }
        Err(e) => return Err(e.into()),
    };

    state.sessions.remove(&id).await;
    info!(
        session_id = %id,
        invoice_id = %invoice.id,
        receipt = %invoice.receipt_number,
        grand_total = %invoice.totals.grand_total,
        points = invoice.totals.loyalty_points_redeemed,
        "Checkout complete"
    );

    Ok((StatusCode::CREATED, Json(invoice)))
}
