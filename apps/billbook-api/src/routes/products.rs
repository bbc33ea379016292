//! # Product Routes
//!
//! Catalog search for the till, and catalog maintenance for managers.
//!
//! ```text
//! GET    /products?q=chai&limit=20   Billing          FTS prefix search
//! GET    /products/{id}              Billing
//! POST   /products                   ManageInventory
//! PUT    /products/{id}              ManageInventory
//! DELETE /products/{id}              ManageInventory  soft delete
//! ```
//!
//! Price and tax rate arrive as numbers or strings (`450`, `"₹450.00"`,
//! `"18%"`) and go through the same parsers either way.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};

use billbook_core::parse::{parse_money, parse_tax_rate, NumericInput};
use billbook_core::validation::{validate_price, validate_product_name, validate_search_query, validate_sku};
use billbook_core::{Capability, Product};
use billbook_db::repository::product::generate_product_id;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::page_size;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(search).post(create))
        .route(
            "/products/{id}",
            get(get_product).put(update).delete(deactivate),
        )
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<u32>,
}

/// Create/update body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub hsn_code: Option<String>,
    /// Unit price in rupees.
    pub price: NumericInput,
    /// GST percent.
    pub tax_rate: NumericInput,
}

/// Validated form of [`ProductInput`].
#[derive(Debug)]
struct ProductFields {
    sku: String,
    name: String,
    category: Option<String>,
    hsn_code: Option<String>,
    price_paise: i64,
    tax_rate_bps: u32,
}

impl ProductInput {
    fn validate(self) -> Result<ProductFields, ApiError> {
        validate_sku(&self.sku)?;
        validate_product_name(&self.name)?;

        let price = parse_money(&self.price.as_text())?;
        validate_price(price.paise())?;
        let tax_rate = parse_tax_rate(&self.tax_rate.as_text())?;

        Ok(ProductFields {
            sku: self.sku.trim().to_ascii_uppercase(),
            name: self.name.trim().to_string(),
            category: non_empty(self.category),
            hsn_code: non_empty(self.hsn_code),
            price_paise: price.paise(),
            tax_rate_bps: tax_rate.bps(),
        })
    }
}

pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn search(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Product>>, ApiError> {
    user.require(Capability::Billing)?;

    let query = validate_search_query(params.q.as_deref().unwrap_or(""))?;
    let limit = page_size(params.limit, 20);
    debug!(query = %query, limit, "search_products request");

    Ok(Json(state.catalog.search(&query, limit).await?))
}

async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    user.require(Capability::Billing)?;
    Ok(Json(state.catalog.get(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    user.require(Capability::ManageInventory)?;
    let fields = body.validate()?;

    let now = Utc::now();
    let product = Product {
        id: generate_product_id(),
        sku: fields.sku,
        name: fields.name,
        category: fields.category,
        hsn_code: fields.hsn_code,
        price_paise: fields.price_paise,
        tax_rate_bps: fields.tax_rate_bps,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    state.catalog.insert(&product).await?;
    info!(product_id = %product.id, sku = %product.sku, by = %user.staff_id, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
    user.require(Capability::ManageInventory)?;
    let fields = body.validate()?;

    let mut product = state.catalog.get(&id).await?;
    product.sku = fields.sku;
    product.name = fields.name;
    product.category = fields.category;
    product.hsn_code = fields.hsn_code;
    product.price_paise = fields.price_paise;
    product.tax_rate_bps = fields.tax_rate_bps;
    product.updated_at = Utc::now();

    state.catalog.update(&product).await?;
    info!(product_id = %product.id, by = %user.staff_id, "Product updated");

    Ok(Json(product))
}

async fn deactivate(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    user.require(Capability::ManageInventory)?;

    state.catalog.deactivate(&id).await?;
    info!(product_id = %id, by = %user.staff_id, "Product deactivated");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn input(price: NumericInput, tax: NumericInput) -> ProductInput {
        ProductInput {
            sku: " hair-cut_01 ".to_string(),
            name: "  Haircut ".to_string(),
            category: Some("  ".to_string()),
            hsn_code: Some("999721".to_string()),
            price,
            tax_rate: tax,
        }
    }

    #[test]
    fn test_input_accepts_text_and_numbers() {
        let fields = input("₹450.50".into(), 18i64.into()).validate().unwrap();
        assert_eq!(fields.sku, "HAIR-CUT_01");
        assert_eq!(fields.name, "Haircut");
        assert_eq!(fields.category, None);
        assert_eq!(fields.price_paise, 45_050);
        assert_eq!(fields.tax_rate_bps, 1800);
    }

    #[test]
    fn test_input_rejects_bad_numbers() {
        let err = input("-5".into(), 18i64.into()).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = input("100".into(), "150%".into()).validate().unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
