//! # Customer Routes
//!
//! ```text
//! GET  /customers?limit=&phone=   list, or look up one phone
//! POST /customers                 create (optional opening points)
//! GET  /customers/{id}
//! PUT  /customers/{id}            profile only; points move at checkout
//! ```

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use billbook_core::parse::{parse_points, NumericInput};
use billbook_core::validation::{normalize_phone, validate_email, validate_name, validate_state_code};
use billbook_core::{Capability, Customer};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::routes::page_size;
use crate::routes::products::non_empty;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list).post(create))
        .route("/customers/{id}", get(get_customer).put(update))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub state_code: Option<String>,
    pub gstin: Option<String>,
    /// Opening balance, honored on create only.
    pub loyalty_points: Option<NumericInput>,
}

struct CustomerFields {
    name: String,
    phone: String,
    email: Option<String>,
    state_code: Option<String>,
    gstin: Option<String>,
    loyalty_points: i64,
}

impl CustomerInput {
    fn validate(self) -> Result<CustomerFields, ApiError> {
        validate_name("name", &self.name)?;
        let phone = normalize_phone(&self.phone)?;

        let email = non_empty(self.email);
        if let Some(email) = &email {
            validate_email(email)?;
        }

        let state_code = non_empty(self.state_code);
        if let Some(code) = &state_code {
            validate_state_code(code)?;
        }

        let gstin = non_empty(self.gstin).map(|g| g.to_ascii_uppercase());
        if let Some(gstin) = &gstin {
            if gstin.len() != 15 || !gstin.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(ApiError::validation("gstin must be 15 letters or digits"));
            }
        }

        let loyalty_points = match &self.loyalty_points {
            Some(points) => parse_points(&points.as_text())?,
            None => 0,
        };

        Ok(CustomerFields {
            name: self.name.trim().to_string(),
            phone,
            email,
            state_code,
            gstin,
            loyalty_points,
        })
    }
}

async fn list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    user.require(Capability::ManageCustomers)?;

    if let Some(phone) = params.phone.as_deref() {
        let phone = normalize_phone(phone)?;
        debug!(phone = %phone, "find_customer request");
        let found = state.customers.find_by_phone(&phone).await?;
        return Ok(Json(found.into_iter().collect()));
    }

    let limit = page_size(params.limit, 50);
    Ok(Json(state.customers.list(limit).await?))
}

async fn get_customer(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    user.require(Capability::ManageCustomers)?;
    Ok(Json(state.customers.get(&id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CustomerInput>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    user.require(Capability::ManageCustomers)?;
    let fields = body.validate()?;

    let now = Utc::now();
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: fields.name,
        phone: fields.phone,
        email: fields.email,
        state_code: fields.state_code,
        gstin: fields.gstin,
        loyalty_points: fields.loyalty_points,
        created_at: now,
        updated_at: now,
    };

    state.customers.insert(&customer).await?;
    info!(customer_id = %customer.id, by = %user.staff_id, "Customer created");

    Ok((StatusCode::CREATED, Json(customer)))
}

async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<CustomerInput>,
) -> Result<Json<Customer>, ApiError> {
    user.require(Capability::ManageCustomers)?;
    let fields = body.validate()?;

    let mut customer = state.customers.get(&id).await?;
    customer.name = fields.name;
    customer.phone = fields.phone;
    customer.email = fields.email;
    customer.state_code = fields.state_code;
    customer.gstin = fields.gstin;

    state.customers.update(&customer).await?;
    info!(customer_id = %customer.id, by = %user.staff_id, "Customer updated");

    // Re-read for the stamped updated_at
    Ok(Json(state.customers.get(&id).await?))
}
