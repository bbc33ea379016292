//! Staff accounts. Creating one is how a new cashier gets a login.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use billbook_core::validation::{normalize_phone, validate_name};
use billbook_core::{Capability, Role, StaffMember};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/staff", post(create))
        .route("/staff/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct StaffInput {
    pub name: String,
    pub phone: String,
    pub role: String,
}

/// The signed-in staff member, as currently stored.
async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<StaffMember>, ApiError> {
    Ok(Json(state.db.staff().get(&user.staff_id).await?))
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<StaffInput>,
) -> Result<(StatusCode, Json<StaffMember>), ApiError> {
    user.require(Capability::ManageStaff)?;

    validate_name("name", &body.name)?;
    let member = StaffMember {
        id: Uuid::new_v4().to_string(),
        name: body.name.trim().to_string(),
        phone: normalize_phone(&body.phone)?,
        role: Role::parse(&body.role)?,
        is_active: true,
        created_at: Utc::now(),
    };

    state.db.staff().insert(&member).await?;
    info!(staff_id = %member.id, role = %member.role, by = %user.staff_id, "Staff member added");

    Ok((StatusCode::CREATED, Json(member)))
}
